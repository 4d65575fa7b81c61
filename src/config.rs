//! Configuration constants for the bucket auditor
//!
//! This module centralizes the tunable parameters and the S3 error codes the
//! provider relies on.

use std::time::Duration;

// ============================================================================
// Query Configuration
// ============================================================================

/// Timeout for a single configuration query against S3
///
/// Bounds each call so that one unresponsive endpoint turns into a Failure
/// outcome for that check instead of stalling the whole audit. The SDK's own
/// retries happen inside this window.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the initial ListBuckets call
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// S3 "not configured" error codes
// ============================================================================

pub const NO_PUBLIC_ACCESS_BLOCK: &str = "NoSuchPublicAccessBlockConfiguration";

pub const NO_ENCRYPTION_CONFIGURATION: &str = "ServerSideEncryptionConfigurationNotFoundError";

pub const NO_WEBSITE_CONFIGURATION: &str = "NoSuchWebsiteConfiguration";

// ============================================================================
// Logging
// ============================================================================

pub const LOG_FILTER: &str = "s3_audit=info";

pub const QUIET_LOG_FILTER: &str = "s3_audit=warn";

// ============================================================================
// Process
// ============================================================================

/// Exit status after a second Ctrl-C (128 + SIGINT, as shells report it)
pub const FORCE_QUIT_EXIT_CODE: i32 = 130;
