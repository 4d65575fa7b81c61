//! Capability provider: read-only configuration queries per bucket

pub mod s3;
pub mod shared;

#[cfg(test)]
pub mod fixture;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

pub use s3::S3Provider;
pub use shared::SharedBucketProvider;

/// Public access block settings of a bucket
///
/// Each flag is optional because S3 may omit any of them; a missing flag never
/// counts as `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicAccessConfig {
    pub block_public_acls: Option<bool>,
    pub ignore_public_acls: Option<bool>,
    pub block_public_policy: Option<bool>,
    pub restrict_public_buckets: Option<bool>,
}

impl PublicAccessConfig {
    /// All four protections switched on
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn fully_blocked() -> Self {
        Self {
            block_public_acls: Some(true),
            ignore_public_acls: Some(true),
            block_public_policy: Some(true),
            restrict_public_buckets: Some(true),
        }
    }
}

/// One server-side encryption rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionRule {
    pub default_algorithm: Option<String>,
    pub kms_master_key_id: Option<String>,
    pub bucket_key_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionConfig {
    pub rules: Vec<EncryptionRule>,
}

impl EncryptionConfig {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_algorithm(algorithm: &str) -> Self {
        Self {
            rules: vec![EncryptionRule {
                default_algorithm: Some(algorithm.to_string()),
                ..Default::default()
            }],
        }
    }

    /// Algorithm of the first rule that applies encryption by default
    pub fn default_algorithm(&self) -> Option<&str> {
        self.rules
            .iter()
            .find_map(|rule| rule.default_algorithm.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersioningConfig {
    /// "Enabled" or "Suspended" as reported by S3
    pub status: Option<String>,
    pub mfa_delete: Option<String>,
}

impl VersioningConfig {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            mfa_delete: None,
        }
    }
}

/// Static website hosting configuration
///
/// A value of this type existing at all means S3 returned a website
/// configuration block, even if every field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteConfig {
    pub index_document: Option<String>,
    pub error_document: Option<String>,
    pub redirect_host: Option<String>,
    pub routing_rule_count: usize,
}

/// Configuration facet queried by a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    PublicAccess,
    Encryption,
    Versioning,
    Website,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facet::PublicAccess => "public access block",
            Facet::Encryption => "default encryption",
            Facet::Versioning => "versioning",
            Facet::Website => "website configuration",
        };
        f.write_str(name)
    }
}

/// Read-only queries the audit needs from the storage service
///
/// Each getter returns `Ok(None)` when the facet was fetched and is simply not
/// configured, and `Err` when the query itself failed. Implementations must be
/// safe to call concurrently for different buckets and facets.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>>;

    async fn public_access_config(&self, bucket: &str) -> Result<Option<PublicAccessConfig>>;

    async fn encryption_config(&self, bucket: &str) -> Result<Option<EncryptionConfig>>;

    async fn versioning_config(&self, bucket: &str) -> Result<Option<VersioningConfig>>;

    async fn website_config(&self, bucket: &str) -> Result<Option<WebsiteConfig>>;
}
