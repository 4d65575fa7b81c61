//! Bucket policy checks
//!
//! Each check reads one configuration facet through the capability provider
//! and compares it with the required value. A check never decides how its
//! result is scheduled or reported; it only returns a pass (with an optional
//! message) or a `CheckFailure`.

pub mod encryption;
pub mod public_access;
pub mod versioning;
pub mod website;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::provider::{CapabilityProvider, Facet};

pub use encryption::EncryptionCheck;
pub use public_access::{PublicAccessCheck, PublicAccessSetting};
pub use versioning::VersioningCheck;
pub use website::WebsiteDisabledCheck;

/// Why a check did not pass
#[derive(Error, Debug)]
pub enum CheckFailure {
    /// The facet is configured but does not satisfy the policy
    #[error("{0}")]
    PolicyViolation(String),

    /// The facet was never configured
    #[error("{0} is not configured")]
    ConfigurationAbsent(Facet),

    /// The facet could not be read; compliance cannot be assumed
    #[error("unable to read {facet}")]
    Query {
        facet: Facet,
        #[source]
        source: anyhow::Error,
    },
}

impl CheckFailure {
    pub fn query(facet: Facet) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| CheckFailure::Query { facet, source }
    }
}

pub type CheckResult = std::result::Result<Option<String>, CheckFailure>;

/// A named policy predicate over one bucket
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable identifier used in reports, e.g. `BlockPublicAcls`
    fn name(&self) -> &'static str;

    async fn run(&self, bucket: &str, provider: &dyn CapabilityProvider) -> CheckResult;
}

/// Every policy the audit enforces, in report order
pub fn all_checks() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(PublicAccessCheck::new(PublicAccessSetting::BlockPublicAcls)),
        Arc::new(PublicAccessCheck::new(PublicAccessSetting::IgnorePublicAcls)),
        Arc::new(PublicAccessCheck::new(PublicAccessSetting::BlockPublicPolicy)),
        Arc::new(PublicAccessCheck::new(PublicAccessSetting::RestrictPublicBuckets)),
        Arc::new(EncryptionCheck),
        Arc::new(VersioningCheck),
        Arc::new(WebsiteDisabledCheck),
    ]
}
