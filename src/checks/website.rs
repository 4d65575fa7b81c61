use async_trait::async_trait;

use super::{Check, CheckFailure, CheckResult};
use crate::provider::{CapabilityProvider, Facet};

pub const NO_WEBSITE_DETAIL: &str = "no website configuration";

pub const WEBSITE_ENABLED_DETAIL: &str = "static website hosting enabled";

/// Passes when the bucket has no static website configuration
///
/// This is the one check where an unconfigured facet is the compliant state.
/// Any configuration block returned by the service fails, including an empty
/// one, and so does a query that could not confirm the absence.
#[derive(Debug, Clone, Copy)]
pub struct WebsiteDisabledCheck;

#[async_trait]
impl Check for WebsiteDisabledCheck {
    fn name(&self) -> &'static str {
        "BucketWebsiteDisabled"
    }

    async fn run(&self, bucket: &str, provider: &dyn CapabilityProvider) -> CheckResult {
        let website = provider
            .website_config(bucket)
            .await
            .map_err(CheckFailure::query(Facet::Website))?;

        match website {
            None => Ok(Some(NO_WEBSITE_DETAIL.to_string())),
            Some(_) => Err(CheckFailure::PolicyViolation(
                WEBSITE_ENABLED_DETAIL.to_string(),
            )),
        }
    }
}
