use async_trait::async_trait;

use super::{Check, CheckFailure, CheckResult};
use crate::provider::{CapabilityProvider, Facet};

const ENABLED: &str = "Enabled";

/// Passes only when versioning status is exactly "Enabled"
#[derive(Debug, Clone, Copy)]
pub struct VersioningCheck;

#[async_trait]
impl Check for VersioningCheck {
    fn name(&self) -> &'static str {
        "BucketVersioning"
    }

    async fn run(&self, bucket: &str, provider: &dyn CapabilityProvider) -> CheckResult {
        let status = provider
            .versioning_config(bucket)
            .await
            .map_err(CheckFailure::query(Facet::Versioning))?
            .and_then(|config| config.status)
            .ok_or(CheckFailure::ConfigurationAbsent(Facet::Versioning))?;

        if status == ENABLED {
            Ok(None)
        } else {
            Err(CheckFailure::PolicyViolation(format!(
                "versioning status is {status}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VersioningConfig;
    use crate::provider::fixture::{BucketFixture, FixtureProvider, Lookup};

    async fn run_with(versioning: Lookup<VersioningConfig>) -> CheckResult {
        let provider = FixtureProvider::new().with_bucket(
            "bucket",
            BucketFixture {
                versioning,
                ..BucketFixture::compliant()
            },
        );
        VersioningCheck.run("bucket", &provider).await
    }

    #[tokio::test]
    async fn test_enabled_passes() {
        let result = run_with(Lookup::Configured(VersioningConfig::with_status("Enabled"))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_suspended_fails() {
        let err = run_with(Lookup::Configured(VersioningConfig::with_status("Suspended")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "versioning status is Suspended");
    }

    #[tokio::test]
    async fn test_missing_status_fails() {
        let err = run_with(Lookup::Absent).await.unwrap_err();
        assert!(matches!(err, CheckFailure::ConfigurationAbsent(Facet::Versioning)));

        // MFA delete reported without a status still means versioning was never enabled
        let config = VersioningConfig {
            status: None,
            mfa_delete: Some("Disabled".to_string()),
        };
        let err = run_with(Lookup::Configured(config)).await.unwrap_err();
        assert!(matches!(err, CheckFailure::ConfigurationAbsent(Facet::Versioning)));
    }
}
