use async_trait::async_trait;

use super::{Check, CheckFailure, CheckResult};
use crate::provider::{CapabilityProvider, Facet};

/// Passes when at least one rule applies server-side encryption by default
#[derive(Debug, Clone, Copy)]
pub struct EncryptionCheck;

#[async_trait]
impl Check for EncryptionCheck {
    fn name(&self) -> &'static str {
        "ServerSideEncryption"
    }

    async fn run(&self, bucket: &str, provider: &dyn CapabilityProvider) -> CheckResult {
        let config = provider
            .encryption_config(bucket)
            .await
            .map_err(CheckFailure::query(Facet::Encryption))?
            .ok_or(CheckFailure::ConfigurationAbsent(Facet::Encryption))?;

        if config.rules.is_empty() {
            return Err(CheckFailure::ConfigurationAbsent(Facet::Encryption));
        }

        let algorithm = config.default_algorithm().ok_or_else(|| {
            CheckFailure::PolicyViolation("no rule sets a default encryption algorithm".to_string())
        })?;

        Ok(Some(format!("Bucket encryption algorithm is: {algorithm}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixture::{BucketFixture, FixtureProvider, Lookup};
    use crate::provider::{EncryptionConfig, EncryptionRule};

    async fn run_with(encryption: Lookup<EncryptionConfig>) -> CheckResult {
        let provider = FixtureProvider::new().with_bucket(
            "bucket",
            BucketFixture {
                encryption,
                ..BucketFixture::compliant()
            },
        );
        EncryptionCheck.run("bucket", &provider).await
    }

    #[tokio::test]
    async fn test_pass_reports_algorithm() {
        let detail = run_with(Lookup::Configured(EncryptionConfig::with_algorithm("aws:kms")))
            .await
            .unwrap();
        assert_eq!(detail.as_deref(), Some("Bucket encryption algorithm is: aws:kms"));
    }

    #[tokio::test]
    async fn test_absent_and_empty_rules_fail() {
        let err = run_with(Lookup::Absent).await.unwrap_err();
        assert!(matches!(err, CheckFailure::ConfigurationAbsent(Facet::Encryption)));

        let err = run_with(Lookup::Configured(EncryptionConfig::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::ConfigurationAbsent(Facet::Encryption)));
    }

    #[tokio::test]
    async fn test_rule_without_algorithm_fails() {
        let config = EncryptionConfig {
            rules: vec![EncryptionRule {
                bucket_key_enabled: Some(true),
                ..Default::default()
            }],
        };
        let err = run_with(Lookup::Configured(config)).await.unwrap_err();
        assert!(matches!(err, CheckFailure::PolicyViolation(_)));
    }

    #[tokio::test]
    async fn test_query_error_fails() {
        let err = run_with(Lookup::Error("timeout")).await.unwrap_err();
        assert!(matches!(err, CheckFailure::Query { facet: Facet::Encryption, .. }));
    }
}
