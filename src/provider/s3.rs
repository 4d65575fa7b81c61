use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_types::SdkConfig;
use tokio::time::timeout;
use tracing::debug;

use super::{
    CapabilityProvider, EncryptionConfig, EncryptionRule, PublicAccessConfig, VersioningConfig,
    WebsiteConfig,
};
use crate::config::{
    DISCOVERY_TIMEOUT, NO_ENCRYPTION_CONFIGURATION, NO_PUBLIC_ACCESS_BLOCK,
    NO_WEBSITE_CONFIGURATION, QUERY_TIMEOUT,
};

/// CapabilityProvider backed by the AWS S3 API
#[derive(Clone)]
pub struct S3Provider {
    s3_client: S3Client,
}

impl S3Provider {
    /// Create a new S3Provider from a loaded AWS configuration
    pub fn new(aws_config: &SdkConfig) -> Self {
        Self {
            s3_client: S3Client::new(aws_config),
        }
    }
}

/// Whether an SDK error is the service telling us the facet is not configured
fn is_not_configured<E, R>(err: &SdkError<E, R>, code: &str) -> bool
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|e| e.code()) == Some(code)
}

#[async_trait]
impl CapabilityProvider for S3Provider {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let output = timeout(DISCOVERY_TIMEOUT, self.s3_client.list_buckets().send())
            .await
            .context("Timed out listing buckets")?
            .context("Failed to list buckets")?;

        let buckets: Vec<String> = output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect();

        debug!("ListBuckets returned {} buckets", buckets.len());
        Ok(buckets)
    }

    async fn public_access_config(&self, bucket: &str) -> Result<Option<PublicAccessConfig>> {
        let response = timeout(
            QUERY_TIMEOUT,
            self.s3_client.get_public_access_block().bucket(bucket).send(),
        )
        .await
        .with_context(|| format!("Timed out reading public access block of '{bucket}'"))?;

        match response {
            Ok(output) => Ok(output
                .public_access_block_configuration()
                .map(|config| PublicAccessConfig {
                    block_public_acls: config.block_public_acls(),
                    ignore_public_acls: config.ignore_public_acls(),
                    block_public_policy: config.block_public_policy(),
                    restrict_public_buckets: config.restrict_public_buckets(),
                })),
            Err(err) if is_not_configured(&err, NO_PUBLIC_ACCESS_BLOCK) => Ok(None),
            Err(err) => Err(err).context("Failed to get public access block"),
        }
    }

    async fn encryption_config(&self, bucket: &str) -> Result<Option<EncryptionConfig>> {
        let response = timeout(
            QUERY_TIMEOUT,
            self.s3_client.get_bucket_encryption().bucket(bucket).send(),
        )
        .await
        .with_context(|| format!("Timed out reading encryption configuration of '{bucket}'"))?;

        match response {
            Ok(output) => Ok(output
                .server_side_encryption_configuration()
                .map(|config| EncryptionConfig {
                    rules: config
                        .rules()
                        .iter()
                        .map(|rule| {
                            let by_default = rule.apply_server_side_encryption_by_default();
                            EncryptionRule {
                                default_algorithm: by_default
                                    .map(|d| d.sse_algorithm().as_str().to_string()),
                                kms_master_key_id: by_default
                                    .and_then(|d| d.kms_master_key_id())
                                    .map(str::to_string),
                                bucket_key_enabled: rule.bucket_key_enabled(),
                            }
                        })
                        .collect(),
                })),
            Err(err) if is_not_configured(&err, NO_ENCRYPTION_CONFIGURATION) => Ok(None),
            Err(err) => Err(err).context("Failed to get bucket encryption"),
        }
    }

    async fn versioning_config(&self, bucket: &str) -> Result<Option<VersioningConfig>> {
        let output = timeout(
            QUERY_TIMEOUT,
            self.s3_client.get_bucket_versioning().bucket(bucket).send(),
        )
        .await
        .with_context(|| format!("Timed out reading versioning configuration of '{bucket}'"))?
        .context("Failed to get bucket versioning")?;

        // S3 omits both fields for buckets that never had versioning turned on
        if output.status().is_none() && output.mfa_delete().is_none() {
            return Ok(None);
        }

        Ok(Some(VersioningConfig {
            status: output.status().map(|s| s.as_str().to_string()),
            mfa_delete: output.mfa_delete().map(|m| m.as_str().to_string()),
        }))
    }

    async fn website_config(&self, bucket: &str) -> Result<Option<WebsiteConfig>> {
        let response = timeout(
            QUERY_TIMEOUT,
            self.s3_client.get_bucket_website().bucket(bucket).send(),
        )
        .await
        .with_context(|| format!("Timed out reading website configuration of '{bucket}'"))?;

        match response {
            Ok(output) => Ok(Some(WebsiteConfig {
                index_document: output.index_document().map(|d| d.suffix().to_string()),
                error_document: output.error_document().map(|d| d.key().to_string()),
                redirect_host: output
                    .redirect_all_requests_to()
                    .map(|r| r.host_name().to_string()),
                routing_rule_count: output.routing_rules().len(),
            })),
            Err(err) if is_not_configured(&err, NO_WEBSITE_CONFIGURATION) => Ok(None),
            Err(err) => Err(err).context("Failed to get bucket website"),
        }
    }
}
