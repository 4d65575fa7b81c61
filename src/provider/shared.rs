//! Per-bucket view over a provider that fetches the public access block once

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{
    CapabilityProvider, EncryptionConfig, PublicAccessConfig, VersioningConfig, WebsiteConfig,
};

/// Wraps a provider for the checks of a single bucket
///
/// The four public access checks read the same block. The first of them to
/// ask triggers the query; the others wait for and reuse that answer, so all
/// four judge the same snapshot. Other facets are passed straight through.
pub struct SharedBucketProvider {
    bucket: String,
    inner: Arc<dyn CapabilityProvider>,
    // anyhow::Error is not Clone, so a failed query is kept as its rendered chain
    public_access: OnceCell<std::result::Result<Option<PublicAccessConfig>, String>>,
}

impl SharedBucketProvider {
    pub fn new(bucket: impl Into<String>, inner: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            bucket: bucket.into(),
            inner,
            public_access: OnceCell::new(),
        }
    }
}

#[async_trait]
impl CapabilityProvider for SharedBucketProvider {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.inner.list_buckets().await
    }

    async fn public_access_config(&self, bucket: &str) -> Result<Option<PublicAccessConfig>> {
        if bucket != self.bucket {
            return self.inner.public_access_config(bucket).await;
        }

        let cached = self
            .public_access
            .get_or_init(|| async {
                self.inner
                    .public_access_config(bucket)
                    .await
                    .map_err(|e| format!("{e:#}"))
            })
            .await;

        cached.clone().map_err(|message| anyhow!(message))
    }

    async fn encryption_config(&self, bucket: &str) -> Result<Option<EncryptionConfig>> {
        self.inner.encryption_config(bucket).await
    }

    async fn versioning_config(&self, bucket: &str) -> Result<Option<VersioningConfig>> {
        self.inner.versioning_config(bucket).await
    }

    async fn website_config(&self, bucket: &str) -> Result<Option<WebsiteConfig>> {
        self.inner.website_config(bucket).await
    }
}
