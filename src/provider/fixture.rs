//! In-memory CapabilityProvider for tests

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{
    CapabilityProvider, EncryptionConfig, PublicAccessConfig, VersioningConfig, WebsiteConfig,
};

/// What a single facet query should return
#[derive(Debug, Clone)]
pub enum Lookup<T> {
    Configured(T),
    Absent,
    Error(&'static str),
}

impl<T: Clone> Lookup<T> {
    fn resolve(&self) -> Result<Option<T>> {
        match self {
            Lookup::Configured(value) => Ok(Some(value.clone())),
            Lookup::Absent => Ok(None),
            Lookup::Error(message) => Err(anyhow!("{message}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BucketFixture {
    pub public_access: Lookup<PublicAccessConfig>,
    pub encryption: Lookup<EncryptionConfig>,
    pub versioning: Lookup<VersioningConfig>,
    pub website: Lookup<WebsiteConfig>,
}

impl BucketFixture {
    /// A bucket that passes every policy
    pub fn compliant() -> Self {
        Self {
            public_access: Lookup::Configured(PublicAccessConfig::fully_blocked()),
            encryption: Lookup::Configured(EncryptionConfig::with_algorithm("AES256")),
            versioning: Lookup::Configured(VersioningConfig::with_status("Enabled")),
            website: Lookup::Absent,
        }
    }

    /// A bucket where every query errors
    pub fn unreachable() -> Self {
        Self {
            public_access: Lookup::Error("access denied"),
            encryption: Lookup::Error("access denied"),
            versioning: Lookup::Error("access denied"),
            website: Lookup::Error("access denied"),
        }
    }
}

#[derive(Default)]
pub struct FixtureProvider {
    buckets: Vec<(String, BucketFixture)>,
    discovery_error: Option<&'static str>,
    calls: AtomicUsize,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, name: &str, fixture: BucketFixture) -> Self {
        self.buckets.push((name.to_string(), fixture));
        self
    }

    pub fn with_discovery_error(mut self, message: &'static str) -> Self {
        self.discovery_error = Some(message);
        self
    }

    /// Number of per-bucket configuration queries served so far
    pub fn facet_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, name: &str) -> Result<&BucketFixture> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.buckets
            .iter()
            .find(|(bucket, _)| bucket == name)
            .map(|(_, fixture)| fixture)
            .ok_or_else(|| anyhow!("NoSuchBucket: {name}"))
    }
}

#[async_trait]
impl CapabilityProvider for FixtureProvider {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        if let Some(message) = self.discovery_error {
            return Err(anyhow!("{message}"));
        }
        Ok(self.buckets.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn public_access_config(&self, bucket: &str) -> Result<Option<PublicAccessConfig>> {
        self.bucket(bucket)?.public_access.resolve()
    }

    async fn encryption_config(&self, bucket: &str) -> Result<Option<EncryptionConfig>> {
        self.bucket(bucket)?.encryption.resolve()
    }

    async fn versioning_config(&self, bucket: &str) -> Result<Option<VersioningConfig>> {
        self.bucket(bucket)?.versioning.resolve()
    }

    async fn website_config(&self, bucket: &str) -> Result<Option<WebsiteConfig>> {
        self.bucket(bucket)?.website.resolve()
    }
}
