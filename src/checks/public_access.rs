use async_trait::async_trait;

use super::{Check, CheckFailure, CheckResult};
use crate::provider::{CapabilityProvider, Facet, PublicAccessConfig};

/// One of the four public access block flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicAccessSetting {
    BlockPublicAcls,
    IgnorePublicAcls,
    BlockPublicPolicy,
    RestrictPublicBuckets,
}

impl PublicAccessSetting {
    pub fn name(self) -> &'static str {
        match self {
            PublicAccessSetting::BlockPublicAcls => "BlockPublicAcls",
            PublicAccessSetting::IgnorePublicAcls => "IgnorePublicAcls",
            PublicAccessSetting::BlockPublicPolicy => "BlockPublicPolicy",
            PublicAccessSetting::RestrictPublicBuckets => "RestrictPublicBuckets",
        }
    }

    fn value(self, config: &PublicAccessConfig) -> Option<bool> {
        match self {
            PublicAccessSetting::BlockPublicAcls => config.block_public_acls,
            PublicAccessSetting::IgnorePublicAcls => config.ignore_public_acls,
            PublicAccessSetting::BlockPublicPolicy => config.block_public_policy,
            PublicAccessSetting::RestrictPublicBuckets => config.restrict_public_buckets,
        }
    }
}

/// Passes when the given public access block flag is explicitly `true`
#[derive(Debug, Clone, Copy)]
pub struct PublicAccessCheck {
    setting: PublicAccessSetting,
}

impl PublicAccessCheck {
    pub fn new(setting: PublicAccessSetting) -> Self {
        Self { setting }
    }
}

#[async_trait]
impl Check for PublicAccessCheck {
    fn name(&self) -> &'static str {
        self.setting.name()
    }

    async fn run(&self, bucket: &str, provider: &dyn CapabilityProvider) -> CheckResult {
        let config = provider
            .public_access_config(bucket)
            .await
            .map_err(CheckFailure::query(Facet::PublicAccess))?
            .ok_or(CheckFailure::ConfigurationAbsent(Facet::PublicAccess))?;

        match self.setting.value(&config) {
            Some(true) => Ok(None),
            Some(false) => Err(CheckFailure::PolicyViolation(format!(
                "{} is disabled",
                self.setting.name()
            ))),
            None => Err(CheckFailure::PolicyViolation(format!(
                "{} is not set",
                self.setting.name()
            ))),
        }
    }
}
