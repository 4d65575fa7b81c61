//! Errors that escape the audit core
//!
//! Everything that goes wrong inside a single check is converted into a
//! Failure outcome at the leaf. Only the conditions below reach the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    /// The bucket list could not be retrieved at all
    #[error("bucket discovery failed: {0:#}")]
    DiscoveryFailed(anyhow::Error),

    /// A task tree was built with both work and children, or with neither
    #[error("invalid task definition '{0}': a node needs exactly one of work or children")]
    InvalidTaskDefinition(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;
