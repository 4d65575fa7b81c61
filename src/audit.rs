//! Audit orchestration: discover buckets, build the task tree, run it, report

use std::collections::HashSet;
use std::sync::Arc;

use derive_builder::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::checks::{Check, all_checks};
use crate::error::{AuditError, Result};
use crate::provider::{CapabilityProvider, SharedBucketProvider};
use crate::report::Report;
use crate::tasks::{ConcurrencyMode, Executor, TaskNode, Work};

const AUDIT_ROOT_TITLE: &str = "S3 bucket audit";

/// Options for a single audit run
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct AuditOptions {
    /// Restrict the audit to these buckets; empty means every discovered bucket
    #[builder(setter(into))]
    pub bucket_filter: Vec<String>,
    /// Run the checks of each bucket one at a time instead of all at once
    pub sequential_checks: bool,
}

/// Run a complete audit against the given provider
///
/// Fails only when buckets cannot be discovered or the tree cannot be built;
/// every per-check problem ends up as a Failure entry in the report.
pub async fn run_audit(
    provider: Arc<dyn CapabilityProvider>,
    options: &AuditOptions,
    executor: &Executor,
    cancel: &CancellationToken,
) -> Result<Report> {
    let Discovery { buckets, missing } = discover_buckets(provider.as_ref(), options).await?;
    if buckets.is_empty() {
        info!("No buckets to audit");
        return Ok(Report::default().with_missing_buckets(missing));
    }

    let checks = all_checks();
    let check_mode = if options.sequential_checks {
        ConcurrencyMode::Sequential
    } else {
        ConcurrencyMode::Concurrent
    };
    let tree = build_audit_tree(&buckets, &provider, &checks, check_mode)?;

    info!(
        "Auditing {} buckets with {} checks each",
        buckets.len(),
        checks.len()
    );
    let completed = executor.execute(&tree, cancel).await;

    let report = Report::aggregate(&completed).with_missing_buckets(missing);
    let summary = report.summary();
    info!(
        "Audit complete: {} buckets, {} passed, {} failed, {} skipped",
        summary.buckets, summary.passed, summary.failed, summary.skipped
    );

    Ok(report)
}

struct Discovery {
    buckets: Vec<String>,
    /// Filter entries that matched no discovered bucket
    missing: Vec<String>,
}

/// List buckets, apply the filter and drop duplicates while keeping order
async fn discover_buckets(
    provider: &dyn CapabilityProvider,
    options: &AuditOptions,
) -> Result<Discovery> {
    let discovered = provider
        .list_buckets()
        .await
        .map_err(AuditError::DiscoveryFailed)?;
    info!("Discovered {} buckets", discovered.len());

    let mut missing = Vec::new();
    for requested in &options.bucket_filter {
        if !discovered.contains(requested) && !missing.contains(requested) {
            warn!("Bucket '{}' was not found and will not be audited", requested);
            missing.push(requested.clone());
        }
    }

    let mut seen = HashSet::new();
    let buckets = discovered
        .into_iter()
        .filter(|bucket| options.bucket_filter.is_empty() || options.bucket_filter.contains(bucket))
        .filter(|bucket| seen.insert(bucket.clone()))
        .collect();

    Ok(Discovery { buckets, missing })
}

/// Root (concurrent across buckets) → one node per bucket → one leaf per check
///
/// The checks of a bucket share one provider view, so facets read by several
/// checks are fetched once per tree.
pub fn build_audit_tree(
    buckets: &[String],
    provider: &Arc<dyn CapabilityProvider>,
    checks: &[Arc<dyn Check>],
    check_mode: ConcurrencyMode,
) -> Result<TaskNode> {
    let bucket_nodes = buckets
        .iter()
        .map(|bucket| {
            let shared: Arc<dyn CapabilityProvider> =
                Arc::new(SharedBucketProvider::new(bucket.clone(), Arc::clone(provider)));
            let leaves = checks
                .iter()
                .map(|check| check_leaf(bucket, check, &shared))
                .collect();
            TaskNode::composite(bucket.clone(), check_mode, leaves)
        })
        .collect::<Result<Vec<_>>>()?;

    TaskNode::composite(AUDIT_ROOT_TITLE, ConcurrencyMode::Concurrent, bucket_nodes)
}

fn check_leaf(
    bucket: &str,
    check: &Arc<dyn Check>,
    provider: &Arc<dyn CapabilityProvider>,
) -> TaskNode {
    let title = check.name();
    let bucket = bucket.to_string();
    let check = Arc::clone(check);
    let provider = Arc::clone(provider);

    TaskNode::leaf(
        title,
        Work::new(move || {
            let bucket = bucket.clone();
            let check = Arc::clone(&check);
            let provider = Arc::clone(&provider);
            async move {
                check
                    .run(&bucket, provider.as_ref())
                    .await
                    .map_err(anyhow::Error::from)
            }
        }),
    )
}
