//! High-level runner API for the bucket auditor.
//!
//! This module wraps the internal pieces (AWS configuration, the S3 provider,
//! the executor, progress display and Ctrl-C handling) behind a single call.
//!
//! This is the primary API for external users and for the CLI.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditOptionsBuilder, run_audit};
use crate::provider::{CapabilityProvider, S3Provider};
use crate::tasks::Executor;
use crate::telemetry::{ProgressStats, TelemetryEvent};

use crate::config::FORCE_QUIT_EXIT_CODE;
pub use crate::config::{LOG_FILTER, QUIET_LOG_FILTER};
pub use crate::error::AuditError;
pub use crate::report::{CheckEntry, Report, ReportSummary};
pub use crate::tasks::Status;

/// Arguments for running an audit
#[derive(Debug, Clone, Default)]
pub struct AuditArgs {
    // AWS configuration
    pub region: Option<String>,
    pub profile: Option<String>,

    // Scope
    pub buckets: Vec<String>,
    pub sequential_checks: bool,

    // Output
    pub quiet: bool,
}

/// Result of a completed audit run
#[derive(Debug, Serialize)]
pub struct AuditResult {
    pub run_id: String,
    pub started_at: String,
    pub duration_secs: f64,
    /// True when the run was interrupted and some checks were skipped
    pub cancelled: bool,
    pub summary: ReportSummary,
    #[serde(flatten)]
    pub report: Report,
}

impl AuditResult {
    /// Every requested bucket was audited in full and no check failed
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.report.is_clean()
    }
}

/// Run an audit of every bucket visible to the default AWS credentials
///
/// # Example
///
/// ```no_run
/// use s3_audit::runner::{AuditArgs, run};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = AuditArgs {
///     region: Some("us-east-1".to_string()),
///     quiet: true,
///     ..Default::default()
/// };
///
/// let result = run(args).await?;
/// println!("{} failing checks", result.summary.failed);
/// # Ok(())
/// # }
/// ```
pub async fn run(args: AuditArgs) -> Result<AuditResult> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &args.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &args.profile {
        loader = loader.profile_name(profile);
    }
    let aws_config = loader.load().await;

    let provider: Arc<dyn CapabilityProvider> = Arc::new(S3Provider::new(&aws_config));
    run_with_provider(provider, &args).await
}

/// Run an audit against any capability provider
pub async fn run_with_provider(
    provider: Arc<dyn CapabilityProvider>,
    args: &AuditArgs,
) -> Result<AuditResult> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now().to_rfc3339();
    let start_time = Instant::now();
    info!("Starting audit run: {}", run_id);

    let options = AuditOptionsBuilder::default()
        .bucket_filter(args.buckets.clone())
        .sequential_checks(args.sequential_checks)
        .build()?;

    // First Ctrl-C stops new checks from starting; a second one exits at once
    let cancel = CancellationToken::new();
    let signal_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if watch_interrupts(cancel, || async { tokio::signal::ctrl_c().await.is_ok() }).await
            {
                std::process::exit(FORCE_QUIT_EXIT_CODE);
            }
        })
    };

    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel::<TelemetryEvent>();
    let executor = Executor::with_telemetry(telemetry_tx);
    let prog_jh = setup_progress_tracking(args.quiet, telemetry_rx);

    let result = run_audit(provider, &options, &executor, &cancel).await;

    // Dropping the executor closes the telemetry channel so the progress task ends
    drop(executor);
    if let Some(jh) = prog_jh {
        let _ = jh.await;
    }
    signal_task.abort();

    let report = result?;
    let duration = start_time.elapsed();

    Ok(AuditResult {
        run_id,
        started_at,
        duration_secs: duration.as_secs_f64(),
        cancelled: cancel.is_cancelled(),
        summary: report.summary(),
        report,
    })
}

/// Cancel on the first interrupt, then wait for a second one
///
/// Returns true when a second interrupt arrived and the caller should stop
/// without waiting for in-flight checks. `next_interrupt` resolves to false
/// when no further interrupts can be delivered.
async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut next_interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !next_interrupt().await {
        return false;
    }
    warn!("Interrupted, waiting for running checks to finish (Ctrl-C again to quit)");
    cancel.cancel();

    if !next_interrupt().await {
        return false;
    }
    warn!("Interrupted again, exiting without waiting");
    true
}

/// Setup a progress spinner fed by executor telemetry
fn setup_progress_tracking(
    quiet: bool,
    mut telemetry_rx: mpsc::UnboundedReceiver<TelemetryEvent>,
) -> Option<tokio::task::JoinHandle<()>> {
    if quiet {
        return None;
    }

    let checks_bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("[{elapsed_precise}] {spinner} Checks: {pos} | {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    checks_bar.set_style(style);

    Some(tokio::spawn(async move {
        let mut stats = ProgressStats::new();

        while let Some(event) = telemetry_rx.recv().await {
            stats.update(&event);

            checks_bar.set_position(stats.checks_completed as u64);
            checks_bar.set_message(progress_message(&stats));
        }

        checks_bar.finish_with_message(progress_message(&stats));
    }))
}

fn progress_message(stats: &ProgressStats) -> String {
    let mut message = format!(
        "{} passed, {} failed, {} skipped",
        stats.checks_passed, stats.checks_failed, stats.checks_skipped
    );
    if let (Some(p50), Some(p90), Some(p99)) = stats.get_percentiles() {
        message.push_str(&format!(" | p50: {}ms, p90: {}ms, p99: {}ms", p50, p90, p99));
    }
    message
}
