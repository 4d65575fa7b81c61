use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::node::{ConcurrencyMode, TaskNode, Work};
use super::outcome::{Outcome, Status};
use crate::telemetry::TelemetryEvent;

/// A task node after execution, with exactly one Outcome per node
///
/// Has the same shape as the TaskNode it was produced from.
#[derive(Debug, Clone)]
pub struct CompletedNode {
    title: String,
    outcome: Outcome,
    children: Vec<CompletedNode>,
}

impl CompletedNode {
    fn new(title: &str, outcome: Outcome, children: Vec<CompletedNode>) -> Self {
        Self {
            title: title.to_string(),
            outcome,
            children,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn children(&self) -> &[CompletedNode] {
        &self.children
    }

    /// Leaf descendants in tree order (the node itself if it is a leaf)
    pub fn leaves(&self) -> Vec<&CompletedNode> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children.iter().flat_map(CompletedNode::leaves).collect()
    }
}

/// Runs task trees
///
/// The executor carries no mutable state, so concurrent `execute` calls on the
/// same or different trees never observe each other.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    telemetry_tx: Option<mpsc::UnboundedSender<TelemetryEvent>>,
}

impl Executor {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report leaf progress over the given channel
    pub fn with_telemetry(telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>) -> Self {
        Self {
            telemetry_tx: Some(telemetry_tx),
        }
    }

    /// Execute a tree and return its completed counterpart
    ///
    /// Once `cancel` is raised no new leaf is started; leaves already running
    /// finish normally and everything not yet started resolves to Skipped.
    pub async fn execute(&self, node: &TaskNode, cancel: &CancellationToken) -> CompletedNode {
        self.execute_node(node, cancel).await
    }

    fn execute_node<'a>(
        &'a self,
        node: &'a TaskNode,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CompletedNode> {
        async move {
            match node.work() {
                Some(work) => self.execute_leaf(node.title(), work, cancel).await,
                None => self.execute_composite(node, cancel).await,
            }
        }
        .boxed()
    }

    async fn execute_leaf(
        &self,
        title: &str,
        work: &Work,
        cancel: &CancellationToken,
    ) -> CompletedNode {
        if cancel.is_cancelled() {
            debug!("Skipping '{}': execution cancelled", title);
            self.emit_completed(Status::Skipped, 0);
            return CompletedNode::new(title, Outcome::skipped(), Vec::new());
        }

        self.emit(TelemetryEvent::CheckStarted);
        let started = Instant::now();

        // Each leaf runs as its own task so a panic stays inside this node
        let outcome = match tokio::spawn(work.start()).await {
            Ok(Ok(detail)) => Outcome::success(detail),
            Ok(Err(e)) => {
                debug!("'{}' failed: {:#}", title, e);
                Outcome::failure(format!("{e:#}"))
            }
            Err(e) => {
                warn!("'{}' panicked: {}", title, e);
                Outcome::failure(format!("check panicked: {e}"))
            }
        };

        self.emit_completed(outcome.status(), started.elapsed().as_millis() as u64);
        CompletedNode::new(title, outcome, Vec::new())
    }

    async fn execute_composite(&self, node: &TaskNode, cancel: &CancellationToken) -> CompletedNode {
        if cancel.is_cancelled() {
            debug!("Skipping '{}': execution cancelled", node.title());
            return self.skip_subtree(node);
        }

        // Scoped token so that a failing child can stop its own siblings
        // without touching the rest of the tree
        let scope = cancel.child_token();

        let children = match node.mode() {
            ConcurrencyMode::Concurrent => {
                join_all(
                    node.children()
                        .iter()
                        .map(|child| self.execute_child(node, child, &scope)),
                )
                .await
            }
            ConcurrencyMode::Sequential => {
                let mut completed = Vec::with_capacity(node.children().len());
                for child in node.children() {
                    completed.push(self.execute_child(node, child, &scope).await);
                }
                completed
            }
        };

        let outcome = derive_outcome(&children);
        CompletedNode::new(node.title(), outcome, children)
    }

    async fn execute_child(
        &self,
        parent: &TaskNode,
        child: &TaskNode,
        scope: &CancellationToken,
    ) -> CompletedNode {
        let completed = self.execute_node(child, scope).await;
        if completed.outcome().is_failure() && !parent.continue_on_child_failure() {
            debug!(
                "'{}' failed, skipping remaining work under '{}'",
                child.title(),
                parent.title()
            );
            scope.cancel();
        }
        completed
    }

    fn skip_subtree(&self, node: &TaskNode) -> CompletedNode {
        if node.is_leaf() {
            self.emit_completed(Status::Skipped, 0);
        }
        let children = node
            .children()
            .iter()
            .map(|child| self.skip_subtree(child))
            .collect();
        CompletedNode::new(node.title(), Outcome::skipped(), children)
    }

    fn emit_completed(&self, status: Status, duration_ms: u64) {
        self.emit(TelemetryEvent::CheckCompleted {
            status,
            duration_ms,
        });
    }

    fn emit(&self, event: TelemetryEvent) {
        if let Some(tx) = &self.telemetry_tx {
            let _ = tx.send(event);
        }
    }
}

/// Outcome of a composite node from its children's outcomes
///
/// Success needs every child to have succeeded. Any failure wins; otherwise
/// a composite with children that never ran is Skipped, even if the rest
/// passed.
fn derive_outcome(children: &[CompletedNode]) -> Outcome {
    let failed: Vec<&str> = children
        .iter()
        .filter(|c| c.outcome().is_failure())
        .map(CompletedNode::title)
        .collect();

    if !failed.is_empty() {
        return Outcome::failure(format!(
            "{} of {} failed: {}",
            failed.len(),
            children.len(),
            failed.join(", ")
        ));
    }

    let skipped = children
        .iter()
        .filter(|c| c.outcome().status() == Status::Skipped)
        .count();

    if skipped == children.len() {
        Outcome::skipped()
    } else if skipped > 0 {
        Outcome::skipped_because(format!("{} of {} skipped", skipped, children.len()))
    } else {
        Outcome::success(None)
    }
}
