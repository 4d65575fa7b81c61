//! Audit report built from a completed task tree

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::tasks::{CompletedNode, Status};

/// Result of one check against one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    pub check: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckEntry {
    fn from_leaf(leaf: &CompletedNode) -> Self {
        Self {
            check: leaf.title().to_string(),
            status: leaf.outcome().status(),
            detail: leaf.outcome().detail().map(str::to_string),
        }
    }
}

/// Check counts across the whole report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub buckets: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Per-bucket check results, keyed by bucket name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub buckets: BTreeMap<String, Vec<CheckEntry>>,
    /// Requested buckets that were not found, so never audited
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_buckets: Vec<String>,
}

impl Report {
    /// Build a report from a completed audit tree
    ///
    /// Each child of the root is a bucket; every leaf below it becomes one
    /// entry, in tree order. Nothing is executed here.
    pub fn aggregate(root: &CompletedNode) -> Self {
        let buckets = root
            .children()
            .iter()
            .map(|bucket| {
                let entries = bucket
                    .leaves()
                    .into_iter()
                    .map(CheckEntry::from_leaf)
                    .collect();
                (bucket.title().to_string(), entries)
            })
            .collect();

        Self {
            buckets,
            missing_buckets: Vec::new(),
        }
    }

    pub fn with_missing_buckets(mut self, missing_buckets: Vec<String>) -> Self {
        self.missing_buckets = missing_buckets;
        self
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn bucket(&self, name: &str) -> Option<&[CheckEntry]> {
        self.buckets.get(name).map(Vec::as_slice)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            buckets: self.buckets.len(),
            ..Default::default()
        };

        for entry in self.buckets.values().flatten() {
            match entry.status {
                Status::Success => summary.passed += 1,
                Status::Failure => summary.failed += 1,
                Status::Skipped => summary.skipped += 1,
            }
        }

        summary
    }

    /// Names of failing checks per bucket; buckets with no failures are left out
    pub fn failing_checks(&self) -> BTreeMap<&str, Vec<&str>> {
        self.buckets
            .iter()
            .filter_map(|(bucket, entries)| {
                let failing: Vec<&str> = entries
                    .iter()
                    .filter(|e| e.status == Status::Failure)
                    .map(|e| e.check.as_str())
                    .collect();
                (!failing.is_empty()).then_some((bucket.as_str(), failing))
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.buckets
            .values()
            .flatten()
            .any(|e| e.status == Status::Failure)
    }

    /// No failing check and every requested bucket was audited
    pub fn is_clean(&self) -> bool {
        !self.has_failures() && self.missing_buckets.is_empty()
    }

    /// Plain text rendering, one block per bucket
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for (bucket, entries) in &self.buckets {
            let _ = writeln!(out, "{bucket}");
            for entry in entries {
                let marker = match entry.status {
                    Status::Success => "✔",
                    Status::Failure => "✖",
                    Status::Skipped => "↓",
                };
                match &entry.detail {
                    Some(detail) => {
                        let _ = writeln!(out, "  {marker} {}: {detail}", entry.check);
                    }
                    None => {
                        let _ = writeln!(out, "  {marker} {}", entry.check);
                    }
                }
            }
        }

        if !self.missing_buckets.is_empty() {
            let _ = writeln!(out, "Not found: {}", self.missing_buckets.join(", "));
        }

        let summary = self.summary();
        let _ = writeln!(
            out,
            "{} buckets: {} passed, {} failed, {} skipped",
            summary.buckets, summary.passed, summary.failed, summary.skipped
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{ConcurrencyMode, Executor, TaskNode, Work};
    use anyhow::anyhow;
    use tokio_util::sync::CancellationToken;

    fn leaf(title: &str, pass: bool) -> TaskNode {
        TaskNode::leaf(
            title,
            Work::new(move || async move {
                if pass {
                    Ok(None)
                } else {
                    Err(anyhow!("violated"))
                }
            }),
        )
    }

    async fn completed_tree() -> CompletedNode {
        let alpha = TaskNode::composite(
            "alpha",
            ConcurrencyMode::Concurrent,
            vec![leaf("One", true), leaf("Two", false)],
        )
        .unwrap();
        // Deeper nesting under a bucket is flattened into its entries
        let beta = TaskNode::composite(
            "beta",
            ConcurrencyMode::Sequential,
            vec![
                TaskNode::composite("group", ConcurrencyMode::Concurrent, vec![leaf("One", true)])
                    .unwrap(),
                leaf("Two", true),
            ],
        )
        .unwrap();
        let root =
            TaskNode::composite("root", ConcurrencyMode::Concurrent, vec![alpha, beta]).unwrap();

        Executor::new()
            .execute(&root, &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_aggregate_preserves_check_order() {
        let report = Report::aggregate(&completed_tree().await);

        assert_eq!(report.buckets.len(), 2);
        let alpha = report.bucket("alpha").unwrap();
        assert_eq!(
            alpha,
            &[
                CheckEntry {
                    check: "One".to_string(),
                    status: Status::Success,
                    detail: None,
                },
                CheckEntry {
                    check: "Two".to_string(),
                    status: Status::Failure,
                    detail: Some("violated".to_string()),
                },
            ]
        );
        let beta: Vec<_> = report.bucket("beta").unwrap().iter().map(|e| &e.check).collect();
        assert_eq!(beta, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_summary_and_failing_checks() {
        let report = Report::aggregate(&completed_tree().await);

        assert_eq!(
            report.summary(),
            ReportSummary {
                buckets: 2,
                passed: 3,
                failed: 1,
                skipped: 0,
            }
        );
        assert!(report.has_failures());

        let failing = report.failing_checks();
        assert_eq!(failing.len(), 1);
        assert_eq!(failing["alpha"], vec!["Two"]);
    }

    #[tokio::test]
    async fn test_render_and_serialize() {
        let report = Report::aggregate(&completed_tree().await);

        let text = report.render_text();
        assert!(text.contains("alpha\n  ✔ One\n  ✖ Two: violated\n"));
        assert!(text.ends_with("2 buckets: 3 passed, 1 failed, 0 skipped\n"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["buckets"]["alpha"][1]["status"], "failure");
        assert_eq!(json["buckets"]["alpha"][1]["detail"], "violated");
        assert!(json["buckets"]["alpha"][0].get("detail").is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = Report::default();
        assert!(!report.has_failures());
        assert!(report.is_clean());
        assert_eq!(report.summary(), ReportSummary::default());
        assert!(serde_json::to_value(&report).unwrap().get("missing_buckets").is_none());
    }

    #[test]
    fn test_missing_buckets_are_not_clean() {
        let report = Report::default().with_missing_buckets(vec!["typo".to_string()]);

        assert!(!report.has_failures());
        assert!(!report.is_clean());
        assert_eq!(
            report.render_text(),
            "Not found: typo\n0 buckets: 0 passed, 0 failed, 0 skipped\n"
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["missing_buckets"][0], "typo");
    }
}
