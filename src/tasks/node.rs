use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{AuditError, Result};

/// Future produced by leaf work: an optional success message, or the error that
/// makes the leaf fail
pub type WorkFuture = BoxFuture<'static, anyhow::Result<Option<String>>>;

/// Reusable unit of leaf work
///
/// Work is a factory rather than a one-shot future so that the same tree can be
/// executed more than once.
#[derive(Clone)]
pub struct Work(Arc<dyn Fn() -> WorkFuture + Send + Sync>);

impl Work {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    pub(crate) fn start(&self) -> WorkFuture {
        (self.0)()
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Work(..)")
    }
}

/// How a composite node runs its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Start every child at once and wait for all of them
    Concurrent,
    /// Run children one at a time, in listed order
    Sequential,
}

#[derive(Debug)]
enum NodeBody {
    Leaf(Work),
    Composite(Vec<TaskNode>),
}

/// A node of the task tree: either a leaf carrying work or a composite
/// carrying children
#[derive(Debug)]
pub struct TaskNode {
    title: String,
    mode: ConcurrencyMode,
    continue_on_child_failure: bool,
    body: NodeBody,
}

impl TaskNode {
    /// Build a node from either work or a non-empty list of children
    ///
    /// Supplying both, or neither, is a programming error and is rejected with
    /// `AuditError::InvalidTaskDefinition`.
    pub fn build(
        title: impl Into<String>,
        mode: ConcurrencyMode,
        children: Vec<TaskNode>,
        work: Option<Work>,
    ) -> Result<Self> {
        let title = title.into();
        let body = match (work, children.is_empty()) {
            (Some(work), true) => NodeBody::Leaf(work),
            (None, false) => NodeBody::Composite(children),
            _ => return Err(AuditError::InvalidTaskDefinition(title)),
        };

        Ok(Self {
            title,
            mode,
            continue_on_child_failure: true,
            body,
        })
    }

    pub fn leaf(title: impl Into<String>, work: Work) -> Self {
        Self {
            title: title.into(),
            mode: ConcurrencyMode::Sequential,
            continue_on_child_failure: true,
            body: NodeBody::Leaf(work),
        }
    }

    pub fn composite(
        title: impl Into<String>,
        mode: ConcurrencyMode,
        children: Vec<TaskNode>,
    ) -> Result<Self> {
        Self::build(title, mode, children, None)
    }

    /// When false, the first failing child causes the remaining unstarted
    /// work under this node to be skipped
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_continue_on_child_failure(mut self, continue_on_child_failure: bool) -> Self {
        self.continue_on_child_failure = continue_on_child_failure;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    pub fn continue_on_child_failure(&self) -> bool {
        self.continue_on_child_failure
    }

    pub fn work(&self) -> Option<&Work> {
        match &self.body {
            NodeBody::Leaf(work) => Some(work),
            NodeBody::Composite(_) => None,
        }
    }

    pub fn children(&self) -> &[TaskNode] {
        match &self.body {
            NodeBody::Leaf(_) => &[],
            NodeBody::Composite(children) => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf(_))
    }

    /// Number of leaves in this subtree
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn leaf_count(&self) -> usize {
        match &self.body {
            NodeBody::Leaf(_) => 1,
            NodeBody::Composite(children) => children.iter().map(TaskNode::leaf_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Work {
        Work::new(|| async { Ok(None) })
    }

    #[test]
    fn test_build_rejects_work_with_children() {
        let child = TaskNode::leaf("child", noop());
        let err = TaskNode::build("both", ConcurrencyMode::Concurrent, vec![child], Some(noop()))
            .unwrap_err();
        assert!(matches!(err, AuditError::InvalidTaskDefinition(ref t) if t == "both"));
    }

    #[test]
    fn test_build_rejects_empty_node() {
        let err = TaskNode::build("neither", ConcurrencyMode::Sequential, vec![], None).unwrap_err();
        assert!(matches!(err, AuditError::InvalidTaskDefinition(_)));

        assert!(TaskNode::composite("empty", ConcurrencyMode::Concurrent, vec![]).is_err());
    }

    #[test]
    fn test_leaf_and_composite_shape() {
        let leaf = TaskNode::build("leaf", ConcurrencyMode::Concurrent, vec![], Some(noop())).unwrap();
        assert!(leaf.is_leaf());
        assert!(leaf.children().is_empty());
        assert!(leaf.continue_on_child_failure());

        let composite =
            TaskNode::composite("group", ConcurrencyMode::Sequential, vec![leaf]).unwrap();
        assert!(!composite.is_leaf());
        assert!(composite.work().is_none());
        assert_eq!(composite.mode(), ConcurrencyMode::Sequential);
        assert_eq!(composite.children().len(), 1);
    }

    #[test]
    fn test_leaf_count_at_arbitrary_depth() {
        let mut node = TaskNode::leaf("bottom", noop());
        for depth in 0..5 {
            node = TaskNode::composite(
                format!("level-{depth}"),
                ConcurrencyMode::Concurrent,
                vec![node, TaskNode::leaf(format!("side-{depth}"), noop())],
            )
            .unwrap();
        }
        assert_eq!(node.leaf_count(), 6);
    }
}
