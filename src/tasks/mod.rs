//! Hierarchical task tree and its concurrent executor

pub mod executor;
pub mod node;
pub mod outcome;

pub use executor::{CompletedNode, Executor};
pub use node::{ConcurrencyMode, TaskNode, Work};
pub use outcome::Status;
