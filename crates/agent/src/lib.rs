//! The repokeep agents and the loop machinery they share.
//!
//! `AgentLoop` drives the model-invoke / tool-dispatch cycle under a step
//! budget. `OutputNormalizer` turns whatever the model's final message
//! looks like into a well-formed report. `DepsAgent` and `LintAgent` wire
//! those pieces to their tool registries, prompts, and report files.

pub mod deps;
pub mod lint;
pub mod loop_runner;
pub mod normalize;
pub mod test_helpers;

pub use deps::{DepsAgent, DepsOutcome, DepsSettings};
pub use lint::{LintAgent, LintOutcome, LintSettings};
pub use loop_runner::AgentLoop;
pub use normalize::OutputNormalizer;
