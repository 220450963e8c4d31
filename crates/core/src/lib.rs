//! # repokeep Core
//!
//! Domain types, traits, and error definitions for the repokeep maintenance
//! agents. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every boundary is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the LLM backend via configuration
//! - Easy testing with scripted stand-ins
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod report;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, ProviderError, Result, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use report::Report;
pub use tool::{Tool, ToolCall, ToolOutput, ToolRegistry};
pub use trace::{Trace, TraceSink};
