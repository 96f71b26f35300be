//! Conversational travel agent
//!
//! ## Architecture
//!
//! - `domain/` - Core types (Message, Conversation, ToolCall, ThreadCheckpoint)
//! - `llm/` - LLM provider implementations
//! - `adapter` - Tool-capable model access with a text-only fallback
//! - `core/` - Tool executor, finalizer and the orchestration loop
//! - `memory/` - Checkpoint persistence backends
//! - `events` - Progress notifications for presentation layers

pub mod adapter;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod events;
pub mod llm;
pub mod memory;
pub mod prompts;

// Re-export commonly used types
pub use adapter::ModelAdapter;
pub use self::config::*;
pub use self::core::{Envelope, Finalizer, LoopOptions, ToolExecutor, TravelAgent};
pub use domain::*;
pub use error::*;
pub use events::{AgentEvent, EventBus};
