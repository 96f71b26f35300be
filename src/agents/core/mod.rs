//! Core agent loop
//!
//! - `ToolExecutor`: runs one batch of tool calls
//! - `Finalizer`: turns the approved answer into a delivered document
//! - `TravelAgent`: the conversational state machine tying them together

mod executor;
mod finalizer;
mod orchestrator;

pub use executor::ToolExecutor;
pub use finalizer::{strip_code_fence, Envelope, Finalizer};
pub use orchestrator::{LoopOptions, TravelAgent};
