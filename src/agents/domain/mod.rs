//! Domain types for the travel agent
//!
//! Conversation history, tool invocation records, thread checkpoints and round outcomes.

mod message;
mod response;
mod thread;
mod tool_call;

pub use message::*;
pub use response::*;
pub use thread::*;
pub use tool_call::*;
