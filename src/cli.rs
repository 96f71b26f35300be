use clap::Parser;
use std::path::PathBuf;

use crate::agents::config::LlmProviderType;

/// Wayfarer - conversational travel planner with flight, hotel and itinerary tools
#[derive(Parser, Debug, Clone)]
#[command(name = "wayfarer", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "WAYFARER_CONFIG", default_value = "wayfarer.toml")]
    pub config: PathBuf,

    /// Conversation thread to open or continue (a fresh id when omitted)
    #[arg(short, long, env = "WAYFARER_THREAD")]
    pub thread: Option<String>,

    /// LLM provider (gemini, ollama, openai)
    #[arg(long)]
    pub provider: Option<LlmProviderType>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Pass the finalization gate without asking
    #[arg(long)]
    pub auto_approve: bool,

    /// Log the final document instead of emailing it
    #[arg(long)]
    pub no_email: bool,
}

impl Cli {
    pub fn thread_id(&self) -> String {
        self.thread
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}
