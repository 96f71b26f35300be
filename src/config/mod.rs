use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::agents::config::{AgentConfig, LlmProviderConfig, MemoryConfig};
use crate::cli::Cli;

/// Prefix for `WAYFARER__SECTION__KEY` environment overrides
pub const ENV_PREFIX: &str = "WAYFARER";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmProviderConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// SerpAPI search settings shared by the flights and hotels tools
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Environment variable holding the SerpAPI key
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    /// Upper bound on entries returned by each search tool
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_search_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            language: default_language(),
            country: default_country(),
            currency: default_currency(),
            request_timeout_seconds: default_search_timeout(),
        }
    }
}

fn default_search_key_env() -> String {
    "SERPAPI_API_KEY".to_string()
}

fn default_search_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_language() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_search_timeout() -> u64 {
    30
}

/// Delivery envelope and SendGrid settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// When false, payloads are logged instead of sent
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_email_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: String::new(),
            to: String::new(),
            subject: default_subject(),
            api_key_env: default_email_key_env(),
            base_url: default_email_base_url(),
        }
    }
}

fn default_subject() -> String {
    "Your travel plan".to_string()
}

fn default_email_key_env() -> String {
    "SENDGRID_API_KEY".to_string()
}

fn default_email_base_url() -> String {
    "https://api.sendgrid.com".to_string()
}

impl Settings {
    /// Load settings for the binary: file, environment, legacy variables, then CLI flags
    pub fn load(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::layered(&cli.config, None)?;
        settings.apply_legacy_env(|key| std::env::var(key).ok());
        settings.apply_cli_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a settings file without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let settings = Self::layered(path.as_ref(), Some(HashMap::new()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults, then the optional TOML file, then `WAYFARER__SECTION__KEY` variables.
    ///
    /// `env` replaces the process environment when given.
    pub fn layered(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.llm.fill_default_model();
        Ok(settings)
    }

    /// Variables read by earlier releases of the tool, applied over file and prefixed env
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(from) = lookup("FROM_EMAIL") {
            self.email.from = from;
        }
        if let Some(to) = lookup("TO_EMAIL") {
            self.email.to = to;
        }
        if let Some(subject) = lookup("EMAIL_SUBJECT") {
            self.email.subject = subject;
        }
    }

    /// Apply CLI argument overrides to settings
    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(provider) = cli.provider {
            self.llm.switch_provider(provider);
        }
        if let Some(model) = &cli.model {
            self.llm.model = model.clone();
        }
        if cli.no_email {
            self.email.enabled = false;
        }
    }

    /// Run the validator and fold every violation into one error
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::{LlmProviderType, MemoryBackend};
    use clap::Parser;

    #[test]
    fn test_defaults_without_file() {
        let settings =
            Settings::layered(Path::new("does-not-exist.toml"), Some(HashMap::new())).unwrap();
        assert_eq!(settings.llm.provider, LlmProviderType::Gemini);
        assert_eq!(settings.search.max_results, 5);
        assert_eq!(settings.search.api_key_env, "SERPAPI_API_KEY");
        assert_eq!(settings.email.base_url, "https://api.sendgrid.com");
        assert!(!settings.email.enabled);
        assert_eq!(settings.memory.backend, MemoryBackend::InMemory);
    }

    #[test]
    fn test_prefixed_env_overrides() {
        let env = HashMap::from([
            ("WAYFARER__LLM__MODEL".to_string(), "gemini-2.5-pro".to_string()),
            ("WAYFARER__AGENT__MAX_TOOL_ROUNDS".to_string(), "3".to_string()),
        ]);
        let settings = Settings::layered(Path::new("does-not-exist.toml"), Some(env)).unwrap();
        assert_eq!(settings.llm.model, "gemini-2.5-pro");
        assert_eq!(settings.agent.max_tool_rounds, 3);
    }

    #[test]
    fn test_legacy_env_ignores_blank_values() {
        let mut settings = Settings::default();
        settings.apply_legacy_env(|key| match key {
            "FROM_EMAIL" => Some("planner@example.com".to_string()),
            "TO_EMAIL" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(settings.email.from, "planner@example.com");
        assert_eq!(settings.email.to, "");
        assert_eq!(settings.email.subject, "Your travel plan");
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut settings = Settings::default();
        settings.email.enabled = true;
        let cli = Cli::parse_from(["wayfarer", "--provider", "ollama", "--model", "llama3.1", "--no-email"]);
        settings.apply_cli_overrides(&cli);
        assert_eq!(settings.llm.provider, LlmProviderType::Ollama);
        assert_eq!(settings.llm.model, "llama3.1");
        assert!(!settings.email.enabled);
    }

    #[test]
    fn test_provider_switch_brings_its_default_model() {
        let mut settings = Settings::default();
        let cli = Cli::parse_from(["wayfarer", "--provider", "ollama"]);
        settings.apply_cli_overrides(&cli);
        assert_eq!(settings.llm.provider, LlmProviderType::Ollama);
        assert_eq!(settings.llm.model, "llama3.1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_provider_from_env_without_model_uses_provider_default() {
        let env = HashMap::from([("WAYFARER__LLM__PROVIDER".to_string(), "openai".to_string())]);
        let settings = Settings::layered(Path::new("does-not-exist.toml"), Some(env)).unwrap();
        assert_eq!(settings.llm.provider, LlmProviderType::OpenAI);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
    }
}
