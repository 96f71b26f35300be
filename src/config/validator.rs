use thiserror::Error;

use crate::agents::config::{AgentConfig, LlmProviderConfig, MemoryBackend, MemoryConfig};
use crate::config::{EmailConfig, SearchConfig, Settings};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Collect every violation rather than stopping at the first
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_llm(&settings.llm, &mut errors);
        Self::validate_agent(&settings.agent, &mut errors);
        Self::validate_search(&settings.search, &mut errors);
        Self::validate_email(&settings.email, &mut errors);
        Self::validate_memory(&settings.memory, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_llm(llm: &LlmProviderConfig, errors: &mut Vec<ValidationError>) {
        if llm.model.trim().is_empty() {
            errors.push(ValidationError::MissingField("llm.model".to_string()));
        }
        Self::check_temperature("llm.temperature", llm.temperature, errors);

        if llm.request_timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "llm.request_timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }
    }

    fn validate_agent(agent: &AgentConfig, errors: &mut Vec<ValidationError>) {
        if agent.max_tool_rounds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "agent.max_tool_rounds".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        if agent.tool_timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "agent.tool_timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }
        Self::check_temperature(
            "agent.finalization_temperature",
            agent.finalization_temperature,
            errors,
        );
        Self::check_temperature(
            "agent.itinerary_temperature",
            agent.itinerary_temperature,
            errors,
        );
    }

    fn validate_search(search: &SearchConfig, errors: &mut Vec<ValidationError>) {
        if search.max_results == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "search.max_results".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        if search.base_url.trim().is_empty() {
            errors.push(ValidationError::MissingField("search.base_url".to_string()));
        }
    }

    fn validate_email(email: &EmailConfig, errors: &mut Vec<ValidationError>) {
        if !email.enabled {
            return;
        }
        if email.from.trim().is_empty() {
            errors.push(ValidationError::MissingField("email.from".to_string()));
        }
        if email.to.trim().is_empty() {
            errors.push(ValidationError::MissingField("email.to".to_string()));
        }
    }

    fn validate_memory(memory: &MemoryConfig, errors: &mut Vec<ValidationError>) {
        if memory.backend == MemoryBackend::File && memory.file_path.trim().is_empty() {
            errors.push(ValidationError::MissingField("memory.file_path".to_string()));
        }
    }

    fn check_temperature(field: &str, value: f32, errors: &mut Vec<ValidationError>) {
        if !(0.0..=2.0).contains(&value) {
            errors.push(ValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} is outside [0, 2]", value),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut settings = Settings::default();
        settings.llm.model = " ".to_string();
        settings.llm.temperature = 2.5;
        settings.agent.max_tool_rounds = 0;
        settings.search.max_results = 0;
        settings.email.enabled = true;
        settings.memory.backend = MemoryBackend::File;
        settings.memory.file_path = String::new();

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 7);
        assert!(errors.contains(&ValidationError::MissingField("email.from".to_string())));
        assert!(errors.contains(&ValidationError::MissingField("memory.file_path".to_string())));
    }

    #[test]
    fn test_disabled_email_needs_no_addresses() {
        let mut settings = Settings::default();
        settings.email.enabled = false;
        settings.email.from.clear();
        assert!(ConfigValidator::validate(&settings).is_ok());
    }
}
