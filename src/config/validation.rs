//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::command::MentionSetting;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("reader.prefix must not be empty")]
    EmptyPrefix,
    #[error("reader.prefix must not contain whitespace, got {0:?}")]
    PrefixWhitespace(String),
    #[error("reader.mention must be \"no\" or \"prefix\"")]
    DefaultMention,
    #[error("reader.help_page_budget must be greater than zero")]
    ZeroPageBudget,
    #[error("conversion word {0:?} must be a single non-empty token")]
    InvalidBoolWord(String),
    #[error("conversion word {0:?} is listed as both true and false")]
    AmbiguousBoolWord(String),
    #[error("logging.level is not a valid filter: {0}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Reader
    let prefix = &config.reader.prefix;
    if prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::PrefixWhitespace(prefix.clone()));
    }
    if config.reader.mention == MentionSetting::Default {
        errors.push(ValidationError::DefaultMention);
    }
    if config.reader.help_page_budget == 0 {
        errors.push(ValidationError::ZeroPageBudget);
    }

    // Conversion words
    let conversion = &config.conversion;
    for word in conversion.true_words.iter().chain(&conversion.false_words) {
        if word.is_empty() || word.chars().any(char::is_whitespace) {
            errors.push(ValidationError::InvalidBoolWord(word.clone()));
        }
    }
    for word in &conversion.true_words {
        if conversion
            .false_words
            .iter()
            .any(|other| other.eq_ignore_ascii_case(word))
        {
            errors.push(ValidationError::AmbiguousBoolWord(word.clone()));
        }
    }

    // Logging
    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        errors.push(ValidationError::InvalidLogLevel(e.to_string()));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
