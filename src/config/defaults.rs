//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use crate::command::MentionSetting;
use crate::help::HelpIndex;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Reader Defaults
// =============================================================================

pub fn default_name() -> String {
    "botcmd".to_string()
}

pub fn default_prefix() -> String {
    "!".to_string()
}

pub fn default_mention() -> MentionSetting {
    MentionSetting::No
}

pub fn default_page_budget() -> usize {
    HelpIndex::DEFAULT_PAGE_BUDGET
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Console Defaults
// =============================================================================

pub fn default_author() -> String {
    "console".to_string()
}

pub fn default_capabilities() -> Vec<String> {
    vec!["operator".to_string()]
}
