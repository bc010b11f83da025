//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

use crate::transport::Scope;

/// Guard for timing one dispatch and recording metrics.
///
/// Counts the command under its scope when dropped. Time up to
/// [`CommandTimer::parsed`] is recorded as the `parse` phase and the rest as
/// the `handler` phase. A dispatch that stops before its handler records
/// only `parse`.
pub struct CommandTimer {
    command: String,
    scope: Scope,
    start: Instant,
    parsed_at: Option<Instant>,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>, scope: Scope) -> Self {
        Self {
            command: command.into(),
            scope,
            start: Instant::now(),
            parsed_at: None,
        }
    }

    /// Mark the end of argument conversion.
    pub fn parsed(&mut self) {
        self.parsed_at.get_or_insert_with(Instant::now);
    }

    /// Whether the handler phase has started.
    pub fn reached_handler(&self) -> bool {
        self.parsed_at.is_some()
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        use crate::metrics::{record_command, record_phase};

        record_command(&self.command, self.scope.as_str());
        match self.parsed_at {
            Some(parsed_at) => {
                record_phase(&self.command, "parse", (parsed_at - self.start).as_secs_f64());
                record_phase(&self.command, "handler", parsed_at.elapsed().as_secs_f64());
            }
            None => record_phase(&self.command, "parse", self.start.elapsed().as_secs_f64()),
        }
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Level, Span, span};

    use crate::transport::Scope;

    /// Create a span for one command execution.
    pub fn command(name: &str, author: &str, scope: Scope) -> Span {
        span!(Level::DEBUG, "command", name = %name, author = %author, scope = %scope)
    }
}
