//! Error hierarchy for botcmd.
//!
//! Errors fall into three groups: registration errors returned while commands
//! and converters are being set up, conversion errors produced while a line
//! is being dispatched, and definition errors that surface a broken command
//! or converter at dispatch time.

use botcmd_proto::RestrictionError;
use thiserror::Error;

use crate::convert::TypeTag;

// ============================================================================
// Conversion Errors (per-token processing)
// ============================================================================

/// A user-facing conversion failure.
///
/// The message is shown to the user as `Parameter <n> is invalid: <message>`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DeserializeError {
    /// Text shown to the user.
    pub message: String,
    /// Whether the command's usage line should follow the message.
    pub show_usage: bool,
}

impl DeserializeError {
    /// A failure that stands on its own.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            show_usage: false,
        }
    }

    /// A failure followed by the usage line.
    pub fn with_usage(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            show_usage: true,
        }
    }
}

/// Errors returned by a deserializer or by the conversion registry.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The input was bad. Reported to the user.
    #[error(transparent)]
    Invalid(#[from] DeserializeError),

    /// A restriction could not be compiled, or a converter needed one and
    /// got none.
    #[error(transparent)]
    Restriction(#[from] RestrictionError),

    /// A deserializer reported an impossible token count.
    #[error("deserializer for {tag} consumed {consumed} of {available} tokens")]
    Contract {
        tag: TypeTag,
        consumed: usize,
        available: usize,
    },
}

impl ConvertError {
    /// Whether this error is the user's fault rather than the command author's.
    #[inline]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_parameter",
            Self::Restriction(e) => e.error_code(),
            Self::Contract { .. } => "converter_contract",
        }
    }
}

/// Errors returned by a serializer.
#[derive(Debug, Clone, Error)]
pub enum SerializeError {
    /// The value was not the shape the serializer expected.
    #[error("expected a {expected} value, got {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

// ============================================================================
// Handler-side Errors
// ============================================================================

/// Errors from reading a parsed argument inside a handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("argument {0} was not supplied")]
    Missing(usize),

    #[error("argument {index} is a {found} value, not {expected}")]
    Mismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("argument {index} does not fit in {target}")]
    OutOfRange { index: usize, target: &'static str },
}

// ============================================================================
// Registration Errors (setup phase)
// ============================================================================

/// Errors returned while registering commands or converters.
///
/// A command that fails registration is not bound under any name.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("invalid command {command}: {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("invalid deserializer: {0}")]
    InvalidDeserializer(String),

    #[error("invalid serializer: {0}")]
    InvalidSerializer(String),

    #[error("the name {name} is already used by the command {owner}")]
    NameConflict { name: String, owner: String },

    #[error("default value of parameter {index} of {command} does not convert: {source}")]
    InvalidDefault {
        command: String,
        index: usize,
        #[source]
        source: ConvertError,
    },
}

impl RegistrationError {
    pub(crate) fn invalid_command(command: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCommand { .. } => "invalid_command",
            Self::InvalidDeserializer(_) => "invalid_deserializer",
            Self::InvalidSerializer(_) => "invalid_serializer",
            Self::NameConflict { .. } => "name_conflict",
            Self::InvalidDefault { .. } => "invalid_default",
        }
    }
}

// ============================================================================
// Definition Errors (surfaced during dispatch)
// ============================================================================

/// A broken command or converter found while dispatching a line.
///
/// These are bugs in the integrator's code, not in the user's input.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("command {command}, parameter {index}: {source}")]
    Conversion {
        command: String,
        index: usize,
        #[source]
        source: ConvertError,
    },

    #[error("command {command}: result could not be serialized: {source}")]
    Serialization {
        command: String,
        #[source]
        source: SerializeError,
    },
}

impl DefinitionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Conversion { source, .. } => source.error_code(),
            Self::Serialization { .. } => "serializer_failed",
        }
    }
}
