//! Command descriptions, handlers and the command registry.

pub mod invocation;
pub mod registry;
pub mod spec;

pub use invocation::{Arguments, Handler, HandlerResult, Invocation, Output, reply, value};
pub use registry::{CommandRegistry, Registered};
pub use spec::{
    Capability, Combine, CommandBuilder, CommandScope, CommandSpec, MentionSetting,
    ParameterSpec, ReplyTarget, Returns,
};

use crate::convert::ConversionRegistry;
use crate::error::RegistrationError;

/// A group of commands registered together, with the converters they need.
pub trait CommandSource {
    /// Register custom converters. Runs before any command of the source.
    fn register_converters(&self, _conversions: &ConversionRegistry) -> Result<(), RegistrationError> {
        Ok(())
    }

    fn commands(&self) -> Vec<CommandSpec>;
}

impl CommandSource for Vec<CommandSpec> {
    fn commands(&self) -> Vec<CommandSpec> {
        self.clone()
    }
}

impl CommandSource for CommandSpec {
    fn commands(&self) -> Vec<CommandSpec> {
        vec![self.clone()]
    }
}
