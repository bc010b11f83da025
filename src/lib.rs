//! # botcmd
//!
//! Typed text-command dispatch for chat bots.
//!
//! A [`Dispatcher`] reads lines such as `!roll 3 d20`, finds the command,
//! converts each token run into a typed [`Value`] through the
//! [`ConversionRegistry`], calls the handler and routes its result back
//! through a [`Transport`].
//!
//! ```rust
//! use std::sync::Arc;
//! use botcmd::command::{CommandSpec, ParameterSpec, Returns, value};
//! use botcmd::convert::TypeTag;
//! # use botcmd::{Dispatcher, transport::*, command::{Capability, ReplyTarget}, convert::Reply};
//! # struct Quiet;
//! # impl Transport for Quiet {
//! #     fn mention_forms(&self) -> Vec<String> { Vec::new() }
//! #     fn resolve_reply_target(&self, _: &dyn MessageContext, _: &ReplyTarget) -> ChannelRef { ChannelRef::new("here") }
//! #     fn has_capability(&self, _: &dyn MessageContext, _: &Capability) -> bool { true }
//! #     fn send(&self, _: &ChannelRef, _: &Reply) -> anyhow::Result<()> { Ok(()) }
//! #     fn react(&self, _: &dyn MessageContext, _: &str) -> anyhow::Result<()> { Ok(()) }
//! # }
//!
//! let dispatcher = Dispatcher::new(Arc::new(Quiet));
//! let double = CommandSpec::builder("double")
//!     .param(ParameterSpec::new(TypeTag::INT).restrict("positive"))
//!     .returns(Returns::Value(TypeTag::INT))
//!     .handler(|inv| value(inv.arg::<i64>(0)? * 2));
//! dispatcher.register_command(double).unwrap();
//! ```

pub mod command;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod metrics;
pub mod telemetry;
pub mod transport;

pub use command::{CommandRegistry, CommandSource, CommandSpec, Invocation, ParameterSpec};
pub use config::Config;
pub use convert::{ConversionRegistry, Reply, TypeTag, Value};
pub use dispatch::{Dispatch, Dispatcher, IgnoreReason};
pub use error::{ConvertError, DefinitionError, DeserializeError, RegistrationError};
pub use help::HelpIndex;
pub use transport::{ChannelRef, MessageContext, Scope, Transport};
