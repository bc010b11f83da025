//! Configuration loading and management.
//!
//! - [`types`]: config structs and [`Config::load`]
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
pub mod validation;

pub use types::{ConfigError, Config, ConsoleConfig, ConversionConfig, LoggingConfig, ReaderConfig};
pub use validation::{ValidationError, validate};
