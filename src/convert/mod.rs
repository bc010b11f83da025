//! Conversion between raw tokens and typed values.
//!
//! - [`tag`]: [`TypeTag`], the key of every conversion table
//! - [`value`]: [`Value`] and typed extraction via [`FromValue`]
//! - [`reply`]: [`Reply`], the closed set of outbound kinds
//! - [`registry`]: [`ConversionRegistry`] with array and enum derivation
//! - [`words`]: the boolean word table

mod builtin;
pub mod registry;
pub mod reply;
pub mod tag;
pub mod value;
pub mod words;

pub use registry::{ConversionRegistry, ConvertOptions, Converted, Deserializer};
pub use reply::{Reply, RichField, RichPayload};
pub use tag::TypeTag;
pub use value::{Captures, Choice, FromValue, Value};
pub use words::BoolWords;
