//! # botcmd-proto
//!
//! The dependency-light core of the botcmd command framework:
//!
//! - Whitespace tokenization and a [`TokenCursor`] that converters read from
//!   without mutating shared state
//! - Command-name rules (`[a-z0-9_-]+`, case-insensitive)
//! - The restriction expression language: AND/OR chains of numeric
//!   comparisons, plus whole-string and character-class regex modes
//!
//! ## Quick Start
//!
//! ```rust
//! use botcmd_proto::{tokenize, Restriction, TokenCursor};
//!
//! let mut cursor = TokenCursor::new(tokenize("roll 3 20"));
//! assert_eq!(cursor.next_token(), Some("roll"));
//! assert_eq!(cursor.remaining(), ["3", "20"]);
//!
//! let restriction = Restriction::new("positive & even");
//! assert!(restriction.allows(4).unwrap());
//! assert!(!restriction.allows(-4).unwrap());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod names;
pub mod restriction;
pub mod token;

pub use self::error::RestrictionError;
pub use self::names::{is_valid_name, normalize_name, split_names};
pub use self::restriction::{Condition, Numeric, Operator, Restriction, Term};
pub use self::token::{tokenize, TokenCursor};
