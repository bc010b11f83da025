//! The restriction language.
//!
//! A [`Restriction`] is attached to a command parameter and evaluated after
//! the parameter's tokens are converted. The converter picks the mode:
//!
//! - **Numeric** ([`Restriction::allows`]): AND/OR chains of comparisons,
//!   e.g. `"positive & even"`, `"<=-10 | >=10"`, `"!%3"`.
//! - **Pattern** ([`Restriction::matches`]): the expression is a regex that
//!   must match the whole input.
//! - **Character class** ([`Restriction::matches_char`]): the expression is
//!   the body of a `[...]` class.
//!
//! Each mode compiles on first use and caches the result, error included.

mod parser;

use crate::error::RestrictionError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A number under test, or a comparison operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// Any integer width, widened.
    Int(i64),
    /// Any floating width, widened.
    Float(f64),
}

impl Numeric {
    /// Widen to `f64`.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

macro_rules! numeric_from {
    ($variant:ident: $($ty:ty),*) => {
        $(impl From<$ty> for Numeric {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

numeric_from!(Int: i8, i16, i32, i64, u8, u16, u32);
numeric_from!(Float: f32, f64);

/// Comparison operator of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `=`
    Eq,
    /// `%`: the value is evenly divisible by the operand.
    Divisible,
    /// `^`: the value is an integral power of the operand.
    Power,
}

/// One OR-term: `[!]<op><operand>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Whether the result is inverted (`!`).
    pub invert: bool,
    /// The comparison.
    pub op: Operator,
    /// The literal on the right-hand side.
    pub operand: Numeric,
}

impl Term {
    /// Evaluate this term against `value`.
    pub fn test(&self, value: Numeric) -> bool {
        let hit = match (value, self.operand) {
            (Numeric::Int(v), Numeric::Int(n)) => int_test(self.op, v, n),
            (v, n) => float_test(self.op, v.as_f64(), n.as_f64()),
        };
        hit != self.invert
    }
}

fn int_test(op: Operator, v: i64, n: i64) -> bool {
    match op {
        Operator::Ge => v >= n,
        Operator::Le => v <= n,
        Operator::Gt => v > n,
        Operator::Lt => v < n,
        Operator::Eq => v == n,
        Operator::Divisible => n != 0 && v.wrapping_rem(n) == 0,
        Operator::Power => is_int_power(v, n),
    }
}

fn is_int_power(v: i64, base: i64) -> bool {
    if v <= 0 || base <= 0 {
        return false;
    }
    if base == 1 {
        return v == 1;
    }
    let mut power: i64 = 1;
    while power < v {
        match power.checked_mul(base) {
            Some(next) => power = next,
            None => return false,
        }
    }
    power == v
}

fn float_test(op: Operator, v: f64, n: f64) -> bool {
    match op {
        Operator::Ge => v >= n,
        Operator::Le => v <= n,
        Operator::Gt => v > n,
        Operator::Lt => v < n,
        Operator::Eq => v == n,
        Operator::Divisible => n != 0.0 && v % n == 0.0,
        Operator::Power => {
            if v <= 0.0 || n <= 0.0 {
                return false;
            }
            if n == 1.0 {
                return v == 1.0;
            }
            let exponent = v.ln() / n.ln();
            exponent.is_finite() && (exponent - exponent.round()).abs() < 1e-9
        }
    }
}

/// A compiled numeric expression: every group needs one satisfied term.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// AND-groups, each a list of OR-terms.
    pub groups: Vec<Vec<Term>>,
}

impl Condition {
    /// Parse a numeric restriction expression.
    pub fn parse(expression: &str) -> Result<Self, RestrictionError> {
        parser::parse_condition(expression)
    }

    /// Evaluate against `value`. An unsatisfied group short-circuits.
    pub fn test(&self, value: Numeric) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|term| term.test(value)))
    }
}

/// A restriction attached to a parameter.
#[derive(Clone)]
pub struct Restriction {
    expression: String,
    error_text: Option<String>,
    condition: OnceLock<Result<Condition, RestrictionError>>,
    pattern: OnceLock<Result<Regex, RestrictionError>>,
    class: OnceLock<Result<Regex, RestrictionError>>,
}

impl Restriction {
    /// Create a restriction. Nothing is compiled until first evaluation.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            error_text: None,
            condition: OnceLock::new(),
            pattern: OnceLock::new(),
            class: OnceLock::new(),
        }
    }

    /// Replace the default failure message. `{INPUT}` is substituted with
    /// the rejected input.
    pub fn with_error(mut self, text: impl Into<String>) -> Self {
        self.error_text = Some(text.into());
        self
    }

    /// The raw expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The custom failure message, if any.
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    /// The compiled numeric form.
    pub fn condition(&self) -> Result<&Condition, RestrictionError> {
        self.condition
            .get_or_init(|| Condition::parse(&self.expression))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Numeric mode: does `value` satisfy the expression?
    pub fn allows(&self, value: impl Into<Numeric>) -> Result<bool, RestrictionError> {
        Ok(self.condition()?.test(value.into()))
    }

    fn whole_pattern(&self) -> Result<&Regex, RestrictionError> {
        self.pattern
            .get_or_init(|| compile(format!("^(?:{})$", self.expression)))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Pattern mode: does the whole of `text` match?
    pub fn matches(&self, text: &str) -> Result<bool, RestrictionError> {
        Ok(self.whole_pattern()?.is_match(text))
    }

    /// Pattern mode: capture groups of a whole-string match, `None` when the
    /// text does not match. Group 0 is the whole text.
    pub fn captures(&self, text: &str) -> Result<Option<Vec<Option<String>>>, RestrictionError> {
        Ok(self.whole_pattern()?.captures(text).map(|caps| {
            caps.iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        }))
    }

    /// Character-class mode: is `c` in `[<expression>]`?
    pub fn matches_char(&self, c: char) -> Result<bool, RestrictionError> {
        let class = self
            .class
            .get_or_init(|| compile(format!("^[{}]$", self.expression)))
            .as_ref()
            .map_err(Clone::clone)?;
        let mut buf = [0u8; 4];
        Ok(class.is_match(c.encode_utf8(&mut buf)))
    }

    /// The message shown when `input` fails this restriction.
    pub fn failure_message(&self, input: &str) -> String {
        match &self.error_text {
            Some(text) => text.replace("{INPUT}", input),
            None => format!("{} does not meet the restriction.", input),
        }
    }

    /// Whether a failure should be followed by the command's usage line.
    ///
    /// Only the generic message asks for it; custom messages stand alone.
    pub fn failure_shows_usage(&self) -> bool {
        self.error_text.is_none()
    }
}

fn compile(pattern: String) -> Result<Regex, RestrictionError> {
    Regex::new(&pattern).map_err(|source| RestrictionError::InvalidPattern { pattern, source })
}

impl fmt::Debug for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restriction")
            .field("expression", &self.expression)
            .field("error_text", &self.error_text)
            .finish()
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
