//! Nom-based parser for numeric restriction expressions.
//!
//! ```text
//! expression = and-group *( "&" and-group )
//! and-group  = term *( "|" term )
//! term       = shorthand / [ "!" ] operator operand
//! operator   = ">=" / "<=" / ">" / "<" / "=" / "%" / "^"
//! operand    = [ "-" ] ( 1*DIGIT [ "." *DIGIT ] / "." 1*DIGIT )
//! ```
//!
//! Whitespace is removed before parsing. Shorthand keywords are matched
//! case-insensitively with hyphens ignored, so `Non-Negative` works.

use super::{Condition, Numeric, Operator, Term};
use crate::error::RestrictionError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1},
    combinator::{all_consuming, map, opt, recognize, value},
    sequence::{pair, tuple},
    IResult,
};

/// Expand a shorthand keyword to its comparison form.
fn shorthand(term: &str) -> Option<&'static str> {
    let keyword: String = term
        .chars()
        .filter(|&c| c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match keyword.as_str() {
        "positive" => Some(">0"),
        "negative" => Some("<0"),
        "nonpositive" => Some("<=0"),
        "nonnegative" => Some(">=0"),
        "even" => Some("%2"),
        "odd" => Some("!%2"),
        _ => None,
    }
}

fn operator(input: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::Ge, tag(">=")),
        value(Operator::Le, tag("<=")),
        value(Operator::Gt, tag(">")),
        value(Operator::Lt, tag("<")),
        value(Operator::Eq, tag("=")),
        value(Operator::Divisible, tag("%")),
        value(Operator::Power, tag("^")),
    ))(input)
}

fn operand(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(char('-')),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, (bool, Operator, &str)> {
    tuple((map(opt(char('!')), |bang| bang.is_some()), operator, operand))(input)
}

fn parse_operand(literal: &str) -> Result<Numeric, RestrictionError> {
    if literal.contains('.') {
        literal
            .parse::<f64>()
            .map(Numeric::Float)
            .map_err(|_| RestrictionError::OperandOutOfRange(literal.to_string()))
    } else {
        literal
            .parse::<i64>()
            .map(Numeric::Int)
            .map_err(|_| RestrictionError::OperandOutOfRange(literal.to_string()))
    }
}

/// Parse a single OR-term (whitespace already stripped).
pub(crate) fn parse_term(term: &str, expression: &str) -> Result<Term, RestrictionError> {
    let text = shorthand(term).unwrap_or(term);
    match all_consuming(comparison)(text) {
        Ok((_, (invert, op, literal))) => Ok(Term {
            invert,
            op,
            operand: parse_operand(literal)?,
        }),
        Err(_) => Err(RestrictionError::InvalidCondition {
            condition: term.to_string(),
            expression: expression.to_string(),
        }),
    }
}

/// Parse a whole expression into AND-groups of OR-terms.
pub(crate) fn parse_condition(expression: &str) -> Result<Condition, RestrictionError> {
    let stripped: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let groups = stripped
        .split('&')
        .map(|group| {
            group
                .split('|')
                .map(|term| parse_term(term, expression))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Condition { groups })
}
