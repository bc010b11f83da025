//! Converters registered on every new [`ConversionRegistry`].
//!
//! [`ConversionRegistry`]: super::ConversionRegistry

use std::str::FromStr;
use std::sync::Arc;

use botcmd_proto::{Numeric, Restriction, RestrictionError};

use super::registry::{Converted, Tables};
use super::{BoolWords, Captures, Reply, TypeTag, Value};
use crate::error::{ConvertError, DeserializeError, SerializeError};

pub(super) fn install(tables: &mut Tables, char_drop_silently: bool, words: Arc<BoolWords>) {
    tables.set_deserializer(TypeTag::BYTE, integer::<i8>);
    tables.set_deserializer(TypeTag::SHORT, integer::<i16>);
    tables.set_deserializer(TypeTag::INT, integer::<i32>);
    tables.set_deserializer(TypeTag::LONG, integer::<i64>);
    tables.set_deserializer(TypeTag::FLOAT, floating::<f32>);
    tables.set_deserializer(TypeTag::DOUBLE, floating::<f64>);
    tables.set_deserializer(TypeTag::STRING, string);
    tables.set_deserializer(TypeTag::MATCH, matcher);
    tables.set_deserializer(TypeTag::CHARS, chars);
    tables.set_deserializer(
        TypeTag::BOOL,
        move |tokens: &[String], _max: usize, _restriction: Option<&Restriction>| {
            boolean(&words, tokens)
        },
    );
    tables.set_deserializer(
        TypeTag::CHAR,
        move |tokens: &[String], _max: usize, restriction: Option<&Restriction>| {
            character(tokens, restriction, char_drop_silently)
        },
    );

    for tag in [
        TypeTag::BYTE,
        TypeTag::SHORT,
        TypeTag::INT,
        TypeTag::LONG,
        TypeTag::FLOAT,
        TypeTag::DOUBLE,
        TypeTag::BOOL,
        TypeTag::CHAR,
        TypeTag::STRING,
        TypeTag::MATCH,
    ] {
        tables.set_plain_serializer(tag, as_text);
    }
    tables.set_plain_serializer(TypeTag::CHARS, chars_as_text);
}

fn first(tokens: &[String]) -> Result<&str, ConvertError> {
    tokens
        .first()
        .map(String::as_str)
        .ok_or_else(|| DeserializeError::new("Nothing left to read.").into())
}

/// The user-facing error for a value that fails its restriction.
fn restriction_failure(restriction: &Restriction, input: &str) -> ConvertError {
    DeserializeError {
        message: restriction.failure_message(input),
        show_usage: restriction.failure_shows_usage(),
    }
    .into()
}

fn check_numeric(
    token: &str,
    value: Numeric,
    restriction: Option<&Restriction>,
) -> Result<(), ConvertError> {
    if let Some(r) = restriction {
        if !r.allows(value)? {
            return Err(restriction_failure(r, token));
        }
    }
    Ok(())
}

fn integer<T>(
    tokens: &[String],
    _max: usize,
    restriction: Option<&Restriction>,
) -> Result<Converted, ConvertError>
where
    T: FromStr + Into<i64>,
{
    let token = first(tokens)?;
    let value: i64 = token
        .parse::<T>()
        .map_err(|_| DeserializeError::new(format!("Can't convert {token} to a number.")))?
        .into();
    check_numeric(token, Numeric::Int(value), restriction)?;
    Ok(Converted::single(Value::Int(value)))
}

fn floating<T>(
    tokens: &[String],
    _max: usize,
    restriction: Option<&Restriction>,
) -> Result<Converted, ConvertError>
where
    T: FromStr + Into<f64>,
{
    let token = first(tokens)?;
    let value: f64 = token
        .parse::<T>()
        .map_err(|_| DeserializeError::new(format!("Can't convert {token} to a number.")))?
        .into();
    check_numeric(token, Numeric::Float(value), restriction)?;
    Ok(Converted::single(Value::Float(value)))
}

fn boolean(words: &BoolWords, tokens: &[String]) -> Result<Converted, ConvertError> {
    let token = first(tokens)?;
    match words.lookup(token) {
        Some(value) => Ok(Converted::single(Value::Bool(value))),
        None => Err(DeserializeError::new(format!("Can't convert {token} to a boolean.")).into()),
    }
}

fn char_keyword(token: &str) -> Option<char> {
    match token.to_lowercase().as_str() {
        "" | "sp" | "space" | "\\s" => Some(' '),
        "nl" | "newline" | "new_line" | "\\n" => Some('\n'),
        "re" | "return" | "\\r" => Some('\r'),
        "tab" | "\\t" => Some('\t'),
        "\\\\" => Some('\\'),
        _ => None,
    }
}

fn character(
    tokens: &[String],
    restriction: Option<&Restriction>,
    drop_silently: bool,
) -> Result<Converted, ConvertError> {
    let token = first(tokens)?;
    let value = match char_keyword(token) {
        Some(c) => c,
        None => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                (Some(c), Some(_)) if drop_silently => c,
                _ => {
                    return Err(DeserializeError::new(format!(
                        "\"{token}\" is not a valid character."
                    ))
                    .into());
                }
            }
        }
    };
    if let Some(r) = restriction {
        if !r.matches_char(value)? {
            return Err(restriction_failure(r, token));
        }
    }
    Ok(Converted::single(Value::Char(value)))
}

/// Process `\\`, `\n`, `\r`, `\t` and `\s`. Other backslashes are kept.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let replacement = match chars.peek() {
            Some('\\') => '\\',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('s') => ' ',
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();
        out.push(replacement);
    }
    out
}

fn chars(
    tokens: &[String],
    max: usize,
    restriction: Option<&Restriction>,
) -> Result<Converted, ConvertError> {
    first(tokens)?;
    let take = tokens.len().min(max).max(1);
    let joined = tokens[..take].join(" ");
    let text = unescape(&joined);
    if let Some(r) = restriction {
        if !r.matches(&text)? {
            return Err(DeserializeError::new(format!("\"{text}\" is not a valid input.")).into());
        }
    }
    Ok(Converted {
        value: Value::List(text.chars().map(Value::Char).collect()),
        consumed: take,
    })
}

/// Join up to `max` tokens. With a restriction, keep appending tokens until
/// the whole text matches or input runs out.
fn greedy_join(
    tokens: &[String],
    max: usize,
    restriction: Option<&Restriction>,
) -> Result<(String, usize), ConvertError> {
    let mut used = tokens.len().min(max).max(1);
    let mut text = tokens[..used].join(" ");
    if let Some(r) = restriction {
        while !r.matches(&text)? && used < tokens.len() {
            text.push(' ');
            text.push_str(&tokens[used]);
            used += 1;
        }
        if !r.matches(&text)? {
            return Err(restriction_failure(r, &text));
        }
    }
    Ok((text, used))
}

fn string(
    tokens: &[String],
    max: usize,
    restriction: Option<&Restriction>,
) -> Result<Converted, ConvertError> {
    first(tokens)?;
    let (text, consumed) = greedy_join(tokens, max, restriction)?;
    Ok(Converted {
        value: Value::Text(text),
        consumed,
    })
}

fn matcher(
    tokens: &[String],
    max: usize,
    restriction: Option<&Restriction>,
) -> Result<Converted, ConvertError> {
    first(tokens)?;
    let r = restriction.ok_or_else(|| RestrictionError::Missing(TypeTag::MATCH.to_string()))?;
    let (text, consumed) = greedy_join(tokens, max, Some(r))?;
    let groups = r.captures(&text)?.unwrap_or_default();
    Ok(Converted {
        value: Value::Match(Captures::new(groups)),
        consumed,
    })
}

fn as_text(value: &Value) -> Result<Reply, SerializeError> {
    Ok(Reply::Text(value.to_string()))
}

fn chars_as_text(value: &Value) -> Result<Reply, SerializeError> {
    match value {
        Value::List(items) => Ok(Reply::Text(items.iter().map(ToString::to_string).collect())),
        Value::Text(text) => Ok(Reply::Text(text.clone())),
        other => Err(SerializeError::Mismatch {
            expected: "list",
            found: other.kind(),
        }),
    }
}
