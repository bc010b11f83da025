//! Type tags: the keys of the conversion tables.

use std::borrow::Cow;
use std::fmt;

const ARRAY_SUFFIX: &str = "[]";

/// Identifies a semantic value type, such as `int`, `int[]` or `color`.
///
/// `T[]` names an array of `T`. Tags compare by exact text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    /// 8-bit signed integer.
    pub const BYTE: TypeTag = TypeTag::from_static("byte");
    /// 16-bit signed integer.
    pub const SHORT: TypeTag = TypeTag::from_static("short");
    /// 32-bit signed integer.
    pub const INT: TypeTag = TypeTag::from_static("int");
    /// 64-bit signed integer.
    pub const LONG: TypeTag = TypeTag::from_static("long");
    /// 32-bit float.
    pub const FLOAT: TypeTag = TypeTag::from_static("float");
    /// 64-bit float.
    pub const DOUBLE: TypeTag = TypeTag::from_static("double");
    /// A word from the boolean table.
    pub const BOOL: TypeTag = TypeTag::from_static("bool");
    /// One character, or a keyword such as `space`.
    pub const CHAR: TypeTag = TypeTag::from_static("char");
    /// Joined tokens as a character list.
    pub const CHARS: TypeTag = TypeTag::from_static("char[]");
    /// Plain text, greedy when restricted.
    pub const STRING: TypeTag = TypeTag::from_static("string");
    /// Regex capture groups. Needs a restriction.
    pub const MATCH: TypeTag = TypeTag::from_static("match");

    /// Reply kinds. Handlers return these directly, so they never get a
    /// serializer.
    pub const TEXT: TypeTag = TypeTag::from_static("text");
    pub const RICH: TypeTag = TypeTag::from_static("rich");
    pub const REACTION: TypeTag = TypeTag::from_static("reaction");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The array tag over this one: `int` becomes `int[]`.
    pub fn array(&self) -> TypeTag {
        TypeTag(Cow::Owned(format!("{}{}", self.0, ARRAY_SUFFIX)))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.0.ends_with(ARRAY_SUFFIX)
    }

    /// The element tag of an array tag: `int[]` gives `int`.
    pub fn element(&self) -> Option<TypeTag> {
        self.0
            .strip_suffix(ARRAY_SUFFIX)
            .map(|inner| TypeTag(Cow::Owned(inner.to_string())))
    }

    /// Whether this is one of the reply kinds handlers return directly.
    pub fn is_reply_kind(&self) -> bool {
        *self == Self::TEXT || *self == Self::RICH || *self == Self::REACTION
    }

    /// A tag is a non-empty name of letters, digits, `_`, `-`, `.` or `:`,
    /// followed by any number of `[]` pairs.
    pub fn is_well_formed(&self) -> bool {
        let mut base = self.as_str();
        while let Some(inner) = base.strip_suffix(ARRAY_SUFFIX) {
            base = inner;
        }
        !base.is_empty()
            && base
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeTag {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}
