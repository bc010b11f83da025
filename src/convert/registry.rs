//! The type-keyed conversion tables.

use std::collections::HashMap;
use std::sync::Arc;

use botcmd_proto::Restriction;
use parking_lot::RwLock;
use tracing::debug;

use super::{BoolWords, Choice, Reply, TypeTag, Value, builtin};
use crate::error::{ConvertError, DeserializeError, RegistrationError, SerializeError};
use crate::transport::MessageContext;

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub value: Value,
    /// Tokens used, from the front of the slice the converter was given.
    pub consumed: usize,
}

impl Converted {
    /// A value built from exactly one token.
    pub fn single(value: Value) -> Self {
        Self { value, consumed: 1 }
    }
}

/// Turns the front of a token slice into a [`Value`].
///
/// `tokens` is never empty. `max_tokens` is the most the caller wants used;
/// converters that read a single token ignore it. The reported `consumed`
/// count must be between 1 and `tokens.len()`.
pub trait Deserializer: Send + Sync {
    fn deserialize(
        &self,
        tokens: &[String],
        max_tokens: usize,
        restriction: Option<&Restriction>,
    ) -> Result<Converted, ConvertError>;
}

impl<F> Deserializer for F
where
    F: Fn(&[String], usize, Option<&Restriction>) -> Result<Converted, ConvertError> + Send + Sync,
{
    fn deserialize(
        &self,
        tokens: &[String],
        max_tokens: usize,
        restriction: Option<&Restriction>,
    ) -> Result<Converted, ConvertError> {
        self(tokens, max_tokens, restriction)
    }
}

type PlainSerializer = dyn Fn(&Value) -> Result<Reply, SerializeError> + Send + Sync;
type ContextSerializer =
    dyn Fn(&Value, &dyn MessageContext) -> Result<Reply, SerializeError> + Send + Sync;

#[derive(Clone)]
enum SerializerFn {
    Plain(Arc<PlainSerializer>),
    Contextual(Arc<ContextSerializer>),
}

/// Raw tables. Also the install target for the built-in converters.
#[derive(Default)]
pub(super) struct Tables {
    deserializers: HashMap<TypeTag, Arc<dyn Deserializer>>,
    serializers: HashMap<TypeTag, SerializerFn>,
    enums: HashMap<TypeTag, Arc<[String]>>,
}

impl Tables {
    pub(super) fn set_deserializer(&mut self, tag: TypeTag, d: impl Deserializer + 'static) -> bool {
        self.deserializers.insert(tag, Arc::new(d)).is_some()
    }

    pub(super) fn set_plain_serializer(
        &mut self,
        tag: TypeTag,
        s: impl Fn(&Value) -> Result<Reply, SerializeError> + Send + Sync + 'static,
    ) -> bool {
        self.serializers
            .insert(tag, SerializerFn::Plain(Arc::new(s)))
            .is_some()
    }

    fn scalar_known(&self, tag: &TypeTag) -> bool {
        self.deserializers.contains_key(tag) || self.enums.contains_key(tag)
    }
}

enum Route {
    Direct(Arc<dyn Deserializer>),
    Enum(Arc<[String]>),
    Array(TypeTag),
    Missing,
}

/// Options fixed when the registry is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Let `char` parameters take the first character of a longer token
    /// instead of failing.
    pub char_drop_silently: bool,
}

/// Deserializers, serializers and enums keyed by [`TypeTag`].
///
/// Later registrations for a tag replace earlier ones. Lookups take a read
/// lock that is released before any converter runs, so converters may call
/// back into the registry.
pub struct ConversionRegistry {
    tables: RwLock<Tables>,
    bool_words: Arc<BoolWords>,
    options: ConvertOptions,
}

impl ConversionRegistry {
    /// A registry with the built-in converters installed.
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    pub fn with_options(options: ConvertOptions) -> Self {
        let bool_words = Arc::new(BoolWords::standard());
        let mut tables = Tables::default();
        builtin::install(&mut tables, options.char_drop_silently, Arc::clone(&bool_words));
        Self {
            tables: RwLock::new(tables),
            bool_words,
            options,
        }
    }

    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// The word table used by the `bool` converter.
    pub fn bool_words(&self) -> &BoolWords {
        &self.bool_words
    }

    /// Register or replace the deserializer for `tag`.
    pub fn register_deserializer(
        &self,
        tag: impl Into<TypeTag>,
        deserializer: impl Deserializer + 'static,
    ) -> Result<(), RegistrationError> {
        let tag = tag.into();
        if !tag.is_well_formed() {
            return Err(RegistrationError::InvalidDeserializer(format!(
                "{tag:?} is not a valid type tag"
            )));
        }
        let replaced = self.tables.write().set_deserializer(tag.clone(), deserializer);
        debug!(tag = %tag, replaced, "Registered deserializer");
        Ok(())
    }

    /// Register or replace the serializer for `tag`.
    pub fn register_serializer(
        &self,
        tag: impl Into<TypeTag>,
        serializer: impl Fn(&Value) -> Result<Reply, SerializeError> + Send + Sync + 'static,
    ) -> Result<(), RegistrationError> {
        let tag = self.check_serializer_tag(tag.into())?;
        let replaced = self.tables.write().set_plain_serializer(tag.clone(), serializer);
        debug!(tag = %tag, replaced, "Registered serializer");
        Ok(())
    }

    /// Register or replace a serializer that also sees the message context.
    pub fn register_contextual_serializer(
        &self,
        tag: impl Into<TypeTag>,
        serializer: impl Fn(&Value, &dyn MessageContext) -> Result<Reply, SerializeError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), RegistrationError> {
        let tag = self.check_serializer_tag(tag.into())?;
        let replaced = self
            .tables
            .write()
            .serializers
            .insert(tag.clone(), SerializerFn::Contextual(Arc::new(serializer)))
            .is_some();
        debug!(tag = %tag, replaced, "Registered contextual serializer");
        Ok(())
    }

    fn check_serializer_tag(&self, tag: TypeTag) -> Result<TypeTag, RegistrationError> {
        if !tag.is_well_formed() {
            return Err(RegistrationError::InvalidSerializer(format!(
                "{tag:?} is not a valid type tag"
            )));
        }
        if tag.is_reply_kind() {
            return Err(RegistrationError::InvalidSerializer(format!(
                "{tag} values are sent as they are and cannot have a serializer"
            )));
        }
        Ok(tag)
    }

    /// Register `tag` as an enum over `members`. A token converts to the
    /// member whose name it equals, ignoring case.
    pub fn register_enum<I, S>(&self, tag: impl Into<TypeTag>, members: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tag = tag.into();
        if !tag.is_well_formed() || tag.is_array() {
            return Err(RegistrationError::InvalidDeserializer(format!(
                "{tag:?} is not a valid enum tag"
            )));
        }
        let members: Arc<[String]> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(RegistrationError::InvalidDeserializer(format!(
                "enum {tag} has no members"
            )));
        }
        if let Some(bad) = members
            .iter()
            .find(|m| m.is_empty() || m.chars().any(char::is_whitespace))
        {
            return Err(RegistrationError::InvalidDeserializer(format!(
                "enum member {bad:?} of {tag} can never match a single token"
            )));
        }
        debug!(tag = %tag, members = members.len(), "Registered enum");
        self.tables.write().enums.insert(tag, members);
        Ok(())
    }

    /// Members of an enum tag, in registration order.
    pub fn enum_members(&self, tag: &TypeTag) -> Option<Vec<String>> {
        self.tables.read().enums.get(tag).map(|m| m.to_vec())
    }

    /// Whether `tag` can be deserialized: registered, an enum, or an array
    /// over a registered tag or enum.
    pub fn can_deserialize(&self, tag: &TypeTag) -> bool {
        let tables = self.tables.read();
        tables.scalar_known(tag)
            || tag
                .element()
                .is_some_and(|element| tables.scalar_known(&element))
    }

    pub fn has_serializer(&self, tag: &TypeTag) -> bool {
        self.tables.read().serializers.contains_key(tag)
    }

    fn route(&self, tag: &TypeTag) -> Route {
        let tables = self.tables.read();
        if let Some(d) = tables.deserializers.get(tag) {
            return Route::Direct(Arc::clone(d));
        }
        if let Some(members) = tables.enums.get(tag) {
            return Route::Enum(Arc::clone(members));
        }
        match tag.element() {
            Some(element) => Route::Array(element),
            None => Route::Missing,
        }
    }

    /// Convert the front of `tokens` as `tag`.
    pub fn deserialize(
        &self,
        tag: &TypeTag,
        tokens: &[String],
        max_tokens: usize,
        restriction: Option<&Restriction>,
    ) -> Result<Converted, ConvertError> {
        if tokens.is_empty() {
            return Err(DeserializeError::new("Nothing left to read.").into());
        }
        let max_tokens = max_tokens.max(1);
        match self.route(tag) {
            Route::Direct(d) => {
                let converted = d.deserialize(tokens, max_tokens, restriction)?;
                if converted.consumed == 0 || converted.consumed > tokens.len() {
                    return Err(ConvertError::Contract {
                        tag: tag.clone(),
                        consumed: converted.consumed,
                        available: tokens.len(),
                    });
                }
                Ok(converted)
            }
            Route::Enum(members) => choose(tag, &members, &tokens[0]),
            Route::Array(element) => self.derive_array(&element, tokens, max_tokens, restriction),
            Route::Missing => Err(DeserializeError::new(format!("No converter for type {tag}.")).into()),
        }
    }

    /// Convert up to `max_tokens` elements, feeding each element converter at
    /// most one token.
    fn derive_array(
        &self,
        element: &TypeTag,
        tokens: &[String],
        max_tokens: usize,
        restriction: Option<&Restriction>,
    ) -> Result<Converted, ConvertError> {
        let limit = tokens.len().min(max_tokens);
        let mut values = Vec::with_capacity(limit);
        let mut pos = 0;
        while values.len() < limit && pos < tokens.len() {
            let converted = self.deserialize(element, &tokens[pos..], 1, restriction)?;
            pos += converted.consumed;
            values.push(converted.value);
        }
        Ok(Converted {
            value: Value::List(values),
            consumed: pos,
        })
    }

    /// Render `value`, declared as `tag`, as a reply. Tags without a
    /// serializer fall back to the value's text form.
    pub fn serialize(
        &self,
        value: &Value,
        tag: &TypeTag,
        ctx: &dyn MessageContext,
    ) -> Result<Reply, SerializeError> {
        let serializer = self.tables.read().serializers.get(tag).cloned();
        match serializer {
            Some(SerializerFn::Plain(s)) => s(value),
            Some(SerializerFn::Contextual(s)) => s(value, ctx),
            None => Ok(Reply::Text(value.to_string())),
        }
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn choose(tag: &TypeTag, members: &[String], token: &str) -> Result<Converted, ConvertError> {
    let wanted = token.to_lowercase();
    members
        .iter()
        .position(|m| m.to_lowercase() == wanted)
        .map(|index| {
            Converted::single(Value::Choice(Choice::new(
                tag.clone(),
                index,
                members[index].clone(),
            )))
        })
        .ok_or_else(|| DeserializeError::new(format!("{token} is an invalid choice")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Scope;
    use botcmd_proto::tokenize;
    use std::any::Any;

    struct Ctx;

    fn constant(value: Value, consumed: usize) -> impl Deserializer {
        move |_t: &[String], _m: usize, _r: Option<&Restriction>| -> Result<Converted, ConvertError> {
            Ok(Converted {
                value: value.clone(),
                consumed,
            })
        }
    }

    impl MessageContext for Ctx {
        fn author(&self) -> &str {
            "tester"
        }
        fn scope(&self) -> Scope {
            Scope::Shared
        }
        fn text(&self) -> &str {
            ""
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_derived_array_respects_limit() {
        let registry = ConversionRegistry::new();
        let tokens = tokenize("1 2 3 4 5");
        let out = registry
            .deserialize(&TypeTag::INT.array(), &tokens, 3, None)
            .unwrap();
        assert_eq!(out.consumed, 3);
        assert_eq!(out.value, Value::from(vec![1, 2, 3]));

        let out = registry
            .deserialize(&TypeTag::INT.array(), &tokens, usize::MAX, None)
            .unwrap();
        assert_eq!(out.consumed, 5);
    }

    #[test]
    fn test_derived_array_stops_on_bad_element() {
        let registry = ConversionRegistry::new();
        let err = registry
            .deserialize(&TypeTag::INT.array(), &tokenize("1 two 3"), usize::MAX, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Can't convert two to a number.");
    }

    #[test]
    fn test_enum_lookup() {
        let registry = ConversionRegistry::new();
        registry
            .register_enum("color", ["Red", "Green", "Blue"])
            .unwrap();
        let color = TypeTag::from("color");

        let out = registry
            .deserialize(&color, &tokenize("GREEN"), 1, None)
            .unwrap();
        match out.value {
            Value::Choice(c) => {
                assert_eq!(c.index(), 1);
                assert_eq!(c.name(), "Green");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = registry
            .deserialize(&color, &tokenize("purple"), 1, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "purple is an invalid choice");

        let out = registry
            .deserialize(&color.array(), &tokenize("red blue"), usize::MAX, None)
            .unwrap();
        assert_eq!(out.consumed, 2);
        assert!(registry.can_deserialize(&color.array()));
    }

    #[test]
    fn test_enum_rejects_bad_members() {
        let registry = ConversionRegistry::new();
        assert!(registry.register_enum("e", Vec::<String>::new()).is_err());
        assert!(registry.register_enum("e", ["a b"]).is_err());
        assert!(registry.register_enum("e[]", ["a"]).is_err());
    }

    #[test]
    fn test_contract_violation() {
        let registry = ConversionRegistry::new();
        registry
            .register_deserializer("lazy", constant(Value::Bool(true), 0))
            .unwrap();
        let err = registry
            .deserialize(&TypeTag::from("lazy"), &tokenize("x"), 1, None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Contract { consumed: 0, available: 1, .. }));
    }

    #[test]
    fn test_missing_converter() {
        let registry = ConversionRegistry::new();
        let tag = TypeTag::from("user");
        assert!(!registry.can_deserialize(&tag));
        assert!(!registry.can_deserialize(&tag.array()));
        let err = registry
            .deserialize(&tag, &tokenize("bob"), 1, None)
            .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "No converter for type user.");
    }

    #[test]
    fn test_serializer_registration_rules() {
        let registry = ConversionRegistry::new();
        assert!(matches!(
            registry.register_serializer(TypeTag::RICH, |v: &Value| Ok(Reply::Text(v.to_string()))),
            Err(RegistrationError::InvalidSerializer(_))
        ));
        assert!(matches!(
            registry.register_serializer("bad tag", |v: &Value| Ok(Reply::Text(v.to_string()))),
            Err(RegistrationError::InvalidSerializer(_))
        ));
        assert!(matches!(
            registry.register_deserializer("", constant(Value::Int(0), 1)),
            Err(RegistrationError::InvalidDeserializer(_))
        ));
    }

    #[test]
    fn test_serialize_fallback_and_context() {
        let registry = ConversionRegistry::new();
        let reply = registry
            .serialize(&Value::Int(42), &TypeTag::from("answer"), &Ctx)
            .unwrap();
        assert_eq!(reply, Reply::text("42"));

        registry
            .register_contextual_serializer("greeting", |v: &Value, ctx: &dyn MessageContext| {
                Ok(Reply::Text(format!("{v}, {}", ctx.author())))
            })
            .unwrap();
        let reply = registry
            .serialize(&Value::from("hello"), &TypeTag::from("greeting"), &Ctx)
            .unwrap();
        assert_eq!(reply, Reply::text("hello, tester"));
    }

    #[test]
    fn test_override_builtin() {
        let registry = ConversionRegistry::new();
        registry
            .register_deserializer(TypeTag::INT, constant(Value::Int(7), 1))
            .unwrap();
        let out = registry
            .deserialize(&TypeTag::INT, &tokenize("1"), 1, None)
            .unwrap();
        assert_eq!(out.value, Value::Int(7));
    }
}
