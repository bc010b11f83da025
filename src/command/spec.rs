//! Static command descriptions and their builder.

use std::fmt;
use std::sync::Arc;

use botcmd_proto::{Restriction, split_names};
use serde::Deserialize;

use super::invocation::{Handler, HandlerResult, Invocation};
use crate::convert::TypeTag;
use crate::transport::Scope;

/// Which namespaces a command is bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandScope {
    PrivateOnly,
    SharedOnly,
    #[default]
    Both,
}

impl CommandScope {
    /// The message scopes this command answers in.
    pub fn scopes(self) -> &'static [Scope] {
        match self {
            Self::PrivateOnly => &[Scope::Private],
            Self::SharedOnly => &[Scope::Shared],
            Self::Both => &[Scope::Private, Scope::Shared],
        }
    }

    pub fn includes(self, scope: Scope) -> bool {
        self.scopes().contains(&scope)
    }
}

/// Where a command's output goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ReplyTarget {
    /// The channel the command was called in.
    #[default]
    Source,
    /// The general channel of the group the command was called in.
    General,
    /// A direct conversation with the caller.
    Direct,
    /// A named channel.
    Channel(String),
    /// Nowhere. Results are dropped.
    None,
    /// A reaction on the invoking message.
    Reaction,
}

/// Whether a command must be preceded by a mention of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionSetting {
    /// Use the dispatcher's setting.
    #[default]
    Default,
    /// A mention is required.
    Prefix,
    /// No mention is required.
    No,
}

/// A named permission checked by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability(String);

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How many tokens a parameter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Count(usize),
    /// Everything that is left.
    Unbounded,
}

impl Combine {
    /// The token limit handed to the deserializer.
    pub fn limit(self) -> usize {
        match self {
            Self::Count(n) => n.max(1),
            Self::Unbounded => usize::MAX,
        }
    }
}

/// One positional parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    tag: TypeTag,
    combine: Option<Combine>,
    default: Option<Vec<String>>,
    restriction: Option<Arc<Restriction>>,
    label: Option<String>,
}

impl ParameterSpec {
    pub fn new(tag: impl Into<TypeTag>) -> Self {
        Self {
            tag: tag.into(),
            combine: None,
            default: None,
            restriction: None,
            label: None,
        }
    }

    /// Let the parameter use up to `count` tokens.
    pub fn combine(mut self, count: usize) -> Self {
        self.combine = Some(Combine::Count(count));
        self
    }

    /// Let the parameter use every remaining token.
    pub fn combine_all(mut self) -> Self {
        self.combine = Some(Combine::Unbounded);
        self
    }

    /// Make the parameter optional. `text` is split on single spaces and
    /// converted in place of missing input, so `""` is one empty token.
    pub fn default_value(mut self, text: &str) -> Self {
        self.default = Some(text.split(' ').map(str::to_string).collect());
        self
    }

    /// Attach a restriction expression.
    pub fn restrict(self, expression: impl Into<String>) -> Self {
        self.restrict_with(Restriction::new(expression))
    }

    /// Attach a restriction with its own failure message.
    pub fn restrict_with(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(Arc::new(restriction));
        self
    }

    /// Name shown in help and logs.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The type the tokens convert to.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Whether the tag names an array.
    pub fn is_array(&self) -> bool {
        self.tag.is_array()
    }

    /// The explicit combine count, else unbounded for arrays, else 1.
    pub fn effective_combine(&self) -> Combine {
        match self.combine {
            Some(combine) => combine,
            None if self.is_array() => Combine::Unbounded,
            None => Combine::Count(1),
        }
    }

    /// Tokens used when the line runs out.
    pub fn default_tokens(&self) -> Option<&[String]> {
        self.default.as_deref()
    }

    /// The restriction handed to the converter.
    pub fn restriction(&self) -> Option<&Restriction> {
        self.restriction.as_deref()
    }

    /// Display name for help and logs.
    pub fn label_text(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// What a handler hands back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Returns {
    /// Nothing. The handler gets the reply channel and sends on its own.
    #[default]
    Nothing,
    /// A [`Reply`](crate::convert::Reply), sent as is.
    Reply,
    /// A value serialized through the serializer for the tag.
    Value(TypeTag),
}

/// A complete command description.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    scope: CommandScope,
    reply: ReplyTarget,
    mention: MentionSetting,
    capability: Option<Capability>,
    usage: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    returns: Returns,
    handler: Arc<dyn Handler>,
}

impl CommandSpec {
    /// Start describing a command called `name`.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::new(),
            scope: CommandScope::default(),
            reply: ReplyTarget::default(),
            mention: MentionSetting::default(),
            capability: None,
            usage: String::new(),
            description: String::new(),
            parameters: Vec::new(),
            returns: Returns::default(),
        }
    }

    /// The primary name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extra names, excluding the primary one.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Where the command can be used.
    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    /// Where output and error replies go.
    pub fn reply_target(&self) -> &ReplyTarget {
        &self.reply
    }

    /// Mention requirement, possibly inherited.
    pub fn mention(&self) -> MentionSetting {
        self.mention
    }

    /// Permission the caller must hold.
    pub fn capability(&self) -> Option<&Capability> {
        self.capability.as_ref()
    }

    /// Usage line without the prefix. May be empty.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Help text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameters in the order they are read.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// What the handler hands back.
    pub fn returns(&self) -> &Returns {
        &self.returns
    }

    pub(crate) fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("scope", &self.scope)
            .field("reply", &self.reply)
            .field("mention", &self.mention)
            .field("capability", &self.capability)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandSpec`]. Supplying the handler finishes it.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    scope: CommandScope,
    reply: ReplyTarget,
    mention: MentionSetting,
    capability: Option<Capability>,
    usage: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    returns: Returns,
}

impl CommandBuilder {
    /// Add space-delimited aliases.
    pub fn aliases(mut self, names: &str) -> Self {
        self.aliases.extend(split_names(names).map(str::to_string));
        self
    }

    pub fn scope(mut self, scope: CommandScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn reply(mut self, target: ReplyTarget) -> Self {
        self.reply = target;
        self
    }

    pub fn mention(mut self, setting: MentionSetting) -> Self {
        self.mention = setting;
        self
    }

    pub fn capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn param(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, returns: Returns) -> Self {
        self.returns = returns;
        self
    }

    /// Finish with a closure handler.
    pub fn handler<F>(self, f: F) -> CommandSpec
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.handled_by(f)
    }

    /// Finish with any [`Handler`].
    pub fn handled_by(self, handler: impl Handler + 'static) -> CommandSpec {
        CommandSpec {
            name: self.name,
            aliases: self.aliases,
            scope: self.scope,
            reply: self.reply,
            mention: self.mention,
            capability: self.capability,
            usage: self.usage,
            description: self.description,
            parameters: self.parameters,
            returns: self.returns,
            handler: Arc::new(handler),
        }
    }
}
