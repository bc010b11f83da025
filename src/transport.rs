//! The seam between the dispatcher and a chat transport.
//!
//! The dispatcher never talks to a network. It reads incoming lines through
//! [`MessageContext`] and sends everything through [`Transport`].

use std::any::Any;
use std::fmt;

use crate::command::{Capability, ReplyTarget};
use crate::convert::Reply;

/// Where an incoming message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A one-to-one conversation with the bot.
    Private,
    /// A channel shared by several users.
    Shared,
}

impl Scope {
    /// Get a static label for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming line and who sent it.
pub trait MessageContext: Send + Sync {
    fn author(&self) -> &str;

    fn scope(&self) -> Scope;

    /// The raw text of the message.
    fn text(&self) -> &str;

    /// Access to the transport's own message type.
    fn as_any(&self) -> &dyn Any;
}

/// An opaque destination resolved by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef(pub String);

impl ChannelRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound side of a chat connection.
pub trait Transport: Send + Sync {
    /// Ways a message can address the bot at its start, e.g. `@bot`.
    fn mention_forms(&self) -> Vec<String>;

    /// Resolve a reply policy for `ctx` to a channel.
    ///
    /// `General` and `Channel` fall back to the source channel when the
    /// transport has no such channel. `Source`, `None` and `Reaction` resolve
    /// to the source channel, which is also where errors are sent.
    fn resolve_reply_target(&self, ctx: &dyn MessageContext, target: &ReplyTarget) -> ChannelRef;

    fn has_capability(&self, ctx: &dyn MessageContext, capability: &Capability) -> bool;

    /// Send a text or rich reply.
    fn send(&self, channel: &ChannelRef, reply: &Reply) -> anyhow::Result<()>;

    /// React to the message in `ctx`.
    fn react(&self, ctx: &dyn MessageContext, reaction: &str) -> anyhow::Result<()>;
}
