//! Line-oriented console front end for the `botcmd` binary.

pub mod demo;

use std::any::Any;
use std::collections::HashSet;
use std::io::Write;

use anyhow::Context;
use botcmd::command::{Capability, ReplyTarget};
use botcmd::config::ConsoleConfig;
use botcmd::convert::Reply;
use botcmd::transport::{ChannelRef, MessageContext, Scope, Transport};

/// Prefix that turns a console line into a direct message.
const DIRECT_PREFIX: &str = "/dm ";

/// One line typed into the console.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    author: String,
    scope: Scope,
    text: String,
}

impl ConsoleMessage {
    /// Parse a console line. A leading `/dm ` makes it private.
    pub fn parse(author: &str, line: &str) -> Self {
        let (scope, text) = match line.strip_prefix(DIRECT_PREFIX) {
            Some(rest) => (Scope::Private, rest),
            None => (Scope::Shared, line),
        };
        Self {
            author: author.to_string(),
            scope,
            text: text.to_string(),
        }
    }
}

impl MessageContext for ConsoleMessage {
    fn author(&self) -> &str {
        &self.author
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Prints replies to stdout.
pub struct ConsoleTransport {
    name: String,
    capabilities: HashSet<String>,
}

impl ConsoleTransport {
    pub fn new(name: impl Into<String>, config: &ConsoleConfig) -> Self {
        Self {
            name: name.into(),
            capabilities: config.capabilities.iter().cloned().collect(),
        }
    }

    fn print(&self, line: std::fmt::Arguments<'_>) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_fmt(line)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush())
            .context("writing to stdout")
    }
}

impl Transport for ConsoleTransport {
    fn mention_forms(&self) -> Vec<String> {
        vec![format!("@{}", self.name), format!("{}:", self.name)]
    }

    fn resolve_reply_target(&self, ctx: &dyn MessageContext, target: &ReplyTarget) -> ChannelRef {
        match target {
            ReplyTarget::General => ChannelRef::new("general"),
            ReplyTarget::Direct => ChannelRef::new(format!("dm:{}", ctx.author())),
            ReplyTarget::Channel(name) => ChannelRef::new(name.clone()),
            ReplyTarget::Source | ReplyTarget::None | ReplyTarget::Reaction => match ctx.scope() {
                Scope::Private => ChannelRef::new(format!("dm:{}", ctx.author())),
                Scope::Shared => ChannelRef::new("general"),
            },
        }
    }

    fn has_capability(&self, _ctx: &dyn MessageContext, capability: &Capability) -> bool {
        self.capabilities.contains(capability.as_str())
    }

    fn send(&self, channel: &ChannelRef, reply: &Reply) -> anyhow::Result<()> {
        self.print(format_args!("[{channel}] {reply}"))
    }

    fn react(&self, _ctx: &dyn MessageContext, reaction: &str) -> anyhow::Result<()> {
        self.print(format_args!("({reaction})"))
    }
}
