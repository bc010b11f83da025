//! Integration test common infrastructure.
//!
//! A transport that records everything the dispatcher sends, and a plain
//! message context.

#![allow(dead_code)]

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use botcmd::command::{Capability, ReplyTarget};
use botcmd::convert::Reply;
use botcmd::transport::{ChannelRef, MessageContext, Scope, Transport};
use botcmd::Dispatcher;
use parking_lot::Mutex;

/// A line from `author`.
pub struct TestMessage {
    pub author: String,
    pub scope: Scope,
    pub text: String,
}

impl TestMessage {
    pub fn shared(text: &str) -> Self {
        Self {
            author: "alice".to_string(),
            scope: Scope::Shared,
            text: text.to_string(),
        }
    }

    pub fn private(text: &str) -> Self {
        Self {
            scope: Scope::Private,
            ..Self::shared(text)
        }
    }
}

impl MessageContext for TestMessage {
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

/// Records sends and reactions instead of delivering them.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(String, Reply)>>,
    pub reactions: Mutex<Vec<String>>,
    pub capabilities: HashSet<String>,
}

impl RecordingTransport {
    pub fn with_capabilities(capabilities: &[&str]) -> Self {
        Self {
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Texts sent so far, rich replies rendered.
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, reply)| reply.to_string()).collect()
    }

    /// Channels sent to so far.
    pub fn channels(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(channel, _)| channel.clone()).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    pub fn is_silent(&self) -> bool {
        self.sent.lock().is_empty() && self.reactions.lock().is_empty()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        self.reactions.lock().clear();
    }
}

impl Transport for RecordingTransport {
    fn mention_forms(&self) -> Vec<String> {
        vec!["@bot".to_string()]
    }

    fn resolve_reply_target(&self, ctx: &dyn MessageContext, target: &ReplyTarget) -> ChannelRef {
        match target {
            ReplyTarget::General => ChannelRef::new("general"),
            ReplyTarget::Direct => ChannelRef::new(format!("dm:{}", ctx.author())),
            ReplyTarget::Channel(name) => ChannelRef::new(name.clone()),
            _ => ChannelRef::new("source"),
        }
    }

    fn has_capability(&self, _ctx: &dyn MessageContext, capability: &Capability) -> bool {
        self.capabilities.contains(capability.as_str())
    }

    fn send(&self, channel: &ChannelRef, reply: &Reply) -> anyhow::Result<()> {
        self.sent.lock().push((channel.to_string(), reply.clone()));
        Ok(())
    }

    fn react(&self, _ctx: &dyn MessageContext, reaction: &str) -> anyhow::Result<()> {
        self.reactions.lock().push(reaction.to_string());
        Ok(())
    }
}

/// A dispatcher over a fresh recording transport.
pub fn dispatcher() -> (Dispatcher, Arc<RecordingTransport>) {
    dispatcher_with(RecordingTransport::default())
}

pub fn dispatcher_with(transport: RecordingTransport) -> (Dispatcher, Arc<RecordingTransport>) {
    let transport = Arc::new(transport);
    let dispatcher = Dispatcher::new(Arc::clone(&transport) as Arc<dyn Transport>);
    (dispatcher, transport)
}
