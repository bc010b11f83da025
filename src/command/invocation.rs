//! What a handler receives and what it returns.

use std::any::Any;

use anyhow::anyhow;

use super::CommandSpec;
use crate::convert::{FromValue, Reply, RichPayload, Value};
use crate::error::ArgumentError;
use crate::transport::{ChannelRef, MessageContext, Transport};

/// A handler result awaiting delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Sent as is.
    Reply(Reply),
    /// Serialized through the command's declared return tag.
    Value(Value),
}

impl From<Reply> for Output {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

impl From<RichPayload> for Output {
    fn from(payload: RichPayload) -> Self {
        Self::Reply(Reply::Rich(payload))
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// `Ok(None)` when there is nothing to send.
pub type HandlerResult = anyhow::Result<Option<Output>>;

/// Return a reply from a handler.
pub fn reply(reply: impl Into<Reply>) -> HandlerResult {
    Ok(Some(Output::Reply(reply.into())))
}

/// Return a value from a handler, to be serialized.
pub fn value(value: impl Into<Value>) -> HandlerResult {
    Ok(Some(Output::Value(value.into())))
}

/// Command implementation.
pub trait Handler: Send + Sync {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync,
{
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        self(invocation)
    }
}

/// Converted arguments in parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Argument `index` converted to `T`.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self.0.get(index).ok_or(ArgumentError::Missing(index))?;
        T::from_value(value, index)
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Borrow an integrator-defined argument.
    pub fn object<T: Any>(&self, index: usize) -> Result<&T, ArgumentError> {
        let value = self.0.get(index).ok_or(ArgumentError::Missing(index))?;
        value.downcast_ref::<T>().ok_or(ArgumentError::Mismatch {
            index,
            expected: "object",
            found: value.kind(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }
}

/// One call of a handler.
pub struct Invocation<'a> {
    command: &'a CommandSpec,
    context: &'a dyn MessageContext,
    args: Arguments,
    reply_channel: Option<&'a ChannelRef>,
    transport: &'a dyn Transport,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        command: &'a CommandSpec,
        context: &'a dyn MessageContext,
        args: Arguments,
        reply_channel: Option<&'a ChannelRef>,
        transport: &'a dyn Transport,
    ) -> Self {
        Self {
            command,
            context,
            args,
            reply_channel,
            transport,
        }
    }

    pub fn command(&self) -> &CommandSpec {
        self.command
    }

    pub fn context(&self) -> &dyn MessageContext {
        self.context
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Shorthand for `self.args().get(index)`.
    pub fn arg<T: FromValue>(&self, index: usize) -> Result<T, ArgumentError> {
        self.args.get(index)
    }

    /// The resolved reply channel. Only commands returning nothing get one.
    pub fn reply_channel(&self) -> Option<&ChannelRef> {
        self.reply_channel
    }

    /// Send to the reply channel.
    pub fn send(&self, reply: impl Into<Reply>) -> anyhow::Result<()> {
        let channel = self.reply_channel.ok_or_else(|| {
            anyhow!(
                "command {} returns a value and has no reply channel",
                self.command.name()
            )
        })?;
        self.transport.send(channel, &reply.into())
    }

    /// React to the invoking message.
    pub fn react(&self, reaction: &str) -> anyhow::Result<()> {
        self.transport.react(self.context, reaction)
    }
}
