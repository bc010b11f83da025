//! Line dispatch.
//!
//! The `Dispatcher` owns the conversion tables, the command registry and the
//! optional help index. [`Dispatcher::handle`] runs one line to completion:
//! prefix and mention checks, command lookup, capability check, argument
//! conversion, handler call and reply routing.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use botcmd_proto::{TokenCursor, normalize_name, tokenize};
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::command::{
    Arguments, CommandRegistry, CommandSource, CommandSpec, Invocation, MentionSetting, Output,
    Registered, ReplyTarget, Returns,
};
use crate::config::Config;
use crate::convert::{ConversionRegistry, ConvertOptions, Reply};
use crate::error::{ConvertError, DefinitionError, RegistrationError};
use crate::help::{HelpCommands, HelpIndex};
use crate::metrics;
use crate::telemetry::{CommandTimer, spans};
use crate::transport::{ChannelRef, MessageContext, Transport};

/// How many causes of a handler error are shown to the user.
const MAX_REPORTED_CAUSES: usize = 4;

/// Why a line reached no command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoPrefix,
    Empty,
    UnknownCommand,
    MentionRequired,
}

impl IgnoreReason {
    /// Get a static label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            Self::NoPrefix => "no_prefix",
            Self::Empty => "empty",
            Self::UnknownCommand => "unknown_command",
            Self::MentionRequired => "mention_required",
        }
    }
}

/// What happened to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command. Nothing was sent.
    Ignored(IgnoreReason),
    /// The caller lacks the command's capability. A denial was sent.
    Denied,
    /// A required parameter was missing. The usage line was sent.
    Usage,
    /// Parameter `index` (1-based) failed to convert. The reason was sent.
    InvalidParameter { index: usize },
    /// The handler failed. A diagnostic report was sent.
    Failed,
    /// The handler ran and its result, if any, was delivered.
    Completed,
}

#[derive(Debug, Clone)]
struct Settings {
    prefix: String,
    mention: MentionSetting,
}

/// Turns incoming lines into handler calls.
pub struct Dispatcher {
    conversions: ConversionRegistry,
    commands: CommandRegistry,
    help: Option<Arc<HelpIndex>>,
    settings: RwLock<Settings>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// A dispatcher with prefix `!`, no mention requirement and no help.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_conversions(transport, ConversionRegistry::new())
    }

    pub fn with_conversions(transport: Arc<dyn Transport>, conversions: ConversionRegistry) -> Self {
        Self {
            conversions,
            commands: CommandRegistry::new(),
            help: None,
            settings: RwLock::new(Settings {
                prefix: "!".to_string(),
                mention: MentionSetting::No,
            }),
            transport,
        }
    }

    /// Build a dispatcher from configuration, with help if enabled.
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Result<Self, RegistrationError> {
        let conversions = ConversionRegistry::with_options(ConvertOptions {
            char_drop_silently: config.conversion.char_drop_silently,
        });
        let words = conversions.bool_words();
        words.add_all(config.conversion.true_words.iter().map(|w| (w.as_str(), true)));
        words.add_all(config.conversion.false_words.iter().map(|w| (w.as_str(), false)));

        let dispatcher = Self::with_conversions(transport, conversions);
        dispatcher.set_prefix(&config.reader.prefix);
        dispatcher.set_mention_setting(config.reader.mention);

        if !config.reader.default_help {
            return Ok(dispatcher);
        }
        let index = HelpIndex::with_page_budget(
            format!("{} help", config.reader.name),
            config.reader.help_page_budget,
        );
        index.set_description(config.reader.help_description.as_str());
        dispatcher.with_help(Arc::new(index))
    }

    /// Attach a help index and register `help` and `helpwith`.
    ///
    /// Only commands registered after this call get help entries.
    pub fn with_help(mut self, index: Arc<HelpIndex>) -> Result<Self, RegistrationError> {
        self.help = Some(Arc::clone(&index));
        self.register(&HelpCommands::new(index))?;
        Ok(self)
    }

    pub fn conversions(&self) -> &ConversionRegistry {
        &self.conversions
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn help(&self) -> Option<&HelpIndex> {
        self.help.as_deref()
    }

    pub fn prefix(&self) -> String {
        self.settings.read().prefix.clone()
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.settings.write().prefix = prefix.into();
    }

    /// The mention requirement for commands that inherit it.
    pub fn mention_setting(&self) -> MentionSetting {
        self.settings.read().mention
    }

    /// Set the inherited mention requirement. `Default` is treated as `No`.
    pub fn set_mention_setting(&self, setting: MentionSetting) {
        self.settings.write().mention = match setting {
            MentionSetting::Default => MentionSetting::No,
            other => other,
        };
    }

    /// Change the text under the help title. No-op without help.
    pub fn set_help_description(&self, description: impl Into<String>) {
        if let Some(help) = &self.help {
            help.set_description(description);
        }
    }

    /// Handler invocations by command, most used first.
    pub fn usage_stats(&self) -> Vec<(String, u64)> {
        self.commands.usage_stats()
    }

    fn effective_mention(&self, command: &CommandSpec) -> MentionSetting {
        match command.mention() {
            MentionSetting::Default => self.mention_setting(),
            other => other,
        }
    }

    /// Register a source's converters, then each of its commands in order.
    ///
    /// Stops at the first failing command; those before it stay registered.
    pub fn register<S: CommandSource + ?Sized>(&self, source: &S) -> Result<&Self, RegistrationError> {
        source.register_converters(&self.conversions)?;
        for spec in source.commands() {
            self.register_command(spec)?;
        }
        Ok(self)
    }

    /// Register a single command.
    pub fn register_command(&self, spec: CommandSpec) -> Result<Registered, RegistrationError> {
        let registered = self.commands.register(spec, &self.conversions)?;
        if let Some(help) = &self.help {
            let mention = match self.effective_mention(&registered.command) {
                MentionSetting::Prefix => self.transport.mention_forms().into_iter().next(),
                _ => None,
            };
            help.add(
                &registered.command,
                &registered.names,
                &self.prefix(),
                mention.as_deref(),
            );
        }
        Ok(registered)
    }

    /// Strip a leading mention of the bot.
    fn strip_mention<'t>(&self, text: &'t str) -> (bool, &'t str) {
        for form in self.transport.mention_forms() {
            if !form.is_empty() {
                if let Some(rest) = text.strip_prefix(form.as_str()) {
                    return (true, rest.trim_start());
                }
            }
        }
        (false, text)
    }

    fn ignore(&self, reason: IgnoreReason) -> Result<Dispatch, DefinitionError> {
        debug!(reason = reason.label(), "Ignoring line");
        metrics::record_ignored(reason.label());
        Ok(Dispatch::Ignored(reason))
    }

    fn deliver(&self, ctx: &dyn MessageContext, channel: &ChannelRef, reply: &Reply) {
        let result = match reply {
            Reply::Reaction(reaction) => self.transport.react(ctx, reaction),
            other => self.transport.send(channel, other),
        };
        if let Err(e) = result {
            warn!(channel = %channel, kind = reply.kind(), error = %e, "Failed to deliver reply");
        }
    }

    fn say(&self, ctx: &dyn MessageContext, channel: &ChannelRef, text: String) {
        self.deliver(ctx, channel, &Reply::Text(text));
    }

    /// Handle one incoming line.
    ///
    /// User mistakes are answered and reported through the returned
    /// [`Dispatch`]. `Err` means a command or converter is broken.
    pub fn handle(&self, ctx: &dyn MessageContext) -> Result<Dispatch, DefinitionError> {
        let (mentioned, text) = self.strip_mention(ctx.text().trim());
        let prefix = self.prefix();
        let Some(body) = text.strip_prefix(prefix.as_str()) else {
            return self.ignore(IgnoreReason::NoPrefix);
        };

        let mut cursor = TokenCursor::new(tokenize(body));
        let Some(name) = cursor.next_token().map(normalize_name) else {
            return self.ignore(IgnoreReason::Empty);
        };
        let Some(command) = self.commands.lookup(ctx.scope(), &name) else {
            return self.ignore(IgnoreReason::UnknownCommand);
        };
        if self.effective_mention(&command) == MentionSetting::Prefix && !mentioned {
            return self.ignore(IgnoreReason::MentionRequired);
        }

        let span = spans::command(command.name(), ctx.author(), ctx.scope());
        let _enter = span.enter();
        let mut timer = CommandTimer::new(command.name(), ctx.scope());

        let channel = self.transport.resolve_reply_target(ctx, command.reply_target());

        if let Some(capability) = command.capability() {
            if !self.transport.has_capability(ctx, capability) {
                debug!(capability = %capability, "Capability missing");
                metrics::record_command_error(command.name(), "access_denied");
                self.say(
                    ctx,
                    &channel,
                    format!("You can't use this command because you don't have the {capability} permission."),
                );
                return Ok(Dispatch::Denied);
            }
        }

        let mut args = Vec::with_capacity(command.parameters().len());
        for (i, param) in command.parameters().iter().enumerate() {
            if cursor.is_empty() {
                match param.default_tokens() {
                    Some(tokens) => cursor.reset(tokens.to_vec()),
                    None => {
                        metrics::record_command_error(command.name(), "missing_parameter");
                        self.say(ctx, &channel, usage_line(&command));
                        return Ok(Dispatch::Usage);
                    }
                }
            }

            let converted = self.conversions.deserialize(
                param.tag(),
                cursor.remaining(),
                param.effective_combine().limit(),
                param.restriction(),
            );
            match converted {
                Ok(converted) => {
                    cursor.advance(converted.consumed);
                    args.push(converted.value);
                }
                Err(ConvertError::Invalid(e)) => {
                    metrics::record_command_error(command.name(), "invalid_parameter");
                    let mut message = format!("Parameter {} is invalid: {}", i + 1, e.message);
                    if e.show_usage && !command.usage().is_empty() {
                        message.push('\n');
                        message.push_str(&usage_line(&command));
                    }
                    self.say(ctx, &channel, message);
                    return Ok(Dispatch::InvalidParameter { index: i + 1 });
                }
                Err(source) => {
                    let err = DefinitionError::Conversion {
                        command: command.name().to_string(),
                        index: i + 1,
                        source,
                    };
                    return Err(self.definition_failure(ctx, &channel, &command, err));
                }
            }
        }
        if !cursor.is_empty() {
            debug!(extra = cursor.len(), "Ignoring trailing tokens");
        }
        timer.parsed();
        self.commands.record_use(command.name());

        let handler_channel = (*command.returns() == Returns::Nothing).then_some(&channel);
        let invocation = Invocation::new(
            &command,
            ctx,
            Arguments::new(args),
            handler_channel,
            self.transport.as_ref(),
        );
        let outcome = catch_unwind(AssertUnwindSafe(|| command.handler().call(&invocation)))
            .unwrap_or_else(|panic| Err(anyhow::anyhow!("handler panicked: {}", panic_message(&*panic))));

        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %format_args!("{err:#}"), "Command handler failed");
                metrics::record_command_error(command.name(), "handler_failed");
                self.say(ctx, &channel, diagnostic(&err));
                return Ok(Dispatch::Failed);
            }
        };

        let Some(output) = output else {
            return Ok(Dispatch::Completed);
        };
        if *command.reply_target() == ReplyTarget::None {
            debug!("Dropping result of command without a reply target");
            return Ok(Dispatch::Completed);
        }

        let reply = match (output, command.returns()) {
            (Output::Reply(reply), _) => reply,
            (Output::Value(value), Returns::Value(tag)) => {
                match self.conversions.serialize(&value, tag, ctx) {
                    Ok(reply) => reply,
                    Err(source) => {
                        let err = DefinitionError::Serialization {
                            command: command.name().to_string(),
                            source,
                        };
                        return Err(self.definition_failure(ctx, &channel, &command, err));
                    }
                }
            }
            (Output::Value(value), _) => Reply::Text(value.to_string()),
        };
        self.deliver(ctx, &channel, &reply);
        Ok(Dispatch::Completed)
    }

    fn definition_failure(
        &self,
        ctx: &dyn MessageContext,
        channel: &ChannelRef,
        command: &CommandSpec,
        err: DefinitionError,
    ) -> DefinitionError {
        error!(error = %err, code = err.error_code(), "Command definition error");
        metrics::record_command_error(command.name(), err.error_code());
        self.say(
            ctx,
            channel,
            format!(
                "The {} command is misconfigured. The problem has been logged.",
                command.name()
            ),
        );
        err
    }
}

fn usage_line(command: &CommandSpec) -> String {
    if command.usage().is_empty() {
        "Not enough parameters (no usage string provided)".to_string()
    } else {
        format!("Usage: {}", command.usage())
    }
}

/// The user-facing report of a failed handler.
fn diagnostic(err: &anyhow::Error) -> String {
    let mut report = format!("An error occurred. Have some details:\n{err}");
    for cause in err.chain().skip(1).take(MAX_REPORTED_CAUSES) {
        report.push_str("\n    caused by: ");
        report.push_str(&cause.to_string());
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
