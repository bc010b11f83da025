//! The built-in `help` and `helpwith` commands.

use std::sync::Arc;

use super::HelpIndex;
use crate::command::{CommandSource, CommandSpec, ParameterSpec, ReplyTarget, Returns, reply};
use crate::convert::TypeTag;

/// Command source serving a [`HelpIndex`].
pub struct HelpCommands {
    index: Arc<HelpIndex>,
}

impl HelpCommands {
    pub fn new(index: Arc<HelpIndex>) -> Self {
        Self { index }
    }
}

impl CommandSource for HelpCommands {
    fn commands(&self) -> Vec<CommandSpec> {
        let pages = Arc::clone(&self.index);
        let help = CommandSpec::builder("help")
            .usage("help [page]")
            .description("Lists the commands this bot understands, one page at a time.")
            .reply(ReplyTarget::Direct)
            .param(ParameterSpec::new(TypeTag::LONG).default_value("1").label("page"))
            .returns(Returns::Reply)
            .handler(move |inv| reply(pages.page(inv.arg::<i64>(0)?)));

        let entries = Arc::clone(&self.index);
        let helpwith = CommandSpec::builder("helpwith")
            .usage("helpwith <command>")
            .description("Shows the help for a single command.")
            .reply(ReplyTarget::Direct)
            .param(ParameterSpec::new(TypeTag::STRING).label("command"))
            .returns(Returns::Reply)
            .handler(move |inv| reply(entries.describe(&inv.arg::<String>(0)?)));

        vec![help, helpwith]
    }
}
