//! Human-readable command summaries, paginated.
//!
//! Every registered command contributes one [`HelpEntry`]. Entries are kept
//! sorted by key (name plus a scope suffix) and split into pages by a
//! character budget, so a page fits a single rich reply.

mod commands;

pub use commands::HelpCommands;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use botcmd_proto::normalize_name;
use parking_lot::RwLock;

use crate::command::{CommandScope, CommandSpec, ReplyTarget};
use crate::convert::RichPayload;

/// One command's help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    key: String,
    title: String,
    body: String,
}

impl HelpEntry {
    /// Render the entry for `spec`, bound under `names` (primary first).
    pub fn render(spec: &CommandSpec, names: &[String], prefix: &str, mention: Option<&str>) -> Self {
        let primary = names
            .first()
            .cloned()
            .unwrap_or_else(|| normalize_name(spec.name()));

        let key = match spec.scope() {
            CommandScope::SharedOnly => format!("{primary} server"),
            CommandScope::PrivateOnly => format!("{primary} dm"),
            CommandScope::Both => primary.clone(),
        };

        let title = match mention {
            Some(mention) => format!("{mention} **{prefix}{primary}**"),
            None => format!("**{prefix}{primary}**"),
        };

        let mut lines = Vec::new();
        if !spec.usage().is_empty() {
            lines.push(format!("**Usage:** {prefix}{}", spec.usage()));
        }
        if !spec.description().is_empty() {
            lines.push(spec.description().to_string());
        }
        lines.push(format!("**Usable in:** {}", usable_in(spec.scope())));
        if names.len() >= 2 {
            lines.push(format!("**Aliases:** {}", names.join(", ")));
        }
        if let Some(location) = responds_in(spec.reply_target()) {
            lines.push(format!("**Bot will respond in:** {location}"));
        }
        if let Some(capability) = spec.capability() {
            lines.push(format!("**Requires permission:** {capability}"));
        }
        lines.push("---".to_string());

        Self {
            key,
            title,
            body: lines.join("\n"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Characters this entry takes on a page.
    pub fn size(&self) -> usize {
        self.title.chars().count() + self.body.chars().count()
    }
}

fn usable_in(scope: CommandScope) -> &'static str {
    match scope {
        CommandScope::PrivateOnly => "Direct messages only",
        CommandScope::SharedOnly => "Shared channels only",
        CommandScope::Both => "Shared channels and direct messages",
    }
}

fn responds_in(target: &ReplyTarget) -> Option<String> {
    match target {
        ReplyTarget::Source => Some("The channel the command was used in".to_string()),
        ReplyTarget::General => Some("The general channel".to_string()),
        ReplyTarget::Direct => Some("A direct message to you".to_string()),
        ReplyTarget::Channel(channel) => Some(format!("The {channel} channel")),
        ReplyTarget::Reaction => Some("A reaction to your message".to_string()),
        ReplyTarget::None => None,
    }
}

struct HelpState {
    title: String,
    description: String,
    page_budget: usize,
    entries: BTreeMap<String, Arc<HelpEntry>>,
    by_name: HashMap<String, Vec<Arc<HelpEntry>>>,
    /// Key of the first entry on each page.
    page_starts: Vec<String>,
}

impl HelpState {
    fn repaginate(&mut self) {
        let widest = self.entries.len().max(1);
        let footer = format!("Page {widest} of {widest}");
        let header = self.title.chars().count()
            + self.description.chars().count()
            + footer.chars().count();
        let budget = self.page_budget.saturating_sub(header);

        self.page_starts.clear();
        let mut room: Option<usize> = None;
        for (key, entry) in &self.entries {
            let size = entry.size();
            room = match room {
                Some(left) if left >= size => Some(left - size),
                _ => {
                    self.page_starts.push(key.clone());
                    Some(budget.saturating_sub(size))
                }
            };
        }
    }
}

/// Sorted, paginated help entries.
pub struct HelpIndex {
    state: RwLock<HelpState>,
}

impl HelpIndex {
    /// Characters per page before the header is taken out.
    pub const DEFAULT_PAGE_BUDGET: usize = 750;

    pub fn new(title: impl Into<String>) -> Self {
        Self::with_page_budget(title, Self::DEFAULT_PAGE_BUDGET)
    }

    pub fn with_page_budget(title: impl Into<String>, page_budget: usize) -> Self {
        Self {
            state: RwLock::new(HelpState {
                title: title.into(),
                description: String::new(),
                page_budget,
                entries: BTreeMap::new(),
                by_name: HashMap::new(),
                page_starts: Vec::new(),
            }),
        }
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    pub fn description(&self) -> String {
        self.state.read().description.clone()
    }

    /// Change the text shown under the title on every page.
    pub fn set_description(&self, description: impl Into<String>) {
        let mut state = self.state.write();
        state.description = description.into();
        state.repaginate();
    }

    /// Add the entry for a freshly registered command.
    pub fn add(&self, spec: &CommandSpec, names: &[String], prefix: &str, mention: Option<&str>) {
        let entry = Arc::new(HelpEntry::render(spec, names, prefix, mention));
        let mut state = self.state.write();
        for name in names {
            state
                .by_name
                .entry(name.clone())
                .or_default()
                .push(Arc::clone(&entry));
        }
        state.entries.insert(entry.key.clone(), entry);
        state.repaginate();
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.state.read().page_starts.len()
    }

    /// Render page `page` (1-based).
    pub fn page(&self, page: i64) -> RichPayload {
        let state = self.state.read();
        let total = state.page_starts.len();
        let mut payload = RichPayload::new(state.title.clone())
            .with_description(state.description.clone())
            .with_footer(format!("Page {page} of {total}"));

        if page <= 0 {
            return payload.with_field(
                "Not far enough.",
                "Negative and zero pages do not exist. Please try again with a positive number.",
            );
        }
        let index = usize::try_from(page - 1).unwrap_or(usize::MAX);
        let Some(start) = state.page_starts.get(index) else {
            return payload.with_field(
                "Too far.",
                format!("There are only {total} pages. Please try again with a smaller number."),
            );
        };
        let end = state.page_starts.get(index + 1);
        for (key, entry) in state.entries.range(start.clone()..) {
            if Some(key) == end {
                break;
            }
            payload = payload.with_field(entry.title.clone(), entry.body.clone());
        }
        payload
    }

    /// Entries registered under `name` or one of its aliases.
    pub fn lookup(&self, name: &str) -> Vec<Arc<HelpEntry>> {
        self.state
            .read()
            .by_name
            .get(&normalize_name(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Render the help for one command.
    pub fn describe(&self, name: &str) -> RichPayload {
        let entries = self.lookup(name);
        let mut payload = RichPayload::new(format!("{}: {}", self.title(), normalize_name(name)));
        if entries.is_empty() {
            return payload.with_field(
                "No such command.",
                format!("There is no command called {name}."),
            );
        }
        for entry in entries {
            payload = payload.with_field(entry.title.clone(), entry.body.clone());
        }
        payload
    }
}
