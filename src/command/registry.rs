//! Command registry with private and shared namespaces.
//!
//! The `CommandRegistry` validates commands against the conversion tables,
//! binds their names and tracks per-command usage.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use botcmd_proto::{is_valid_name, normalize_name};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::{Combine, CommandScope, CommandSpec, Returns};
use crate::convert::ConversionRegistry;
use crate::error::RegistrationError;
use crate::transport::Scope;

/// A successful registration.
#[derive(Debug, Clone)]
pub struct Registered {
    pub command: Arc<CommandSpec>,
    /// Lowercased names actually bound, primary first.
    pub names: Vec<String>,
}

#[derive(Default)]
struct Namespaces {
    private: HashMap<String, Arc<CommandSpec>>,
    shared: HashMap<String, Arc<CommandSpec>>,
}

impl Namespaces {
    fn table(&self, scope: Scope) -> &HashMap<String, Arc<CommandSpec>> {
        match scope {
            Scope::Private => &self.private,
            Scope::Shared => &self.shared,
        }
    }

    fn table_mut(&mut self, scope: Scope) -> &mut HashMap<String, Arc<CommandSpec>> {
        match scope {
            Scope::Private => &mut self.private,
            Scope::Shared => &mut self.shared,
        }
    }

    /// The command already holding `name` in any namespace `scope` covers.
    fn owner(&self, scope: CommandScope, name: &str) -> Option<&Arc<CommandSpec>> {
        scope
            .scopes()
            .iter()
            .find_map(|&s| self.table(s).get(name))
    }

    fn bind(&mut self, scope: CommandScope, name: &str, command: &Arc<CommandSpec>) {
        for &s in scope.scopes() {
            self.table_mut(s).insert(name.to_string(), Arc::clone(command));
        }
    }
}

/// Name to command maps, one per [`Scope`].
pub struct CommandRegistry {
    namespaces: RwLock<Namespaces>,
    /// Handler invocation counts by primary name. Denied lines and lines
    /// with bad arguments are not counted.
    usage: DashMap<String, AtomicU64>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(Namespaces::default()),
            usage: DashMap::new(),
        }
    }

    /// Validate `spec` and bind its names.
    ///
    /// A conflict on the primary name rejects the whole command. Aliases that
    /// are malformed or taken are skipped with a warning.
    pub fn register(
        &self,
        spec: CommandSpec,
        conversions: &ConversionRegistry,
    ) -> Result<Registered, RegistrationError> {
        validate(&spec, conversions)?;

        let primary = normalize_name(spec.name());
        if !is_valid_name(&primary) {
            return Err(RegistrationError::invalid_command(
                spec.name(),
                "names may only contain letters, digits, underscores and hyphens",
            ));
        }

        let mut namespaces = self.namespaces.write();
        if let Some(owner) = namespaces.owner(spec.scope(), &primary) {
            return Err(RegistrationError::NameConflict {
                name: primary,
                owner: owner.name().to_string(),
            });
        }

        let scope = spec.scope();
        let aliases: Vec<String> = spec.aliases().iter().map(|a| normalize_name(a)).collect();
        let command = Arc::new(spec);
        namespaces.bind(scope, &primary, &command);
        let mut names = vec![primary.clone()];

        for alias in aliases {
            if !is_valid_name(&alias) {
                warn!(command = %primary, alias = %alias, "Skipping malformed alias");
                continue;
            }
            if let Some(owner) = namespaces.owner(scope, &alias) {
                warn!(command = %primary, alias = %alias, owner = %owner.name(), "Skipping alias already in use");
                continue;
            }
            namespaces.bind(scope, &alias, &command);
            names.push(alias);
        }
        drop(namespaces);

        self.usage.entry(primary.clone()).or_default();
        info!(command = %primary, names = ?names, scope = ?scope, "Registered command");
        Ok(Registered { command, names })
    }

    /// Find a command by name or alias, ignoring case.
    pub fn lookup(&self, scope: Scope, name: &str) -> Option<Arc<CommandSpec>> {
        self.namespaces
            .read()
            .table(scope)
            .get(&normalize_name(name))
            .cloned()
    }

    /// Every registered command once, sorted by primary name.
    pub fn commands(&self) -> Vec<Arc<CommandSpec>> {
        let namespaces = self.namespaces.read();
        let mut seen: Vec<Arc<CommandSpec>> = Vec::new();
        for command in namespaces.private.values().chain(namespaces.shared.values()) {
            if !seen.iter().any(|c| Arc::ptr_eq(c, command)) {
                seen.push(Arc::clone(command));
            }
        }
        seen.sort_by(|a, b| a.name().cmp(b.name()));
        seen
    }

    /// Bound names in one namespace, sorted.
    pub fn names(&self, scope: Scope) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.read().table(scope).keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn record_use(&self, command: &str) {
        let key = normalize_name(command);
        if let Some(count) = self.usage.get(&key) {
            count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.usage.entry(key).or_default().fetch_add(1, Ordering::Relaxed);
    }

    /// Invocation counts of commands invoked at least once, most used first.
    pub fn usage_stats(&self) -> Vec<(String, u64)> {
        let mut stats: Vec<_> = self
            .usage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a command's parameters and return type against the conversion
/// tables, and convert its defaults.
fn validate(spec: &CommandSpec, conversions: &ConversionRegistry) -> Result<(), RegistrationError> {
    let name = spec.name();
    let parameters = spec.parameters();

    for (i, param) in parameters.iter().enumerate() {
        if !conversions.can_deserialize(param.tag()) {
            return Err(RegistrationError::invalid_command(
                name,
                format!("parameter {} has type {}, which has no converter", i + 1, param.tag()),
            ));
        }
    }

    match spec.returns() {
        Returns::Nothing | Returns::Reply => {}
        Returns::Value(tag) if tag.is_reply_kind() => {
            return Err(RegistrationError::invalid_command(
                name,
                format!("{tag} results are replies; declare Returns::Reply instead"),
            ));
        }
        Returns::Value(tag) if !conversions.has_serializer(tag) => {
            return Err(RegistrationError::invalid_command(
                name,
                format!("return type {tag} has no serializer"),
            ));
        }
        Returns::Value(_) => {}
    }

    if let Some((i, _)) = parameters
        .iter()
        .enumerate()
        .rev()
        .skip(1)
        .find(|(_, p)| p.effective_combine() == Combine::Unbounded)
    {
        return Err(RegistrationError::invalid_command(
            name,
            format!(
                "parameter {} takes all remaining input but is not the last parameter",
                i + 1
            ),
        ));
    }

    for (i, param) in parameters.iter().enumerate() {
        if let Some(tokens) = param.default_tokens() {
            conversions
                .deserialize(
                    param.tag(),
                    tokens,
                    param.effective_combine().limit(),
                    param.restriction(),
                )
                .map_err(|source| RegistrationError::InvalidDefault {
                    command: name.to_string(),
                    index: i + 1,
                    source,
                })?;
        }
    }

    Ok(())
}
