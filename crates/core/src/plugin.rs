//! Statement shapes and the registry that maps them to handlers.
//!
//! A [`PluginKey`] is the canonical identity of a custom statement: its
//! optional open/connect clause, the set of parameters it is sent, and the
//! fixed phrase that names it. A [`Plugin`] groups related statements under a
//! name; a [`Registry`] merges plugins and is immutable once built.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::{PluginError, RegistryError};

/// What a handler settles with: the value to store under the statement's
/// output variable, or the failure that aborts execution.
pub type PluginResult = Result<serde_json::Value, PluginError>;

// ──────────────────────────────────────────────
// PluginKey
// ──────────────────────────────────────────────

/// The leading resource clause of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum OpenConnect {
    #[default]
    None,
    /// `open '<ident>' and`
    Open,
    /// `connect to '<ident>' and`
    Connect,
}

impl OpenConnect {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            OpenConnect::None => None,
            OpenConnect::Open => Some("open"),
            OpenConnect::Connect => Some("connect"),
        }
    }
}

/// Canonical identity of a registered statement shape.
///
/// Two keys are equal iff clause, parameter set (order-independent) and
/// phrase words are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginKey {
    pub open_connect: OpenConnect,
    pub params: BTreeSet<String>,
    pub phrase: Vec<String>,
}

impl PluginKey {
    /// Validate and build a key.
    ///
    /// The phrase and each parameter name must consist of lowercase ASCII
    /// alphanumerics, `_` or `-`; phrase words are separated by exactly one
    /// space.
    pub fn new(
        open_connect: OpenConnect,
        params: &[&str],
        phrase: &str,
    ) -> Result<Self, RegistryError> {
        check_words(phrase).map_err(|reason| RegistryError::InvalidPhrase {
            phrase: phrase.to_string(),
            reason,
        })?;
        for param in params {
            check_words(param)
                .and_then(|()| {
                    if param.contains(' ') {
                        Err("must be a single word".to_string())
                    } else {
                        Ok(())
                    }
                })
                .map_err(|reason| RegistryError::InvalidParam {
                    param: param.to_string(),
                    reason,
                })?;
        }

        let mut set = BTreeSet::new();
        for param in params {
            if !set.insert(param.to_string()) {
                return Err(RegistryError::InvalidParam {
                    param: param.to_string(),
                    reason: "listed more than once".to_string(),
                });
            }
        }

        Ok(PluginKey {
            open_connect,
            params: set,
            phrase: phrase.split(' ').map(str::to_string).collect(),
        })
    }

    pub fn phrase(&self) -> String {
        self.phrase.join(" ")
    }
}

/// Renders the key in the statement surface grammar, with empty identifiers.
impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.open_connect {
            OpenConnect::None => {}
            OpenConnect::Open => write!(f, "open '' and ")?,
            OpenConnect::Connect => write!(f, "connect to '' and ")?,
        }
        for param in &self.params {
            write!(f, "send {} '' and ", param)?;
        }
        write!(f, "{}", self.phrase())
    }
}

fn check_words(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Err("must not be empty".to_string());
    }
    if s.starts_with(' ') || s.ends_with(' ') {
        return Err("must not start or end with a space".to_string());
    }
    if s.contains("  ") {
        return Err("words must be separated by a single space".to_string());
    }
    if let Some(c) = s
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | ' '))
    {
        return Err(format!(
            "invalid character '{}' (only a-z, 0-9, '_' and '-' are allowed)",
            c
        ));
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Executor trait
// ──────────────────────────────────────────────

/// Handler behind a registered statement.
///
/// Any `Fn(ExecutionContext) -> impl Future<Output = PluginResult>` is an
/// executor, so plugins are usually registered as async closures.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext) -> PluginResult;
}

#[async_trait]
impl<F, Fut> Executor for F
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = PluginResult> + Send + 'static,
{
    async fn execute(&self, ctx: ExecutionContext) -> PluginResult {
        (self)(ctx).await
    }
}

// ──────────────────────────────────────────────
// Plugin
// ──────────────────────────────────────────────

/// A named group of statement shapes, e.g. all filesystem statements.
pub struct Plugin {
    name: String,
    statements: Vec<(PluginKey, Arc<dyn Executor>)>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Plugin {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a statement shape. Fails immediately on an invalid phrase or
    /// parameter name, or when the same key is already part of this plugin.
    pub fn register<E>(
        &mut self,
        open_connect: OpenConnect,
        params: &[&str],
        phrase: &str,
        executor: E,
    ) -> Result<&mut Self, RegistryError>
    where
        E: Executor + 'static,
    {
        let key = PluginKey::new(open_connect, params, phrase)?;
        if self.statements.iter().any(|(k, _)| *k == key) {
            return Err(RegistryError::DuplicatePlugin {
                key,
                plugin: self.name.clone(),
                existing: self.name.clone(),
            });
        }
        self.statements.push((key, Arc::new(executor)));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ──────────────────────────────────────────────
// Registry
// ──────────────────────────────────────────────

struct Entry {
    key: PluginKey,
    plugin: String,
    executor: Arc<dyn Executor>,
}

/// All statement shapes known to one execution session, in registration
/// order. Built once, then only read.
pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<PluginKey, usize>,
}

impl Registry {
    /// Merge plugins in order. Any key registered by two plugins is a
    /// [`RegistryError::DuplicatePlugin`] naming both.
    pub fn from_plugins(plugins: impl IntoIterator<Item = Plugin>) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        let mut index: HashMap<PluginKey, usize> = HashMap::new();

        for plugin in plugins {
            for (key, executor) in plugin.statements {
                if let Some(&existing) = index.get(&key) {
                    let existing: &Entry = &entries[existing];
                    return Err(RegistryError::DuplicatePlugin {
                        key,
                        plugin: plugin.name,
                        existing: existing.plugin.clone(),
                    });
                }
                index.insert(key.clone(), entries.len());
                entries.push(Entry {
                    key,
                    plugin: plugin.name.clone(),
                    executor,
                });
            }
        }

        Ok(Registry { entries, index })
    }

    /// Create an empty registry (no statements registered).
    pub fn empty() -> Self {
        Registry {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Exact-key lookup.
    pub fn lookup(&self, key: &PluginKey) -> Option<&Arc<dyn Executor>> {
        self.index.get(key).map(|&i| &self.entries[i].executor)
    }

    /// Name of the plugin that registered `key`.
    pub fn plugin_of(&self, key: &PluginKey) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].plugin.as_str())
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &PluginKey> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.key.to_string()))
            .finish()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
