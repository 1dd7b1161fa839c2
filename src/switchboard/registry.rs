//! The directory of available agents.
//!
//! [`AgentRegistry`] maps agent names to agents (last registration wins) and owns the ordered
//! keyword triggers used by [`AgentRegistry::find_agent_for_input`]. Triggers are evaluated in
//! a fixed sequence; the first registered agent whose trigger matches is returned even when a
//! later trigger would also match. When no specific trigger fires the `conversational` agent
//! is the fallback.
//!
//! ```rust
//! use switchboard::registry::AgentRegistry;
//!
//! let registry = AgentRegistry::new();
//! assert!(registry.find_agent_for_input("weather in Lima").is_none());
//! assert_eq!(registry.trigger_order(), vec!["weather", "research", "filesystem", "notes"]);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::switchboard::agent::Agent;

/// Agent used when no specific trigger matches.
pub const FALLBACK_AGENT: &str = "conversational";

const WEATHER_KEYWORDS: &[&str] = &["weather", "forecast", "temperature", "conditions"];
const RESEARCH_KEYWORDS: &[&str] = &[
    "search",
    "find",
    "look up",
    "research",
    "news",
    "latest",
    "what is",
    "who is",
    "tell me about",
];
// factual questions that do not use one of the keywords above
const RESEARCH_OPENERS: &[&str] = &["who ", "when ", "where ", "which "];
const FILESYSTEM_KEYWORDS: &[&str] = &[
    "list files",
    "show files",
    "list directory",
    "show directory",
    "list folder",
    "show folder",
];
const NOTES_KEYWORDS: &[&str] = &["note", "add note", "create note", "show notes", "list notes"];

type TriggerFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Predicate over lower-cased user text that selects one agent.
#[derive(Clone)]
pub struct KeywordTrigger {
    agent: String,
    matches: TriggerFn,
}

impl fmt::Debug for KeywordTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordTrigger")
            .field("agent", &self.agent)
            .finish()
    }
}

impl KeywordTrigger {
    /// Fires when any keyword occurs as a substring of the input.
    pub fn keywords(agent: impl Into<String>, keywords: &[&str]) -> Self {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Self::predicate(agent, move |text| keywords.iter().any(|k| text.contains(k.as_str())))
    }

    /// Fires when `predicate` returns true for the lower-cased input.
    pub fn predicate<F>(agent: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            agent: agent.into(),
            matches: Arc::new(predicate),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn matches(&self, lowered: &str) -> bool {
        (self.matches)(lowered)
    }
}

/// Built-in triggers in priority order: weather, research, filesystem, notes.
///
/// Research also fires on inputs opening with "who ", "when ", "where " or "which ", so a
/// question such as "which files are in src?" goes to research ahead of filesystem. Listing
/// requests need one of the filesystem phrases ("list files in src") or an `ls ` prefix.
pub fn default_triggers() -> Vec<KeywordTrigger> {
    let weather = KeywordTrigger::keywords("weather", WEATHER_KEYWORDS);
    let research = KeywordTrigger::predicate("research", |text| {
        RESEARCH_KEYWORDS.iter().any(|k| text.contains(k))
            || RESEARCH_OPENERS.iter().any(|o| text.starts_with(o))
    });
    let filesystem = KeywordTrigger::predicate("filesystem", |text| {
        text.starts_with("ls ") || FILESYSTEM_KEYWORDS.iter().any(|k| text.contains(k))
    });
    let notes = KeywordTrigger::keywords("notes", NOTES_KEYWORDS);
    vec![weather, research, filesystem, notes]
}

#[derive(Default)]
struct Entries {
    by_name: HashMap<String, Arc<dyn Agent>>,
    // names in first-registration order
    order: Vec<String>,
}

/// Process-wide agent directory, shared by reference between router, dispatcher and index.
pub struct AgentRegistry {
    entries: RwLock<Entries>,
    triggers: Vec<KeywordTrigger>,
    generation: AtomicU64,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    /// Empty registry with the built-in trigger order.
    pub fn new() -> Self {
        Self::with_triggers(default_triggers())
    }

    /// Empty registry with a custom trigger order.
    pub fn with_triggers(triggers: Vec<KeywordTrigger>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            triggers,
            generation: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace the agent under its name. Replacing logs a warning.
    pub fn register(&self, agent: Arc<dyn Agent>) {
        let name = agent.name().to_string();
        {
            let mut entries = self.write();
            if entries.by_name.insert(name.clone(), agent).is_some() {
                log::warn!(
                    "[AgentRegistry] Agent with name \"{}\" already registered. Overwriting.",
                    name
                );
            } else {
                entries.order.push(name.clone());
            }
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        log::info!("[AgentRegistry] Registered agent: \"{}\"", name);
    }

    pub fn get_agent_by_name(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.read().by_name.get(name).cloned()
    }

    /// Snapshot of every agent. Callers must not rely on the order.
    pub fn get_all_agents(&self) -> Vec<Arc<dyn Agent>> {
        let entries = self.read();
        entries
            .order
            .iter()
            .filter_map(|name| entries.by_name.get(name).cloned())
            .collect()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().by_name.is_empty()
    }

    /// Counter bumped by every [`register`](Self::register) call.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Agent names in trigger priority order.
    pub fn trigger_order(&self) -> Vec<&str> {
        self.triggers.iter().map(|t| t.agent()).collect()
    }

    /// Keyword match of `input` against the ordered triggers, falling back to the
    /// conversational agent.
    pub fn find_agent_for_input(&self, input: &str) -> Option<Arc<dyn Agent>> {
        let lowered = input.to_lowercase();
        let entries = self.read();

        for trigger in &self.triggers {
            if let Some(agent) = entries.by_name.get(trigger.agent()) {
                if trigger.matches(&lowered) {
                    log::debug!("[AgentRegistry] Keyword trigger matched \"{}\"", trigger.agent());
                    return Some(agent.clone());
                }
            }
        }

        entries.by_name.get(FALLBACK_AGENT).cloned()
    }

    /// `{name, description, parameters}` declarations for every agent except the
    /// conversational fallback, for callers that let an LLM pick the agent.
    pub fn tool_definitions(&self) -> Vec<Value> {
        self.get_all_agents()
            .into_iter()
            .filter(|agent| agent.name() != FALLBACK_AGENT)
            .map(|agent| {
                serde_json::json!({
                    "name": agent.name(),
                    "description": agent.description(),
                    "parameters": agent.input_schema().to_json_schema(),
                })
            })
            .collect()
    }
}
