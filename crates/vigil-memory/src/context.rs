use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_TURNS: usize = 10;
pub const NO_CONTEXT: &str = "No previous context";

/// Turns included by [`ConversationContext::render_context`].
const RENDERED_TURNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Default)]
struct ContextState {
    turns: VecDeque<ConversationTurn>,
    preferences: HashMap<String, String>,
}

impl ContextState {
    fn render(&self) -> Option<String> {
        if self.turns.is_empty() {
            return None;
        }
        let skip = self.turns.len().saturating_sub(RENDERED_TURNS);
        let lines: Vec<String> = self
            .turns
            .iter()
            .skip(skip)
            .map(|t| format!("User: {}\nAssistant: {}", t.user, t.assistant))
            .collect();
        Some(lines.join("\n"))
    }
}

/// Bounded FIFO turn history plus a flat user-preference map.
#[derive(Debug)]
pub struct ConversationContext {
    state: Mutex<ContextState>,
    max_turns: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationContext {
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            state: Mutex::new(ContextState::default()),
            max_turns,
        }
    }

    #[must_use]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ContextState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn add_turn(&self, user: impl Into<String>, assistant: impl Into<String>) {
        let mut state = self.lock();
        state.turns.push_back(ConversationTurn {
            timestamp: Utc::now(),
            user: user.into(),
            assistant: assistant.into(),
        });
        while state.turns.len() > self.max_turns {
            state.turns.pop_front();
        }
    }

    /// Last three turns as `User:`/`Assistant:` lines, most recent last.
    #[must_use]
    pub fn render_context(&self) -> String {
        self.lock()
            .render()
            .unwrap_or_else(|| NO_CONTEXT.to_owned())
    }

    /// Prefix `query` with recent context, or return it unchanged when there is none.
    #[must_use]
    pub fn augment(&self, query: &str) -> String {
        match self.lock().render() {
            Some(context) => format!("Context: {context}\n\nNew question: {query}"),
            None => query.to_owned(),
        }
    }

    #[must_use]
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.lock().turns.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().turns.is_empty()
    }

    /// Drop all turns. Preferences are kept.
    pub fn clear(&self) {
        self.lock().turns.clear();
    }

    pub fn set_preference(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().preferences.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn preference(&self, key: &str) -> Option<String> {
        self.lock().preferences.get(key).cloned()
    }

    pub fn remove_preference(&self, key: &str) -> Option<String> {
        self.lock().preferences.remove(key)
    }

    #[must_use]
    pub fn preferences(&self) -> HashMap<String, String> {
        self.lock().preferences.clone()
    }
}
