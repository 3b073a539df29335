//! Seams to the outside world: key-value persistence and user prompts.
//!
//! The rules never touch a browser API directly. The wasm build plugs in
//! `localStorage` and `window.prompt`; tests plug in the in-memory versions
//! below.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;

/// String-keyed, string-valued store (the shape of `localStorage`).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// Blocking yes/no, text and number questions. `None` means the user cancelled.
pub trait Prompt {
    fn ask_yes_no(&mut self, question: &str) -> Option<bool>;
    fn ask_text(&mut self, prompt: &str) -> Option<String>;
    fn ask_number(&mut self, prompt: &str) -> Option<f64>;
}

// ── In-memory store ──────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// ── JSON file store (native builds) ──────────────────────────

/// Keeps every key in one JSON object on disk, rewritten on each `set`.
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    /// Opens `path`; a missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "store file is not valid JSON, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    fn flush(&self) {
        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("store serialization failed: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), "store write failed: {e}");
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

// ── Scripted prompt ──────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Answer {
    YesNo(bool),
    Text(String),
    Number(f64),
    Cancel,
}

/// Replays canned answers in order. A question whose queued answer has the
/// wrong shape, or an empty queue, counts as cancelled.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Answer>,
    /// Every question asked, in order.
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask_yes_no(&mut self, question: &str) -> Option<bool> {
        self.asked.push(question.to_string());
        match self.answers.pop_front()? {
            Answer::YesNo(b) => Some(b),
            _ => None,
        }
    }

    fn ask_text(&mut self, prompt: &str) -> Option<String> {
        self.asked.push(prompt.to_string());
        match self.answers.pop_front()? {
            Answer::Text(t) => Some(t),
            _ => None,
        }
    }

    fn ask_number(&mut self, prompt: &str) -> Option<f64> {
        self.asked.push(prompt.to_string());
        match self.answers.pop_front()? {
            Answer::Number(n) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("k", "v".into());
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn scripted_prompt_replays_in_order() {
        let mut p = ScriptedPrompt::new([
            Answer::YesNo(true),
            Answer::Text("hello".into()),
            Answer::Number(3.5),
        ]);
        assert_eq!(p.ask_yes_no("q1"), Some(true));
        assert_eq!(p.ask_text("q2").as_deref(), Some("hello"));
        assert_eq!(p.ask_number("q3"), Some(3.5));
        assert_eq!(p.ask_yes_no("q4"), None);
        assert_eq!(p.asked, vec!["q1", "q2", "q3", "q4"]);
    }

    #[test]
    fn scripted_prompt_shape_mismatch_is_cancel() {
        let mut p = ScriptedPrompt::new([Answer::Text("x".into()), Answer::Cancel]);
        assert_eq!(p.ask_yes_no("q"), None);
        assert_eq!(p.ask_text("q"), None);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn json_file_store_persists_between_opens() {
        let path = std::env::temp_dir().join(format!(
            "habit-quest-store-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        {
            let mut store = JsonFileStore::open(&path);
            store.set("scores", "{\"a\":1}".into());
        }
        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("scores").as_deref(), Some("{\"a\":1}"));
        let _ = fs::remove_file(&path);
    }
}
