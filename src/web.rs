//! Browser bindings: `localStorage`, `window.confirm` / `window.prompt`, and
//! the local calendar date.

use chrono::NaiveDate;

use crate::ports::{KeyValueStore, Prompt};

fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

// ── localStorage ─────────────────────────────────────────────

pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// `None` when storage is disabled (private mode, sandboxed iframe).
    pub fn open() -> Option<Self> {
        let storage = window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: String) {
        if let Err(e) = self.storage.set_item(key, &value) {
            tracing::warn!(key, "localStorage への保存に失敗: {e:?}");
        }
    }

    fn remove(&mut self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}

// ── Dialogs ──────────────────────────────────────────────────

#[derive(Default)]
pub struct BrowserPrompt;

impl Prompt for BrowserPrompt {
    /// `window.confirm` cannot tell "cancel" from "no"; both read as `false`.
    fn ask_yes_no(&mut self, question: &str) -> Option<bool> {
        window()?.confirm_with_message(question).ok()
    }

    fn ask_text(&mut self, prompt: &str) -> Option<String> {
        window()?.prompt_with_message(prompt).ok()?
    }

    fn ask_number(&mut self, prompt: &str) -> Option<f64> {
        let text = self.ask_text(prompt)?;
        match text.trim().parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::debug!(input = %text, "not a number");
                None
            }
        }
    }
}

/// Today's date in the browser's local time zone.
pub fn today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
}
