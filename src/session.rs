//! Session: the one owner of `AppState`.
//!
//! Each action runs the matching rule function and, when it succeeds,
//! writes the full key set back to the store. The view layer only ever talks
//! to a `Session`.

use chrono::NaiveDate;

use crate::battle::{self, TurnOutcome};
use crate::error::Result;
use crate::ledger;
use crate::mission;
use crate::period::{check_rollover, rollover_due, RolloverSummary};
use crate::ports::{KeyValueStore, Prompt};
use crate::progression::{self, LevelChange};
use crate::save::{load_state, save_state};
use crate::state::{AppState, BattlePhase, Notice, StatName, DEFEAT_IDLE_DELAY_MS};

pub struct Session<S: KeyValueStore, P: Prompt> {
    pub state: AppState,
    store: S,
    prompt: P,
}

impl<S: KeyValueStore, P: Prompt> Session<S, P> {
    /// Load the saved state from `store`.
    pub fn new(store: S, prompt: P) -> Self {
        let state = load_state(&store);
        Self {
            state,
            store,
            prompt,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    pub fn notices(&self) -> &[Notice] {
        &self.state.log
    }

    fn persist(&mut self) {
        save_state(&self.state, &mut self.store);
    }

    fn persisted<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_ok() {
            self.persist();
        }
        result
    }

    /// Page-load entry point. When the period changed, pending mission
    /// answers are collected first so they count for the closing period.
    pub fn start(&mut self, today: NaiveDate) -> Option<RolloverSummary> {
        if rollover_due(&self.state, today) {
            let answered = mission::collect_outcomes(&mut self.state, &mut self.prompt);
            tracing::debug!(answered, "mission outcomes collected before rollover");
        }
        let summary = check_rollover(&mut self.state, today);
        self.persist();
        summary
    }

    // ── Ledger ───────────────────────────────────────────────

    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let r = ledger::add_category(&mut self.state, name);
        self.persisted(r)
    }

    pub fn remove_categories<T: AsRef<str>>(&mut self, names: &[T]) -> Vec<String> {
        let removed = ledger::remove_categories(&mut self.state, names);
        if !removed.is_empty() {
            self.persist();
        }
        removed
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<()> {
        let r = ledger::rename_category(&mut self.state, old, new);
        self.persisted(r)
    }

    pub fn reorder_category(&mut self, moved: &str, target: &str) -> bool {
        let moved = ledger::reorder_category(&mut self.state, moved, target);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn sort_categories(&mut self) {
        ledger::sort_categories(&mut self.state);
        self.persist();
    }

    pub fn set_target(&mut self, name: &str, target: f64) -> Result<u32> {
        let r = ledger::set_target(&mut self.state, name, target);
        self.persisted(r)
    }

    pub fn adjust_score(&mut self, name: &str, delta: i64, today: NaiveDate) -> Result<u32> {
        let r = ledger::adjust_score(&mut self.state, name, delta, today);
        self.persisted(r)
    }

    // ── Missions ─────────────────────────────────────────────

    pub fn set_mission_target(&mut self, category: &str, text: &str) -> Result<()> {
        let r = mission::set_mission_target(&mut self.state, category, text);
        self.persisted(r)
    }

    pub fn clear_mission_target(&mut self, category: &str) -> Result<()> {
        let r = mission::clear_mission_target(&mut self.state, category);
        self.persisted(r)
    }

    pub fn record_mission_outcome(&mut self, category: &str) -> Result<Option<bool>> {
        let r = mission::record_mission_outcome(&mut self.state, category, &mut self.prompt);
        self.persisted(r)
    }

    // ── Progression ──────────────────────────────────────────

    pub fn assign_stat(&mut self, stat: StatName, category: Option<&str>) -> Result<LevelChange> {
        let r = progression::assign_stat(&mut self.state, stat, category);
        self.persisted(r)
    }

    pub fn upgrade_stat(&mut self, stat: StatName) -> Result<f64> {
        let r = progression::upgrade_stat(&mut self.state, stat);
        self.persisted(r)
    }

    // ── Battle ───────────────────────────────────────────────

    pub fn start_run(&mut self) -> Result<()> {
        let r = battle::start_run(&mut self.state);
        self.persisted(r)
    }

    pub fn attack(&mut self) -> Result<TurnOutcome> {
        let r = battle::resolve_turn(&mut self.state);
        self.persisted(r)
    }

    pub fn buy_potion(&mut self) -> Result<u32> {
        let r = battle::buy_potion(&mut self.state);
        self.persisted(r)
    }

    /// HP and MP live only in the session, so nothing is written.
    pub fn heal_with_mp(&mut self) -> Result<u32> {
        battle::heal_with_mp(&mut self.state)
    }

    pub fn reset_progress(&mut self) {
        battle::reset_progress(&mut self.state);
        self.persist();
    }

    /// Advance the defeat screen timer. Fires once, returning true when the
    /// view went back to idle.
    pub fn tick_defeat_timer(&mut self, elapsed_ms: f64) -> bool {
        if self.state.battle.phase != BattlePhase::Defeated {
            return false;
        }
        self.state.battle.defeat_elapsed_ms += elapsed_ms.max(0.0);
        if self.state.battle.defeat_elapsed_ms < DEFEAT_IDLE_DELAY_MS {
            return false;
        }
        battle::return_to_idle(&mut self.state)
    }

    // ── Prompted actions ─────────────────────────────────────

    /// Returns the added name, or `None` when the prompt was cancelled.
    pub fn add_category_prompted(&mut self) -> Result<Option<String>> {
        let Some(input) = self.prompt.ask_text("追加するカテゴリ名を入力:") else {
            return Ok(None);
        };
        self.add_category(&input)?;
        Ok(Some(input.trim().to_string()))
    }

    pub fn rename_category_prompted(&mut self, old: &str) -> Result<Option<String>> {
        let question = format!("「{}」の新しい名前を入力:", old);
        let Some(input) = self.prompt.ask_text(&question) else {
            return Ok(None);
        };
        self.rename_category(old, &input)?;
        Ok(Some(input.trim().to_string()))
    }

    /// Ask for space separated names, confirm, then delete. Names that do not
    /// exist are dropped before the confirmation.
    pub fn delete_categories_prompted(&mut self) -> Vec<String> {
        let Some(input) = self
            .prompt
            .ask_text("削除するカテゴリ名を空白区切りで入力(複数可):")
        else {
            return Vec::new();
        };
        let names: Vec<String> = ledger::parse_name_list(&input)
            .into_iter()
            .filter(|n| self.state.category(n).is_some())
            .collect();
        if names.is_empty() {
            return Vec::new();
        }

        let question = format!("{} を削除しますか？", names.join("、"));
        if self.prompt.ask_yes_no(&question) != Some(true) {
            return Vec::new();
        }
        self.remove_categories(&names)
    }

    pub fn set_target_prompted(&mut self, name: &str) -> Result<Option<u32>> {
        let question = format!("「{}」の目標値を入力:", name);
        let Some(n) = self.prompt.ask_number(&question) else {
            return Ok(None);
        };
        self.set_target(name, n).map(Some)
    }

    /// Returns false when the prompt was cancelled.
    pub fn set_mission_prompted(&mut self, category: &str) -> Result<bool> {
        let question = format!("「{}」の今週のミッションを入力:", category);
        let Some(text) = self.prompt.ask_text(&question) else {
            return Ok(false);
        };
        self.set_mission_target(category, &text)?;
        Ok(true)
    }
}
