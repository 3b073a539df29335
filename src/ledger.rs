//! Ledger: the category list, scores and the daily activity log.

use chrono::NaiveDate;

use crate::error::{Result, TrackerError};
use crate::progression::recalc_level;
use crate::state::{AppState, Category};

// ── Category CRUD ────────────────────────────────────────────

pub fn add_category(state: &mut AppState, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::EmptyInput("カテゴリ名"));
    }
    if state.category(name).is_some() {
        return Err(TrackerError::duplicate(name));
    }
    state.categories.push(Category::new(name));
    tracing::debug!(category = name, "category added");
    Ok(())
}

/// Drops each named category with all its records. Unknown names are skipped.
/// Returns the names that were actually removed.
pub fn remove_categories<S: AsRef<str>>(state: &mut AppState, names: &[S]) -> Vec<String> {
    let mut removed = Vec::new();
    for name in names {
        let name = name.as_ref();
        if let Some(idx) = state.position(name) {
            removed.push(state.categories.remove(idx).name);
        }
    }
    if !removed.is_empty() {
        tracing::debug!(?removed, "categories removed");
        recalc_level(state);
    }
    removed
}

/// Renames in place: position, score, past score, mission data, stat binding
/// and target all follow the new name.
pub fn rename_category(state: &mut AppState, old: &str, new: &str) -> Result<()> {
    let new = new.trim();
    if new.is_empty() {
        return Err(TrackerError::EmptyInput("新しい名前"));
    }
    if state.category(new).is_some() {
        return Err(TrackerError::duplicate(new));
    }
    let category = state
        .category_mut(old)
        .ok_or_else(|| TrackerError::unknown(old))?;
    category.name = new.to_string();
    tracing::debug!(from = old, to = new, "category renamed");
    Ok(())
}

/// Move `moved` to the slot `target` occupies. No-op when either is missing
/// or both are the same. Returns whether the order changed.
pub fn reorder_category(state: &mut AppState, moved: &str, target: &str) -> bool {
    let (from, to) = match (state.position(moved), state.position(target)) {
        (Some(f), Some(t)) if f != t => (f, t),
        _ => return false,
    };
    let category = state.categories.remove(from);
    state.categories.insert(to, category);
    true
}

pub fn sort_categories(state: &mut AppState) {
    state.categories.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Split a batch-delete answer into names. Any whitespace separates names.
pub fn parse_name_list(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

pub fn set_target(state: &mut AppState, name: &str, target: f64) -> Result<u32> {
    if !target.is_finite() || target < 1.0 || target > u32::MAX as f64 {
        return Err(TrackerError::InvalidTarget(target));
    }
    let category = state
        .category_mut(name)
        .ok_or_else(|| TrackerError::unknown(name))?;
    category.target = target.floor() as u32;
    Ok(category.target)
}

// ── Scores ───────────────────────────────────────────────────

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Apply `delta` to a score, floored at 0. The applied change goes to the
/// daily log under `today`, then the level is recomputed.
pub fn adjust_score(state: &mut AppState, name: &str, delta: i64, today: NaiveDate) -> Result<u32> {
    let category = state
        .category_mut(name)
        .ok_or_else(|| TrackerError::unknown(name))?;

    let old = category.score;
    let new = (old as i64)
        .saturating_add(delta)
        .clamp(0, u32::MAX as i64) as u32;
    category.score = new;

    let applied = new as i64 - old as i64;
    *state
        .daily_log
        .entry(date_key(today))
        .or_default()
        .entry(name.to_string())
        .or_insert(0) += applied;

    recalc_level(state);
    Ok(new)
}

/// Sum of all logged deltas for one day.
pub fn daily_total(state: &AppState, date: NaiveDate) -> i64 {
    state
        .daily_log
        .get(&date_key(date))
        .map(|day| day.values().sum())
        .unwrap_or(0)
}

// ── Chart / comparison ───────────────────────────────────────

/// This week against last week, in list order.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RadarSeries {
    pub labels: Vec<String>,
    pub current: Vec<u32>,
    pub past: Vec<u32>,
}

pub fn radar_series(state: &AppState) -> RadarSeries {
    let mut series = RadarSeries::default();
    for c in &state.categories {
        series.labels.push(c.name.clone());
        series.current.push(c.score);
        series.past.push(c.past_score);
    }
    series
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

pub fn trend(state: &AppState, name: &str) -> Option<Trend> {
    let c = state.category(name)?;
    Some(match c.score.cmp(&c.past_score) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Flat,
    })
}
