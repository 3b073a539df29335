//! Progression: turns category scores into RPG stats and the player level.

use crate::error::{Result, TrackerError};
use crate::state::{
    round_tenth, AppState, Category, Notice, StatBlock, StatName, ALL_STATS, MULTIPLIER_STEP,
    UPGRADE_BASE_COST, UPGRADE_TIER_COST,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelChange {
    Unchanged,
    Up(u32),
    Down(u32),
}

// ── Stat Assignment ──────────────────────────────────────────

/// Bind `stat` to `category`, or unbind it with `None`.
///
/// Whatever category held `stat` before loses it. The newly bound category
/// gives up the stat it held, since a category feeds at most one stat.
pub fn assign_stat(
    state: &mut AppState,
    stat: StatName,
    category: Option<&str>,
) -> Result<LevelChange> {
    if let Some(name) = category {
        if state.category(name).is_none() {
            return Err(TrackerError::unknown(name));
        }
    }

    for c in state.categories.iter_mut() {
        if c.stat == Some(stat) {
            c.stat = None;
        }
    }
    if let Some(name) = category {
        if let Some(c) = state.category_mut(name) {
            c.stat = Some(stat);
        }
    }

    tracing::debug!(%stat, category = ?category, "stat assignment changed");
    Ok(recalc_level(state))
}

/// Current stat → category name bindings, in `ALL_STATS` order.
pub fn assignments(state: &AppState) -> Vec<(StatName, Option<String>)> {
    ALL_STATS
        .iter()
        .map(|&stat| (stat, state.bound_category(stat).map(|c| c.name.clone())))
        .collect()
}

// ── Stats ────────────────────────────────────────────────────

pub fn stat_value(category: &Category, multiplier: f64) -> u32 {
    let base = category.score as f64 + category.mission_points as f64;
    (base * multiplier).floor() as u32
}

/// Live stats: unbound stats are 0.
pub fn compute_stats(state: &AppState) -> StatBlock {
    let mut block = StatBlock::default();
    for stat in ALL_STATS {
        if let Some(c) = state.bound_category(stat) {
            block.set(stat, stat_value(c, state.multipliers.get(stat)));
        }
    }
    block
}

// ── Level ────────────────────────────────────────────────────

/// Level = lowest score among stat-bound categories. Moves both ways.
/// With nothing bound the level is left alone.
pub fn recalc_level(state: &mut AppState) -> LevelChange {
    let new_level = match state
        .categories
        .iter()
        .filter(|c| c.stat.is_some())
        .map(|c| c.score)
        .min()
    {
        Some(l) => l,
        None => return LevelChange::Unchanged,
    };

    let old_level = state.level;
    state.level = new_level;

    if new_level > old_level {
        let gained = new_level - old_level;
        state.push_notice(Notice::LevelUp {
            gained,
            level: new_level,
        });
        LevelChange::Up(gained)
    } else if new_level < old_level {
        let lost = old_level - new_level;
        state.push_notice(Notice::LevelDown {
            lost,
            level: new_level,
        });
        LevelChange::Down(lost)
    } else {
        LevelChange::Unchanged
    }
}

// ── Upgrades ─────────────────────────────────────────────────

/// Cost of the next +0.1 on a stat currently at `multiplier`.
/// Rises by one tier every two purchases.
pub fn upgrade_cost(multiplier: f64) -> u32 {
    let tenths = ((multiplier - 1.0).max(0.0) * 10.0).round() as u32;
    UPGRADE_BASE_COST + UPGRADE_TIER_COST * (tenths / 2)
}

pub fn upgrade_stat(state: &mut AppState, stat: StatName) -> Result<f64> {
    let current = state.multipliers.get(stat);
    let cost = upgrade_cost(current) as f64;
    let balance = state.battle.currency;
    if balance < cost {
        state.push_notice(Notice::InsufficientFunds { cost, balance });
        return Err(TrackerError::InsufficientFunds { cost, balance });
    }

    state.battle.currency -= cost;
    state.multipliers.set(stat, round_tenth(current + MULTIPLIER_STEP));
    let multiplier = state.multipliers.get(stat);
    state.push_notice(Notice::StatUpgraded { stat, multiplier });
    Ok(multiplier)
}
