//! Weekly rollover.
//!
//! A period is an ISO-8601 week (Monday start, Thursday-anchored year),
//! encoded as `iso_year * 100 + iso_week` so periods order and compare as
//! plain integers across year boundaries.

use chrono::{Datelike, NaiveDate};

use crate::mission::score_missions;
use crate::progression::{recalc_level, LevelChange};
use crate::state::{AppState, Notice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolloverSummary {
    pub from: u32,
    pub to: u32,
    pub missions_cleared: usize,
    pub missions_failed: usize,
    pub level: LevelChange,
}

pub fn period_number(date: NaiveDate) -> u32 {
    let week = date.iso_week();
    week.year() as u32 * 100 + week.week()
}

/// True when a baseline exists and `today` falls in a different period.
pub fn rollover_due(state: &AppState, today: NaiveDate) -> bool {
    matches!(state.last_period, Some(last) if last != period_number(today))
}

/// Apply the period change, if any.
///
/// The first call ever only records the baseline. A second call in the same
/// period does nothing.
pub fn check_rollover(state: &mut AppState, today: NaiveDate) -> Option<RolloverSummary> {
    let current = period_number(today);
    let previous = state.last_period;
    state.last_period = Some(current);

    let from = match previous {
        Some(p) if p != current => p,
        Some(_) => return None,
        None => {
            tracing::info!(period = current, "period baseline recorded");
            return None;
        }
    };

    for c in state.categories.iter_mut() {
        c.past_score = c.score;
    }
    let (missions_cleared, missions_failed) = score_missions(state);
    let level = recalc_level(state);

    state.push_notice(Notice::Rollover {
        cleared: missions_cleared,
        failed: missions_failed,
    });
    tracing::info!(from, to = current, missions_cleared, missions_failed, "period rollover");

    Some(RolloverSummary {
        from,
        to: current,
        missions_cleared,
        missions_failed,
        level,
    })
}
