//! Persistence: split `AppState` into the stored keys and join it back.
//!
//! Every key holds one JSON value. A key that is missing or fails to parse
//! loads as its default and the rest of the state still loads; nothing here
//! is fatal. Player HP/MP, the current enemy, the stage and the battle phase
//! are not stored, so a fresh load always starts idle.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ports::KeyValueStore;
use crate::state::{
    AppState, Category, Checkpoint, DailyLog, MissionStatus, Multipliers, StatName, ALL_STATS,
    DEFAULT_TARGET,
};

pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_SCORES: &str = "scores";
pub const KEY_PAST_SCORES: &str = "pastScores";
pub const KEY_MISSION_POINTS: &str = "missionPoints";
pub const KEY_WEEKLY_MISSIONS: &str = "weeklyMissions";
pub const KEY_STAT_ASSIGNMENTS: &str = "statAssignments";
pub const KEY_STAT_MULTIPLIERS: &str = "statMultipliers";
pub const KEY_PLAYER_LEVEL: &str = "playerLevel";
pub const KEY_LAST_PERIOD: &str = "lastUpdatedWeek";
pub const KEY_CHECKPOINT: &str = "checkpoint";
pub const KEY_CURRENCY: &str = "currency";
pub const KEY_DAILY_LOG: &str = "dailyLog";
pub const KEY_CATEGORY_TARGETS: &str = "categoryTargets";

pub const ALL_KEYS: [&str; 13] = [
    KEY_CATEGORIES,
    KEY_SCORES,
    KEY_PAST_SCORES,
    KEY_MISSION_POINTS,
    KEY_WEEKLY_MISSIONS,
    KEY_STAT_ASSIGNMENTS,
    KEY_STAT_MULTIPLIERS,
    KEY_PLAYER_LEVEL,
    KEY_LAST_PERIOD,
    KEY_CHECKPOINT,
    KEY_CURRENCY,
    KEY_DAILY_LOG,
    KEY_CATEGORY_TARGETS,
];

// ── Wire records ─────────────────────────────────────────────

/// `{ "targetText": "...", "cleared": true | false | null }`
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
struct MissionRecord {
    #[serde(rename = "targetText")]
    target_text: String,
    cleared: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum CheckpointRecord {
    Full {
        stage: u32,
        #[serde(default)]
        currency: f64,
        #[serde(default)]
        multipliers: BTreeMap<String, f64>,
    },
    /// Older saves kept only the stage number.
    Stage(u32),
}

/// Everything that goes to the store, one field per key.
#[derive(Debug, Default, Clone, PartialEq)]
struct SaveData {
    categories: Vec<String>,
    scores: BTreeMap<String, i64>,
    past_scores: BTreeMap<String, i64>,
    mission_points: BTreeMap<String, i64>,
    missions: BTreeMap<String, MissionRecord>,
    assignments: BTreeMap<String, Option<String>>,
    multipliers: BTreeMap<String, f64>,
    level: u32,
    last_period: Option<u32>,
    checkpoint: Option<CheckpointRecord>,
    currency: f64,
    daily_log: DailyLog,
    targets: BTreeMap<String, u32>,
}

fn read<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, "saved value is malformed, using default: {e}");
            None
        }
    }
}

fn write<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(json) => store.set(key, json),
        Err(e) => tracing::warn!(key, "serialization failed, key not saved: {e}"),
    }
}

impl SaveData {
    fn read_from<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            categories: read(store, KEY_CATEGORIES).unwrap_or_default(),
            scores: read(store, KEY_SCORES).unwrap_or_default(),
            past_scores: read(store, KEY_PAST_SCORES).unwrap_or_default(),
            mission_points: read(store, KEY_MISSION_POINTS).unwrap_or_default(),
            missions: read(store, KEY_WEEKLY_MISSIONS).unwrap_or_default(),
            assignments: read(store, KEY_STAT_ASSIGNMENTS).unwrap_or_default(),
            multipliers: read(store, KEY_STAT_MULTIPLIERS).unwrap_or_default(),
            level: read(store, KEY_PLAYER_LEVEL).unwrap_or_default(),
            last_period: read(store, KEY_LAST_PERIOD),
            checkpoint: read(store, KEY_CHECKPOINT),
            currency: read(store, KEY_CURRENCY).unwrap_or_default(),
            daily_log: read(store, KEY_DAILY_LOG).unwrap_or_default(),
            targets: read(store, KEY_CATEGORY_TARGETS).unwrap_or_default(),
        }
    }

    fn write_to<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        write(store, KEY_CATEGORIES, &self.categories);
        write(store, KEY_SCORES, &self.scores);
        write(store, KEY_PAST_SCORES, &self.past_scores);
        write(store, KEY_MISSION_POINTS, &self.mission_points);
        write(store, KEY_WEEKLY_MISSIONS, &self.missions);
        write(store, KEY_STAT_ASSIGNMENTS, &self.assignments);
        write(store, KEY_STAT_MULTIPLIERS, &self.multipliers);
        write(store, KEY_PLAYER_LEVEL, &self.level);
        match self.last_period {
            Some(p) => write(store, KEY_LAST_PERIOD, &p),
            None => store.remove(KEY_LAST_PERIOD),
        }
        match &self.checkpoint {
            Some(cp) => write(store, KEY_CHECKPOINT, cp),
            None => store.remove(KEY_CHECKPOINT),
        }
        write(store, KEY_CURRENCY, &self.currency);
        write(store, KEY_DAILY_LOG, &self.daily_log);
        write(store, KEY_CATEGORY_TARGETS, &self.targets);
    }
}

// ── Extract / Apply ──────────────────────────────────────────

fn multipliers_to_map(m: &Multipliers) -> BTreeMap<String, f64> {
    ALL_STATS
        .iter()
        .map(|&s| (s.label().to_string(), m.get(s)))
        .collect()
}

fn multipliers_from_map(map: &BTreeMap<String, f64>) -> Multipliers {
    let mut m = Multipliers::default();
    for (label, &value) in map {
        match StatName::from_label(label) {
            Some(stat) => m.set(stat, value),
            None => tracing::warn!(label = %label, "unknown stat in saved multipliers"),
        }
    }
    m
}

fn non_negative(key: &str, name: &str, value: i64) -> u32 {
    if value < 0 {
        tracing::warn!(key, category = name, value, "negative saved value clamped to 0");
    }
    value.clamp(0, u32::MAX as i64) as u32
}

fn finite_currency(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!(value, "invalid saved currency reset to 0");
        0.0
    }
}

fn extract_save(state: &AppState) -> SaveData {
    let mut data = SaveData {
        level: state.level,
        last_period: state.last_period,
        currency: state.battle.currency,
        multipliers: multipliers_to_map(&state.multipliers),
        daily_log: state.daily_log.clone(),
        checkpoint: state
            .battle
            .checkpoint
            .as_ref()
            .map(|cp| CheckpointRecord::Full {
                stage: cp.stage,
                currency: cp.currency,
                multipliers: multipliers_to_map(&cp.multipliers),
            }),
        ..SaveData::default()
    };

    for c in &state.categories {
        data.categories.push(c.name.clone());
        data.scores.insert(c.name.clone(), c.score as i64);
        data.past_scores.insert(c.name.clone(), c.past_score as i64);
        data.mission_points
            .insert(c.name.clone(), c.mission_points as i64);
        data.missions.insert(
            c.name.clone(),
            MissionRecord {
                target_text: c.mission.target.clone(),
                cleared: match c.mission.status {
                    MissionStatus::Unanswered => None,
                    MissionStatus::Cleared => Some(true),
                    MissionStatus::NotCleared => Some(false),
                },
            },
        );
        data.targets.insert(c.name.clone(), c.target);
    }
    for stat in ALL_STATS {
        data.assignments.insert(
            stat.label().to_string(),
            state.bound_category(stat).map(|c| c.name.clone()),
        );
    }
    data
}

fn apply_save(state: &mut AppState, data: SaveData) {
    state.categories.clear();
    for raw in &data.categories {
        let name = raw.trim();
        if name.is_empty() || state.category(name).is_some() {
            tracing::warn!(name = %raw, "skipping blank or duplicate saved category");
            continue;
        }
        let mut c = Category::new(name);
        c.score = non_negative(KEY_SCORES, name, data.scores.get(name).copied().unwrap_or(0));
        c.past_score = non_negative(
            KEY_PAST_SCORES,
            name,
            data.past_scores.get(name).copied().unwrap_or(0),
        );
        c.mission_points = non_negative(
            KEY_MISSION_POINTS,
            name,
            data.mission_points.get(name).copied().unwrap_or(0),
        );
        if let Some(m) = data.missions.get(name) {
            c.mission.target = m.target_text.clone();
            c.mission.status = match m.cleared {
                None => MissionStatus::Unanswered,
                Some(true) => MissionStatus::Cleared,
                Some(false) => MissionStatus::NotCleared,
            };
        }
        c.target = match data.targets.get(name) {
            Some(&t) if t >= 1 => t,
            _ => DEFAULT_TARGET,
        };
        state.categories.push(c);
    }

    for (label, bound) in &data.assignments {
        let Some(name) = bound else { continue };
        let Some(stat) = StatName::from_label(label) else {
            tracing::warn!(label = %label, "unknown stat in saved assignments");
            continue;
        };
        match state.category_mut(name) {
            Some(c) if c.stat.is_none() => c.stat = Some(stat),
            Some(_) => tracing::warn!(category = %name, %stat, "category already bound, dropping"),
            None => tracing::warn!(category = %name, %stat, "assignment to unknown category"),
        }
    }

    state.multipliers = multipliers_from_map(&data.multipliers);
    state.level = data.level;
    state.last_period = data.last_period;
    state.battle.currency = finite_currency(data.currency);
    state.battle.checkpoint = data.checkpoint.map(|cp| match cp {
        CheckpointRecord::Full {
            stage,
            currency,
            multipliers,
        } => Checkpoint {
            stage,
            currency: finite_currency(currency),
            multipliers: multipliers_from_map(&multipliers),
        },
        CheckpointRecord::Stage(stage) => Checkpoint {
            stage,
            currency: state.battle.currency,
            multipliers: state.multipliers,
        },
    });
    state.daily_log = data.daily_log;
}

// ── Public API ───────────────────────────────────────────────

/// Load whatever the store holds. Never fails.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> AppState {
    let mut state = AppState::new();
    apply_save(&mut state, SaveData::read_from(store));
    tracing::debug!(
        categories = state.categories.len(),
        level = state.level,
        "state loaded"
    );
    state
}

/// Write every key.
pub fn save_state<S: KeyValueStore + ?Sized>(state: &AppState, store: &mut S) {
    extract_save(state).write_to(store);
}
