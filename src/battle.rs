//! Battle engine: a run is a chain of stages, one enemy each.
//!
//! Idle → InBattle(stage) → victory advances to InBattle(stage + 1);
//! defeat → Defeated → Idle.

use crate::error::{Result, TrackerError};
use crate::progression::compute_stats;
use crate::state::{
    AppState, BattlePhase, Checkpoint, Enemy, EnemyTier, Multipliers, Notice, StatBlock, StatName,
    BOSS_CLEARED_CATEGORIES, BOSS_INTERVAL, BOSS_REWARD, CHECKPOINT_INTERVAL, HEAL_HP,
    HEAL_MP_COST, POTION_COST, POTION_MP, REGULAR_REWARD,
};

const REGULAR_NAMES: [&str; 5] = ["スライム", "オオカミ", "ゴブリン", "コウモリ", "スケルトン"];
const MID_BOSS_NAMES: [&str; 3] = ["ゴーレム", "暗黒騎士", "ドラゴン"];
const BOSS_NAME: &str = "バルザーク";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnOutcome {
    /// Both sides still standing.
    Continue,
    /// Enemy fell. `checkpoint` is the stage saved as the new resume point, if any.
    Victory { reward: f64, checkpoint: Option<u32> },
    Defeat,
}

// ── Run ──────────────────────────────────────────────────────

/// Begin a run, resuming from the checkpoint when there is one.
pub fn start_run(state: &mut AppState) -> Result<()> {
    if !state.has_assignments() {
        return Err(TrackerError::NotConfigured);
    }

    let resumed = match state.battle.checkpoint.clone() {
        Some(cp) => {
            state.battle.stage = cp.stage;
            state.battle.currency = cp.currency;
            state.multipliers = cp.multipliers;
            true
        }
        None => {
            state.battle.stage = 0;
            state.battle.currency = 0.0;
            state.multipliers = Multipliers::default();
            false
        }
    };

    let stats = compute_stats(state);
    state.battle.player_hp = max_hp(&stats);
    state.battle.player_mp = stats.mp;
    state.battle.phase = BattlePhase::InBattle;
    state.battle.defeat_elapsed_ms = 0.0;

    let stage = state.battle.stage;
    tracing::info!(stage, resumed, "run started");
    state.push_notice(Notice::RunStarted { stage, resumed });
    spawn_enemy(state, stage);
    Ok(())
}

/// Player HP ceiling. An unbound HP stat still leaves one hit point.
pub fn max_hp(stats: &StatBlock) -> u32 {
    stats.hp.max(1)
}

/// Categories whose score has reached their target.
pub fn cleared_category_count(state: &AppState) -> usize {
    state
        .categories
        .iter()
        .filter(|c| c.reached_target())
        .count()
}

// ── Enemies ──────────────────────────────────────────────────

pub fn enemy_tier(state: &AppState, stage: u32) -> EnemyTier {
    let i = stage.saturating_add(1);
    if i % CHECKPOINT_INTERVAL != 0 {
        EnemyTier::Regular
    } else if i % BOSS_INTERVAL == 0 && cleared_category_count(state) >= BOSS_CLEARED_CATEGORIES {
        EnemyTier::Boss
    } else {
        EnemyTier::MidBoss
    }
}

/// Deterministic enemy for `stage` (0-based).
///
/// Each stat ramps as `1 + i` with `i = stage + 1`, capped at the target of
/// the category bound to that stat. Unbound stats are 0.
pub fn generate_enemy(state: &AppState, stage: u32) -> Enemy {
    let ramp = stage.saturating_add(2);
    let stat = |s: StatName| {
        state
            .bound_category(s)
            .map(|c| ramp.min(c.target))
            .unwrap_or(0)
    };

    let tier = enemy_tier(state, stage);
    let name = match tier {
        EnemyTier::Regular => REGULAR_NAMES[stage as usize % REGULAR_NAMES.len()],
        EnemyTier::MidBoss => {
            let n = (stage / CHECKPOINT_INTERVAL) as usize;
            MID_BOSS_NAMES[n % MID_BOSS_NAMES.len()]
        }
        EnemyTier::Boss => BOSS_NAME,
    };
    let hp = stat(StatName::Hp).max(1);

    Enemy {
        name: name.to_string(),
        tier,
        hp,
        max_hp: hp,
        atk: stat(StatName::Atk),
        def: stat(StatName::Def),
        spd: stat(StatName::Spd),
    }
}

/// Put the enemy for `stage` on the field and announce it.
pub fn spawn_enemy(state: &mut AppState, stage: u32) {
    let enemy = generate_enemy(state, stage);
    state.push_notice(Notice::EnemyAppeared {
        name: enemy.name.clone(),
        tier: enemy.tier,
    });
    state.battle.enemy = Some(enemy);
}

// ── Turn ─────────────────────────────────────────────────────

/// Both directions: at least 1.
pub fn damage(atk: u32, def: u32) -> u32 {
    atk.saturating_sub(def).max(1)
}

/// One exchange of blows. The faster side strikes first (ties go to the
/// player); a knockout ends the exchange before the other side swings.
pub fn resolve_turn(state: &mut AppState) -> Result<TurnOutcome> {
    if state.battle.phase != BattlePhase::InBattle {
        return Err(TrackerError::NoActiveBattle);
    }
    let enemy_spd = match &state.battle.enemy {
        Some(e) => e.spd,
        None => return Err(TrackerError::NoActiveBattle),
    };

    let stats = compute_stats(state);
    if stats.spd >= enemy_spd {
        if player_strikes(state, &stats) {
            return Ok(enemy_defeated(state));
        }
        if enemy_strikes(state, &stats) {
            return Ok(player_defeated(state));
        }
    } else {
        if enemy_strikes(state, &stats) {
            return Ok(player_defeated(state));
        }
        if player_strikes(state, &stats) {
            return Ok(enemy_defeated(state));
        }
    }
    Ok(TurnOutcome::Continue)
}

/// Returns true when the enemy is down.
fn player_strikes(state: &mut AppState, stats: &StatBlock) -> bool {
    let (target, dealt, down) = match state.battle.enemy.as_mut() {
        Some(enemy) => {
            let dealt = damage(stats.atk, enemy.def);
            enemy.hp = enemy.hp.saturating_sub(dealt);
            (enemy.name.clone(), dealt, enemy.hp == 0)
        }
        None => return false,
    };
    tracing::debug!(enemy = %target, damage = dealt, "player strikes");
    state.push_notice(Notice::PlayerHit {
        target,
        damage: dealt,
    });
    down
}

/// Returns true when the player is down.
fn enemy_strikes(state: &mut AppState, stats: &StatBlock) -> bool {
    let (attacker, dealt) = match &state.battle.enemy {
        Some(enemy) => (enemy.name.clone(), damage(enemy.atk, stats.def)),
        None => return false,
    };
    state.battle.player_hp = state.battle.player_hp.saturating_sub(dealt);
    tracing::debug!(attacker = %attacker, damage = dealt, "enemy strikes");
    state.push_notice(Notice::EnemyHit {
        attacker,
        damage: dealt,
    });
    state.battle.player_hp == 0
}

fn enemy_defeated(state: &mut AppState) -> TurnOutcome {
    let Some(enemy) = state.battle.enemy.take() else {
        return TurnOutcome::Continue;
    };
    let reward = if enemy.is_boss() {
        BOSS_REWARD
    } else {
        REGULAR_REWARD
    };
    state.battle.currency += reward;
    state.push_notice(Notice::EnemyDefeated {
        name: enemy.name,
        reward,
    });

    let next = state.battle.stage.saturating_add(1);
    let checkpoint = if next % CHECKPOINT_INTERVAL == 0 {
        state.battle.checkpoint = Some(Checkpoint {
            stage: next,
            currency: state.battle.currency,
            multipliers: state.multipliers,
        });
        tracing::info!(stage = next, "checkpoint saved");
        state.push_notice(Notice::CheckpointSaved { stage: next });
        Some(next)
    } else {
        None
    };

    state.battle.stage = next;
    spawn_enemy(state, next);
    TurnOutcome::Victory { reward, checkpoint }
}

fn player_defeated(state: &mut AppState) -> TurnOutcome {
    let stats = compute_stats(state);
    let battle = &mut state.battle;
    battle.currency /= 2.0;
    battle.player_hp = max_hp(&stats);
    battle.player_mp = stats.mp;
    battle.enemy = None;
    battle.phase = BattlePhase::Defeated;
    battle.defeat_elapsed_ms = 0.0;

    let currency = battle.currency;
    tracing::info!(stage = battle.stage, currency, "player defeated");
    state.push_notice(Notice::PlayerDefeated { currency });
    TurnOutcome::Defeat
}

/// Finish the deferred defeat → idle transition. No-op in any other phase.
pub fn return_to_idle(state: &mut AppState) -> bool {
    if state.battle.phase != BattlePhase::Defeated {
        return false;
    }
    state.battle.phase = BattlePhase::Idle;
    state.battle.defeat_elapsed_ms = 0.0;
    true
}

/// Wipe checkpoint, currency and multipliers. Categories and scores stay.
pub fn reset_progress(state: &mut AppState) {
    state.battle.checkpoint = None;
    state.battle.currency = 0.0;
    state.battle.stage = 0;
    state.battle.enemy = None;
    state.battle.phase = BattlePhase::Idle;
    state.battle.defeat_elapsed_ms = 0.0;
    state.multipliers = Multipliers::default();
    state.push_notice(Notice::ProgressReset);
}

// ── Resources ────────────────────────────────────────────────

/// Spend gold on MP. Returns the new MP.
pub fn buy_potion(state: &mut AppState) -> Result<u32> {
    let balance = state.battle.currency;
    if balance < POTION_COST {
        state.push_notice(Notice::InsufficientFunds {
            cost: POTION_COST,
            balance,
        });
        return Err(TrackerError::InsufficientFunds {
            cost: POTION_COST,
            balance,
        });
    }
    state.battle.currency -= POTION_COST;
    state.battle.player_mp = state.battle.player_mp.saturating_add(POTION_MP);
    state.push_notice(Notice::PotionUsed { mp: POTION_MP });
    Ok(state.battle.player_mp)
}

/// Trade MP for HP, never above max HP. Returns the HP actually restored.
pub fn heal_with_mp(state: &mut AppState) -> Result<u32> {
    let available = state.battle.player_mp;
    if available < HEAL_MP_COST {
        state.push_notice(Notice::NotEnoughMp {
            needed: HEAL_MP_COST,
            available,
        });
        return Err(TrackerError::InsufficientResource {
            needed: HEAL_MP_COST,
            available,
        });
    }

    let cap = max_hp(&compute_stats(state));
    let before = state.battle.player_hp;
    let after = before.saturating_add(HEAL_HP).min(cap).max(before);
    state.battle.player_mp -= HEAL_MP_COST;
    state.battle.player_hp = after;
    let healed = after - before;
    state.push_notice(Notice::Healed { hp: healed });
    Ok(healed)
}

// ── Tests ────────────────────────────────────────────────────
