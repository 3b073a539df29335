//! Habit Quest state: data structures only, no rules.
//!
//! One `Category` record carries every per-category field, so renaming or
//! deleting a category moves or drops all of them together.

use std::collections::BTreeMap;
use std::fmt;

// ── Tunables ──────────────────────────────────────────────────

/// Goal used for a category until the user edits it.
pub const DEFAULT_TARGET: u32 = 10;

pub const MISSION_CLEAR_BONUS: u32 = 3;
pub const MISSION_FAIL_PENALTY: u32 = 5;

pub const MULTIPLIER_STEP: f64 = 0.1;
pub const UPGRADE_BASE_COST: u32 = 30;
pub const UPGRADE_TIER_COST: u32 = 20;

pub const POTION_COST: f64 = 50.0;
pub const POTION_MP: u32 = 15;
pub const HEAL_MP_COST: u32 = 3;
pub const HEAL_HP: u32 = 15;

pub const REGULAR_REWARD: f64 = 10.0;
pub const BOSS_REWARD: f64 = 50.0;

/// Every n-th stage is a mid-boss and, once cleared, a checkpoint.
pub const CHECKPOINT_INTERVAL: u32 = 5;
/// Stage interval of the top-tier boss.
pub const BOSS_INTERVAL: u32 = 25;
/// Categories at or above target needed before the top-tier boss shows up.
pub const BOSS_CLEARED_CATEGORIES: usize = 3;

/// Cosmetic pause between a defeat and the idle view.
pub const DEFEAT_IDLE_DELAY_MS: f64 = 1500.0;

pub const LOG_CAPACITY: usize = 30;

// ── Stats ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatName {
    Atk,
    Def,
    Hp,
    Mp,
    Spd,
}

pub const ALL_STATS: [StatName; 5] = [
    StatName::Atk,
    StatName::Def,
    StatName::Hp,
    StatName::Mp,
    StatName::Spd,
];

impl StatName {
    pub fn label(self) -> &'static str {
        match self {
            StatName::Atk => "ATK",
            StatName::Def => "DEF",
            StatName::Hp => "HP",
            StatName::Mp => "MP",
            StatName::Spd => "SPD",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        ALL_STATS.iter().copied().find(|s| s.label() == label)
    }

    fn index(self) -> usize {
        match self {
            StatName::Atk => 0,
            StatName::Def => 1,
            StatName::Hp => 2,
            StatName::Mp => 3,
            StatName::Spd => 4,
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final stat values, one per `StatName`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatBlock {
    pub atk: u32,
    pub def: u32,
    pub hp: u32,
    pub mp: u32,
    pub spd: u32,
}

impl StatBlock {
    pub fn get(&self, stat: StatName) -> u32 {
        match stat {
            StatName::Atk => self.atk,
            StatName::Def => self.def,
            StatName::Hp => self.hp,
            StatName::Mp => self.mp,
            StatName::Spd => self.spd,
        }
    }

    pub fn set(&mut self, stat: StatName, value: u32) {
        match stat {
            StatName::Atk => self.atk = value,
            StatName::Def => self.def = value,
            StatName::Hp => self.hp = value,
            StatName::Mp => self.mp = value,
            StatName::Spd => self.spd = value,
        }
    }
}

/// Upgradeable per-stat multiplier, never below 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Multipliers([f64; 5]);

impl Default for Multipliers {
    fn default() -> Self {
        Self([1.0; 5])
    }
}

impl Multipliers {
    pub fn get(&self, stat: StatName) -> f64 {
        self.0[stat.index()]
    }

    /// Values below 1.0 (or NaN) are raised to 1.0; the result is kept to one decimal.
    pub fn set(&mut self, stat: StatName, value: f64) {
        let v = if value.is_finite() { value.max(1.0) } else { 1.0 };
        self.0[stat.index()] = round_tenth(v);
    }
}

pub fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ── Categories ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MissionStatus {
    #[default]
    Unanswered,
    Cleared,
    NotCleared,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Mission {
    /// Free-text weekly goal. Empty means "no mission this week".
    pub target: String,
    pub status: MissionStatus,
}

impl Mission {
    pub fn is_set(&self) -> bool {
        !self.target.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub name: String,
    pub score: u32,
    /// Score as it stood at the last rollover.
    pub past_score: u32,
    pub mission_points: u32,
    pub mission: Mission,
    /// The stat this category feeds, if any. At most one category holds a given stat.
    pub stat: Option<StatName>,
    pub target: u32,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            past_score: 0,
            mission_points: 0,
            mission: Mission::default(),
            stat: None,
            target: DEFAULT_TARGET,
        }
    }

    pub fn reached_target(&self) -> bool {
        self.score >= self.target
    }
}

/// Date ("YYYY-MM-DD") → category → summed score delta for that day.
pub type DailyLog = BTreeMap<String, BTreeMap<String, i64>>;

// ── Battle ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyTier {
    Regular,
    MidBoss,
    Boss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub name: String,
    pub tier: EnemyTier,
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spd: u32,
}

impl Enemy {
    pub fn is_boss(&self) -> bool {
        self.tier != EnemyTier::Regular
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    Idle,
    InBattle,
    /// Lost the last fight; attacks stay disabled until the idle view returns.
    Defeated,
}

/// Furthest confirmed stage, restored on the next `start_run`.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub stage: u32,
    pub currency: f64,
    pub multipliers: Multipliers,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub enemy: Option<Enemy>,
    pub stage: u32,
    pub player_hp: u32,
    pub player_mp: u32,
    pub currency: f64,
    pub checkpoint: Option<Checkpoint>,
    /// Milliseconds accumulated since the defeat, while `phase == Defeated`.
    pub defeat_elapsed_ms: f64,
}

impl BattleState {
    pub fn new() -> Self {
        Self {
            phase: BattlePhase::Idle,
            enemy: None,
            stage: 0,
            player_hp: 0,
            player_mp: 0,
            currency: 0.0,
            checkpoint: None,
            defeat_elapsed_ms: 0.0,
        }
    }
}

impl Default for BattleState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Notices ───────────────────────────────────────────────────

/// One-way notifications for the view layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    LevelUp { gained: u32, level: u32 },
    LevelDown { lost: u32, level: u32 },
    Rollover { cleared: usize, failed: usize },
    MissionAnswered { category: String, cleared: bool },
    RunStarted { stage: u32, resumed: bool },
    EnemyAppeared { name: String, tier: EnemyTier },
    /// Player dealt damage.
    PlayerHit { target: String, damage: u32 },
    /// Enemy dealt damage.
    EnemyHit { attacker: String, damage: u32 },
    EnemyDefeated { name: String, reward: f64 },
    PlayerDefeated { currency: f64 },
    CheckpointSaved { stage: u32 },
    InsufficientFunds { cost: f64, balance: f64 },
    NotEnoughMp { needed: u32, available: u32 },
    PotionUsed { mp: u32 },
    Healed { hp: u32 },
    StatUpgraded { stat: StatName, multiplier: f64 },
    ProgressReset,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LevelUp { gained, level } => {
                write!(f, "レベルアップ！ +{} (Lv.{})", gained, level)
            }
            Notice::LevelDown { lost, level } => {
                write!(f, "レベルダウン… -{} (Lv.{})", lost, level)
            }
            Notice::Rollover { cleared, failed } => write!(
                f,
                "週が変わりました！ ミッション達成 {} / 未達成 {}",
                cleared, failed
            ),
            Notice::MissionAnswered { category, cleared } => {
                let verdict = if *cleared { "達成" } else { "未達成" };
                write!(f, "{}のミッション: {}", category, verdict)
            }
            Notice::RunStarted { stage, resumed } => {
                if *resumed {
                    write!(f, "セーブポイントから再開 (ステージ{})", stage + 1)
                } else {
                    write!(f, "冒険開始！ (ステージ{})", stage + 1)
                }
            }
            Notice::EnemyAppeared { name, tier } => match tier {
                EnemyTier::Boss => write!(f, "魔王{}が現れた！", name),
                EnemyTier::MidBoss => write!(f, "中ボス{}が現れた！", name),
                EnemyTier::Regular => write!(f, "{}が現れた！", name),
            },
            Notice::PlayerHit { target, damage } => {
                write!(f, "攻撃！ {}に{}ダメージ！", target, damage)
            }
            Notice::EnemyHit { attacker, damage } => {
                write!(f, "{}の攻撃！ {}ダメージ！", attacker, damage)
            }
            Notice::EnemyDefeated { name, reward } => {
                write!(f, "{}を倒した！ {}G獲得", name, reward)
            }
            Notice::PlayerDefeated { currency } => {
                write!(f, "力尽きた… 所持金が{}Gになった", currency)
            }
            Notice::CheckpointSaved { stage } => {
                write!(f, "セーブポイント更新 (ステージ{})", stage + 1)
            }
            Notice::InsufficientFunds { cost, balance } => {
                write!(f, "ゴールドが足りない！ (必要{}G / 所持{}G)", cost, balance)
            }
            Notice::NotEnoughMp { needed, available } => {
                write!(f, "MPが足りない！ (必要{} / 残り{})", needed, available)
            }
            Notice::PotionUsed { mp } => write!(f, "ポーションを使った！ MP{}回復！", mp),
            Notice::Healed { hp } => write!(f, "回復魔法！ HP{}回復！", hp),
            Notice::StatUpgraded { stat, multiplier } => {
                write!(f, "{}強化！ 倍率x{:.1}", stat, multiplier)
            }
            Notice::ProgressReset => f.write_str("進行状況をリセットしました"),
        }
    }
}

// ── Root State ────────────────────────────────────────────────

pub struct AppState {
    /// Categories in user order.
    pub categories: Vec<Category>,
    pub daily_log: DailyLog,
    pub level: u32,
    pub multipliers: Multipliers,
    /// ISO year * 100 + ISO week of the last seen period; `None` before the first run.
    pub last_period: Option<u32>,
    pub battle: BattleState,
    pub log: Vec<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            daily_log: DailyLog::new(),
            level: 0,
            multipliers: Multipliers::default(),
            last_period: None,
            battle: BattleState::new(),
            log: Vec::new(),
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        tracing::info!(target: "habit_quest::notice", "{}", notice);
        self.log.push(notice);
        if self.log.len() > LOG_CAPACITY {
            self.log.remove(0);
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    /// The category currently feeding `stat`.
    pub fn bound_category(&self, stat: StatName) -> Option<&Category> {
        self.categories.iter().find(|c| c.stat == Some(stat))
    }

    pub fn has_assignments(&self) -> bool {
        self.categories.iter().any(|c| c.stat.is_some())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
