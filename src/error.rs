//! Error type shared by every tracker operation.
//!
//! All variants are recoverable: the failing operation leaves `AppState`
//! exactly as it was and the caller shows the message to the user.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    /// Category name collides with an existing one.
    #[error("カテゴリ「{0}」はすでに存在します")]
    DuplicateName(String),

    /// A required text field was blank.
    #[error("{0}が空です")]
    EmptyInput(&'static str),

    /// A run cannot start until at least one stat is bound to a category.
    #[error("ステータスにカテゴリが割り当てられていません")]
    NotConfigured,

    #[error("ゴールドが足りません (必要: {cost}, 所持: {balance})")]
    InsufficientFunds { cost: f64, balance: f64 },

    #[error("MPが足りません (必要: {needed}, 残り: {available})")]
    InsufficientResource { needed: u32, available: u32 },

    #[error("カテゴリ「{0}」が見つかりません")]
    UnknownCategory(String),

    /// Attack requested while no enemy is engaged (idle, or waiting after defeat).
    #[error("戦闘中ではありません")]
    NoActiveBattle,

    #[error("目標値が不正です: {0}")]
    InvalidTarget(f64),
}

impl TrackerError {
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownCategory(name.into())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
