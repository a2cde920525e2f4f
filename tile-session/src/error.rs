//! 会话错误类型

use thiserror::Error;
use tile_engine::EngineError;

/// 会话错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// 对局已无合法走法
    #[error("No legal moves left: the game is over")]
    NoLegalMoves,

    /// 已达成目标且未开启胜利后继续
    #[error("Target reached: the game is won")]
    GameWon,

    /// 挑战模式步数已用完
    #[error("Move limit of {limit} reached")]
    OutOfMoves { limit: u32 },

    /// 存档损坏或无法解析
    #[error("Corrupt save: {reason}")]
    CorruptSave { reason: String },

    /// 配置不合法
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// 提示次数已用完
    #[error("Hint limit of {limit} exhausted")]
    HintsExhausted { limit: u32 },

    /// 悔棋次数已用完
    #[error("Undo limit of {limit} reached")]
    UndoLimitReached { limit: u32 },

    #[error("Unknown checkpoint: {name:?}")]
    UnknownCheckpoint { name: String },

    #[error("Unknown challenge: {name:?}")]
    UnknownChallenge { name: String },
}

impl SessionError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        SessionError::CorruptSave {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SessionError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// 会话操作结果类型
pub type Result<T> = std::result::Result<T, SessionError>;
