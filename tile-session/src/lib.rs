//! 2048 对局会话
//!
//! 包含:
//! - 对局配置与游戏模式
//! - 会话状态机（走子、悔棋/重做、提示、检查点）
//! - 带校验的存档格式与备份轮换
//! - 挑战预设、限时计时器、双人对战

mod challenge;
mod clock;
mod config;
mod error;
mod session;
mod storage;
mod two_player;

pub use challenge::{Challenge, CHALLENGES, CHALLENGE_MOVE_LIMIT};
pub use clock::MoveClock;
pub use config::{GameConfig, GameMode};
pub use error::{Result, SessionError};
pub use session::{GameSession, SessionState, TurnReport};
pub use storage::{SaveInfo, StorageManager, AUTOSAVE_NAME, DEFAULT_MAX_BACKUPS};
pub use two_player::{MatchOutcome, Player, TwoPlayerMatch};
