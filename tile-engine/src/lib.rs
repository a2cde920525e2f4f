//! 2048 数字合并引擎
//!
//! 包含:
//! - 格子、坐标、方向等核心数据结构
//! - 棋盘与滑动合并规则（支持障碍物）
//! - 可复现的新方块生成
//! - 有界的悔棋/重做历史
//! - 棋盘记谱格式

mod board;
mod cell;
mod constants;
mod error;
mod history;
mod moves;
mod notation;
mod spawn;

pub use board::Board;
pub use cell::{is_valid_tile_value, Cell, Direction, Position};
pub use constants::*;
pub use error::{EngineError, Result};
pub use history::{HistoryEntry, HistoryStack};
pub use moves::{slide_and_merge, MoveOutcome, MoveResolver};
pub use notation::Notation;
pub use spawn::{Spawn, SpawnGenerator};
