//! 错误类型定义

use thiserror::Error;

/// 引擎错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 无效的方向输入
    #[error("Invalid direction: {input:?}")]
    InvalidDirection { input: String },

    /// 坐标越界
    #[error("Position ({row}, {col}) is out of bounds for a {size}x{size} board")]
    OutOfBounds { row: usize, col: usize, size: usize },

    /// 不支持的棋盘大小
    #[error("Unsupported board size: {size} (expected {min}..={max})")]
    InvalidBoardSize { size: usize, min: usize, max: usize },

    /// 方块数值不是 2 到 MAX_TILE 之间的 2 的幂
    #[error("Invalid tile value: {value}")]
    InvalidTile { value: u64 },

    /// 无效的棋盘记谱
    #[error("Invalid board notation: {reason}")]
    InvalidNotation { reason: String },

    /// 目标格子不是空格
    #[error("Cell ({row}, {col}) is not empty")]
    CellOccupied { row: usize, col: usize },

    /// 障碍物位置重复或已被占用
    #[error("Obstacle overlaps an occupied cell at ({row}, {col})")]
    ObstacleOverlap { row: usize, col: usize },
}

/// 引擎操作结果类型
pub type Result<T> = std::result::Result<T, EngineError>;
