//! 格子、坐标与方向定义

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_TILE;
use crate::error::{EngineError, Result};

/// 格子内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cell {
    /// 空格
    #[default]
    Empty,
    /// 数字方块（2 到 MAX_TILE 之间的 2 的幂）
    Tile(u64),
    /// 障碍物，不可通过、不可合并
    Obstacle,
}

impl Cell {
    /// 创建数字方块（校验数值）
    pub fn tile(value: u64) -> Result<Self> {
        if is_valid_tile_value(value) {
            Ok(Cell::Tile(value))
        } else {
            Err(EngineError::InvalidTile { value })
        }
    }

    /// 获取方块数值（空格和障碍物返回 None）
    pub fn value(&self) -> Option<u64> {
        match self {
            Cell::Tile(value) => Some(*value),
            Cell::Empty | Cell::Obstacle => None,
        }
    }

    /// 方块数值的以 2 为底的指数（2 -> 1, 4 -> 2, ...），非方块为 0
    pub fn exponent(&self) -> u32 {
        match self {
            Cell::Tile(value) => value.trailing_zeros(),
            Cell::Empty | Cell::Obstacle => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Cell::Obstacle)
    }

    pub fn is_tile(&self) -> bool {
        matches!(self, Cell::Tile(_))
    }
}

/// 检查数值是否为合法方块（2 到 MAX_TILE 之间的 2 的幂）
pub fn is_valid_tile_value(value: u64) -> bool {
    (2..=MAX_TILE).contains(&value) && value.is_power_of_two()
}

/// 棋盘坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 行（0 在最上方）
    pub row: usize,
    /// 列（0 在最左侧）
    pub col: usize,
}

impl Position {
    /// 创建新位置（按棋盘边长检查边界）
    pub fn new(row: usize, col: usize, size: usize) -> Option<Self> {
        if row < size && col < size {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self, size: usize) -> bool {
        self.row < size && self.col < size
    }

    /// 转换为数组索引（行优先）
    pub fn to_index(&self, size: usize) -> usize {
        self.row * size + self.col
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 滑动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// 固定的方向优先级，AI 平分时按此顺序取先者
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::Down,
    ];

    /// 是否为纵向移动
    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// 小写名称
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// 从键位解析（WASD 与 vim 方向键）
    pub fn from_key(c: char) -> Option<Direction> {
        match c.to_ascii_lowercase() {
            'w' | 'k' => Some(Direction::Up),
            's' | 'j' => Some(Direction::Down),
            'a' | 'h' => Some(Direction::Left),
            'd' | 'l' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "up" => return Ok(Direction::Up),
            "down" => return Ok(Direction::Down),
            "left" => return Ok(Direction::Left),
            "right" => return Ok(Direction::Right),
            _ => {}
        }

        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Direction::from_key(c),
            _ => None,
        }
        .ok_or_else(|| EngineError::InvalidDirection {
            input: s.to_string(),
        })
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
