//! 滑动与合并
//!
//! 每条线（行或列）独立处理：按移动方向从前沿开始取格子，遇到障碍物切分成段，
//! 段内先压紧、再从前沿扫描一次合并相邻等值对（每块每步最多合并一次）、最后再压紧写回。

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cell::{Cell, Direction, Position};
use crate::constants::MAX_TILE;

/// 一次滑动的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// 滑动后的棋盘
    pub board: Board,
    /// 本步合并产生的分数（新方块数值之和）
    pub score_delta: u64,
    /// 棋盘是否发生变化
    pub moved: bool,
    /// 本步合并生成的方块位置
    pub merged: Vec<Position>,
}

/// 滑动求解器
pub struct MoveResolver;

impl MoveResolver {
    /// 对棋盘执行一次滑动（不生成新方块）
    pub fn apply(board: &Board, direction: Direction) -> MoveOutcome {
        let mut result = board.clone();
        let mut score_delta = 0;
        let mut merged = Vec::new();

        for index in 0..board.size() {
            let line = Self::line(board.size(), index, direction);
            Self::resolve_line(board, &mut result, &line, &mut score_delta, &mut merged);
        }

        let moved = result != *board;
        MoveOutcome {
            board: result,
            score_delta,
            moved,
            merged,
        }
    }

    /// 只判断方向是否合法（会改变棋盘）
    pub fn is_legal(board: &Board, direction: Direction) -> bool {
        Self::apply(board, direction).moved
    }

    /// 第 `index` 条线上的坐标，按移动方向排列，前沿在最前
    pub fn line(size: usize, index: usize, direction: Direction) -> Vec<Position> {
        (0..size)
            .map(|step| match direction {
                Direction::Left => Position::new_unchecked(index, step),
                Direction::Right => Position::new_unchecked(index, size - 1 - step),
                Direction::Up => Position::new_unchecked(step, index),
                Direction::Down => Position::new_unchecked(size - 1 - step, index),
            })
            .collect()
    }

    fn resolve_line(
        source: &Board,
        target: &mut Board,
        line: &[Position],
        score_delta: &mut u64,
        merged: &mut Vec<Position>,
    ) {
        let cells: Vec<Cell> = line.iter().map(|pos| source.cell(*pos)).collect();

        // 按障碍物切分，segment_start 为当前段在线上的起始偏移
        let mut segment_start = 0;
        for offset in 0..=cells.len() {
            let at_boundary = offset == cells.len() || cells[offset].is_obstacle();
            if !at_boundary {
                continue;
            }

            let segment = &line[segment_start..offset];
            let values: Vec<u64> = cells[segment_start..offset]
                .iter()
                .filter_map(|cell| cell.value())
                .collect();
            let (slid, merged_slots) = slide_and_merge(&values);

            for (slot, pos) in segment.iter().enumerate() {
                let cell = slid.get(slot).map_or(Cell::Empty, |value| Cell::Tile(*value));
                target.put(*pos, cell);
            }
            for slot in merged_slots {
                *score_delta = score_delta.saturating_add(slid[slot]);
                merged.push(segment[slot]);
            }

            segment_start = offset + 1;
        }
    }
}

/// 段内压紧 + 单次合并
///
/// 返回前沿对齐的数值列表，以及合并生成的方块下标。
/// 已达到 [`MAX_TILE`] 的方块不再合并。
pub fn slide_and_merge(values: &[u64]) -> (Vec<u64>, Vec<usize>) {
    let mut result = Vec::with_capacity(values.len());
    let mut merged_slots = Vec::new();
    let mut iter = values.iter().copied().peekable();

    while let Some(value) = iter.next() {
        if value < MAX_TILE && iter.peek() == Some(&value) {
            iter.next();
            merged_slots.push(result.len());
            result.push(value * 2);
        } else {
            result.push(value);
        }
    }

    (result, merged_slots)
}
