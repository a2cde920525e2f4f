//! 悔棋/重做历史
//!
//! 线性撤销模型：悔棋只移动游标，新走法会截断游标之后的记录。
//! 超过最大深度时从最旧的记录开始淘汰。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cell::Direction;

/// 历史记录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 棋盘快照
    pub board: Board,
    /// 该时刻的累计分数
    pub score: u64,
    /// 产生该局面的方向（初始局面为 None）
    pub direction: Option<Direction>,
}

impl HistoryEntry {
    pub fn new(board: Board, score: u64, direction: Option<Direction>) -> Self {
        Self {
            board,
            score,
            direction,
        }
    }
}

/// 有界的悔棋栈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    /// 当前条目下标
    cursor: usize,
    /// 最多保留的条目数（≥1）
    max_depth: usize,
}

impl HistoryStack {
    /// 以初始局面创建历史
    pub fn new(initial: HistoryEntry, max_depth: usize) -> Self {
        let mut entries = VecDeque::with_capacity(max_depth.clamp(1, 64));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// 追加新局面：截断游标之后的记录，追加并前移游标
    pub fn push(&mut self, board: Board, score: u64, direction: Option<Direction>) {
        self.entries.truncate(self.cursor + 1);
        self.entries
            .push_back(HistoryEntry::new(board, score, direction));

        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// 后退一步，返回新的当前条目；已在最早记录时返回 None
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// 前进一步，返回新的当前条目；没有可重做记录时返回 None
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// 当前条目
    pub fn current(&self) -> &HistoryEntry {
        // 构造时至少有一条记录，截断也总会保留游标处的记录
        &self.entries[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// 当前游标
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 已保存的条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// 按时间顺序遍历全部条目
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// 校验反序列化得到的历史是否自洽
    pub fn is_consistent(&self) -> bool {
        !self.entries.is_empty()
            && self.cursor < self.entries.len()
            && self.max_depth >= 1
            && self.entries.len() <= self.max_depth
    }
}
