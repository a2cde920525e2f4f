//! 挑战模式预设
//!
//! 每个挑战是一块固定的开局棋盘、一个目标方块和一个步数上限。

use tile_engine::{Board, Notation};

use crate::error::{Result, SessionError};

/// 挑战模式的默认步数上限
pub const CHALLENGE_MOVE_LIMIT: u32 = 50;

/// 挑战预设
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub name: &'static str,
    pub description: &'static str,
    /// 开局棋盘记谱
    pub board: &'static str,
    pub target: u32,
    pub move_limit: u32,
}

/// 全部挑战
pub const CHALLENGES: [Challenge; 3] = [
    Challenge {
        name: "symmetry",
        description: "Reach 256 from a symmetric opening",
        board: "2,0,0,2/0,4,4,0/0,4,4,0/2,0,0,2",
        target: 256,
        move_limit: CHALLENGE_MOVE_LIMIT,
    },
    Challenge {
        name: "tower",
        description: "Build 2048 from a staircase in the corner",
        board: "0,0,0,2/0,0,2,4/0,2,4,8/2,4,8,16",
        target: 2048,
        move_limit: CHALLENGE_MOVE_LIMIT,
    },
    Challenge {
        name: "spiral",
        description: "Reach 512 starting from a ring of twos",
        board: "2,2,2,2/0,0,0,2/2,0,0,2/2,2,2,2",
        target: 512,
        move_limit: CHALLENGE_MOVE_LIMIT,
    },
];

impl Challenge {
    /// 按名称查找（不区分大小写）
    pub fn find(name: &str) -> Result<&'static Challenge> {
        let name = name.trim();
        CHALLENGES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SessionError::UnknownChallenge {
                name: name.to_string(),
            })
    }

    /// 开局棋盘
    pub fn board(&self) -> Result<Board> {
        Ok(Notation::parse(self.board)?)
    }
}
