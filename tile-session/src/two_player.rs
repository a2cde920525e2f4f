//! 双人分屏对战
//!
//! 两位玩家各自拥有完全独立的会话，轮流走子。
//! 只有有效走子才交换回合；一方进入终局后由另一方继续。

use rand::Rng;
use serde::{Deserialize, Serialize};
use tile_engine::Direction;

use crate::config::GameConfig;
use crate::error::{Result, SessionError};
use crate::session::{GameSession, SessionState, TurnReport};

/// 第二位玩家的种子扰动
const SECOND_SEED_MASK: u64 = 0x9E37_79B9_7F4A_7C15;

/// 玩家
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(&self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn index(&self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::One => write!(f, "Player 1"),
            Player::Two => write!(f, "Player 2"),
        }
    }
}

/// 对战结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Winner(Player),
    Draw,
}

/// 双人对战
#[derive(Debug, Clone)]
pub struct TwoPlayerMatch {
    sessions: [GameSession; 2],
    current: Player,
    outcome: Option<MatchOutcome>,
}

impl TwoPlayerMatch {
    /// 创建对战，两块棋盘使用互相独立的种子
    pub fn new(config: GameConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let first = GameSession::new(GameConfig {
            seed: Some(seed),
            ..config.clone()
        })?;
        let second = GameSession::new(GameConfig {
            seed: Some(seed ^ SECOND_SEED_MASK),
            ..config
        })?;
        Ok(Self::from_sessions(first, second))
    }

    /// 由两个已有会话组成对战
    pub fn from_sessions(first: GameSession, second: GameSession) -> Self {
        let mut game = Self {
            sessions: [first, second],
            current: Player::One,
            outcome: None,
        };
        game.settle();
        if game.session(Player::One).is_over() && !game.session(Player::Two).is_over() {
            game.current = Player::Two;
        }
        game
    }

    /// 当前玩家走一步
    pub fn apply_move(&mut self, direction: Direction) -> Result<TurnReport> {
        if let Some(outcome) = self.outcome {
            return Err(match outcome {
                MatchOutcome::Winner(_) => SessionError::GameWon,
                MatchOutcome::Draw => SessionError::NoLegalMoves,
            });
        }

        let player = self.current;
        let report = self.sessions[player.index()].apply_move(direction)?;
        if !report.moved {
            return Ok(report);
        }

        self.settle();
        if self.outcome.is_none() && !self.session(player.other()).is_over() {
            self.current = player.other();
        }
        Ok(report)
    }

    /// 判定胜负：先达成目标者胜；双方都终局时按分数比较
    fn settle(&mut self) {
        for player in [Player::One, Player::Two] {
            if self.session(player).session_state() == SessionState::Won {
                self.outcome = Some(MatchOutcome::Winner(player));
                tracing::info!("{} 达成目标", player);
                return;
            }
        }

        if self.sessions.iter().all(GameSession::is_over) {
            let (one, two) = (self.sessions[0].score(), self.sessions[1].score());
            self.outcome = Some(match one.cmp(&two) {
                std::cmp::Ordering::Greater => MatchOutcome::Winner(Player::One),
                std::cmp::Ordering::Less => MatchOutcome::Winner(Player::Two),
                std::cmp::Ordering::Equal => MatchOutcome::Draw,
            });
            tracing::info!("双方均已终局: {} vs {}", one, two);
        }
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn session(&self, player: Player) -> &GameSession {
        &self.sessions[player.index()]
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// 两位玩家的分数
    pub fn scores(&self) -> (u64, u64) {
        (self.sessions[0].score(), self.sessions[1].score())
    }
}
