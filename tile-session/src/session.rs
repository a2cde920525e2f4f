//! 对局会话
//!
//! 会话独占自己的棋盘、随机源和历史，前端每次调用都会得到一份
//! [`TurnReport`]，计时、统计等外部组件只读取这些结果。

use std::collections::BTreeMap;

use bincode::Options;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tile_ai::{AiEngine, Suggestion, SuggestionTask};
use tile_engine::{
    Board, Direction, HistoryEntry, HistoryStack, MoveResolver, Position, Spawn, SpawnGenerator,
    INITIAL_TILES,
};

use crate::challenge::Challenge;
use crate::config::{GameConfig, GameMode};
use crate::error::{Result, SessionError};

/// 存档魔数
const SAVE_MAGIC: [u8; 4] = *b"T2KS";

/// 存档格式版本
const SAVE_VERSION: u16 = 1;

/// 单个存档的最大字节数
const MAX_SAVE_BYTES: u64 = 64 * 1024 * 1024;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// 进行中
    InProgress,
    /// 已达成目标
    Won,
    /// 无合法走法（终局）
    NoLegalMoves,
    /// 挑战步数用完（终局）
    OutOfMoves,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::InProgress => "in progress",
            SessionState::Won => "won",
            SessionState::NoLegalMoves => "no legal moves",
            SessionState::OutOfMoves => "out of moves",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 一次走子的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub direction: Direction,
    /// 棋盘是否发生变化；为 false 时会话状态完全不变
    pub moved: bool,
    pub score_delta: u64,
    /// 本步合并生成的方块位置
    pub merged: Vec<Position>,
    /// 本步生成的新方块
    pub spawned: Option<Spawn>,
    /// 走子后的总分
    pub score: u64,
    /// 走子后的状态
    pub state: SessionState,
    /// 状态发生变化时为 (之前, 之后)
    pub transition: Option<(SessionState, SessionState)>,
}

/// 对局会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// 构造时使用的配置（种子已确定）
    config: GameConfig,
    board: Board,
    score: u64,
    /// 胜利目标
    target: u32,
    state: SessionState,
    spawner: SpawnGenerator,
    history: HistoryStack,
    /// 已完成的有效走子数（悔棋不回退）
    moves_made: u32,
    /// 步数上限（挑战模式）
    move_limit: Option<u32>,
    undos_used: u32,
    hints_used: u32,
    checkpoints: BTreeMap<String, HistoryEntry>,
}

/// 存档外层结构
#[derive(Serialize, Deserialize)]
struct SaveEnvelope {
    magic: [u8; 4],
    version: u16,
    /// payload 的 SHA-256
    checksum: [u8; 32],
    payload: Vec<u8>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_SAVE_BYTES)
}

fn checksum(payload: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(payload));
    out
}

impl GameSession {
    /// 按配置创建新会话
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;

        let mut config = config;
        let seed = *config
            .seed
            .get_or_insert_with(|| rand::thread_rng().gen());
        let mut spawner = SpawnGenerator::new(seed);

        let (board, target, move_limit) = match &config.mode {
            GameMode::Challenge { name } => {
                let challenge = Challenge::find(name)?;
                (challenge.board()?, challenge.target, Some(challenge.move_limit))
            }
            mode => {
                let mut board = match mode {
                    GameMode::Obstacles { count } => {
                        let empty = Board::new(config.board_size)?;
                        let positions = spawner.pick_positions(&empty, *count);
                        Board::with_obstacles(config.board_size, &positions)?
                    }
                    _ => Board::new(config.board_size)?,
                };
                for _ in 0..INITIAL_TILES {
                    spawner.spawn(&mut board);
                }
                (board, config.target, None)
            }
        };

        tracing::info!(
            "新对局: 模式={} 边长={} 目标={} 种子={}",
            config.mode.name(),
            board.size(),
            target,
            seed
        );

        Self::assemble(config, board, target, move_limit, spawner)
    }

    /// 使用给定的开局棋盘创建会话（不生成初始方块）
    pub fn with_board(config: GameConfig, board: Board) -> Result<Self> {
        config.validate()?;
        board.validate()?;

        let mut config = config;
        let seed = *config
            .seed
            .get_or_insert_with(|| rand::thread_rng().gen());
        let target = config.target;
        Self::assemble(config, board, target, None, SpawnGenerator::new(seed))
    }

    fn assemble(
        config: GameConfig,
        board: Board,
        target: u32,
        move_limit: Option<u32>,
        spawner: SpawnGenerator,
    ) -> Result<Self> {
        let history = HistoryStack::new(
            HistoryEntry::new(board.clone(), 0, None),
            config.history_depth,
        );
        let mut session = Self {
            config,
            board,
            score: 0,
            target,
            state: SessionState::InProgress,
            spawner,
            history,
            moves_made: 0,
            move_limit,
            undos_used: 0,
            hints_used: 0,
            checkpoints: BTreeMap::new(),
        };
        session.state = session.derive_state();
        Ok(session)
    }

    /// 走一步
    ///
    /// 方向无法改变棋盘时返回 `moved = false` 的报告，状态不变。
    /// 终局后调用返回对应的错误。
    pub fn apply_move(&mut self, direction: Direction) -> Result<TurnReport> {
        self.ensure_playable()?;

        let outcome = MoveResolver::apply(&self.board, direction);
        if !outcome.moved {
            return Ok(TurnReport {
                direction,
                moved: false,
                score_delta: 0,
                merged: Vec::new(),
                spawned: None,
                score: self.score,
                state: self.state,
                transition: None,
            });
        }

        let mut board = outcome.board;
        let spawned = self.spawner.spawn(&mut board);
        self.board = board;
        self.score += outcome.score_delta;
        self.moves_made += 1;
        self.history
            .push(self.board.clone(), self.score, Some(direction));

        let before = self.state;
        self.state = self.derive_state();
        let transition = (before != self.state).then_some((before, self.state));
        if let Some((from, to)) = transition {
            tracing::info!("对局状态变化: {} -> {}", from, to);
        }

        tracing::debug!(
            "走子 {}: +{} 分，总分 {}，第 {} 步",
            direction,
            outcome.score_delta,
            self.score,
            self.moves_made
        );

        Ok(TurnReport {
            direction,
            moved: true,
            score_delta: outcome.score_delta,
            merged: outcome.merged,
            spawned,
            score: self.score,
            state: self.state,
            transition,
        })
    }

    /// 悔棋；没有可悔的记录时返回 None
    pub fn undo(&mut self) -> Result<Option<SessionState>> {
        if !self.history.can_undo() {
            return Ok(None);
        }
        if let Some(limit) = self.config.undo_limit {
            if self.undos_used >= limit {
                return Err(SessionError::UndoLimitReached { limit });
            }
        }

        let Some(entry) = self.history.undo().cloned() else {
            return Ok(None);
        };
        self.undos_used += 1;
        Ok(Some(self.restore_entry(entry)))
    }

    /// 重做；没有可重做的记录时返回 None
    pub fn redo(&mut self) -> Result<Option<SessionState>> {
        let Some(entry) = self.history.redo().cloned() else {
            return Ok(None);
        };
        Ok(Some(self.restore_entry(entry)))
    }

    /// 在当前棋盘上搜索建议方向
    ///
    /// 只有产生建议时才消耗一次提示；没有合法走法时返回 None。
    pub fn suggest_move(&mut self) -> Result<Option<Suggestion>> {
        if !self.take_hint()? {
            return Ok(None);
        }
        let mut engine = AiEngine::from_difficulty(self.config.difficulty);
        Ok(engine.suggest(&self.board))
    }

    /// 在后台线程上对当前棋盘快照搜索，计费规则同 [`GameSession::suggest_move`]
    pub fn spawn_suggestion(&mut self) -> Result<Option<SuggestionTask>> {
        if !self.take_hint()? {
            return Ok(None);
        }
        Ok(Some(SuggestionTask::spawn(
            self.board.clone(),
            tile_ai::AiConfig::from_difficulty(self.config.difficulty),
        )))
    }

    /// 扣除一次提示；棋盘上没有合法走法时不扣，返回 false
    fn take_hint(&mut self) -> Result<bool> {
        if let Some(limit) = self.config.hint_limit {
            if self.hints_used >= limit {
                return Err(SessionError::HintsExhausted { limit });
            }
        }
        if !self.board.has_legal_move() {
            return Ok(false);
        }
        self.hints_used += 1;
        Ok(true)
    }

    /// 把当前局面存为检查点（同名覆盖）
    pub fn checkpoint(&mut self, name: &str) {
        self.checkpoints
            .insert(name.to_string(), self.history.current().clone());
        tracing::debug!("保存检查点 {:?}", name);
    }

    /// 回到检查点，恢复的局面作为新的历史记录压入
    pub fn restore_checkpoint(&mut self, name: &str) -> Result<SessionState> {
        let entry = self
            .checkpoints
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCheckpoint {
                name: name.to_string(),
            })?;

        self.history.push(entry.board.clone(), entry.score, None);
        Ok(self.restore_entry(entry))
    }

    /// 已保存的检查点名称
    pub fn checkpoints(&self) -> impl Iterator<Item = &str> {
        self.checkpoints.keys().map(String::as_str)
    }

    fn restore_entry(&mut self, entry: HistoryEntry) -> SessionState {
        self.board = entry.board;
        self.score = entry.score;
        self.state = self.derive_state();
        self.state
    }

    fn ensure_playable(&self) -> Result<()> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::Won if self.config.continue_after_win => Ok(()),
            SessionState::Won => Err(SessionError::GameWon),
            SessionState::NoLegalMoves => Err(SessionError::NoLegalMoves),
            SessionState::OutOfMoves => Err(SessionError::OutOfMoves {
                limit: self.move_limit.unwrap_or(self.moves_made),
            }),
        }
    }

    /// 由当前棋盘推导状态
    ///
    /// 达成目标优先于其他状态；开启胜利后继续时，无路可走仍判为 NoLegalMoves。
    fn derive_state(&self) -> SessionState {
        let won = self.board.reached(self.target);
        let stuck = !self.board.has_legal_move();

        if won && !(self.config.continue_after_win && stuck) {
            SessionState::Won
        } else if stuck {
            SessionState::NoLegalMoves
        } else if self.move_limit.is_some_and(|limit| self.moves_made >= limit) {
            SessionState::OutOfMoves
        } else {
            SessionState::InProgress
        }
    }

    /// 当前棋盘
    pub fn current_board(&self) -> &Board {
        &self.board
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// 本局使用的随机种子
    pub fn seed(&self) -> u64 {
        self.spawner.seed()
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn move_limit(&self) -> Option<u32> {
        self.move_limit
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// 剩余悔棋次数，None 为不限
    pub fn undos_remaining(&self) -> Option<u32> {
        self.config
            .undo_limit
            .map(|limit| limit.saturating_sub(self.undos_used))
    }

    /// 剩余提示次数，None 为不限
    pub fn hints_remaining(&self) -> Option<u32> {
        self.config
            .hint_limit
            .map(|limit| limit.saturating_sub(self.hints_used))
    }

    /// 是否已进入不可继续的终局
    pub fn is_over(&self) -> bool {
        self.ensure_playable().is_err()
    }

    /// 序列化为存档数据
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = codec()
            .serialize(self)
            .map_err(|e| SessionError::corrupt(format!("failed to encode session: {}", e)))?;
        let envelope = SaveEnvelope {
            magic: SAVE_MAGIC,
            version: SAVE_VERSION,
            checksum: checksum(&payload),
            payload,
        };
        codec()
            .serialize(&envelope)
            .map_err(|e| SessionError::corrupt(format!("failed to encode envelope: {}", e)))
    }

    /// 从存档数据恢复会话
    ///
    /// 数据被截断、校验和不符或内容违反任何不变量时返回 `CorruptSave`。
    pub fn deserialize(blob: &[u8]) -> Result<Self> {
        let envelope: SaveEnvelope = codec()
            .deserialize(blob)
            .map_err(|e| SessionError::corrupt(format!("malformed envelope: {}", e)))?;

        if envelope.magic != SAVE_MAGIC {
            return Err(SessionError::corrupt("bad magic"));
        }
        if envelope.version != SAVE_VERSION {
            return Err(SessionError::corrupt(format!(
                "unsupported version {}",
                envelope.version
            )));
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err(SessionError::corrupt("checksum mismatch"));
        }

        let session: Self = codec()
            .deserialize(&envelope.payload)
            .map_err(|e| SessionError::corrupt(format!("malformed payload: {}", e)))?;
        session.check_invariants()?;
        Ok(session)
    }

    /// 校验反序列化得到的会话
    fn check_invariants(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| SessionError::corrupt(format!("config: {}", e)))?;
        self.board
            .validate()
            .map_err(|e| SessionError::corrupt(format!("board: {}", e)))?;

        if !self.history.is_consistent() {
            return Err(SessionError::corrupt("history cursor out of range"));
        }

        let obstacles = self.board.obstacle_positions();
        let snapshots = self
            .history
            .entries()
            .chain(self.checkpoints.values());
        for entry in snapshots {
            entry
                .board
                .validate()
                .map_err(|e| SessionError::corrupt(format!("history board: {}", e)))?;
            if entry.board.size() != self.board.size()
                || entry.board.obstacle_positions() != obstacles
            {
                return Err(SessionError::corrupt("obstacle layout differs between snapshots"));
            }
        }

        let current = self.history.current();
        if current.board != self.board || current.score != self.score {
            return Err(SessionError::corrupt("board does not match history"));
        }
        if self.target < 8 || !self.target.is_power_of_two() {
            return Err(SessionError::corrupt(format!("invalid target {}", self.target)));
        }
        if self.state != self.derive_state() {
            return Err(SessionError::corrupt("stored state does not match board"));
        }
        Ok(())
    }
}
