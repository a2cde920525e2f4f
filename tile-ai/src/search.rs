//! 搜索引擎
//!
//! 实现 Expectimax + 迭代加深 + 置换表
//!
//! 玩家层取四个方向中的最大值，机会层按 0.9/0.1 的权重对所有空格上
//! 生成 2 或 4 的结果求期望。超时或超出节点预算时丢弃未完成的那一轮，
//! 返回上一轮完整搜索的结果。

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tile_engine::{Board, Direction, MoveResolver, FOUR_PROBABILITY, SPAWN_HIGH, SPAWN_LOW};

use crate::evaluate::{Evaluator, HeuristicWeights};
use crate::transposition::TranspositionTable;
use crate::zobrist::ZobristTable;

/// AI 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// 简单：depth=1
    Easy,
    /// 中等：depth=2
    #[default]
    Medium,
    /// 困难：depth=3
    Hard,
}

impl Difficulty {
    /// 每局默认提示次数
    pub fn default_hint_limit(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 5,
            Difficulty::Hard => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    /// 最大搜索深度（玩家层数）
    pub max_depth: u8,
    pub time_limit_ms: u64,
    /// 单次搜索最多访问的节点数
    pub node_budget: u64,
    /// 置换表大小（MB）
    pub tt_size_mb: usize,
    pub weights: HeuristicWeights,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let (max_depth, time_limit_ms, node_budget) = match difficulty {
            Difficulty::Easy => (1, 200, 50_000),
            Difficulty::Medium => (2, 500, 500_000),
            Difficulty::Hard => (3, 1500, 2_000_000),
        };
        Self {
            difficulty,
            max_depth,
            time_limit_ms,
            node_budget,
            tt_size_mb: 4,
            weights: HeuristicWeights::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}

/// 走法建议
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// 推荐方向
    pub direction: Direction,
    /// 该方向的期望评估值
    pub score: f64,
    /// 实际完成的搜索深度（0 表示只做了静态评估）
    pub depth: u8,
}

/// AI 引擎
pub struct AiEngine {
    config: AiConfig,
    evaluator: Evaluator,
    zobrist: ZobristTable,
    tt: TranspositionTable,
    nodes_searched: u64,
    deadline: Instant,
    aborted: bool,
}

impl AiEngine {
    /// 创建新的 AI 引擎
    pub fn new(config: AiConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config.weights),
            zobrist: ZobristTable::new(),
            tt: TranspositionTable::new(config.tt_size_mb),
            nodes_searched: 0,
            deadline: Instant::now(),
            aborted: false,
            config,
        }
    }

    /// 从难度创建
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(AiConfig::from_difficulty(difficulty))
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 按配置的最大深度搜索
    pub fn suggest(&mut self, board: &Board) -> Option<Suggestion> {
        self.suggest_move(board, self.config.max_depth)
    }

    /// 搜索最佳方向
    ///
    /// 所有方向都无法改变棋盘时返回 None。
    pub fn suggest_move(&mut self, board: &Board, depth: u8) -> Option<Suggestion> {
        let started = Instant::now();
        self.nodes_searched = 0;
        self.aborted = false;
        self.deadline = started + Duration::from_millis(self.config.time_limit_ms);
        self.tt.new_search();

        let candidates: Vec<(Direction, Board)> = Direction::ALL
            .iter()
            .map(|dir| (*dir, MoveResolver::apply(board, *dir)))
            .filter(|(_, outcome)| outcome.moved)
            .map(|(dir, outcome)| (dir, outcome.board))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        // 深度 0：只对走完后的棋盘做静态评估，保证总有可用答案
        let mut best = self.pick(&candidates, |engine, after| engine.evaluator.evaluate(after), 0);

        for current_depth in 1..=depth {
            if self.should_stop() {
                break;
            }

            let result = self.pick(
                &candidates,
                |engine, after| engine.chance_node(after, current_depth),
                current_depth,
            );

            if self.aborted {
                tracing::debug!("深度 {} 未完成，使用深度 {} 的结果", current_depth, best.depth);
                break;
            }
            best = result;
        }

        let tt = self.tt.stats();
        tracing::debug!(
            "搜索完成: {} 深度={} 分数={:.2} 节点={} 用时={:?} 置换表命中={:.1}% 占用={:.1}%",
            best.direction,
            best.depth,
            best.score,
            self.nodes_searched,
            started.elapsed(),
            tt.hit_rate() * 100.0,
            tt.usage() * 100.0
        );

        Some(best)
    }

    /// 按优先级顺序比较候选方向，只有严格更大时才替换
    fn pick<F>(&mut self, candidates: &[(Direction, Board)], mut value: F, depth: u8) -> Suggestion
    where
        F: FnMut(&mut Self, &Board) -> f64,
    {
        let mut best: Option<Suggestion> = None;
        for (direction, after) in candidates {
            let score = value(self, after);
            if self.aborted {
                break;
            }
            if best.map_or(true, |b| score > b.score) {
                best = Some(Suggestion {
                    direction: *direction,
                    score,
                    depth,
                });
            }
        }

        // candidates 非空
        best.unwrap_or(Suggestion {
            direction: candidates[0].0,
            score: f64::MIN,
            depth,
        })
    }

    /// 玩家节点：取所有合法方向的最大期望值
    fn max_node(&mut self, board: &Board, depth: u8) -> f64 {
        self.nodes_searched += 1;

        if self.should_stop() {
            self.aborted = true;
            return 0.0;
        }

        if depth == 0 {
            return if board.has_legal_move() {
                self.evaluator.evaluate(board)
            } else {
                self.evaluator.evaluate_terminal(board)
            };
        }

        let hash = self.zobrist.hash(board);
        if let Some(score) = self.tt.probe(hash, depth) {
            return score;
        }

        let mut best: Option<f64> = None;
        for direction in Direction::ALL {
            let outcome = MoveResolver::apply(board, direction);
            if !outcome.moved {
                continue;
            }
            let score = self.chance_node(&outcome.board, depth);
            if self.aborted {
                return 0.0;
            }
            best = Some(best.map_or(score, |b| b.max(score)));
        }

        let score = best.unwrap_or_else(|| self.evaluator.evaluate_terminal(board));
        self.tt.store(hash, score, depth);
        score
    }

    /// 机会节点：对所有空格上生成 2/4 的结果求期望
    fn chance_node(&mut self, board: &Board, depth: u8) -> f64 {
        self.nodes_searched += 1;

        let empty = board.empty_positions();
        if empty.is_empty() {
            return self.max_node(board, depth - 1);
        }

        let mut total = 0.0;
        for pos in &empty {
            for (value, probability) in [
                (SPAWN_LOW, 1.0 - FOUR_PROBABILITY),
                (SPAWN_HIGH, FOUR_PROBABILITY),
            ] {
                let mut child = board.clone();
                if child.place_tile(*pos, value).is_err() {
                    continue;
                }
                total += probability * self.max_node(&child, depth - 1);
                if self.aborted {
                    return 0.0;
                }
            }
        }

        total / empty.len() as f64
    }

    fn should_stop(&self) -> bool {
        self.nodes_searched >= self.config.node_budget || Instant::now() >= self.deadline
    }

    /// 获取搜索的节点数
    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}
