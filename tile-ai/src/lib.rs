//! 2048 AI 引擎
//!
//! 包含:
//! - 局面评估函数（空格、单调性、平滑度、角落偏好）
//! - Expectimax 搜索 + 迭代加深
//! - Zobrist 哈希
//! - 置换表
//! - 后台建议任务

mod evaluate;
mod search;
mod transposition;
mod worker;
mod zobrist;

pub use evaluate::{corner_weights, Evaluator, HeuristicWeights, LOSS_PENALTY};
pub use search::{AiConfig, AiEngine, Difficulty, Suggestion};
pub use transposition::{TTEntry, TTStats, TranspositionTable};
pub use worker::SuggestionTask;
pub use zobrist::ZobristTable;
