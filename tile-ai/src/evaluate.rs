//! 局面评估函数
//!
//! 所有分量都以方块的 log2 指数计算，避免大方块让某一项压倒其他项。
//! 首选角落固定为左上角：单调性要求行从左到右、列从上到下不递增，
//! 位置权重矩阵沿蛇形路线从左上角递减。

use serde::{Deserialize, Serialize};
use tile_engine::{Board, Cell, Direction, MoveResolver};

/// 无合法走法的局面额外扣除的分数
pub const LOSS_PENALTY: f64 = 100_000.0;

/// 各启发项的权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicWeights {
    /// 空格数量
    pub empty: f64,
    /// 单调性
    pub monotonicity: f64,
    /// 平滑度
    pub smoothness: f64,
    /// 角落位置权重
    pub corner: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            empty: 2.7,
            monotonicity: 1.0,
            smoothness: 0.1,
            corner: 1.0,
        }
    }
}

/// 评估器
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    weights: HeuristicWeights,
}

impl Evaluator {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// 评估棋盘（越大越好）
    pub fn evaluate(&self, board: &Board) -> f64 {
        let w = &self.weights;
        w.empty * board.count_empty() as f64
            + w.monotonicity * Self::monotonicity(board)
            + w.smoothness * Self::smoothness(board)
            + w.corner * Self::corner_bias(board)
    }

    /// 评估终局：无合法走法时扣除 [`LOSS_PENALTY`]
    pub fn evaluate_terminal(&self, board: &Board) -> f64 {
        self.evaluate(board) - LOSS_PENALTY
    }

    /// 单调性（≤0）：行内从左到右、列内从上到下每出现一次指数上升就扣除上升量
    pub fn monotonicity(board: &Board) -> f64 {
        -segments(board)
            .iter()
            .map(|segment| {
                segment
                    .windows(2)
                    .map(|pair| (pair[1] - pair[0]).max(0.0))
                    .sum::<f64>()
            })
            .sum::<f64>()
    }

    /// 平滑度（≤0）：相邻方块指数差的绝对值之和取负
    pub fn smoothness(board: &Board) -> f64 {
        -segments(board)
            .iter()
            .map(|segment| {
                segment
                    .windows(2)
                    .map(|pair| (pair[1] - pair[0]).abs())
                    .sum::<f64>()
            })
            .sum::<f64>()
    }

    /// 角落偏好：方块指数与蛇形位置权重的加权和
    pub fn corner_bias(board: &Board) -> f64 {
        let weights = corner_weights(board.size());
        board
            .cells()
            .filter(|(_, cell)| cell.is_tile())
            .map(|(pos, cell)| f64::from(cell.exponent()) * weights[pos.to_index(board.size())])
            .sum()
    }
}

/// 蛇形位置权重矩阵（行优先），左上角为 1，沿蛇形路线线性递减
pub fn corner_weights(size: usize) -> Vec<f64> {
    let total = (size * size) as f64;
    let mut weights = vec![0.0; size * size];
    for row in 0..size {
        for step in 0..size {
            let col = if row % 2 == 0 { step } else { size - 1 - step };
            let rank = (row * size + step) as f64;
            weights[row * size + col] = 1.0 - rank / total;
        }
    }
    weights
}

/// 所有行（左→右）和列（上→下）被障碍物切分后的方块指数序列，空格被跳过
fn segments(board: &Board) -> Vec<Vec<f64>> {
    let size = board.size();
    let mut result = Vec::with_capacity(size * 2);

    for direction in [Direction::Left, Direction::Up] {
        for index in 0..size {
            let mut current = Vec::with_capacity(size);
            for pos in MoveResolver::line(size, index, direction) {
                match board.at(pos).unwrap_or(Cell::Obstacle) {
                    Cell::Obstacle => {
                        if current.len() > 1 {
                            result.push(std::mem::take(&mut current));
                        } else {
                            current.clear();
                        }
                    }
                    Cell::Tile(value) => current.push(f64::from(value.trailing_zeros())),
                    Cell::Empty => {}
                }
            }
            if current.len() > 1 {
                result.push(current);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_engine::Notation;

    fn board(notation: &str) -> Board {
        Notation::parse(notation).unwrap()
    }

    #[test]
    fn test_more_empty_cells_is_better() {
        let evaluator = Evaluator::default();
        let open = board("4,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0");
        let crowded = board("4,2,4,2/2,4,2,4/0,0,0,0/0,0,0,0");
        assert!(evaluator.evaluate(&open) > evaluator.evaluate(&crowded));
    }

    #[test]
    fn test_monotonicity() {
        let descending = board("8,4,2/0,0,0/0,0,0");
        let ascending = board("2,4,8/0,0,0/0,0,0");
        assert_eq!(Evaluator::monotonicity(&descending), 0.0);
        assert_eq!(Evaluator::monotonicity(&ascending), -2.0);
    }

    #[test]
    fn test_smoothness() {
        let smooth = board("4,4,0/0,0,0/0,0,0");
        let rough = board("2,64,0/0,0,0/0,0,0");
        assert_eq!(Evaluator::smoothness(&smooth), 0.0);
        assert_eq!(Evaluator::smoothness(&rough), -5.0);
    }

    #[test]
    fn test_obstacle_breaks_adjacency() {
        let blocked = board("2,X,64/0,0,0/0,0,0");
        assert_eq!(Evaluator::smoothness(&blocked), 0.0);
        assert_eq!(Evaluator::monotonicity(&blocked), 0.0);

        // 空格不打断比较
        let gap = board("2,0,64/0,0,0/0,0,0");
        assert_eq!(Evaluator::smoothness(&gap), -5.0);
    }

    #[test]
    fn test_corner_preference() {
        let corner = board("256,0,0,0/0,0,0,0/0,0,0,0/0,0,0,0");
        let center = board("0,0,0,0/0,256,0,0/0,0,0,0/0,0,0,0");
        assert!(Evaluator::corner_bias(&corner) > Evaluator::corner_bias(&center));

        let evaluator = Evaluator::default();
        assert!(evaluator.evaluate(&corner) > evaluator.evaluate(&center));
    }

    #[test]
    fn test_corner_weights_snake() {
        let weights = corner_weights(3);
        assert_eq!(weights[0], 1.0);
        // 第二行从右往左继续
        assert!(weights[5] > weights[4]);
        assert!(weights[4] > weights[3]);
        assert!(weights[3] > weights[6]);
        assert!(weights.iter().all(|w| *w > 0.0));
    }

    #[test]
    fn test_terminal_penalty() {
        let evaluator = Evaluator::default();
        let stuck = board("2,4,8/4,8,16/8,16,32");
        assert_eq!(
            evaluator.evaluate_terminal(&stuck),
            evaluator.evaluate(&stuck) - LOSS_PENALTY
        );
    }
}
