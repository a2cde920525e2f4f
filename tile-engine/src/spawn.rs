//! 新方块生成
//!
//! 随机源由会话持有并可序列化，同一种子 + 同一走法序列总能复现相同的对局。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cell::{Cell, Position};
use crate::constants::{FOUR_PROBABILITY, SPAWN_HIGH, SPAWN_LOW};

/// 一次生成的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    pub position: Position,
    pub value: u64,
}

/// 新方块生成器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnGenerator {
    /// 种子（仅用于展示和存档）
    seed: u64,
    /// 随机源（包含流位置，存档后可继续同一序列）
    rng: ChaCha8Rng,
}

impl SpawnGenerator {
    /// 使用种子创建生成器
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 在随机空格上放置一个新方块；没有空格时什么也不做
    pub fn spawn(&mut self, board: &mut Board) -> Option<Spawn> {
        let empty = board.empty_positions();
        if empty.is_empty() {
            tracing::trace!("棋盘已满，跳过生成");
            return None;
        }

        let position = empty[self.rng.gen_range(0..empty.len())];
        let value = self.next_value();
        board.put(position, Cell::Tile(value));

        Some(Spawn { position, value })
    }

    /// 从空格中不重复地随机抽取 `count` 个位置（用于放置障碍物）
    pub fn pick_positions(&mut self, board: &Board, count: usize) -> Vec<Position> {
        let mut candidates = board.empty_positions();
        let mut picked = Vec::with_capacity(count.min(candidates.len()));
        while picked.len() < count && !candidates.is_empty() {
            let index = self.rng.gen_range(0..candidates.len());
            picked.push(candidates.swap_remove(index));
        }
        picked.sort();
        picked
    }

    fn next_value(&mut self) -> u64 {
        if self.rng.gen::<f64>() < FOUR_PROBABILITY {
            SPAWN_HIGH
        } else {
            SPAWN_LOW
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::Notation;

    #[test]
    fn test_spawn_on_empty_cell() {
        let mut board = Board::new(4).unwrap();
        let mut spawner = SpawnGenerator::new(7);

        let spawn = spawner.spawn(&mut board).unwrap();
        assert!(spawn.value == 2 || spawn.value == 4);
        assert_eq!(board.at(spawn.position), Ok(Cell::Tile(spawn.value)));
        assert_eq!(board.count_empty(), 15);
    }

    #[test]
    fn test_spawn_full_board_is_noop() {
        let mut board = Notation::parse("2,4,8/4,8,16/8,16,32").unwrap();
        let before = board.clone();
        let mut spawner = SpawnGenerator::new(1);

        assert_eq!(spawner.spawn(&mut board), None);
        assert_eq!(board, before);
    }

    #[test]
    fn test_spawn_never_hits_obstacle() {
        let mut board = Notation::parse("X,X,X/X,0,X/X,X,X").unwrap();
        let mut spawner = SpawnGenerator::new(3);

        let spawn = spawner.spawn(&mut board).unwrap();
        assert_eq!(spawn.position, Position::new_unchecked(1, 1));
        assert_eq!(board.obstacle_positions().len(), 8);
    }

    #[test]
    fn test_same_seed_reproduces() {
        let mut a = SpawnGenerator::new(42);
        let mut b = SpawnGenerator::new(42);
        let mut board_a = Board::new(5).unwrap();
        let mut board_b = Board::new(5).unwrap();

        for _ in 0..20 {
            assert_eq!(a.spawn(&mut board_a), b.spawn(&mut board_b));
        }
        assert_eq!(board_a, board_b);
    }

    #[test]
    fn test_serialized_generator_continues_sequence() {
        let mut original = SpawnGenerator::new(99);
        let mut board = Board::new(6).unwrap();
        for _ in 0..5 {
            original.spawn(&mut board);
        }

        let bytes = bincode::serialize(&original).unwrap();
        let mut restored: SpawnGenerator = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, original);

        let mut board_a = board.clone();
        let mut board_b = board;
        for _ in 0..10 {
            assert_eq!(original.spawn(&mut board_a), restored.spawn(&mut board_b));
        }
    }

    #[test]
    fn test_four_ratio_converges() {
        let mut spawner = SpawnGenerator::new(2024);
        let trials = 20_000;
        let mut fours = 0;

        for _ in 0..trials {
            let mut board = Board::new(4).unwrap();
            if let Some(spawn) = spawner.spawn(&mut board) {
                if spawn.value == 4 {
                    fours += 1;
                }
            }
        }

        let ratio = fours as f64 / trials as f64;
        assert!((ratio - 0.1).abs() < 0.02, "4 的比例应接近 0.10，实际 {}", ratio);
    }

    #[test]
    fn test_spawn_position_is_uniform() {
        let mut spawner = SpawnGenerator::new(5);
        let mut counts = [0usize; 9];
        for _ in 0..9_000 {
            let mut board = Board::new(3).unwrap();
            let spawn = spawner.spawn(&mut board).unwrap();
            counts[spawn.position.to_index(3)] += 1;
        }
        for count in counts {
            assert!((800..1200).contains(&count), "分布不均匀: {:?}", counts);
        }
    }

    #[test]
    fn test_pick_positions() {
        let board = Notation::parse("2,0,0/0,0,0/0,0,4").unwrap();
        let mut spawner = SpawnGenerator::new(11);
        let picked = spawner.pick_positions(&board, 4);

        assert_eq!(picked.len(), 4);
        for pos in &picked {
            assert_eq!(board.at(*pos), Ok(Cell::Empty));
        }
        let mut deduped = picked.clone();
        deduped.dedup();
        assert_eq!(deduped, picked);

        assert_eq!(spawner.pick_positions(&board, 20).len(), 7);
    }
}
