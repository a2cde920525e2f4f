//! Zobrist 哈希
//!
//! 为每个位置上的每个方块指数和障碍物生成随机键，用于置换表索引。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_engine::{Board, Cell, MAX_BOARD_SIZE, MAX_TILE_EXPONENT};

const MAX_EXPONENT: usize = MAX_TILE_EXPONENT as usize;

const MAX_CELLS: usize = MAX_BOARD_SIZE * MAX_BOARD_SIZE;

/// Zobrist 哈希表
pub struct ZobristTable {
    /// 方块哈希值 [position][exponent]
    tiles: Vec<[u64; MAX_EXPONENT + 1]>,
    /// 障碍物哈希值 [position]
    obstacles: [u64; MAX_CELLS],
    /// 棋盘边长哈希值，区分不同尺寸下相同下标的布局
    sizes: [u64; MAX_BOARD_SIZE + 1],
}

impl ZobristTable {
    /// 创建新的 Zobrist 表（使用固定种子保证确定性）
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0x2048_CAFE_D00D_1234);

        let mut tiles = vec![[0u64; MAX_EXPONENT + 1]; MAX_CELLS];
        for keys in tiles.iter_mut() {
            for key in keys.iter_mut() {
                *key = rng.gen();
            }
        }

        let mut obstacles = [0u64; MAX_CELLS];
        for key in obstacles.iter_mut() {
            *key = rng.gen();
        }

        let mut sizes = [0u64; MAX_BOARD_SIZE + 1];
        for key in sizes.iter_mut() {
            *key = rng.gen();
        }

        Self {
            tiles,
            obstacles,
            sizes,
        }
    }

    /// 计算棋盘的完整哈希值
    pub fn hash(&self, board: &Board) -> u64 {
        let size = board.size();
        let mut hash = self.sizes[size.min(MAX_BOARD_SIZE)];

        for (pos, cell) in board.cells() {
            let index = pos.to_index(size);
            match cell {
                Cell::Tile(_) => hash ^= self.tile_hash(index, cell.exponent()),
                Cell::Obstacle => hash ^= self.obstacles[index],
                Cell::Empty => {}
            }
        }

        hash
    }

    /// 获取方块的哈希值
    #[inline]
    pub fn tile_hash(&self, index: usize, exponent: u32) -> u64 {
        self.tiles[index][(exponent as usize).min(MAX_EXPONENT)]
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}
