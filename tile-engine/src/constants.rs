//! 引擎常量定义

/// 最小棋盘边长
pub const MIN_BOARD_SIZE: usize = 3;

/// 最大棋盘边长
pub const MAX_BOARD_SIZE: usize = 6;

/// 默认棋盘边长
pub const DEFAULT_BOARD_SIZE: usize = 4;

/// 默认胜利目标方块
pub const DEFAULT_TARGET: u32 = 2048;

/// 新方块为 4 的概率（其余为 2）
pub const FOUR_PROBABILITY: f64 = 0.1;

/// 新方块的较小取值
pub const SPAWN_LOW: u64 = 2;

/// 新方块的较大取值
pub const SPAWN_HIGH: u64 = 4;

/// 方块指数上限。6×6 棋盘最多能合出 2^37，上限留有余量
pub const MAX_TILE_EXPONENT: u32 = 40;

/// 最大方块，达到后不再参与合并
pub const MAX_TILE: u64 = 1 << MAX_TILE_EXPONENT;

/// 开局生成的方块数量
pub const INITIAL_TILES: usize = 2;

/// 默认历史记录深度
pub const DEFAULT_HISTORY_DEPTH: usize = 32;
