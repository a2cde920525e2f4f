//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::cell::{is_valid_tile_value, Cell, Position};
use crate::constants::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::error::{EngineError, Result};
use crate::moves::MoveResolver;
use crate::Direction;

/// 棋盘
///
/// N×N 的格子数组，索引为 `row * size + col`。复制棋盘总是深拷贝。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// 边长
    size: usize,
    /// 格子，使用 Vec 以支持 serde
    cells: Vec<Cell>,
}

impl Board {
    /// 创建空棋盘
    pub fn new(size: usize) -> Result<Self> {
        check_size(size)?;
        Ok(Self {
            size,
            cells: vec![Cell::Empty; size * size],
        })
    }

    /// 创建带障碍物的空棋盘
    pub fn with_obstacles(size: usize, obstacles: &[Position]) -> Result<Self> {
        let mut board = Self::new(size)?;
        for pos in obstacles {
            if !board.at(*pos)?.is_empty() {
                return Err(EngineError::ObstacleOverlap {
                    row: pos.row,
                    col: pos.col,
                });
            }
            board.put(*pos, Cell::Obstacle);
        }
        Ok(board)
    }

    /// 从格子列表创建（行优先），并校验全部不变量
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self> {
        let board = Self { size, cells };
        board.validate()?;
        Ok(board)
    }

    /// 校验棋盘不变量：边长合法、格子数量为 N²、方块数值合法
    pub fn validate(&self) -> Result<()> {
        check_size(self.size)?;
        if self.cells.len() != self.size * self.size {
            return Err(EngineError::InvalidNotation {
                reason: format!(
                    "Expected {} cells, got {}",
                    self.size * self.size,
                    self.cells.len()
                ),
            });
        }
        for cell in &self.cells {
            if let Cell::Tile(value) = cell {
                if !is_valid_tile_value(*value) {
                    return Err(EngineError::InvalidTile { value: *value });
                }
            }
        }
        Ok(())
    }

    /// 棋盘边长
    pub fn size(&self) -> usize {
        self.size
    }

    /// 获取指定位置的格子
    pub fn get(&self, row: usize, col: usize) -> Result<Cell> {
        self.at(Position::new_unchecked(row, col))
    }

    /// 获取指定坐标的格子
    pub fn at(&self, pos: Position) -> Result<Cell> {
        if pos.is_valid(self.size) {
            Ok(self.cells[pos.to_index(self.size)])
        } else {
            Err(self.out_of_bounds(pos))
        }
    }

    /// 读取格子，调用方保证坐标在棋盘内（坐标来自同一棋盘的线或遍历）
    pub(crate) fn cell(&self, pos: Position) -> Cell {
        self.cells[pos.to_index(self.size)]
    }

    /// 写入格子，坐标约定同 [`Board::cell`]
    pub(crate) fn put(&mut self, pos: Position, cell: Cell) {
        let index = pos.to_index(self.size);
        self.cells[index] = cell;
    }

    /// 在空格上放置一个方块（模拟生成，供搜索和预设棋盘使用）
    pub fn place_tile(&mut self, pos: Position, value: u64) -> Result<()> {
        let cell = Cell::tile(value)?;
        if !self.at(pos)?.is_empty() {
            return Err(EngineError::CellOccupied {
                row: pos.row,
                col: pos.col,
            });
        }
        self.put(pos, cell);
        Ok(())
    }

    /// 按行优先顺序遍历所有格子
    pub fn cells(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new_unchecked(index / size, index % size), *cell))
    }

    /// 所有空格位置（行优先）
    pub fn empty_positions(&self) -> Vec<Position> {
        self.cells()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// 所有障碍物位置（行优先）
    pub fn obstacle_positions(&self) -> Vec<Position> {
        self.cells()
            .filter(|(_, cell)| cell.is_obstacle())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// 空格数量
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    /// 是否没有空格
    pub fn is_full(&self) -> bool {
        self.count_empty() == 0
    }

    /// 至少一个方向能改变棋盘时为 true
    pub fn has_legal_move(&self) -> bool {
        Direction::ALL
            .iter()
            .any(|dir| MoveResolver::apply(self, *dir).moved)
    }

    /// 最大方块
    pub fn max_tile(&self) -> Option<u64> {
        self.cells.iter().filter_map(|cell| cell.value()).max()
    }

    /// 所有方块数值之和
    pub fn tile_sum(&self) -> u64 {
        self.cells
            .iter()
            .filter_map(|cell| cell.value())
            .sum()
    }

    /// 是否存在不小于目标值的方块
    pub fn reached(&self, target: u32) -> bool {
        self.max_tile().is_some_and(|max| max >= u64::from(target))
    }

    fn out_of_bounds(&self, pos: Position) -> EngineError {
        EngineError::OutOfBounds {
            row: pos.row,
            col: pos.col,
            size: self.size,
        }
    }
}

fn check_size(size: usize) -> Result<()> {
    if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(EngineError::InvalidBoardSize {
            size,
            min: MIN_BOARD_SIZE,
            max: MAX_BOARD_SIZE,
        })
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .max_tile()
            .map(|max| max.to_string().len())
            .unwrap_or(1)
            .max(1);
        let separator = "-".repeat((width + 3) * self.size + 1);

        writeln!(f, "{}", separator)?;
        for row in 0..self.size {
            write!(f, "|")?;
            for col in 0..self.size {
                let text = match self.cells[row * self.size + col] {
                    Cell::Empty => ".".to_string(),
                    Cell::Obstacle => "X".to_string(),
                    Cell::Tile(value) => value.to_string(),
                };
                write!(f, " {:>width$} |", text, width = width)?;
            }
            writeln!(f)?;
            writeln!(f, "{}", separator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::Notation;

    #[test]
    fn test_new_board() {
        for size in 3..=6 {
            let board = Board::new(size).unwrap();
            assert_eq!(board.size(), size);
            assert_eq!(board.count_empty(), size * size);
            assert!(!board.is_full());
        }
        assert!(matches!(
            Board::new(2),
            Err(EngineError::InvalidBoardSize { size: 2, .. })
        ));
        assert!(Board::new(7).is_err());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let board = Board::new(4).unwrap();
        assert_eq!(board.get(0, 0), Ok(Cell::Empty));
        assert_eq!(
            board.get(4, 0),
            Err(EngineError::OutOfBounds { row: 4, col: 0, size: 4 })
        );
        assert!(board.get(0, 4).is_err());
    }

    #[test]
    fn test_set_and_copy_do_not_alias() {
        let pos = Position::new_unchecked(1, 2);
        let mut board = Board::new(4).unwrap();
        board.put(pos, Cell::Tile(8));
        let copy = board.clone();
        board.put(pos, Cell::Tile(16));

        assert_eq!(copy.get(1, 2), Ok(Cell::Tile(8)));
        assert_eq!(board.get(1, 2), Ok(Cell::Tile(16)));
        assert_ne!(copy, board);
    }

    #[test]
    fn test_place_tile() {
        let mut board = Notation::parse("2,0,0/0,X,0/0,0,0").unwrap();
        board.place_tile(Position::new_unchecked(0, 1), 4).unwrap();
        assert_eq!(board.get(0, 1), Ok(Cell::Tile(4)));

        assert_eq!(
            board.place_tile(Position::new_unchecked(0, 0), 2),
            Err(EngineError::CellOccupied { row: 0, col: 0 })
        );
        assert_eq!(
            board.place_tile(Position::new_unchecked(1, 1), 2),
            Err(EngineError::CellOccupied { row: 1, col: 1 })
        );
        assert_eq!(
            board.place_tile(Position::new_unchecked(2, 2), 6),
            Err(EngineError::InvalidTile { value: 6 })
        );
    }

    #[test]
    fn test_with_obstacles() {
        let obstacles = [Position::new_unchecked(0, 0), Position::new_unchecked(2, 3)];
        let board = Board::with_obstacles(4, &obstacles).unwrap();
        assert_eq!(board.obstacle_positions(), obstacles.to_vec());
        assert_eq!(board.count_empty(), 14);

        let duplicate = [Position::new_unchecked(1, 1), Position::new_unchecked(1, 1)];
        assert_eq!(
            Board::with_obstacles(4, &duplicate),
            Err(EngineError::ObstacleOverlap { row: 1, col: 1 })
        );
    }

    #[test]
    fn test_from_cells_validates() {
        assert!(Board::from_cells(3, vec![Cell::Empty; 9]).is_ok());
        assert!(Board::from_cells(3, vec![Cell::Empty; 8]).is_err());

        let mut cells = vec![Cell::Empty; 9];
        cells[4] = Cell::Tile(12);
        assert_eq!(
            Board::from_cells(3, cells),
            Err(EngineError::InvalidTile { value: 12 })
        );
    }

    #[test]
    fn test_is_full_and_legal_moves() {
        // 满盘但可以合并
        let board = Notation::parse("2,4,8/4,8,16/8,16,16").unwrap();
        assert!(board.is_full());
        assert!(board.has_legal_move());

        // 满盘且无法合并
        let stuck = Notation::parse("2,4,8/4,8,16/8,16,32").unwrap();
        assert!(stuck.is_full());
        assert!(!stuck.has_legal_move());
    }

    #[test]
    fn test_empty_cells_without_legal_move() {
        // 有空格，但障碍物把所有方块卡住
        let board = Notation::parse("2,X,./X,.,./.,.,.").unwrap();
        assert!(!board.is_full());
        assert!(!board.has_legal_move());
    }

    #[test]
    fn test_max_tile_and_sum() {
        let board = Notation::parse("2,0,4/0,X,0/0,0,128").unwrap();
        assert_eq!(board.max_tile(), Some(128));
        assert_eq!(board.tile_sum(), 134);
        assert!(board.reached(128));
        assert!(!board.reached(256));
        assert_eq!(Board::new(3).unwrap().max_tile(), None);
    }

    #[test]
    fn test_display() {
        let board = Notation::parse("2,0,X/0,0,0/0,0,1024").unwrap();
        let text = board.to_string();
        assert!(text.contains("1024"));
        assert!(text.contains('X'));
        assert_eq!(text.lines().count(), 7);
    }
}
