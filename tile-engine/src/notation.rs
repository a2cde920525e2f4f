//! 棋盘记谱格式
//!
//! 行之间用 `/` 分隔，格子之间用 `,` 分隔：
//! `0` 或 `.` 表示空格，`X` 表示障碍物，其余为方块数值。
//!
//! 示例：
//! `2,0,X,2/0,0,0,0/0,4,0,0/0,0,0,2048`

use crate::board::Board;
use crate::cell::{Cell, Position};
use crate::error::{EngineError, Result};

/// 记谱格式处理
pub struct Notation;

impl Notation {
    /// 解析记谱字符串为棋盘
    pub fn parse(text: &str) -> Result<Board> {
        let rows: Vec<&str> = text.trim().split('/').collect();
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);

        for (row_idx, row) in rows.iter().enumerate() {
            let tokens: Vec<&str> = row.split(',').map(str::trim).collect();
            if tokens.len() != size {
                return Err(EngineError::InvalidNotation {
                    reason: format!(
                        "Row {} has {} cells, expected {}",
                        row_idx,
                        tokens.len(),
                        size
                    ),
                });
            }
            for token in tokens {
                cells.push(Self::parse_cell(token)?);
            }
        }

        Board::from_cells(size, cells)
    }

    fn parse_cell(token: &str) -> Result<Cell> {
        match token {
            "0" | "." => Ok(Cell::Empty),
            "X" | "x" => Ok(Cell::Obstacle),
            _ => {
                let value: u64 = token.parse().map_err(|_| EngineError::InvalidNotation {
                    reason: format!("Invalid cell token: {:?}", token),
                })?;
                Cell::tile(value)
            }
        }
    }

    /// 将棋盘转换为记谱字符串
    pub fn to_string(board: &Board) -> String {
        let size = board.size();
        (0..size)
            .map(|row| {
                (0..size)
                    .map(|col| match board.cell(Position::new_unchecked(row, col)) {
                        Cell::Tile(value) => value.to_string(),
                        Cell::Obstacle => "X".to_string(),
                        Cell::Empty => "0".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board() {
        let board = Notation::parse("2,0,X/.,4,0/0,0,2048").unwrap();
        assert_eq!(board.size(), 3);
        assert_eq!(board.get(0, 0), Ok(Cell::Tile(2)));
        assert_eq!(board.get(0, 2), Ok(Cell::Obstacle));
        assert_eq!(board.get(1, 0), Ok(Cell::Empty));
        assert_eq!(board.get(2, 2), Ok(Cell::Tile(2048)));
    }

    #[test]
    fn test_to_string_roundtrip() {
        let text = "2,0,X,2/0,0,0,0/0,4,0,0/0,0,0,2048";
        let board = Notation::parse(text).unwrap();
        assert_eq!(Notation::to_string(&board), text);
    }

    #[test]
    fn test_parse_errors() {
        // 行长度不一致
        assert!(matches!(
            Notation::parse("2,0,0/0,0/0,0,0"),
            Err(EngineError::InvalidNotation { .. })
        ));
        // 非法字符
        assert!(matches!(
            Notation::parse("2,0,0/0,q,0/0,0,0"),
            Err(EngineError::InvalidNotation { .. })
        ));
        // 非 2 的幂
        assert_eq!(
            Notation::parse("3,0,0/0,0,0/0,0,0"),
            Err(EngineError::InvalidTile { value: 3 })
        );
        // 超过最大方块
        assert!(matches!(
            Notation::parse("2199023255552,0,0/0,0,0/0,0,0"),
            Err(EngineError::InvalidTile { .. })
        ));
        // 边长过小
        assert!(matches!(
            Notation::parse("2,0/0,0"),
            Err(EngineError::InvalidBoardSize { size: 2, .. })
        ));
    }
}
