//! 对局配置
//!
//! 模式以带参数的枚举表示，会话在构造时一次性读取。
//! 配置文件为 JSON，读取失败时回退到默认值。

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tile_ai::Difficulty;
use tile_engine::{DEFAULT_BOARD_SIZE, DEFAULT_HISTORY_DEPTH, DEFAULT_TARGET, MAX_BOARD_SIZE, MIN_BOARD_SIZE};

use crate::challenge::Challenge;
use crate::error::{Result, SessionError};

/// 游戏模式
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// 经典模式
    #[default]
    Classic,
    /// 开局随机放置障碍物
    Obstacles { count: usize },
    /// 每步限时（计时由前端驱动）
    Timed { move_limit_secs: u64 },
    /// 预设棋盘挑战
    Challenge { name: String },
    /// 双人分屏对战
    TwoPlayer,
}

impl GameMode {
    /// 按难度取障碍物数量：简单 2，中等 4，困难 6
    pub fn obstacles_for(difficulty: Difficulty) -> Self {
        let count = match difficulty {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
        };
        GameMode::Obstacles { count }
    }

    /// 按难度取每步时限：简单 15 秒，中等 10 秒，困难 5 秒
    pub fn timed_for(difficulty: Difficulty) -> Self {
        let move_limit_secs = match difficulty {
            Difficulty::Easy => 15,
            Difficulty::Medium => 10,
            Difficulty::Hard => 5,
        };
        GameMode::Timed { move_limit_secs }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Obstacles { .. } => "obstacles",
            GameMode::Timed { .. } => "timed",
            GameMode::Challenge { .. } => "challenge",
            GameMode::TwoPlayer => "two_player",
        }
    }
}

/// 对局配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// 棋盘边长（挑战模式使用预设棋盘的边长）
    pub board_size: usize,
    /// 胜利目标方块（挑战模式使用预设目标）
    pub target: u32,
    pub mode: GameMode,
    /// 达成目标后是否允许继续
    pub continue_after_win: bool,
    /// 悔棋历史深度
    pub history_depth: usize,
    /// 随机种子，None 表示构造时从系统熵源抽取
    pub seed: Option<u64>,
    /// AI 提示难度
    pub difficulty: Difficulty,
    /// 每局提示次数上限，None 为不限
    pub hint_limit: Option<u32>,
    /// 每局悔棋次数上限，None 为不限
    pub undo_limit: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            target: DEFAULT_TARGET,
            mode: GameMode::Classic,
            continue_after_win: false,
            history_depth: DEFAULT_HISTORY_DEPTH,
            seed: None,
            difficulty: Difficulty::default(),
            hint_limit: None,
            undo_limit: None,
        }
    }
}

impl GameConfig {
    /// 指定种子的经典配置
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(SessionError::invalid_config(format!(
                "board_size must be in {}..={}, got {}",
                MIN_BOARD_SIZE, MAX_BOARD_SIZE, self.board_size
            )));
        }
        if self.target < 8 || !self.target.is_power_of_two() {
            return Err(SessionError::invalid_config(format!(
                "target must be a power of two >= 8, got {}",
                self.target
            )));
        }
        if self.history_depth == 0 {
            return Err(SessionError::invalid_config("history_depth must be at least 1"));
        }

        match &self.mode {
            GameMode::Obstacles { count } => {
                let max = self.board_size * self.board_size - 2;
                if *count > max {
                    return Err(SessionError::invalid_config(format!(
                        "{} obstacles leave no room on a {}x{} board (max {})",
                        count, self.board_size, self.board_size, max
                    )));
                }
            }
            GameMode::Timed { move_limit_secs } if *move_limit_secs == 0 => {
                return Err(SessionError::invalid_config("move_limit_secs must be at least 1"));
            }
            GameMode::Challenge { name } => {
                Challenge::find(name)?;
            }
            _ => {}
        }

        Ok(())
    }

    /// 从文件加载配置，文件缺失或无效时使用默认配置
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置: {:?}", path);
            return Self::default();
        }

        let config: Self = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("配置文件格式无效: {}，使用默认配置", e);
                    return Self::default();
                }
            },
            Err(e) => {
                tracing::warn!("无法读取配置文件: {}，使用默认配置", e);
                return Self::default();
            }
        };

        match config.validate() {
            Ok(()) => {
                tracing::info!("已加载配置: {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置无效: {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 保存配置到文件（美化 JSON），自动创建父目录
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        std::fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {:?}", path))?;

        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.board_size, 4);
        assert_eq!(config.target, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_size = GameConfig {
            board_size: 7,
            ..GameConfig::default()
        };
        assert!(matches!(bad_size.validate(), Err(SessionError::InvalidConfig { .. })));

        let bad_target = GameConfig {
            target: 1000,
            ..GameConfig::default()
        };
        assert!(matches!(bad_target.validate(), Err(SessionError::InvalidConfig { .. })));

        let small_target = GameConfig {
            target: 4,
            ..GameConfig::default()
        };
        assert!(small_target.validate().is_err());

        let no_history = GameConfig {
            history_depth: 0,
            ..GameConfig::default()
        };
        assert!(no_history.validate().is_err());

        let crowded = GameConfig {
            board_size: 3,
            mode: GameMode::Obstacles { count: 8 },
            ..GameConfig::default()
        };
        assert!(crowded.validate().is_err());

        let unknown = GameConfig {
            mode: GameMode::Challenge {
                name: "labyrinth".to_string(),
            },
            ..GameConfig::default()
        };
        assert!(matches!(
            unknown.validate(),
            Err(SessionError::UnknownChallenge { .. })
        ));
    }

    #[test]
    fn test_mode_presets() {
        assert_eq!(GameMode::obstacles_for(Difficulty::Hard), GameMode::Obstacles { count: 6 });
        assert_eq!(
            GameMode::timed_for(Difficulty::Easy),
            GameMode::Timed { move_limit_secs: 15 }
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = GameConfig {
            board_size: 5,
            mode: GameMode::Timed { move_limit_secs: 10 },
            seed: Some(7),
            hint_limit: Some(3),
            ..GameConfig::default()
        };
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"timed\""));
        assert_eq!(GameConfig::load(&path), config);
    }

    #[test]
    fn test_load_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("missing.json");
        assert_eq!(GameConfig::load(&missing), GameConfig::default());

        let garbage = temp_dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert_eq!(GameConfig::load(&garbage), GameConfig::default());

        let invalid = temp_dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{ "board_size": 12 }"#).unwrap();
        assert_eq!(GameConfig::load(&invalid), GameConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "board_size": 6, "mode": "two_player" }"#).unwrap();

        let config = GameConfig::load(&path);
        assert_eq!(config.board_size, 6);
        assert_eq!(config.mode, GameMode::TwoPlayer);
        assert_eq!(config.target, 2048);
    }
}
