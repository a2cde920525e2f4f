//! 存档存储系统
//!
//! 目录结构：
//! - `saves/<name>.sav` 主存档
//! - `saves/backups/<name>-<时间戳>-<序号>.sav` 覆盖前的旧存档
//!
//! 读取时先尝试主存档，再按从新到旧的顺序尝试备份。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::session::{GameSession, SessionState};

/// 存档扩展名
const SAVE_EXTENSION: &str = "sav";

/// 备份子目录
const BACKUP_DIR: &str = "backups";

/// 每个存档默认保留的备份数
pub const DEFAULT_MAX_BACKUPS: usize = 5;

/// 自动存档名称
pub const AUTOSAVE_NAME: &str = "autosave";

/// 存储管理器
pub struct StorageManager {
    saves_dir: PathBuf,
    max_backups: usize,
}

impl StorageManager {
    /// 在默认数据目录下创建存储管理器
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::data_dir().context("无法获取应用数据目录")?;
        Self::new(data_dir.join("tile2048").join("saves"))
    }

    /// 在指定目录创建存储管理器
    pub fn new(saves_dir: impl Into<PathBuf>) -> Result<Self> {
        let saves_dir = saves_dir.into();
        let backups = saves_dir.join(BACKUP_DIR);
        fs::create_dir_all(&backups)
            .with_context(|| format!("无法创建存储目录: {:?}", backups))?;

        Ok(Self {
            saves_dir,
            max_backups: DEFAULT_MAX_BACKUPS,
        })
    }

    /// 设置每个存档保留的备份数
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    /// 保存会话，已有的同名存档先移入备份
    pub fn save(&self, name: &str, session: &GameSession) -> Result<PathBuf> {
        let name = checked_name(name)?;
        let path = self.save_path(&name);

        if path.exists() {
            let backup = self.next_backup_path(&name);
            fs::copy(&path, &backup)
                .with_context(|| format!("备份存档失败: {:?} -> {:?}", path, backup))?;
            self.prune_backups(&name)?;
        }

        let blob = session.serialize().context("序列化会话失败")?;

        // 先写临时文件再替换，避免写到一半留下残缺的主存档
        let temp = path.with_extension("tmp");
        fs::write(&temp, blob).with_context(|| format!("写入文件失败: {:?}", temp))?;
        fs::rename(&temp, &path).with_context(|| format!("替换存档失败: {:?}", path))?;

        tracing::info!("存档已保存: {:?}", path);
        Ok(path)
    }

    /// 自动存档
    pub fn autosave(&self, session: &GameSession) -> Result<PathBuf> {
        self.save(AUTOSAVE_NAME, session)
    }

    /// 加载存档，主存档损坏时依次尝试备份
    pub fn load(&self, name: &str) -> Result<GameSession> {
        let name = checked_name(name)?;

        let mut candidates = vec![self.save_path(&name)];
        candidates.extend(self.backups(&name)?.into_iter().rev());

        for path in candidates.iter().filter(|p| p.exists()) {
            match read_session(path) {
                Ok(session) => {
                    tracing::info!("已加载存档: {:?}", path);
                    return Ok(session);
                }
                Err(e) => {
                    tracing::warn!("存档不可用: {:?}: {:#}，尝试下一个备份", path, e);
                }
            }
        }

        anyhow::bail!("没有可用的存档: {}", name)
    }

    /// 列出所有可读取的存档（按修改时间倒序）
    pub fn list_saves(&self) -> Result<Vec<SaveInfo>> {
        let mut saves = Vec::new();

        let entries = fs::read_dir(&self.saves_dir)
            .with_context(|| format!("读取存储目录失败: {:?}", self.saves_dir))?;

        for entry in entries {
            let entry = entry.context("读取目录项失败")?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match read_session(&path) {
                Ok(session) => saves.push(SaveInfo {
                    name: name.to_string(),
                    modified: entry
                        .metadata()
                        .and_then(|m| m.modified())
                        .map(DateTime::from)
                        .unwrap_or_else(|_| Utc::now()),
                    score: session.score(),
                    max_tile: session.current_board().max_tile(),
                    state: session.session_state(),
                }),
                Err(e) => {
                    // 跳过损坏的文件
                    tracing::debug!("跳过损坏的存档 {:?}: {:#}", path, e);
                }
            }
        }

        saves.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }

    /// 删除存档及其备份
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = checked_name(name)?;
        let path = self.save_path(&name);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("删除文件失败: {:?}", path))?;
        }
        for backup in self.backups(&name)? {
            fs::remove_file(&backup).with_context(|| format!("删除备份失败: {:?}", backup))?;
        }
        Ok(())
    }

    /// 某个存档的备份（从旧到新）
    pub fn backups(&self, name: &str) -> Result<Vec<PathBuf>> {
        let dir = self.backups_dir();
        let entries = fs::read_dir(&dir).with_context(|| format!("读取备份目录失败: {:?}", dir))?;

        let mut backups = Vec::new();
        for entry in entries {
            let path = entry.context("读取目录项失败")?.path();
            let belongs = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| is_backup_of(stem, name));
            if belongs && path.extension().and_then(|s| s.to_str()) == Some(SAVE_EXTENSION) {
                backups.push(path);
            }
        }

        // 文件名中的时间戳和序号定长，字典序即时间顺序
        backups.sort();
        Ok(backups)
    }

    /// 获取存储目录路径
    pub fn saves_directory(&self) -> &Path {
        &self.saves_dir
    }

    fn backups_dir(&self) -> PathBuf {
        self.saves_dir.join(BACKUP_DIR)
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.saves_dir.join(format!("{}.{}", name, SAVE_EXTENSION))
    }

    fn next_backup_path(&self, name: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let mut seq = 0u32;
        loop {
            let path = self
                .backups_dir()
                .join(format!("{}-{}-{:03}.{}", name, timestamp, seq, SAVE_EXTENSION));
            if !path.exists() {
                return path;
            }
            seq += 1;
        }
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.backups(name)?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for old in &backups[..excess] {
            fs::remove_file(old).with_context(|| format!("删除旧备份失败: {:?}", old))?;
            tracing::debug!("已删除旧备份: {:?}", old);
        }
        Ok(())
    }
}

/// 存档摘要
#[derive(Debug, Clone)]
pub struct SaveInfo {
    /// 存档名称（不含扩展名）
    pub name: String,
    /// 文件修改时间
    pub modified: DateTime<Utc>,
    pub score: u64,
    pub max_tile: Option<u64>,
    pub state: SessionState,
}

fn read_session(path: &Path) -> Result<GameSession> {
    let blob = fs::read(path).with_context(|| format!("读取文件失败: {:?}", path))?;
    GameSession::deserialize(&blob).with_context(|| format!("解析存档失败: {:?}", path))
}

/// 备份文件名形如 `<name>-YYYYmmdd_HHMMSSfff-NNN`
fn is_backup_of(stem: &str, name: &str) -> bool {
    stem.strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|rest| {
            rest.len() == 22
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == '_' || c == '-')
        })
}

/// 清理名称中的特殊字符，空名称报错
fn checked_name(name: &str) -> Result<String> {
    let clean = sanitize_filename(name);
    if clean.is_empty() {
        anyhow::bail!("存档名称不能为空");
    }
    Ok(clean)
}

/// 清理文件名中的特殊字符
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
