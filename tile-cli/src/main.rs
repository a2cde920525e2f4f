use std::path::PathBuf;

use anyhow::{Context, Result};
use tile_session::{GameConfig, StorageManager};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // 初始化日志（输出到 stderr，不干扰棋盘）
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tile_cli=info".parse()?))
        .init();

    let config_path = config_path()?;
    let config = GameConfig::load(&config_path);
    if !config_path.exists() {
        // 首次运行写出默认配置，方便手动修改
        if let Err(e) = config.save(&config_path) {
            tracing::warn!("无法写入默认配置: {:#}", e);
        }
    }
    info!("模式 {}，棋盘 {}x{}", config.mode.name(), config.board_size, config.board_size);

    let storage = StorageManager::open_default()?;
    info!("存档目录: {:?}", storage.saves_directory());

    tile_cli::run(config, storage)
}

fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("无法获取配置目录")?;
    Ok(dir.join("tile2048").join("config.json"))
}
