//! 2048 终端前端
//!
//! 包含:
//! - 命令解析
//! - 棋盘与状态的文本渲染
//! - 标准输入上的命令循环

mod app;
mod command;
mod render;

pub use app::{run, App, Flow};
pub use command::{Command, HELP};
