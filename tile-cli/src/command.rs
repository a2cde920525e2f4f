//! 命令解析
//!
//! 单个字符走子（WASD / vim 方向键），其余为单词命令加可选参数。

use std::str::FromStr;

use tile_engine::Direction;
use tile_session::AUTOSAVE_NAME;

/// 默认存档名
const QUICKSAVE_NAME: &str = "quicksave";

/// 玩家输入的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Undo,
    Redo,
    Hint,
    Save(String),
    Load(String),
    ListSaves,
    Delete(String),
    Checkpoint(String),
    Restore(String),
    NewGame,
    Help,
    Quit,
}

/// 帮助文本
pub const HELP: &str = "\
moves:    w/a/s/d, h/j/k/l, or up/down/left/right
undo:     u | undo          redo: r | redo
hint:     hint
save:     save [name]       load: load [name]   (load with no name resumes the autosave)
saves:    saves             delete <name>
marks:    mark <name>       back <name>
other:    new | help | q";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        let (word, arg) = match input.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (input, ""),
        };
        let word = word.to_ascii_lowercase();
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        let command = match word.as_str() {
            "" => anyhow::bail!("Empty command"),
            "u" | "undo" => Command::Undo,
            "r" | "redo" => Command::Redo,
            "hint" => Command::Hint,
            "save" => Command::Save(arg.unwrap_or_else(|| QUICKSAVE_NAME.to_string())),
            "load" => Command::Load(arg.unwrap_or_else(|| AUTOSAVE_NAME.to_string())),
            "saves" | "list" => Command::ListSaves,
            "delete" => Command::Delete(required(arg, "delete")?),
            "mark" => Command::Checkpoint(required(arg, "mark")?),
            "back" => Command::Restore(required(arg, "back")?),
            "new" => Command::NewGame,
            "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => match other.parse::<Direction>() {
                Ok(direction) if arg.is_none() => Command::Move(direction),
                _ => anyhow::bail!("Unknown command: {:?} (type `help`)", input),
            },
        };
        Ok(command)
    }
}

fn required(arg: Option<String>, command: &str) -> anyhow::Result<String> {
    arg.ok_or_else(|| anyhow::anyhow!("`{}` needs a name", command))
}
