//! 终端前端
//!
//! 读取一行命令，交给会话处理，再把棋盘写回输出。
//! 会话返回的错误只提示给玩家，不会结束程序；只有输出失败才向上传播。

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tile_engine::Direction;
use tile_session::{GameConfig, GameMode, GameSession, MoveClock, Player, StorageManager, TwoPlayerMatch};

use crate::command::{Command, HELP};
use crate::render;

/// 提示搜索的轮询间隔
const HINT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 当前对局
enum Play {
    Single(GameSession),
    Match(TwoPlayerMatch),
}

/// 处理完一条命令后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 终端应用
pub struct App<W: Write> {
    config: GameConfig,
    storage: StorageManager,
    play: Play,
    /// 限时模式的每步计时
    clock: Option<MoveClock>,
    timed_out: bool,
    out: W,
}

impl<W: Write> App<W> {
    pub fn new(config: GameConfig, storage: StorageManager, out: W) -> Result<Self> {
        let play = start(&config)?;
        let clock = clock_for(&config);
        Ok(Self {
            config,
            storage,
            play,
            clock,
            timed_out: false,
            out,
        })
    }

    /// 解析并处理一行输入
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        match line.parse::<Command>() {
            Ok(command) => self.handle(command),
            Err(e) => {
                writeln!(self.out, "! {}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// 处理一条命令
    pub fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::NewGame => self.new_game()?,
            Command::Move(direction) => self.play_move(direction)?,
            Command::ListSaves => self.list_saves()?,
            Command::Delete(name) => match self.storage.delete(&name) {
                Ok(()) => writeln!(self.out, "deleted {}", name)?,
                Err(e) => writeln!(self.out, "! {:#}", e)?,
            },
            Command::Load(name) => self.load(&name)?,
            other => match self.play {
                Play::Single(_) => self.single_only(other)?,
                Play::Match(_) => writeln!(self.out, "! not available in two-player mode")?,
            },
        }
        Ok(Flow::Continue)
    }

    /// 显示当前棋盘和状态
    pub fn show(&mut self) -> Result<()> {
        match &self.play {
            Play::Single(session) => {
                write!(self.out, "{}", session.current_board())?;
                writeln!(self.out, "{}", render::status_line(session))?;
            }
            Play::Match(game) => {
                let (one, two) = game.scores();
                write!(
                    self.out,
                    "{}",
                    render::side_by_side(
                        game.session(Player::One).current_board(),
                        game.session(Player::Two).current_board(),
                    )
                )?;
                match game.outcome() {
                    Some(outcome) => writeln!(
                        self.out,
                        "{} vs {} | {}",
                        one,
                        two,
                        render::outcome_message(outcome)
                    )?,
                    None => writeln!(
                        self.out,
                        "{} vs {} | {} to move",
                        one,
                        two,
                        game.current_player()
                    )?,
                }
            }
        }
        if let Some(clock) = &self.clock {
            writeln!(self.out, "time left {:.1}s", clock.remaining().as_secs_f32())?;
        }
        Ok(())
    }

    /// 输出提示符
    pub fn prompt(&mut self) -> Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }

    /// 退出前自动存档未结束的单人对局
    pub fn shutdown(&mut self) -> Result<()> {
        if let Play::Single(session) = &self.play {
            if !session.is_over() && !self.timed_out {
                let path = self.storage.autosave(session)?;
                writeln!(self.out, "autosaved to {}", path.display())?;
            }
        }
        Ok(())
    }

    fn new_game(&mut self) -> Result<()> {
        // 重新开局时换一个种子
        let config = GameConfig {
            seed: None,
            ..self.config.clone()
        };
        match start(&config) {
            Ok(play) => {
                self.play = play;
                self.clock = clock_for(&config);
                self.timed_out = false;
                self.show()?;
            }
            Err(e) => writeln!(self.out, "! {}", e)?,
        }
        Ok(())
    }

    fn play_move(&mut self, direction: Direction) -> Result<()> {
        if self.timed_out {
            writeln!(self.out, "! out of time, type `new` to start again")?;
            return Ok(());
        }
        if self.clock.as_ref().is_some_and(MoveClock::is_expired) {
            self.timed_out = true;
            tracing::info!("限时模式超时");
            writeln!(self.out, "time's up! the game is over")?;
            return Ok(());
        }

        let result = match &mut self.play {
            Play::Single(session) => session.apply_move(direction),
            Play::Match(game) => game.apply_move(direction),
        };
        match result {
            Ok(report) => {
                if let Some(clock) = &mut self.clock {
                    clock.observe(&report);
                }
                match render::describe_turn(&report) {
                    Some(line) => writeln!(self.out, "{}", line)?,
                    None => writeln!(self.out, "nothing moves {}", direction)?,
                }
                if report.moved {
                    self.show()?;
                }
            }
            Err(e) => writeln!(self.out, "! {}", e)?,
        }
        Ok(())
    }

    fn single_only(&mut self, command: Command) -> Result<()> {
        let Play::Single(session) = &mut self.play else {
            return Ok(());
        };

        match command {
            Command::Undo => match session.undo() {
                Ok(Some(state)) => {
                    tracing::debug!("悔棋后状态 {}", state);
                    self.show()?;
                }
                Ok(None) => writeln!(self.out, "nothing to undo")?,
                Err(e) => writeln!(self.out, "! {}", e)?,
            },
            Command::Redo => match session.redo() {
                Ok(Some(_)) => self.show()?,
                Ok(None) => writeln!(self.out, "nothing to redo")?,
                Err(e) => writeln!(self.out, "! {}", e)?,
            },
            Command::Hint => self.hint()?,
            Command::Save(name) => match self.storage.save(&name, session) {
                Ok(path) => writeln!(self.out, "saved to {}", path.display())?,
                Err(e) => writeln!(self.out, "! {:#}", e)?,
            },
            Command::Checkpoint(name) => {
                session.checkpoint(&name);
                writeln!(self.out, "marked {}", name)?;
            }
            Command::Restore(name) => match session.restore_checkpoint(&name) {
                Ok(_) => self.show()?,
                Err(e) => writeln!(self.out, "! {}", e)?,
            },
            _ => {}
        }
        Ok(())
    }

    /// 后台搜索提示，搜索期间暂停计时
    fn hint(&mut self) -> Result<()> {
        let Play::Single(session) = &mut self.play else {
            return Ok(());
        };
        let mut task = match session.spawn_suggestion() {
            Ok(Some(task)) => task,
            Ok(None) => {
                writeln!(self.out, "no move to suggest")?;
                return Ok(());
            }
            Err(e) => {
                writeln!(self.out, "! {}", e)?;
                return Ok(());
            }
        };

        if let Some(clock) = &mut self.clock {
            clock.pause();
        }
        let suggestion = loop {
            if let Some(result) = task.try_take() {
                break result;
            }
            thread::sleep(HINT_POLL_INTERVAL);
        };
        if let Some(clock) = &mut self.clock {
            clock.resume();
        }
        tracing::debug!("提示耗时 {:.2}s", task.elapsed_secs());

        match suggestion {
            Some(s) => writeln!(
                self.out,
                "hint: {} (depth {}, score {:.1})",
                s.direction, s.depth, s.score
            )?,
            None => writeln!(self.out, "no move to suggest")?,
        }
        Ok(())
    }

    fn load(&mut self, name: &str) -> Result<()> {
        match self.storage.load(name) {
            Ok(session) => {
                self.clock = clock_for(session.config());
                self.timed_out = false;
                self.play = Play::Single(session);
                writeln!(self.out, "loaded {}", name)?;
                self.show()?;
            }
            Err(e) => writeln!(self.out, "! {:#}", e)?,
        }
        Ok(())
    }

    fn list_saves(&mut self) -> Result<()> {
        match self.storage.list_saves() {
            Ok(saves) if saves.is_empty() => writeln!(self.out, "no saves yet")?,
            Ok(saves) => {
                for info in &saves {
                    writeln!(self.out, "{}", render::save_line(info))?;
                }
            }
            Err(e) => writeln!(self.out, "! {:#}", e)?,
        }
        Ok(())
    }
}

fn start(config: &GameConfig) -> tile_session::Result<Play> {
    Ok(match config.mode {
        GameMode::TwoPlayer => Play::Match(TwoPlayerMatch::new(config.clone())?),
        _ => Play::Single(GameSession::new(config.clone())?),
    })
}

fn clock_for(config: &GameConfig) -> Option<MoveClock> {
    match config.mode {
        GameMode::Timed { move_limit_secs } => Some(MoveClock::from_secs(move_limit_secs)),
        _ => None,
    }
}

/// 标准输入输出上的命令循环
pub fn run(config: GameConfig, storage: StorageManager) -> Result<()> {
    let stdout = io::stdout();
    let mut app = App::new(config, storage, stdout.lock()).context("无法开始对局")?;
    writeln!(app.out, "type `help` for commands")?;
    app.show()?;
    app.prompt()?;

    for line in io::stdin().lock().lines() {
        let line = line.context("读取输入失败")?;
        if app.handle_line(&line)? == Flow::Quit {
            break;
        }
        app.prompt()?;
    }

    app.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tile_ai::Difficulty;

    fn create_app(config: GameConfig) -> (App<Vec<u8>>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path().join("saves")).unwrap();
        let app = App::new(config, storage, Vec::new()).unwrap();
        (app, temp_dir)
    }

    fn take_output(app: &mut App<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut app.out)).unwrap()
    }

    fn session(app: &App<Vec<u8>>) -> &GameSession {
        match &app.play {
            Play::Single(session) => session,
            Play::Match(_) => panic!("应为单人对局"),
        }
    }

    /// 依次尝试四个方向，直到有一个有效
    fn make_any_move(app: &mut App<Vec<u8>>) {
        let before = session(app).history().len();
        for direction in Direction::ALL {
            app.handle(Command::Move(direction)).unwrap();
            if session(app).history().len() > before {
                return;
            }
        }
        panic!("开局应有合法走法");
    }

    #[test]
    fn test_move_and_undo() {
        let (mut app, _temp_dir) = create_app(GameConfig::seeded(42));
        let start = session(&app).current_board().clone();

        make_any_move(&mut app);
        assert_ne!(session(&app).current_board(), &start);

        app.handle(Command::Undo).unwrap();
        assert_eq!(session(&app).current_board(), &start);

        take_output(&mut app);
        app.handle(Command::Undo).unwrap();
        assert!(take_output(&mut app).contains("nothing to undo"));
    }

    #[test]
    fn test_bad_input_keeps_running() {
        let (mut app, _temp_dir) = create_app(GameConfig::seeded(1));
        assert_eq!(app.handle_line("jump").unwrap(), Flow::Continue);
        assert!(take_output(&mut app).starts_with("! "));
        assert_eq!(app.handle_line("   ").unwrap(), Flow::Continue);
        assert_eq!(app.handle_line("q").unwrap(), Flow::Quit);
    }

    #[test]
    fn test_save_and_load() {
        let (mut app, _temp_dir) = create_app(GameConfig::seeded(7));
        make_any_move(&mut app);
        let saved = session(&app).clone();

        app.handle(Command::Save("slot".to_string())).unwrap();
        make_any_move(&mut app);
        assert_ne!(session(&app), &saved);

        app.handle(Command::Load("slot".to_string())).unwrap();
        assert_eq!(session(&app), &saved);

        take_output(&mut app);
        app.handle(Command::ListSaves).unwrap();
        assert!(take_output(&mut app).contains("slot"));
    }

    #[test]
    fn test_checkpoint_commands() {
        let (mut app, _temp_dir) = create_app(GameConfig::seeded(3));
        app.handle(Command::Checkpoint("start".to_string())).unwrap();
        let start = session(&app).current_board().clone();
        make_any_move(&mut app);

        app.handle(Command::Restore("start".to_string())).unwrap();
        assert_eq!(session(&app).current_board(), &start);

        take_output(&mut app);
        app.handle(Command::Restore("missing".to_string())).unwrap();
        assert!(take_output(&mut app).starts_with("! "));
    }

    #[test]
    fn test_hint() {
        let config = GameConfig {
            difficulty: Difficulty::Easy,
            hint_limit: Some(1),
            ..GameConfig::seeded(5)
        };
        let (mut app, _temp_dir) = create_app(config);
        take_output(&mut app);

        app.handle(Command::Hint).unwrap();
        assert!(take_output(&mut app).starts_with("hint: "));

        app.handle(Command::Hint).unwrap();
        assert!(take_output(&mut app).starts_with("! "), "提示次数已用完");
    }

    #[test]
    fn test_hint_on_stuck_board_is_free() {
        let config = GameConfig {
            difficulty: Difficulty::Easy,
            hint_limit: Some(1),
            ..GameConfig::seeded(5)
        };
        let (mut app, _temp_dir) = create_app(config.clone());
        let board = tile_engine::Notation::parse("2,4,8/4,8,16/8,16,32").unwrap();
        app.play = Play::Single(GameSession::with_board(config, board).unwrap());
        take_output(&mut app);

        app.handle(Command::Hint).unwrap();
        assert_eq!(take_output(&mut app), "no move to suggest\n");
        assert_eq!(session(&app).hints_remaining(), Some(1));
    }

    #[test]
    fn test_two_player_rejects_single_commands() {
        let config = GameConfig {
            mode: GameMode::TwoPlayer,
            ..GameConfig::seeded(9)
        };
        let (mut app, _temp_dir) = create_app(config);
        app.handle(Command::Undo).unwrap();
        assert!(take_output(&mut app).contains("two-player"));

        for direction in Direction::ALL {
            app.handle(Command::Move(direction)).unwrap();
        }
        assert!(take_output(&mut app).contains("to move"));
    }

    #[test]
    fn test_timed_out_stops_moves() {
        let config = GameConfig {
            mode: GameMode::Timed { move_limit_secs: 10 },
            ..GameConfig::seeded(11)
        };
        let (mut app, _temp_dir) = create_app(config);
        app.clock = Some(MoveClock::new(Duration::from_millis(1)));
        thread::sleep(Duration::from_millis(20));
        let before = session(&app).clone();

        app.handle(Command::Move(Direction::Up)).unwrap();
        assert!(take_output(&mut app).contains("time's up"));
        app.handle(Command::Move(Direction::Down)).unwrap();
        assert!(take_output(&mut app).contains("out of time"));
        assert_eq!(session(&app), &before, "超时后棋盘不变");

        app.handle(Command::NewGame).unwrap();
        assert!(!app.timed_out);
    }

    #[test]
    fn test_shutdown_autosaves() {
        let (mut app, _temp_dir) = create_app(GameConfig::seeded(13));
        make_any_move(&mut app);
        app.shutdown().unwrap();
        let restored = app.storage.load(tile_session::AUTOSAVE_NAME).unwrap();
        assert_eq!(&restored, session(&app));
    }
}
