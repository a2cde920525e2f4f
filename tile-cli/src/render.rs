//! 文本渲染

use tile_engine::Board;
use tile_session::{GameSession, MatchOutcome, SaveInfo, SessionState, TurnReport};

/// 状态栏：分数、目标、剩余的悔棋/提示次数
pub fn status_line(session: &GameSession) -> String {
    let mut parts = vec![
        format!("score {}", session.score()),
        format!("target {}", session.target()),
        format!("state {}", session.session_state()),
    ];
    if let Some(limit) = session.move_limit() {
        parts.push(format!("moves {}/{}", session.moves_made(), limit));
    }
    if let Some(undos) = session.undos_remaining() {
        parts.push(format!("undos {}", undos));
    }
    if let Some(hints) = session.hints_remaining() {
        parts.push(format!("hints {}", hints));
    }
    parts.join(" | ")
}

/// 一步走子的摘要；无效方向返回 None
pub fn describe_turn(report: &TurnReport) -> Option<String> {
    if !report.moved {
        return None;
    }
    let mut line = format!("{}", report.direction);
    if report.score_delta > 0 {
        line.push_str(&format!(" +{}", report.score_delta));
    }
    if let Some(spawn) = &report.spawned {
        line.push_str(&format!(", new {} at {}", spawn.value, spawn.position));
    }
    if let Some((_, to)) = report.transition {
        line.push_str(&format!(" -> {}", end_message(to)));
    }
    Some(line)
}

/// 终局提示
pub fn end_message(state: SessionState) -> &'static str {
    match state {
        SessionState::InProgress => "in progress",
        SessionState::Won => "target reached!",
        SessionState::NoLegalMoves => "no legal moves left",
        SessionState::OutOfMoves => "move limit used up",
    }
}

/// 两块棋盘并排显示
pub fn side_by_side(left: &Board, right: &Board) -> String {
    let left = left.to_string();
    let right = right.to_string();
    let width = left.lines().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    let mut rights = right.lines();
    for line in left.lines() {
        let other = rights.next().unwrap_or("");
        out.push_str(&format!("{:<width$}    {}\n", line, other, width = width));
    }
    for other in rights {
        out.push_str(&format!("{:<width$}    {}\n", "", other, width = width));
    }
    out
}

/// 对战结果
pub fn outcome_message(outcome: MatchOutcome) -> String {
    match outcome {
        MatchOutcome::Winner(player) => format!("{} wins", player),
        MatchOutcome::Draw => "draw".to_string(),
    }
}

/// 存档列表的一行
pub fn save_line(info: &SaveInfo) -> String {
    format!(
        "{:<16} {}  score {:>6}  max {:>5}  {}",
        info.name,
        info.modified.format("%Y-%m-%d %H:%M"),
        info.score,
        info.max_tile.unwrap_or(0),
        info.state
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_engine::{Direction, Notation};
    use tile_session::{GameConfig, Player};

    fn session(notation: &str) -> GameSession {
        GameSession::with_board(GameConfig::seeded(1), Notation::parse(notation).unwrap()).unwrap()
    }

    #[test]
    fn test_describe_turn() {
        let mut session = session("2,2,0/0,0,0/0,0,0");
        let report = session.apply_move(Direction::Left).unwrap();
        let line = describe_turn(&report).unwrap();
        assert!(line.starts_with("left +4"), "{}", line);
        assert!(line.contains("new "));
    }

    #[test]
    fn test_noop_turn_is_silent() {
        let mut session = session("2,0,0/0,0,0/0,0,0");
        let report = session.apply_move(Direction::Up).unwrap();
        assert_eq!(describe_turn(&report), None, "无效方向不输出");
    }

    #[test]
    fn test_status_line() {
        let config = GameConfig {
            hint_limit: Some(3),
            ..GameConfig::seeded(1)
        };
        let session = GameSession::new(config).unwrap();
        let line = status_line(&session);
        assert!(line.contains("score 0"));
        assert!(line.contains("hints 3"));
        assert!(!line.contains("moves"), "经典模式没有步数上限");
    }

    #[test]
    fn test_side_by_side() {
        let left = Notation::parse("2,0,0/0,0,0/0,0,0").unwrap();
        let right = Notation::parse("0,0,0,0/0,0,0,0/0,0,0,0/0,0,0,4").unwrap();
        let text = side_by_side(&left, &right);
        assert_eq!(text.lines().count(), right.to_string().lines().count());
        assert!(text.contains('4'));
    }

    #[test]
    fn test_outcome_message() {
        assert_eq!(outcome_message(MatchOutcome::Winner(Player::Two)), "Player 2 wins");
        assert_eq!(outcome_message(MatchOutcome::Draw), "draw");
    }
}
