//! 限时模式的每步计时器
//!
//! 会话本身不持有时钟，前端在每次走子后把 [`TurnReport`] 交给时钟。

use std::time::{Duration, Instant};

use crate::session::TurnReport;

/// 每步计时器
#[derive(Debug, Clone)]
pub struct MoveClock {
    /// 每步时限（毫秒）
    limit_ms: u64,
    /// 暂停或重置时记录的剩余时间（毫秒）
    remaining_ms: u64,
    /// 本次计时开始时间
    turn_start: Option<Instant>,
    paused: bool,
}

impl MoveClock {
    /// 创建并立即开始计时
    pub fn new(limit: Duration) -> Self {
        let limit_ms = limit.as_millis() as u64;
        Self {
            limit_ms,
            remaining_ms: limit_ms,
            turn_start: Some(Instant::now()),
            paused: false,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// 剩余时间（毫秒）
    pub fn remaining_ms(&self) -> u64 {
        match self.turn_start {
            Some(start) if !self.paused => {
                let elapsed = start.elapsed().as_millis() as u64;
                self.remaining_ms.saturating_sub(elapsed)
            }
            _ => self.remaining_ms,
        }
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.remaining_ms())
    }

    pub fn limit_ms(&self) -> u64 {
        self.limit_ms
    }

    /// 是否超时
    pub fn is_expired(&self) -> bool {
        self.remaining_ms() == 0
    }

    /// 重新开始一步的计时
    pub fn reset(&mut self) {
        self.remaining_ms = self.limit_ms;
        self.turn_start = (!self.paused).then(Instant::now);
    }

    /// 根据走子结果更新：有效走子时重置，返回是否重置
    pub fn observe(&mut self, report: &TurnReport) -> bool {
        if report.moved {
            self.reset();
        }
        report.moved
    }

    /// 暂停计时器
    pub fn pause(&mut self) {
        if !self.paused {
            self.remaining_ms = self.remaining_ms();
            self.turn_start = None;
            self.paused = true;
        }
    }

    /// 恢复计时器
    pub fn resume(&mut self) {
        if self.paused {
            self.turn_start = Some(Instant::now());
            self.paused = false;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tile_engine::{Direction, Notation};

    use crate::config::GameConfig;
    use crate::session::GameSession;

    #[test]
    fn test_clock_counts_down() {
        let clock = MoveClock::from_secs(10);
        thread::sleep(Duration::from_millis(200));
        assert!(clock.remaining_ms() < 10_000);
        assert!(!clock.is_expired());
    }

    #[test]
    fn test_clock_expires() {
        let clock = MoveClock::new(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(150));
        assert!(clock.is_expired());
        assert_eq!(clock.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_clock_pause_resume() {
        let mut clock = MoveClock::from_secs(10);

        thread::sleep(Duration::from_millis(200));
        clock.pause();

        let at_pause = clock.remaining_ms();
        thread::sleep(Duration::from_millis(200));

        // 暂停期间时间不变
        assert_eq!(clock.remaining_ms(), at_pause);

        clock.resume();
        thread::sleep(Duration::from_millis(200));
        assert!(clock.remaining_ms() < at_pause);
    }

    #[test]
    fn test_observe_resets_only_on_move() {
        let board = Notation::parse("2,0,0/0,0,0/0,0,0").unwrap();
        let mut session = GameSession::with_board(GameConfig::seeded(1), board).unwrap();
        let mut clock = MoveClock::from_secs(10);
        thread::sleep(Duration::from_millis(200));

        let noop = session.apply_move(Direction::Up).unwrap();
        assert!(!clock.observe(&noop));
        assert!(clock.remaining_ms() < 10_000);

        let moved = session.apply_move(Direction::Right).unwrap();
        assert!(clock.observe(&moved));
        assert!(clock.remaining_ms() > 9_800);
    }

    #[test]
    fn test_reset_while_paused() {
        let mut clock = MoveClock::from_secs(5);
        clock.pause();
        clock.reset();
        assert_eq!(clock.remaining_ms(), 5_000);
        assert!(clock.is_paused());
    }
}
