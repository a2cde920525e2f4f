//! 后台建议任务
//!
//! 在独立线程上对棋盘快照运行搜索，调用方可以继续处理输入，
//! 之后通过轮询或阻塞等待取回结果。

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tile_engine::Board;

use crate::search::{AiConfig, AiEngine, Suggestion};

/// 后台建议任务
pub struct SuggestionTask {
    handle: Option<JoinHandle<()>>,
    receiver: Receiver<Option<Suggestion>>,
    /// 已取回的结果
    result: Option<Option<Suggestion>>,
    started_at: Instant,
}

impl SuggestionTask {
    /// 在后台线程上搜索棋盘快照
    pub fn spawn(snapshot: Board, config: AiConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut engine = AiEngine::new(config);
            let suggestion = engine.suggest(&snapshot);
            // 接收端已丢弃时结果无人需要
            let _ = sender.send(suggestion);
        });

        Self {
            handle: Some(handle),
            receiver,
            result: None,
            started_at: Instant::now(),
        }
    }

    /// 任务是否已产生结果（不阻塞）
    pub fn is_finished(&mut self) -> bool {
        self.poll();
        self.result.is_some()
    }

    /// 取走结果（不阻塞）；尚未完成时返回 None
    pub fn try_take(&mut self) -> Option<Option<Suggestion>> {
        self.poll();
        let result = self.result.take();
        if result.is_some() {
            self.join();
        }
        result
    }

    /// 阻塞直到搜索结束
    pub fn wait(mut self) -> Option<Suggestion> {
        if let Some(result) = self.result.take() {
            self.join();
            return result;
        }
        let result = self.receiver.recv().ok().flatten();
        self.join();
        result
    }

    /// 已运行的时长（秒）
    pub fn elapsed_secs(&self) -> f32 {
        self.started_at.elapsed().as_secs_f32()
    }

    fn poll(&mut self) {
        if self.result.is_some() {
            return;
        }
        match self.receiver.try_recv() {
            Ok(suggestion) => self.result = Some(suggestion),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("建议线程意外退出");
                self.result = Some(None);
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("建议线程 panic");
            }
        }
    }
}
