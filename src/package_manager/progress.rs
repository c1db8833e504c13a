//! 模拟安装进度
//!
//! winget 不输出可解析的进度，安装进程存活期间按固定间隔递增百分比，
//! 始终停在 `ceiling` 之下；到达 100 由流水线在进程退出后发出。
//! 每个刻度同时发出已用时间，进度到顶后计时照常继续。

use crate::config::ProgressConfig;
use crate::events::{Event, EventSender};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSimulator {
    interval: Duration,
    step: u8,
    ceiling: u8,
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

impl ProgressSimulator {
    pub fn new(interval: Duration, step: u8, ceiling: u8) -> Self {
        Self {
            interval,
            step: step.max(1),
            ceiling: ceiling.clamp(1, 100),
        }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(config.interval(), config.step, config.ceiling)
    }

    /// 进程存活时允许的最大值
    pub fn limit(&self) -> u8 {
        self.ceiling - 1
    }

    /// 下一个刻度；已到上限时返回 None
    pub fn next_tick(&self, current: u8) -> Option<u8> {
        let limit = self.limit();
        if current >= limit {
            None
        } else {
            Some(current.saturating_add(self.step).min(limit))
        }
    }

    /// 为第 `job` 个任务启动计时线程，已用时间从 `started` 起算
    pub fn start(&self, job: usize, started: Instant, events: EventSender) -> ProgressTicker {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let sim = *self;

        let handle = thread::spawn(move || {
            let mut percent = 0u8;
            loop {
                match stop_rx.recv_timeout(sim.interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // 收到停止信号或发送端已丢弃
                    _ => break,
                }
                if let Some(next) = sim.next_tick(percent) {
                    percent = next;
                    let _ = events.send(Event::Progress { job, percent });
                }
                let _ = events.send(Event::Elapsed {
                    job,
                    elapsed: started.elapsed(),
                });
            }
            percent
        });

        ProgressTicker { stop_tx, handle }
    }
}

/// 正在运行的计时线程
pub struct ProgressTicker {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<u8>,
}

impl ProgressTicker {
    /// 通知停止并等待线程退出，返回最后发出的百分比。
    /// 返回之后不会再有该任务的进度或计时事件。
    pub fn stop(self) -> u8 {
        let _ = self.stop_tx.send(());
        drop(self.stop_tx);
        self.handle.join().unwrap_or(0)
    }
}
