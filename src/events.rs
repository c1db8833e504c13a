//! 后台任务 → 调用方的事件流
//!
//! 所有生产者（搜索、描述、安装流水线、进度模拟）都往同一个 channel 发送 [`Event`]；
//! 消费方用 [`dispatch`] 在单一上下文中按顺序回调 [`EventSink`]。

use crate::package_manager::{BatchSummary, SearchResult};
use std::time::Duration;
use tokio::sync::mpsc;

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 与具体任务无关的状态信息
    Message(String),
    SearchResults(SearchResult),
    Description { id: String, text: String },
    Log { job: usize, line: String },
    Progress { job: usize, percent: u8 },
    /// 安装进程存活期间按模拟间隔发出的已用时间
    Elapsed { job: usize, elapsed: Duration },
    JobDone {
        job: usize,
        success: bool,
        elapsed: Duration,
    },
    BatchDone(BatchSummary),
}

impl Event {
    /// 事件所属的安装任务序号
    pub fn job(&self) -> Option<usize> {
        match self {
            Event::Log { job, .. }
            | Event::Progress { job, .. }
            | Event::Elapsed { job, .. }
            | Event::JobDone { job, .. } => Some(*job),
            _ => None,
        }
    }
}

/// 表现层实现的回调接口
pub trait EventSink {
    fn on_message(&mut self, _text: &str) {}
    fn on_search_results(&mut self, results: &SearchResult);
    fn on_description(&mut self, id: &str, text: &str);
    fn on_log(&mut self, job: usize, line: &str);
    fn on_progress(&mut self, job: usize, percent: u8);
    fn on_elapsed(&mut self, _job: usize, _elapsed: Duration) {}
    fn on_job_done(&mut self, job: usize, success: bool, elapsed: Duration);
    fn on_batch_done(&mut self, summary: BatchSummary);
}

pub fn deliver<S: EventSink + ?Sized>(event: &Event, sink: &mut S) {
    match event {
        Event::Message(text) => sink.on_message(text),
        Event::SearchResults(results) => sink.on_search_results(results),
        Event::Description { id, text } => sink.on_description(id, text),
        Event::Log { job, line } => sink.on_log(*job, line),
        Event::Progress { job, percent } => sink.on_progress(*job, *percent),
        Event::Elapsed { job, elapsed } => sink.on_elapsed(*job, *elapsed),
        Event::JobDone {
            job,
            success,
            elapsed,
        } => sink.on_job_done(*job, *success, *elapsed),
        Event::BatchDone(summary) => sink.on_batch_done(*summary),
    }
}

/// 持续分发直到所有发送端关闭
pub async fn dispatch<S: EventSink + ?Sized>(mut rx: EventReceiver, sink: &mut S) {
    while let Some(event) = rx.recv().await {
        deliver(&event, sink);
    }
}
