//! 终端输出：把事件流渲染成带时间戳的文本行

use crate::events::EventSink;
use crate::package_manager::{BatchSummary, SearchResult};
use chrono::Local;
use std::io::Write;
use std::time::Duration;

/// `MM:SS`，超过一小时时分钟继续累加
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub struct ConsoleSink<W: Write> {
    out: W,
    timestamps: bool,
    print_results: bool,
    results: SearchResult,
    summary: Option<BatchSummary>,
    /// 最近一次打印的计时，秒数变化时才重新打印
    clock: Option<(usize, u64)>,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            timestamps: true,
            print_results: true,
            results: Vec::new(),
            summary: None,
            clock: None,
        }
    }

    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// 只保存搜索结果，不打印列表（如 `--json`）
    pub fn quiet_results(mut self) -> Self {
        self.print_results = false;
        self
    }

    pub fn results(&self) -> &SearchResult {
        &self.results
    }

    pub fn take_results(&mut self) -> SearchResult {
        std::mem::take(&mut self.results)
    }

    pub fn summary(&self) -> Option<BatchSummary> {
        self.summary
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = if self.timestamps {
            writeln!(self.out, "[{}] {}", Local::now().format("%H:%M:%S"), text)
        } else {
            writeln!(self.out, "{}", text)
        };
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn on_message(&mut self, text: &str) {
        self.line(text);
    }

    fn on_search_results(&mut self, results: &SearchResult) {
        if self.print_results {
            for (i, pkg) in results.iter().enumerate() {
                let _ = writeln!(self.out, "{:>3}. {}", i + 1, pkg);
            }
        }
        self.results = results.clone();
    }

    fn on_description(&mut self, _id: &str, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn on_log(&mut self, _job: usize, line: &str) {
        self.line(line);
    }

    fn on_progress(&mut self, job: usize, percent: u8) {
        let _ = writeln!(self.out, "  [{}] {:>3}%", job + 1, percent);
    }

    fn on_elapsed(&mut self, job: usize, elapsed: Duration) {
        let secs = elapsed.as_secs();
        if self.clock == Some((job, secs)) {
            return;
        }
        self.clock = Some((job, secs));
        let _ = writeln!(self.out, "  [{}] Elapsed: {}", job + 1, format_elapsed(elapsed));
    }

    fn on_job_done(&mut self, _job: usize, _success: bool, elapsed: Duration) {
        self.clock = None;
        let _ = writeln!(self.out, "  Elapsed: {}", format_elapsed(elapsed));
    }

    fn on_batch_done(&mut self, summary: BatchSummary) {
        let _ = writeln!(
            self.out,
            "{} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        self.summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{deliver, Event};
    use crate::package_manager::Package;

    #[test]
    fn elapsed_is_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(75_900)), "01:15");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "62:05");
    }

    #[test]
    fn renders_events_in_order() {
        let mut sink = ConsoleSink::new(Vec::new()).without_timestamps();
        let events = [
            Event::SearchResults(vec![Package::new("Git.Git", "Git", "winget", "2.47.0")]),
            Event::Log {
                job: 0,
                line: "Starting installation for: Git".into(),
            },
            Event::Progress { job: 0, percent: 5 },
            Event::JobDone {
                job: 0,
                success: true,
                elapsed: Duration::from_secs(12),
            },
            Event::BatchDone(BatchSummary {
                succeeded: 1,
                failed: 0,
            }),
        ];
        for event in &events {
            deliver(event, &mut sink);
        }

        assert_eq!(sink.results().len(), 1);
        assert_eq!(
            sink.summary(),
            Some(BatchSummary {
                succeeded: 1,
                failed: 0
            })
        );
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "  1. Git (Git.Git) [winget] v2.47.0\n\
             Starting installation for: Git\n  \
             [1]   5%\n  \
             Elapsed: 00:12\n\
             1 succeeded, 0 failed\n"
        );
    }

    #[test]
    fn running_clock_prints_once_per_second() {
        let mut sink = ConsoleSink::new(Vec::new()).without_timestamps();
        for ms in [0, 400, 1000, 1500, 2100] {
            sink.on_elapsed(0, Duration::from_millis(ms));
        }
        sink.on_elapsed(1, Duration::from_millis(900));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "  [1] Elapsed: 00:00
               [1] Elapsed: 00:01
               [1] Elapsed: 00:02
               [2] Elapsed: 00:00
"
        );
    }

    #[test]
    fn quiet_results_are_kept_but_not_printed() {
        let mut sink = ConsoleSink::new(Vec::new()).quiet_results();
        sink.on_search_results(&vec![Package::new("a", "A", "winget", "1")]);
        assert_eq!(sink.take_results().len(), 1);
        assert!(sink.into_inner().is_empty());
    }
}
