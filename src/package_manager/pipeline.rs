//! 批量安装流水线
//!
//! 一个批次内的任务严格串行：上一个任务的 `JobDone` 发出之前，不会发出下一个任务的任何事件。
//! 每个任务里，读取安装输出与模拟进度并行进行，二者都写入同一个事件 channel。

use super::progress::ProgressSimulator;
use super::streaming::{self, OutputMode};
use super::types::{InstallBatch, InstallJob};
use super::PackageManager;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{Event, EventSender};
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct InstallPipeline {
    pm: PackageManager,
    simulator: ProgressSimulator,
}

impl InstallPipeline {
    pub fn new(pm: PackageManager, simulator: ProgressSimulator) -> Self {
        Self { pm, simulator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PackageManager::new(config),
            ProgressSimulator::from_config(&config.progress),
        )
    }

    /// 在当前线程依次安装，结果记录在 `batch` 的各个任务里
    pub fn run(&self, batch: &mut InstallBatch, events: &EventSender) {
        log::info!("installing batch of {} package(s)", batch.len());
        for (index, job) in batch.jobs_mut() {
            self.run_job(index, job, events);
        }

        let summary = batch.summary();
        log::info!(
            "batch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );
        let _ = events.send(Event::Message("All installations complete.".to_string()));
        let _ = events.send(Event::BatchDone(summary));
    }

    fn run_job(&self, index: usize, job: &mut InstallJob, events: &EventSender) {
        let started = Instant::now();

        job.start();
        let starting = format!("Starting installation for: {}", job.package);
        emit_log(index, job, events, starting);
        let _ = events.send(Event::Progress {
            job: index,
            percent: 0,
        });

        let success = match self.pm.install_args(&job.package) {
            Ok(args) => self.run_installer(index, job, &args, started, events),
            Err(Error::UnsupportedSource(source)) => {
                emit_log(index, job, events, unsupported_message(&source));
                false
            }
            Err(e) => {
                emit_log(index, job, events, format!("ERROR: {}", e));
                false
            }
        };

        job.advance_progress(100);
        let _ = events.send(Event::Progress {
            job: index,
            percent: 100,
        });

        let summary = if success {
            format!("SUCCESS: Installed {}", job.package.name)
        } else {
            format!("FAILURE: Could not install {}", job.package.name)
        };
        emit_log(index, job, events, summary);

        let elapsed = started.elapsed();
        job.finish(success, elapsed);
        let _ = events.send(Event::JobDone {
            job: index,
            success,
            elapsed,
        });
    }

    /// 启动安装进程并转发输出，返回是否成功
    fn run_installer(
        &self,
        index: usize,
        job: &mut InstallJob,
        args: &[String],
        started: Instant,
        events: &EventSender,
    ) -> bool {
        let mut child = match streaming::spawn(&self.pm.command, args, OutputMode::Merged) {
            Ok(child) => child,
            Err(e) => {
                emit_log(index, job, events, format!("ERROR: {}", e));
                return false;
            }
        };

        let ticker = self.simulator.start(index, started, events.clone());
        while let Some(line) = child.next_line() {
            emit_log(index, job, events, line);
        }
        let program = child.program().to_string();
        let status = child.wait();
        // 模拟线程结束后才允许发出 100
        job.advance_progress(ticker.stop());

        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                let err = Error::NonZeroExit {
                    program,
                    code: status.code(),
                };
                log::warn!("{}: {}", job.package.id, err);
                false
            }
            Err(e) => {
                emit_log(index, job, events, format!("ERROR: {}", e));
                false
            }
        }
    }
}

/// 在独立线程上运行整个批次；空选择直接拒绝
pub fn spawn_install(
    pipeline: InstallPipeline,
    mut batch: InstallBatch,
    events: EventSender,
) -> Result<thread::JoinHandle<InstallBatch>> {
    if batch.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(thread::spawn(move || {
        pipeline.run(&mut batch, &events);
        batch
    }))
}

fn emit_log(index: usize, job: &mut InstallJob, events: &EventSender, line: String) {
    job.push_log(line.clone());
    let _ = events.send(Event::Log { job: index, line });
}

fn unsupported_message(source: &str) -> String {
    if source.eq_ignore_ascii_case("url") {
        "Direct URL installs not implemented.".to_string()
    } else {
        format!("Installs from source '{}' not implemented.", source)
    }
}
