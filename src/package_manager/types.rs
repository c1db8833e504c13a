//! PackageManager 相关数据类型定义

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 搜索结果条目，由搜索输出的一行构造，构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub source: String,
    pub version: String,
}

impl Package {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            version: version.into(),
        }
    }

    /// 同一个 id 可能出现在多个源中，身份由 (id, source) 决定
    pub fn key(&self) -> (&str, &str) {
        (&self.id, &self.source)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}] v{}", self.name, self.id, self.source, self.version)
    }
}

/// 搜索结果，顺序与命令输出一致
pub type SearchResult = Vec<Package>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// 单个包的安装任务
#[derive(Debug, Clone)]
pub struct InstallJob {
    pub package: Package,
    state: JobState,
    progress: u8,
    log_lines: Vec<String>,
    elapsed: Duration,
}

impl InstallJob {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            state: JobState::Pending,
            progress: 0,
            log_lines: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Pending → Running，进度归零
    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, JobState::Pending);
        self.state = JobState::Running;
        self.progress = 0;
    }

    /// 只在 Running 期间追加日志
    pub(crate) fn push_log(&mut self, line: String) {
        if self.state == JobState::Running {
            self.log_lines.push(line);
        } else {
            log::warn!("dropping log line for {} in state {:?}", self.package.id, self.state);
        }
    }

    /// 进度只增不减
    pub(crate) fn advance_progress(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// 终态只设置一次，返回是否生效
    pub(crate) fn finish(&mut self, success: bool, elapsed: Duration) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.state = if success {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
        self.elapsed = elapsed;
        true
    }
}

/// 一次批量安装；开始后成员不变
#[derive(Debug, Clone)]
pub struct InstallBatch {
    jobs: Vec<InstallJob>,
}

impl InstallBatch {
    pub fn new(packages: Vec<Package>) -> Self {
        Self {
            jobs: packages.into_iter().map(InstallJob::new).collect(),
        }
    }

    pub fn jobs(&self) -> &[InstallJob] {
        &self.jobs
    }

    pub(crate) fn jobs_mut(&mut self) -> impl Iterator<Item = (usize, &mut InstallJob)> {
        self.jobs.iter_mut().enumerate()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self
            .jobs
            .iter()
            .filter(|j| j.state == JobState::Succeeded)
            .count();
        let failed = self
            .jobs
            .iter()
            .filter(|j| j.state == JobState::Failed)
            .count();
        BatchSummary { succeeded, failed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}
