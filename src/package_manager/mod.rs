//! 包管理器模块 — 对 winget 命令行的封装

pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod streaming;
pub mod types;

// 重新导出常用类型和函数
pub use parser::{ColumnSearchParser, SearchParser, NO_DESCRIPTION};
pub use pipeline::{spawn_install, InstallPipeline};
pub use progress::ProgressSimulator;
pub use types::{BatchSummary, InstallBatch, InstallJob, JobState, Package, SearchResult};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{Event, EventSender};
use std::sync::Arc;

/// 安装时启用的固定参数：静默、接受协议、精确匹配 id
const INSTALL_FLAGS: [&str; 4] = [
    "--silent",
    "--accept-package-agreements",
    "--accept-source-agreements",
    "--exact",
];

/// 根据包的来源决定如何安装
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRoute {
    /// 默认源，直接安装
    Default,
    /// 商店源，需要 `--source <store>`
    Store(String),
    /// 不支持的来源（如 url），不启动进程
    Unsupported(String),
}

#[derive(Clone)]
pub struct PackageManager {
    pub command: String,
    store_source: String,
    installable_sources: Vec<String>,
    search_parser: Arc<dyn SearchParser>,
}

impl std::fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageManager")
            .field("command", &self.command)
            .field("store_source", &self.store_source)
            .field("installable_sources", &self.installable_sources)
            .finish_non_exhaustive()
    }
}

impl PackageManager {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.command.clone(),
            store_source: config.store_source.clone(),
            installable_sources: config.installable_sources.clone(),
            search_parser: Arc::new(ColumnSearchParser),
        }
    }

    /// 替换搜索输出解析器
    pub fn with_search_parser(mut self, parser: Arc<dyn SearchParser>) -> Self {
        self.search_parser = parser;
        self
    }

    pub fn name(&self) -> &str {
        &self.command
    }

    // ===== 查询 =====

    /// 搜索包 (winget search -q)
    ///
    /// 空查询由调用方负责拦截；启动失败返回错误，其余情况都返回（可能为空的）列表，
    /// 非零退出码也照常解析，因为 winget 查无结果时同样返回非零。
    /// 查询原样传给 winget，只在判空时忽略空白
    pub fn search(&self, query: &str) -> Result<SearchResult> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        let args = vec!["search".to_string(), "-q".to_string(), query.to_string()];
        let output = streaming::capture(&self.command, &args)?;
        if !output.status.success() {
            log::debug!("search exited with {:?}", output.status.code());
        }
        Ok(self.search_parser.parse(&output.lines))
    }

    /// 获取包描述 (winget show --id)，总是返回可显示的文本
    pub fn describe(&self, id: &str) -> String {
        let args = vec!["show".to_string(), "--id".to_string(), id.to_string()];
        match streaming::capture(&self.command, &args) {
            Ok(output) => parser::parse_description(&output.lines),
            Err(e) => {
                log::warn!("describe {}: {}", id, e);
                parser::description_error(e)
            }
        }
    }

    // ===== 安装 =====

    pub fn install_route(&self, source: &str) -> InstallRoute {
        if source.eq_ignore_ascii_case(&self.store_source) {
            InstallRoute::Store(self.store_source.clone())
        } else if self
            .installable_sources
            .iter()
            .any(|s| s.eq_ignore_ascii_case(source))
        {
            InstallRoute::Default
        } else {
            InstallRoute::Unsupported(source.to_string())
        }
    }

    /// 构造安装参数；不支持的来源返回 `UnsupportedSource`
    pub fn install_args(&self, package: &Package) -> Result<Vec<String>> {
        let store = match self.install_route(&package.source) {
            InstallRoute::Default => None,
            InstallRoute::Store(store) => Some(store),
            InstallRoute::Unsupported(source) => return Err(Error::UnsupportedSource(source)),
        };

        let mut args = vec![
            "install".to_string(),
            "--id".to_string(),
            package.id.clone(),
        ];
        args.extend(INSTALL_FLAGS.iter().map(|s| s.to_string()));
        if let Some(store) = store {
            args.push("--source".to_string());
            args.push(store);
        }
        Ok(args)
    }
}

// ===== 后台任务 =====

/// 在后台执行搜索，结果与状态信息通过事件返回
pub fn spawn_search(
    pm: PackageManager,
    query: String,
    tx: EventSender,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let _ = tx.send(Event::Message(format!(
            "Searching {} for: {}",
            pm.name(),
            query.trim()
        )));

        let results = match tokio::task::spawn_blocking(move || pm.search(&query)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                let _ = tx.send(Event::Message(format!("Search failed: {}", e)));
                Vec::new()
            }
            Err(e) => {
                let _ = tx.send(Event::Message(format!("Search failed: {}", e)));
                Vec::new()
            }
        };

        let summary = if results.is_empty() {
            "No results found.".to_string()
        } else {
            format!("Found {} apps.", results.len())
        };
        let _ = tx.send(Event::Message(summary));
        let _ = tx.send(Event::SearchResults(results));
    })
}

/// 在后台获取描述；先发送占位文本，每次选中都重新获取
pub fn spawn_description(
    pm: PackageManager,
    id: String,
    tx: EventSender,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let _ = tx.send(Event::Description {
            id: id.clone(),
            text: "Fetching description...".to_string(),
        });

        let fetch_id = id.clone();
        let text = tokio::task::spawn_blocking(move || pm.describe(&fetch_id))
            .await
            .unwrap_or_else(|e| parser::description_error(e));
        let _ = tx.send(Event::Description { id, text });
    })
}
