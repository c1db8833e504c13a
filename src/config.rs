use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_ENV: &str = "WINGET_PILOT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 包管理器可执行文件
    pub command: String,
    /// 商店源，安装时需要显式 `--source`
    pub store_source: String,
    /// 可直接安装的源（不区分大小写）
    pub installable_sources: Vec<String>,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressConfig {
    pub interval_ms: u64,
    pub step: u8,
    pub ceiling: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: "winget".to_string(),
            store_source: "msstore".to_string(),
            installable_sources: vec!["winget".to_string()],
            progress: ProgressConfig::default(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            step: 5,
            ceiling: 95,
        }
    }
}

impl ProgressConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// 默认配置文件位置：`~/.config/winget-pilot/config.toml`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/winget-pilot/config.toml")
    }

    /// 依次尝试：显式路径 > 环境变量 > 默认位置；文件不存在时使用默认配置
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_path),
        };

        if config_path.exists() {
            log::debug!("loading config from {}", config_path.display());
            let content = fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
