//! 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// 包管理器无法启动（程序不存在、无权限等）
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 程序运行了，但以非零状态退出；code 为 None 表示被信号终止
    #[error("`{program}` exited with {}", describe_code(*.code))]
    NonZeroExit { program: String, code: Option<i32> },

    #[error("installs from source '{0}' are not supported")]
    UnsupportedSource(String),

    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("no packages selected")]
    EmptySelection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
