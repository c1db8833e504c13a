//! 通过 winget 命令行搜索、查看并批量安装软件包

pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod package_manager;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{dispatch, Event, EventSink};
pub use package_manager::{InstallPipeline, Package, PackageManager};
