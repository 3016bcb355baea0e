//! 守护进程启动配置的加载、校验与启动
//!
//! 核心是 [`ConfigParser`]：把 ecosystem 风格的配置（JSON 或 JS 对象字面量）
//! 转换为不可变的 [`ProcessLaunchDescriptor`] 列表，校验失败时一次性返回全部错误。
//! [`ProcessManager`] 是 [`Supervisor`] 的一个最小实现，只负责启动与停止。

pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use error::{LaunchError, LoadError, SettingsError, ValidationError, ValidationErrors};
pub use models::{
    LauncherSettings, LoadOptions, LogDateFormat, MemoryLimit, ProcessInfo, ProcessLaunchDescriptor,
    ProcessStatus, ScriptCheck,
};
pub use services::{ConfigParser, ProcessManager, SettingsStore, SourceFormat, Supervisor};
