use crate::utils::{format_size, format_timestamp, moment_to_strftime, parse_size};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 描述如何启动一个受管进程的不可变记录
///
/// 只能通过 `ConfigParser` 构造，构造后所有字段只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessLaunchDescriptor {
    pub(crate) name: String,
    pub(crate) script: PathBuf,
    pub(crate) interpreter: Option<String>,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) instance_count: u32,
    pub(crate) auto_restart: bool,
    pub(crate) watch_filesystem: bool,
    pub(crate) max_memory_before_restart: Option<MemoryLimit>,
    pub(crate) error_log_path: Option<PathBuf>,
    pub(crate) out_log_path: Option<PathBuf>,
    pub(crate) log_timestamp_format: Option<LogDateFormat>,
    pub(crate) environment: BTreeMap<String, String>,
    pub(crate) args: Vec<String>,
}

impl ProcessLaunchDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// None 表示直接执行脚本本身
    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    pub fn watch_filesystem(&self) -> bool {
        self.watch_filesystem
    }

    pub fn max_memory_before_restart(&self) -> Option<MemoryLimit> {
        self.max_memory_before_restart
    }

    pub fn error_log_path(&self) -> Option<&Path> {
        self.error_log_path.as_deref()
    }

    pub fn out_log_path(&self) -> Option<&Path> {
        self.out_log_path.as_deref()
    }

    pub fn log_timestamp_format(&self) -> Option<&LogDateFormat> {
        self.log_timestamp_format.as_ref()
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// 脚本的实际路径：相对路径以工作目录为基准
    pub fn resolved_script(&self) -> PathBuf {
        match &self.working_directory {
            Some(cwd) if self.script.is_relative() => cwd.join(&self.script),
            _ => self.script.clone(),
        }
    }
}

/// 内存上限，以字节为单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MemoryLimit(u64);

impl MemoryLimit {
    pub fn from_bytes(bytes: u64) -> Option<Self> {
        (bytes > 0).then_some(Self(bytes))
    }

    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for MemoryLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s)
            .map(Self)
            .ok_or_else(|| format!("无法识别的内存大小: {}", s))
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_size(self.0))
    }
}

/// moment.js 风格的日志时间格式，例如 "YYYY-MM-DD HH:mm:ss"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogDateFormat(String);

impl LogDateFormat {
    /// 空白格式视为无效
    pub fn new(pattern: impl Into<String>) -> Option<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            None
        } else {
            Some(Self(pattern))
        }
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    pub fn strftime(&self) -> String {
        moment_to_strftime(&self.0)
    }

    pub fn format<Tz>(&self, time: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        format_timestamp(&self.0, time)
    }
}

impl fmt::Display for LogDateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_limit_parses_and_displays() {
        let limit: MemoryLimit = "200M".parse().unwrap();
        assert_eq!(limit.bytes(), 200 * 1024 * 1024);
        assert_eq!(limit.to_string(), "200M");
        assert!("200X".parse::<MemoryLimit>().is_err());
        assert!(MemoryLimit::from_bytes(0).is_none());
    }

    #[test]
    fn blank_log_date_format_is_rejected() {
        assert!(LogDateFormat::new("").is_none());
        assert!(LogDateFormat::new("   ").is_none());
        let format = LogDateFormat::new("YYYY-MM-DD HH:mm:ss").unwrap();
        assert_eq!(format.strftime(), "%Y-%m-%d %H:%M:%S");
    }
}
