use crate::utils::LiteralError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 单个字段的校验失败；`app` 为应用名，缺少名称时为 `apps[序号]`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{app}: 缺少必填字段 `{field}`")]
    MissingRequiredField { app: String, field: &'static str },

    #[error("{app}: instances 必须是正整数，实际为 {value}")]
    InvalidInstanceCount { app: String, value: String },

    #[error("{app}: 无法识别的 max_memory_restart `{value}`（示例：200M、1G、512K）")]
    InvalidMemoryLimit { app: String, value: String },

    #[error("{app}: log_date_format 不能为空")]
    InvalidLogDateFormat { app: String },

    #[error("{app}: 非法的环境变量名 `{key}`")]
    InvalidEnvironmentKey { app: String, key: String },

    #[error("{app}: 字段 `{field}` {reason}")]
    InvalidField {
        app: String,
        field: String,
        reason: String,
    },

    #[error("应用名称重复: {name}")]
    DuplicateName { name: String },

    #[error("{app}: 脚本不存在: {}", .path.display())]
    ScriptNotFound { app: String, path: PathBuf },
}

/// 一次加载中收集到的全部校验错误，按发现顺序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("读取配置文件失败 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置源格式错误: {0}")]
    MalformedSource(String),

    #[error("配置校验失败:\n{0}")]
    Invalid(ValidationErrors),
}

impl LoadError {
    /// 校验错误列表；其他类型的错误返回空切片
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            LoadError::Invalid(errors) => errors.as_slice(),
            _ => &[],
        }
    }
}

impl From<LiteralError> for LoadError {
    fn from(err: LiteralError) -> Self {
        LoadError::MalformedSource(err.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::MalformedSource(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("进程 {0} 已经注册")]
    AlreadyRegistered(String),

    #[error("进程 {0} 不存在")]
    NotRegistered(String),

    #[error("{name}: 工作目录不存在: {}", .path.display())]
    WorkingDirectoryMissing { name: String, path: PathBuf },

    #[error("{name}: 在 PATH 中找不到解释器 `{interpreter}`")]
    InterpreterNotFound { name: String, interpreter: String },

    #[error("打开日志文件失败 {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: 启动进程失败: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("停止进程 {name} 失败: {source}")]
    Stop {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("无法获取用户主目录")]
    NoHomeDir,

    #[error("读写设置文件失败 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析设置文件失败 {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
