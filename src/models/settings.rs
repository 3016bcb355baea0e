use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 启动器自身的设置，保存在 ~/.daemon-launcher/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LauncherSettings {
    /// 未指定 out_file / error_file 时日志写入的目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub script_check: ScriptCheck,
    /// 默认使用的 env_<profile> 配置块
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_profile: Option<String>,
    #[serde(default = "default_kill_timeout_ms")]
    pub kill_timeout_ms: u64,
}

fn default_kill_timeout_ms() -> u64 {
    1600
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            log_dir: None,
            script_check: ScriptCheck::default(),
            env_profile: None,
            kill_timeout_ms: default_kill_timeout_ms(),
        }
    }
}

impl LauncherSettings {
    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }
}

/// 加载时是否检查脚本文件存在
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptCheck {
    /// 交给 supervisor 在启动时处理
    #[default]
    Deferred,
    /// 加载阶段就要求脚本存在
    Required,
}

/// 一次加载的选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub script_check: ScriptCheck,
    /// 需要合并的 env_<profile> 配置块
    pub env_profile: Option<String>,
}

impl From<&LauncherSettings> for LoadOptions {
    fn from(settings: &LauncherSettings) -> Self {
        Self {
            script_check: settings.script_check,
            env_profile: settings.env_profile.clone(),
        }
    }
}
