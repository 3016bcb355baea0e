use crate::error::SettingsError;
use crate::models::LauncherSettings;
use std::fs;
use std::path::{Path, PathBuf};

/// 启动器数据目录，日志和设置都放在这里
pub struct SettingsStore {
    home: PathBuf,
}

impl SettingsStore {
    /// 使用 ~/.daemon-launcher
    pub fn from_user_home() -> Result<Self, SettingsError> {
        let home = dirs_next::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(Self::new(home.join(".daemon-launcher")))
    }

    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn settings_path(&self) -> PathBuf {
        self.home.join("settings.json")
    }

    /// 默认的日志目录，设置中的 log_dir 优先
    pub fn log_dir(&self, settings: &LauncherSettings) -> PathBuf {
        settings
            .log_dir
            .clone()
            .unwrap_or_else(|| self.home.join("logs"))
    }

    /// 加载设置；文件不存在时返回默认值
    pub fn load(&self) -> Result<LauncherSettings, SettingsError> {
        let path = self.settings_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(LauncherSettings::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| SettingsError::Json { path, source })
    }

    /// 保存设置，必要时创建目录
    pub fn save(&self, settings: &LauncherSettings) -> Result<(), SettingsError> {
        fs::create_dir_all(&self.home).map_err(|source| SettingsError::Io {
            path: self.home.clone(),
            source,
        })?;

        let path = self.settings_path();
        let json = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Json {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, json).map_err(|source| SettingsError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScriptCheck;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("launcher"));

        let settings = store.load().unwrap();
        assert_eq!(settings, LauncherSettings::default());
        assert_eq!(settings.kill_timeout_ms, 1600);
        assert_eq!(store.log_dir(&settings), dir.path().join("launcher").join("logs"));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("launcher"));

        let settings = LauncherSettings {
            log_dir: Some(PathBuf::from("/var/log/daemons")),
            script_check: ScriptCheck::Required,
            env_profile: Some("production".to_string()),
            kill_timeout_ms: 500,
        };
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(store.log_dir(&loaded), PathBuf::from("/var/log/daemons"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.settings_path(), r#"{ "script_check": "required" }"#).unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.script_check, ScriptCheck::Required);
        assert_eq!(settings.kill_timeout_ms, 1600);
        assert_eq!(settings.log_dir, None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.settings_path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Json { .. })));
    }
}
