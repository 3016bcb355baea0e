use crate::models::{LauncherSettings, LoadOptions};
use crate::services::{ProcessManager, SettingsStore};

pub struct AppState {
    pub store: SettingsStore,
    pub settings: LauncherSettings,
    pub process_manager: ProcessManager,
}

impl AppState {
    pub fn new(store: SettingsStore, settings: LauncherSettings) -> Self {
        let process_manager = ProcessManager::new(store.log_dir(&settings), settings.kill_timeout());
        Self {
            store,
            settings,
            process_manager,
        }
    }

    /// 设置里的默认值，命令行参数可以再覆盖
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::from(&self.settings)
    }
}
