use std::ffi::OsString;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// 缓存查找解释器用的 PATH
/// 守护进程常由 cron / systemd 拉起，环境里的 PATH 往往不完整，因此补充常见目录
pub static USER_PATH: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    let system_path = std::env::var_os("PATH").unwrap_or_else(OsString::new);
    let mut paths: Vec<PathBuf> = std::env::split_paths(&system_path)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();

    let mut extra = vec![
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/bin"),
    ];
    if let Some(home) = dirs_next::home_dir() {
        extra.insert(0, home.join(".local").join("bin"));
        extra.insert(0, home.join("bin"));
    }

    for dir in extra {
        if dir.exists() && !paths.contains(&dir) {
            paths.push(dir);
        }
    }

    tracing::debug!(entries = paths.len(), "interpreter search path resolved");
    paths
});

/// 在 PATH 中查找可执行程序；带路径分隔符的参数直接检查文件本身
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    resolve_program_in(program, &USER_PATH)
}

pub fn resolve_program_in(program: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let direct = Path::new(program);
    if direct.components().count() > 1 || direct.is_absolute() {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    search_path
        .iter()
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// 没有执行权限的同名文件不能遮住后面目录里的真实程序
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
