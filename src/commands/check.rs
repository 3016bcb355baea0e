use crate::error::LoadError;
use crate::models::{LoadOptions, ProcessLaunchDescriptor};
use crate::services::ConfigParser;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// 校验配置文件，返回可以直接打印的报告
pub fn check_config(path: &Path, options: &LoadOptions, json: bool) -> Result<String> {
    let descriptors = match ConfigParser::load_file(path, options) {
        Ok(descriptors) => descriptors,
        Err(LoadError::Invalid(errors)) => {
            for error in &errors {
                tracing::error!("{}", error);
            }
            anyhow::bail!("{} 未通过校验:\n{}", path.display(), errors);
        }
        Err(e) => return Err(e).with_context(|| format!("无法加载 {}", path.display())),
    };

    if json {
        return serde_json::to_string_pretty(&descriptors).context("序列化进程配置失败");
    }

    Ok(render_summary(&descriptors))
}

fn render_summary(descriptors: &[ProcessLaunchDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} 个进程配置有效", descriptors.len());

    for d in descriptors {
        let _ = writeln!(out, "\n[{}]", d.name());
        let _ = writeln!(out, "  script       {}", d.script().display());
        let _ = writeln!(out, "  interpreter  {}", d.interpreter().unwrap_or("(直接执行)"));
        if let Some(cwd) = d.working_directory() {
            let _ = writeln!(out, "  cwd          {}", cwd.display());
        }
        let _ = writeln!(out, "  instances    {}", d.instance_count());
        let _ = writeln!(out, "  autorestart  {}", d.auto_restart());
        let _ = writeln!(out, "  watch        {}", d.watch_filesystem());
        if let Some(limit) = d.max_memory_before_restart() {
            let _ = writeln!(out, "  max_memory   {} ({} bytes)", limit, limit.bytes());
        }
        if let Some(path) = d.out_log_path() {
            let _ = writeln!(out, "  out_file     {}", path.display());
        }
        if let Some(path) = d.error_log_path() {
            let _ = writeln!(out, "  error_file   {}", path.display());
        }
        if let Some(format) = d.log_timestamp_format() {
            let _ = writeln!(out, "  date_format  {}", format);
        }
        for (key, value) in d.environment() {
            let _ = writeln!(out, "  env          {}={}", key, value);
        }
        if !d.args().is_empty() {
            let _ = writeln!(out, "  args         {}", d.args().join(" "));
        }
    }

    out
}
