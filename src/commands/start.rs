use crate::models::{LoadOptions, ProcessInfo, ProcessLaunchDescriptor};
use crate::services::{ConfigParser, Supervisor};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::path::Path;

/// 按名称筛选要启动的进程；`only` 为空时全部启动
pub fn select_descriptors(
    descriptors: Vec<ProcessLaunchDescriptor>,
    only: &[String],
) -> Result<Vec<ProcessLaunchDescriptor>> {
    if only.is_empty() {
        return Ok(descriptors);
    }

    if let Some(unknown) = only
        .iter()
        .find(|name| !descriptors.iter().any(|d| d.name() == name.as_str()))
    {
        anyhow::bail!("配置中没有名为 {} 的进程", unknown);
    }

    Ok(descriptors
        .into_iter()
        .filter(|d| only.iter().any(|name| name == d.name()))
        .collect())
}

/// 依次启动，单个进程失败时记录错误并继续
pub async fn start_all<S: Supervisor + ?Sized>(
    supervisor: &S,
    descriptors: &[ProcessLaunchDescriptor],
) -> Vec<ProcessInfo> {
    let mut started = Vec::new();

    for descriptor in descriptors {
        match supervisor.register_and_launch(descriptor).await {
            Ok(mut infos) => started.append(&mut infos),
            Err(e) => {
                tracing::error!(name = descriptor.name(), error = %e, "failed to launch process");
                continue;
            }
        }
    }

    started
}

/// 加载配置并启动，直到收到 Ctrl-C 后停止全部进程
pub async fn run(state: &AppState, path: &Path, options: &LoadOptions, only: &[String]) -> Result<()> {
    let descriptors = ConfigParser::load_file(path, options)
        .with_context(|| format!("无法加载 {}", path.display()))?;
    let descriptors = select_descriptors(descriptors, only)?;

    let started = start_all(&state.process_manager, &descriptors).await;
    if started.is_empty() {
        anyhow::bail!("没有成功启动任何进程");
    }

    for info in &started {
        println!(
            "{} #{} pid={} id={}",
            info.name,
            info.instance,
            info.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            info.process_id
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("等待 Ctrl-C 信号失败")?;
    tracing::info!("interrupt received, stopping processes");

    state.process_manager.stop_all().await?;
    Ok(())
}
