use crate::error::LaunchError;
use crate::models::{LogDateFormat, LogStream, ProcessInfo, ProcessLaunchDescriptor, ProcessStatus};
use crate::utils::{kill_process_tree, resolve_program};
use async_trait::async_trait;
use chrono::{Local, Utc};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// 外部 supervisor 的最小接口
#[async_trait]
pub trait Supervisor: Send + Sync {
    /// 注册并启动 descriptor 描述的全部实例
    async fn register_and_launch(
        &self,
        descriptor: &ProcessLaunchDescriptor,
    ) -> Result<Vec<ProcessInfo>, LaunchError>;

    async fn stop(&self, name: &str) -> Result<(), LaunchError>;

    async fn stop_all(&self) -> Result<(), LaunchError>;

    async fn list(&self) -> Vec<ProcessInfo>;
}

type SharedLog = Arc<Mutex<File>>;

/// 只负责启动和停止；autorestart、watch、内存上限不在这里执行
pub struct ProcessManager {
    processes: Arc<Mutex<HashMap<String, Vec<ProcessHandle>>>>,
    log_dir: PathBuf,
    kill_timeout: Duration,
}

struct ProcessHandle {
    info: ProcessInfo,
    child: Child,
}

impl ProcessManager {
    pub fn new(log_dir: impl Into<PathBuf>, kill_timeout: Duration) -> Self {
        // 预热解释器搜索路径
        let _ = &*crate::utils::USER_PATH;

        Self {
            processes: Arc::new(Mutex::new(HashMap::new())),
            log_dir: log_dir.into(),
            kill_timeout,
        }
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.processes.lock().await.contains_key(name)
    }

    /// 名称中的路径分隔符替换为 `_`，日志始终落在 log_dir 之下
    fn default_log_path(&self, name: &str, stream: LogStream) -> PathBuf {
        let suffix = match stream {
            LogStream::Stdout => "out",
            LogStream::Stderr => "error",
        };
        let file_stem: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
            .collect();
        self.log_dir.join(format!("{}-{}.log", file_stem, suffix))
    }

    /// 解析要执行的程序和参数：有解释器时脚本作为第一个参数
    fn build_invocation(
        descriptor: &ProcessLaunchDescriptor,
        cwd: &Path,
    ) -> Result<(PathBuf, Vec<OsString>), LaunchError> {
        let script = descriptor.script();
        let script_path = if script.is_relative() {
            cwd.join(script)
        } else {
            script.to_path_buf()
        };

        let (program, mut args) = match descriptor.interpreter() {
            Some(interpreter) => {
                let program = resolve_program(interpreter).ok_or_else(|| {
                    LaunchError::InterpreterNotFound {
                        name: descriptor.name().to_string(),
                        interpreter: interpreter.to_string(),
                    }
                })?;
                (program, vec![script_path.into_os_string()])
            }
            None => (script_path, Vec::new()),
        };

        args.extend(descriptor.args().iter().map(OsString::from));
        Ok((program, args))
    }

    async fn open_log(path: &Path) -> Result<SharedLog, LaunchError> {
        let to_error = |source: io::Error| LaunchError::LogFile {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(to_error)?;

        Ok(Arc::new(Mutex::new(file)))
    }

    async fn stop_handle(&self, name: &str, mut handle: ProcessHandle) -> Result<(), LaunchError> {
        let to_error = |source: io::Error| LaunchError::Stop {
            name: name.to_string(),
            source,
        };

        if let Some(pid) = handle.child.id() {
            let grace = self.kill_timeout;
            tokio::task::spawn_blocking(move || kill_process_tree(pid, grace))
                .await
                .map_err(|e| to_error(io::Error::new(io::ErrorKind::Other, e)))?
                .map_err(to_error)?;
        }

        // 回收子进程；已经退出的进程这里直接返回
        if let Err(e) = handle.child.kill().await {
            tracing::debug!(name, instance = handle.info.instance, error = %e, "child already reaped");
        }

        tracing::info!(name, instance = handle.info.instance, pid = ?handle.info.pid, "process stopped");
        Ok(())
    }
}

#[async_trait]
impl Supervisor for ProcessManager {
    async fn register_and_launch(
        &self,
        descriptor: &ProcessLaunchDescriptor,
    ) -> Result<Vec<ProcessInfo>, LaunchError> {
        let name = descriptor.name().to_string();
        let mut processes = self.processes.lock().await;
        if processes.contains_key(&name) {
            return Err(LaunchError::AlreadyRegistered(name));
        }

        let cwd = match descriptor.working_directory() {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(|source| LaunchError::Spawn {
                name: name.clone(),
                source,
            })?,
        };
        if !cwd.is_dir() {
            return Err(LaunchError::WorkingDirectoryMissing { name, path: cwd });
        }

        let (program, args) = Self::build_invocation(descriptor, &cwd)?;

        let out_path = descriptor
            .out_log_path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_log_path(&name, LogStream::Stdout));
        let err_path = descriptor
            .error_log_path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_log_path(&name, LogStream::Stderr));

        let out_log = Self::open_log(&out_path).await?;
        let err_log = if err_path == out_path {
            out_log.clone()
        } else {
            Self::open_log(&err_path).await?
        };

        let mut handles: Vec<ProcessHandle> = Vec::new();
        for instance in 0..descriptor.instance_count() {
            let mut command = Command::new(&program);
            command
                .args(&args)
                .current_dir(&cwd)
                .envs(descriptor.environment())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(source) => {
                    // 不保留部分启动的实例
                    for handle in handles {
                        if let Err(e) = self.stop_handle(&name, handle).await {
                            tracing::warn!(name = %name, error = %e, "failed to stop partially launched instance");
                        }
                    }
                    return Err(LaunchError::Spawn { name, source });
                }
            };

            let pid = child.id();
            let format = descriptor.log_timestamp_format().cloned();

            if let Some(stdout) = child.stdout.take() {
                tokio::spawn(pipe_lines(
                    stdout,
                    out_log.clone(),
                    format.clone(),
                    name.clone(),
                    LogStream::Stdout,
                ));
            }
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(pipe_lines(
                    stderr,
                    err_log.clone(),
                    format,
                    name.clone(),
                    LogStream::Stderr,
                ));
            }

            tracing::info!(name = %name, instance, pid = ?pid, program = %program.display(), "process launched");

            handles.push(ProcessHandle {
                info: ProcessInfo {
                    process_id: uuid::Uuid::new_v4().to_string(),
                    name: name.clone(),
                    instance,
                    status: ProcessStatus::Running,
                    started_at: Utc::now(),
                    pid,
                },
                child,
            });
        }

        if descriptor.auto_restart()
            || descriptor.watch_filesystem()
            || descriptor.max_memory_before_restart().is_some()
        {
            tracing::debug!(
                name = %name,
                autorestart = descriptor.auto_restart(),
                watch = descriptor.watch_filesystem(),
                max_memory = ?descriptor.max_memory_before_restart().map(|m| m.bytes()),
                "restart policy is left to the external supervisor"
            );
        }

        let infos = handles.iter().map(|h| h.info.clone()).collect();
        processes.insert(name, handles);
        Ok(infos)
    }

    async fn stop(&self, name: &str) -> Result<(), LaunchError> {
        let handles = self
            .processes
            .lock()
            .await
            .remove(name)
            .ok_or_else(|| LaunchError::NotRegistered(name.to_string()))?;

        // 某个实例停止失败时仍继续停止其余实例
        let mut first_error = None;
        for handle in handles {
            if let Err(e) = self.stop_handle(name, handle).await {
                tracing::error!(name, error = %e, "failed to stop instance");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 逐个停止，遇到错误继续处理剩余进程，最后返回第一个错误
    async fn stop_all(&self) -> Result<(), LaunchError> {
        let names: Vec<String> = {
            let processes = self.processes.lock().await;
            processes.keys().cloned().collect()
        };

        let mut first_error = None;
        for name in names {
            if let Err(e) = self.stop(&name).await {
                tracing::error!(name = %name, error = %e, "failed to stop process");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn list(&self) -> Vec<ProcessInfo> {
        let mut processes = self.processes.lock().await;
        let mut infos: Vec<ProcessInfo> = processes
            .values_mut()
            .flat_map(|handles| handles.iter_mut())
            .map(|handle| {
                handle.info.status = match handle.child.try_wait() {
                    Ok(None) => ProcessStatus::Running,
                    Ok(Some(status)) if status.success() => ProcessStatus::Stopped,
                    Ok(Some(_)) => ProcessStatus::Crashed,
                    Err(_) => ProcessStatus::Error,
                };
                handle.info.clone()
            })
            .collect();

        infos.sort_by(|a, b| a.name.cmp(&b.name).then(a.instance.cmp(&b.instance)));
        infos
    }
}

/// 给一行输出加上时间前缀，未配置格式时原样输出
fn render_line(format: Option<&LogDateFormat>, line: &str) -> String {
    match format {
        Some(format) => format!("{}: {}\n", format.format(&Local::now()), line),
        None => format!("{}\n", line),
    }
}

/// 按行转发子进程输出；非 UTF-8 字节按有损方式解码，只在 EOF 或读错误时结束
async fn pipe_lines<R>(
    reader: R,
    log: SharedLog,
    format: Option<LogDateFormat>,
    name: String,
    stream: LogStream,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf);
                let entry = render_line(format.as_ref(), &line);
                let mut file = log.lock().await;
                let written = match file.write_all(entry.as_bytes()).await {
                    Ok(()) => file.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    // 写日志失败时继续读取，避免子进程写入已关闭的管道
                    tracing::warn!(name = %name, stream = stream.as_str(), error = %e, "failed to write log line");
                }
            }
            Err(e) => {
                tracing::warn!(name = %name, stream = stream.as_str(), error = %e, "failed to read process output");
                break;
            }
        }
    }
}
