use std::io;
use std::process::Command;
use std::time::Duration;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

#[cfg(not(target_os = "windows"))]
fn get_child_pids(pid: u32) -> Vec<u32> {
    let output = Command::new("pgrep").args(["-P", &pid.to_string()]).output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<u32>().ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// 递归杀死进程树：先 SIGTERM，等待 grace 后再 SIGKILL
///
/// 会阻塞调用线程，异步代码里应通过 spawn_blocking 调用。
pub fn kill_process_tree(pid: u32, grace: Duration) -> io::Result<()> {
    #[cfg(target_os = "windows")]
    {
        let _ = grace;
        let mut kill_command = Command::new("taskkill");
        kill_command.args(["/PID", &pid.to_string(), "/T", "/F"]);

        const CREATE_NO_WINDOW: u32 = 0x08000000;
        kill_command.creation_flags(CREATE_NO_WINDOW);

        kill_command.output()?;
        return Ok(());
    }

    #[cfg(not(target_os = "windows"))]
    {
        // 先收集整棵树，避免父进程退出后子进程被 init 接管而漏杀
        let mut tree = Vec::new();
        collect_tree(pid, &mut tree);

        for target in &tree {
            let _ = Command::new("kill").args(["-TERM", &target.to_string()]).output();
        }

        std::thread::sleep(grace);

        for target in &tree {
            let still_alive = Command::new("kill")
                .args(["-0", &target.to_string()])
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false);
            if still_alive {
                tracing::debug!(pid = target, "process ignored SIGTERM, sending SIGKILL");
                Command::new("kill").args(["-9", &target.to_string()]).output()?;
            }
        }

        Ok(())
    }
}

/// 深度优先收集，子进程排在父进程前面
#[cfg(not(target_os = "windows"))]
fn collect_tree(pid: u32, out: &mut Vec<u32>) {
    for child_pid in get_child_pids(pid) {
        collect_tree(child_pid, out);
    }
    out.push(pid);
}
