//! # Command Execution Module / 命令执行模块
//!
//! Spawns child processes and captures their combined stdout and stderr.
//!
//! 派生子进程并捕获其合并的 stdout 和 stderr。

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// How many trailing lines of output go into a step error's diagnostic.
pub const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// The exit status and output of a finished command.
/// 已完成命令的退出状态和输出。
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    /// Combined stdout and stderr, line by line in arrival order.
    /// 合并的 stdout 和 stderr，按到达顺序逐行排列。
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The last `n` lines of output, for diagnostics.
    /// 输出的最后 `n` 行，用于诊断。
    pub fn tail(&self, n: usize) -> String {
        tail_lines(&self.output, n)
    }
}

/// Returns the last `n` non-empty lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Builds a command from an argv vector, running in `cwd`.
/// The child is killed if the returned future is dropped.
///
/// 从 argv 向量构建在 `cwd` 中运行的命令。
/// 如果返回的 future 被丢弃，子进程会被终止。
pub fn build_command(argv: &[String], cwd: &Path) -> std::io::Result<Command> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
    })?;
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd).kill_on_drop(true);
    Ok(cmd)
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// The exit status and combined output, or the error that prevented the
/// process from being spawned or awaited.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(mut cmd: Command) -> std::io::Result<CommandOutput> {
    tracing::debug!(command = ?cmd.as_std(), "spawning");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    // Both readers append to the same buffer so lines keep their arrival order.
    let output = Arc::new(tokio::sync::Mutex::new(String::new()));
    let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
    let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

    let status = child.wait().await?;

    if let Err(e) = stdout_handle.await {
        tracing::warn!("failed to join stdout task: {e}");
    }
    if let Err(e) = stderr_handle.await {
        tracing::warn!("failed to join stderr task: {e}");
    }

    let output = output.lock().await.clone();
    tracing::debug!(?status, bytes = output.len(), "command finished");
    Ok(CommandOutput { status, output })
}

/// Drains `stream` to EOF, appending each line to `sink`.
/// Bytes that are not valid UTF-8 are replaced rather than ending the read,
/// so the child never writes into a closed pipe.
async fn collect_lines<R>(stream: R, sink: Arc<tokio::sync::Mutex<String>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let mut out = sink.lock().await;
                out.push_str(line.trim_end_matches(['\n', '\r']));
                out.push('\n');
            }
            Err(e) => {
                tracing::warn!("failed to read command output: {e}");
                break;
            }
        }
    }
}
