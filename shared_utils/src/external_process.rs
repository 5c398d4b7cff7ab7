//! External process runner
//!
//! Every external tool is launched from an argument vector (never a shell
//! string). stdout and stderr are drained on helper threads so a chatty tool
//! can never block on a full pipe, while the calling thread polls the child
//! for completion, an optional timeout and Ctrl-C cancellation.

use crate::errors::{ToolError, ToolResult};
use crate::logging::log_external_tool;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Shared cancellation flag, set from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Route Ctrl-C into `flag` instead of killing the process outright, so the
/// running child can be stopped and its staged output removed.
pub fn install_interrupt_handler(flag: &CancelFlag) -> Result<(), ctrlc::Error> {
    let flag = flag.clone();
    ctrlc::set_handler(move || {
        if flag.is_cancelled() {
            // Second Ctrl-C: the user really wants out.
            std::process::exit(130);
        }
        eprintln!("\n⚠️  Interrupt received, stopping after cleanup (press Ctrl-C again to force)");
        flag.cancel();
    })
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs external tools with a shared timeout policy and cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    timeout: Option<Duration>,
    cancel: CancelFlag,
}

impl ToolRunner {
    pub fn new(timeout: Option<Duration>, cancel: CancelFlag) -> Self {
        Self { timeout, cancel }
    }

    /// Run `program` to completion. A non-zero exit is not an error here;
    /// see [`ToolRunner::run_checked`].
    pub fn run(&self, program: &Path, args: &[OsString]) -> ToolResult<ToolOutput> {
        let tool = tool_label(program);
        if self.cancel.is_cancelled() {
            return Err(ToolError::Cancelled { tool });
        }

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(tool = %tool, args = ?args, "Executing external tool");
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

        let stdout_thread = drain(child.stdout.take());
        let stderr_thread = drain(child.stderr.take());

        let status = match self.wait(&mut child, start, &tool) {
            Ok(status) => status,
            Err(err) => {
                stop(&mut child);
                collect(stdout_thread);
                let stderr = collect(stderr_thread);
                log_external_tool(&tool, args, &stderr, None, start.elapsed());
                return Err(err);
            }
        };

        let stdout = collect(stdout_thread);
        let stderr = collect(stderr_thread);
        log_external_tool(&tool, args, &stderr, status.code(), start.elapsed());

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Like [`ToolRunner::run`], but a non-zero exit becomes [`ToolError::Failed`].
    pub fn run_checked(&self, program: &Path, args: &[OsString]) -> ToolResult<ToolOutput> {
        let output = self.run(program, args)?;
        if !output.success() {
            return Err(ToolError::Failed {
                tool: tool_label(program),
                code: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    fn wait(&self, child: &mut Child, start: Instant, tool: &str) -> ToolResult<ExitStatus> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.cancel.is_cancelled() {
                return Err(ToolError::Cancelled {
                    tool: tool.to_string(),
                });
            }
            if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    return Err(ToolError::TimedOut {
                        tool: tool.to_string(),
                        timeout,
                    });
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn tool_label(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Failed to kill external tool (already exited?)");
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_run_captures_stdout() {
        let runner = ToolRunner::default();
        let output = runner
            .run(Path::new("echo"), &args(&["hello", "world"]))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello world");
    }

    #[test]
    fn test_args_are_not_shell_interpreted() {
        let runner = ToolRunner::default();
        let output = runner
            .run(Path::new("echo"), &args(&["a; echo injected", "$HOME"]))
            .unwrap();
        assert_eq!(output.stdout.trim(), "a; echo injected $HOME");
    }

    #[test]
    fn test_run_checked_reports_failure() {
        let runner = ToolRunner::default();
        let err = runner.run_checked(Path::new("false"), &[]).unwrap_err();
        match err {
            ToolError::Failed { tool, code, .. } => {
                assert_eq!(tool, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let runner = ToolRunner::default();
        let err = runner
            .run(&PathBuf::from("definitely_not_a_tool_xyz"), &[])
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[test]
    fn test_timeout_kills_child() {
        let runner = ToolRunner::new(Some(Duration::from_millis(100)), CancelFlag::new());
        let start = Instant::now();
        let err = runner.run(Path::new("sleep"), &args(&["5"])).unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let runner = ToolRunner::new(None, cancel);
        let err = runner.run(Path::new("echo"), &[]).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_cancel_while_running() {
        let cancel = CancelFlag::new();
        let runner = ToolRunner::new(None, cancel.clone());
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });
        let err = runner.run(Path::new("sleep"), &args(&["5"])).unwrap_err();
        trigger.join().unwrap();
        assert!(err.is_cancelled());
    }
}
