//! Shell session and command execution.
//!
//! Owns a long-lived shell child and runs one-shot commands through it,
//! capturing combined output and the exit code.

use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use parking_lot::Mutex;

/// Result of executing a shell command.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// Combined standard output and standard error (stdout first)
    pub output: String,

    /// Exit code of the command (0 when the spawn itself failed)
    pub exit_code: i32,

    /// Spawn error, if the command could not be started
    pub error: Option<String>,
}

impl CommandResult {
    /// Check if the command ran and exited with code 0.
    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_code == 0
    }
}

/// Pending result of an `execute` call.
///
/// Single-consumer hand-off: the result is delivered exactly once, to
/// whoever calls [`CommandHandle::wait`].
#[derive(Debug)]
pub struct CommandHandle {
    rx: Receiver<CommandResult>,
}

impl CommandHandle {
    /// Block until the command completes and take its result.
    pub fn wait(self) -> CommandResult {
        // The worker thread holds the only sender; a closed channel means
        // it panicked before delivering, which we surface as a spawn error.
        self.rx.recv().unwrap_or_else(|_| CommandResult {
            output: String::new(),
            exit_code: 0,
            error: Some("command worker terminated without a result".to_string()),
        })
    }
}

/// A long-lived shell session.
///
/// The session starts a parent shell at construction and keeps it alive
/// for the lifetime of the process. Each [`execute`](Self::execute) spawns
/// an independent `sh -c` sub-process, so commands do not share shell
/// state; the parent exists so future stateful shells can reuse the same
/// surface.
#[derive(Debug)]
pub struct ShellSession {
    child: Mutex<Option<Child>>,
}

impl ShellSession {
    /// Start a new shell session.
    pub fn new() -> anyhow::Result<Self> {
        let (shell, _) = shell_invocation();

        let child = ProcessCommand::new(shell)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child: Mutex::new(Some(child)) })
    }

    /// Execute a command line, returning a handle to its pending result.
    ///
    /// Stdout and stderr are concatenated (stdout first). A non-zero exit
    /// is reported through `exit_code`, not `error`; `error` is set only
    /// when the sub-process could not be spawned.
    pub fn execute(&self, command_line: &str) -> CommandHandle {
        let (tx, rx) = mpsc::sync_channel::<CommandResult>(1);
        let command_line = command_line.to_string();

        thread::spawn(move || {
            let (shell, shell_arg) = shell_invocation();

            let result = match ProcessCommand::new(shell)
                .arg(shell_arg)
                .arg(&command_line)
                .stdin(Stdio::null())
                .output()
            {
                Ok(output) => {
                    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
                    combined.push_str(&String::from_utf8_lossy(&output.stderr));

                    CommandResult {
                        output: combined,
                        exit_code: output.status.code().unwrap_or(-1),
                        error: None,
                    }
                }
                Err(e) => CommandResult {
                    output: String::new(),
                    exit_code: 0,
                    error: Some(format!("failed to spawn '{command_line}': {e}")),
                },
            };

            // The receiver may already be gone; dropped results are fine.
            let _ = tx.send(result);
        });

        CommandHandle { rx }
    }

    /// Terminate the parent shell. Idempotent.
    pub fn close(&self) {
        let mut guard = self.child.lock();
        if let Some(mut child) = guard.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Get the shell and its command-string argument for the current platform.
fn shell_invocation() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Search `PATH` for an executable, returning its full path.
///
/// On Windows the `PATHEXT` suffixes are tried for each directory; on
/// Unix the candidate must be a regular file with an execute bit set.
pub fn which(executable: &str) -> anyhow::Result<PathBuf> {
    let path_env = std::env::var("PATH").unwrap_or_default();

    let extensions: Vec<String> = if cfg!(target_os = "windows") {
        let pathext = std::env::var("PATHEXT").unwrap_or_default();
        let mut exts: Vec<String> =
            pathext.split(';').filter(|e| !e.is_empty()).map(str::to_string).collect();
        exts.push(String::new());
        exts
    } else {
        vec![String::new()]
    };

    for dir in std::env::split_paths(&path_env) {
        for ext in &extensions {
            let candidate = dir.join(format!("{executable}{ext}"));
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }

    anyhow::bail!("{executable}: command not found")
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata().map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
