//! Process execution seam.
//!
//! Every `git` and `gh` invocation goes through [`CommandRunner`], with the
//! working directory passed explicitly. The fleet tool never changes its own
//! working directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::CommandError;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs.
pub trait CommandRunner {
    /// Run `program args...` in `cwd`, feeding `stdin` if given.
    ///
    /// A nonzero exit is *not* an error at this level; see [`run_checked`].
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        stdin: Option<&str>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Run and turn a nonzero exit into [`CommandError::Failed`].
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    stdin: Option<&str>,
) -> Result<CommandOutput, CommandError> {
    let output = runner.run(program, args, cwd, stdin)?;
    if output.success() {
        Ok(output)
    } else {
        Err(CommandError::Failed {
            program: program.to_string(),
            args: args.join(" "),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        stdin: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        let spawn_err = |source| CommandError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(program, args = %args.join(" "), cwd = ?cwd, "running");

        let mut child = cmd.spawn().map_err(spawn_err)?;
        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).map_err(spawn_err)?;
            }
        }
        let output = child.wait_with_output().map_err(spawn_err)?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Recording runner (unit tests)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};

    use super::{CommandOutput, CommandRunner};
    use crate::error::CommandError;

    /// One recorded invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        pub program: String,
        pub args: Vec<String>,
        pub cwd: Option<PathBuf>,
        pub stdin: Option<String>,
    }

    impl Call {
        pub fn line(&self) -> String {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Records calls and replays queued outputs (default: success, empty).
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<Call>>,
        pub replies: RefCell<VecDeque<CommandOutput>>,
    }

    impl RecordingRunner {
        pub fn reply(&self, status: i32, stdout: &str) {
            self.replies.borrow_mut().push_back(CommandOutput {
                status: Some(status),
                stdout: stdout.to_string(),
                stderr: String::new(),
            });
        }

        pub fn lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(Call::line).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(
            &self,
            program: &str,
            args: &[&str],
            cwd: Option<&Path>,
            stdin: Option<&str>,
        ) -> Result<CommandOutput, CommandError> {
            self.calls.borrow_mut().push(Call {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                cwd: cwd.map(Path::to_path_buf),
                stdin: stdin.map(str::to_string),
            });
            Ok(self.replies.borrow_mut().pop_front().unwrap_or(CommandOutput {
                status: Some(0),
                ..CommandOutput::default()
            }))
        }
    }
}
