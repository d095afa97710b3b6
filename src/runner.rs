use anyhow::{Context, Result};
use std::ffi::OsString;
use std::process::{Command, Stdio};

/// Executes a rendered command line and returns what it wrote to stdout.
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> Result<String>;
}

/// Runs commands through the host command interpreter (`sh -c` / `cmd /C`).
///
/// The interpreter is looked up by the OS on spawn. The call blocks until the
/// child exits; there is no timeout.
pub struct ShellRunner {
    shell: OsString,
    flag: OsString,
}

impl ShellRunner {
    pub fn new(shell: impl Into<OsString>, flag: impl Into<OsString>) -> Self {
        Self {
            shell: shell.into(),
            flag: flag.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("sh", "-c")
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<String> {
        let shell = self.shell.to_string_lossy();
        tracing::debug!(%shell, %command, "running command");
        let output = Command::new(&self.shell)
            .arg(&self.flag)
            .arg(command)
            .stdin(Stdio::inherit())
            .output()
            .with_context(|| format!("can't spawn {shell}"))?;

        if !output.stderr.is_empty() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
                "command wrote to stderr"
            );
        }
        tracing::debug!(status = %output.status, "command finished");

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn shell_runner_captures_stdout() {
        let mut runner = ShellRunner::default();
        let out = runner.run("printf 'a b'; echo oops >&2").unwrap();
        assert_eq!(out, "a b");
    }

    #[test]
    #[cfg(unix)]
    fn shell_runner_ignores_exit_status() {
        let mut runner = ShellRunner::default();
        let out = runner.run("echo partial; exit 3").unwrap();
        assert_eq!(out, "partial\n");
    }

    #[test]
    #[cfg(unix)]
    fn shell_runner_accepts_interpreter_path() {
        let mut runner = ShellRunner::new("/bin/sh", "-c");
        assert_eq!(runner.run("echo $((1 + 2))").unwrap(), "3\n");
    }

    #[test]
    fn shell_runner_missing_interpreter() {
        let mut runner = ShellRunner::new("no-such-interpreter-here", "-c");
        let err = runner.run("true").unwrap_err();
        assert!(
            err.to_string().contains("can't spawn no-such-interpreter-here"),
            "{err:#}"
        );
    }
}
