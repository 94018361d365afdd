use crate::command::{Command, CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::redirect::Redirections;
use crate::resolve::{is_direct_path, resolve};
use anyhow::Result;
use nix::errno::Errno;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, ExitStatus};

/// Why a command could not be run to completion.
///
/// Each variant names the launch phase that failed. None of them affect the
/// interpreter beyond the line being executed.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("{}: {}", .path.display(), describe(.source))]
    Redirect { path: PathBuf, source: io::Error },

    #[error("I don't implement pipes")]
    UnsupportedPipe,

    #[error("{name}: command not found")]
    NotFound { name: String },

    #[error("{}: {}", .path.display(), describe(.source))]
    ImageLoad { path: PathBuf, source: io::Error },

    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}

impl LaunchError {
    /// Exit code recorded for a command that failed this way.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LaunchError::NotFound { .. } => 127,
            LaunchError::ImageLoad { .. } => 126,
            LaunchError::Redirect { .. } | LaunchError::UnsupportedPipe | LaunchError::Wait(_) => 1,
        }
    }
}

/// Text of the underlying system error, without Rust's `(os error N)` suffix.
fn describe(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_owned(),
        None => err.to_string(),
    }
}

/// A [`LaunchError`] together with the redirected streams that were already
/// open when it happened, so the message lands where the command's own output
/// would have gone.
#[derive(Debug)]
pub struct LaunchFailure {
    pub error: LaunchError,
    stdout: Option<File>,
    stderr: Option<File>,
}

impl From<LaunchError> for LaunchFailure {
    fn from(error: LaunchError) -> Self {
        Self {
            error,
            stdout: None,
            stderr: None,
        }
    }
}

impl LaunchFailure {
    /// Print the error the way a user expects to see it.
    ///
    /// Lookup problems go to the command's standard output, system call
    /// failures to its standard error. A stream that was not redirected falls
    /// back to `stdout` or the interpreter's standard error.
    pub fn report(self, stdout: &mut dyn Write) -> io::Result<()> {
        let LaunchFailure {
            error,
            stdout: redirected_stdout,
            stderr: redirected_stderr,
        } = self;
        match (&error, redirected_stdout, redirected_stderr) {
            (LaunchError::NotFound { .. } | LaunchError::UnsupportedPipe, Some(mut file), _) => {
                writeln!(file, "{error}")
            }
            (LaunchError::NotFound { .. } | LaunchError::UnsupportedPipe, None, _) => {
                writeln!(stdout, "{error}")?;
                stdout.flush()
            }
            (_, _, Some(mut file)) => writeln!(file, "{error}"),
            (_, _, None) => {
                eprintln!("{error}");
                Ok(())
            }
        }
    }
}

/// Spawn the head of a chain as a child process and wait for it.
///
/// Redirections are opened first, then the program is located: names
/// starting with `/` or `.` are used as paths, anything else is searched on
/// `PATH`. The child gets `command.args()` as its argument vector and the
/// environment's variables and working directory.
pub fn launch(command: &Command, env: &Environment) -> Result<ExitStatus, LaunchError> {
    spawn_and_wait(command, env).map_err(|failure| failure.error)
}

fn spawn_and_wait(command: &Command, env: &Environment) -> Result<ExitStatus, LaunchFailure> {
    let redirections = Redirections::open(command, env)?;
    let path = match locate(command, env) {
        Ok(path) => path,
        Err(error) => {
            return Err(LaunchFailure {
                error,
                stdout: redirections.stdout,
                stderr: redirections.stderr,
            });
        }
    };
    let report_stderr = redirections
        .stderr
        .as_ref()
        .and_then(|file| file.try_clone().ok());
    let (stdin, stdout, stderr) = redirections.into_stdio();

    let mut child = process::Command::new(env.resolve_path(&path))
        .arg0(command.name())
        .args(command.operands())
        .env_clear()
        .envs(env.vars())
        .current_dir(env.current_dir())
        .stdin(stdin)
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| LaunchFailure {
            error: LaunchError::ImageLoad { path, source },
            stdout: None,
            stderr: report_stderr,
        })?;

    tracing::debug!(pid = child.id(), command = command.name(), "spawned child");
    let status = child.wait().map_err(LaunchError::Wait)?;
    tracing::debug!(command = command.name(), %status, "child finished");
    Ok(status)
}

fn locate(command: &Command, env: &Environment) -> Result<PathBuf, LaunchError> {
    let name = command.name();
    if is_direct_path(name) {
        return Ok(PathBuf::from(name));
    }
    resolve(name, env.get_var("PATH")).ok_or_else(|| LaunchError::NotFound {
        name: name.to_owned(),
    })
}

/// Convert a finished child's status into a shell exit code.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

/// Command that is not a builtin: runs in a child process.
pub struct ExternalCommand {
    command: Command,
}

impl ExternalCommand {
    pub fn new(command: Command) -> Self {
        Self { command }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(command.clone())))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match spawn_and_wait(&self.command, env) {
            Ok(status) => Ok(exit_code(status)),
            Err(failure) => {
                tracing::debug!(command = self.command.name(), error = ?failure.error, "launch failed");
                let code = failure.error.exit_code();
                failure.report(stdout)?;
                Ok(code)
            }
        }
    }
}
