use crate::env::Environment;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Where a stage reads its input from or writes its output to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// An ordinary file, relative to the interpreter's working directory.
    File(PathBuf),
    /// Connects to the adjacent stage of the chain.
    Pipe,
}

/// One stage of a command chain.
///
/// `args` always holds at least one element and `args[0]` equals `name`; the
/// constructor is the only way to build a stage, so the invariant holds for
/// every value. Standard error can only go to a file, never to a pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<String>,
    pub stdin: Option<Redirect>,
    pub stdout: Option<Redirect>,
    pub stderr: Option<PathBuf>,
    pub append_stdout: bool,
    pub append_stderr: bool,
    /// Next stage of the pipeline. Parsed, but only the head is executed.
    pub next: Option<Box<Command>>,
}

impl Command {
    /// Create a stage running `name` with the given trailing arguments.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut argv = vec![name.clone()];
        argv.extend(args.into_iter().map(Into::into));
        Self {
            name,
            args: argv,
            stdin: None,
            stdout: None,
            stderr: None,
            append_stdout: false,
            append_stderr: false,
            next: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full argument vector, including the command name at index 0.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments following the command name.
    pub fn operands(&self) -> &[String] {
        &self.args[1..]
    }

    pub fn push_arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// Iterate over this stage and every stage linked after it.
    pub fn stages(&self) -> impl Iterator<Item = &Command> {
        std::iter::successors(Some(self), |cmd| cmd.next.as_deref())
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// Implemented by built-ins via a blanket impl and by the external launcher.
pub trait ExecutableCommand {
    /// Executes the command. `stdout` receives the interpreter's own output
    /// (built-in output and user-visible diagnostics).
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from the head of a chain.
///
/// Returns `None` when the factory doesn't recognize the command.
pub trait CommandFactory {
    fn try_create(&self, env: &Environment, command: &Command)
    -> Option<Box<dyn ExecutableCommand>>;
}
