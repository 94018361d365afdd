use crate::command::{Command, CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins run inside the interpreter's own process, so they can change its
/// state (the working directory) and write straight to its output.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Build the command from the operands following its name.
    fn from_operands(operands: &[String]) -> Self;

    /// Executes the command using the interpreter's output and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        <T as BuiltinCommand>::execute(*self, stdout, env)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>> {
        if command.name() == T::name() {
            Some(Box::new(T::from_operands(command.operands())))
        } else {
            None
        }
    }
}

/// Write the arguments to standard output, separated by spaces and followed
/// by a newline. Arguments are printed verbatim; there are no options.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn from_operands(operands: &[String]) -> Self {
        Self {
            args: operands.to_vec(),
        }
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        stdout.flush()?;
        Ok(0)
    }
}

/// Change the current working directory.
/// Without an argument, changes to the directory named by `HOME`.
pub struct Cd {
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_operands(operands: &[String]) -> Self {
        Self {
            args: operands.to_vec(),
        }
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.args.as_slice() {
            [] => match env.get_var("HOME") {
                Some(home) => home.to_owned(),
                None => {
                    writeln!(stdout, "cd: HOME not set")?;
                    return Ok(1);
                }
            },
            [path] => path.clone(),
            _ => {
                writeln!(stdout, "'cd' requires exactly one argument")?;
                return Ok(1);
            }
        };

        match env.change_dir(&target) {
            Ok(dir) => {
                tracing::debug!(dir = %dir.display(), "changed directory");
                Ok(0)
            }
            Err(err) => {
                tracing::debug!(path = %target, error = %err, "cd failed");
                writeln!(stdout, "{target}: No such file or directory")?;
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn detached(dir: &Path) -> Environment {
        Environment::detached(Vec::<(String, String)>::new(), dir)
    }

    fn run<T: BuiltinCommand>(args: &[&str], env: &mut Environment) -> (ExitCode, String) {
        let operands: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let code = BuiltinCommand::execute(T::from_operands(&operands), &mut out, env).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_echo_joins_with_spaces() {
        let mut env = detached(Path::new("/"));
        assert_eq!(run::<Echo>(&["a", "b", "c"], &mut env), (0, "a b c\n".to_string()));
    }

    #[test]
    fn test_echo_without_arguments_prints_newline() {
        let mut env = detached(Path::new("/"));
        assert_eq!(run::<Echo>(&[], &mut env), (0, "\n".to_string()));
    }

    #[test]
    fn test_echo_has_no_options() {
        let mut env = detached(Path::new("/"));
        assert_eq!(run::<Echo>(&["-n", "--help"], &mut env).1, "-n --help\n");
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let temp = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(temp.path()).unwrap();
        let mut env = detached(Path::new("/"));

        let (code, out) = run::<Cd>(&[canonical.to_str().unwrap()], &mut env);

        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert_eq!(env.current_dir(), canonical);
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let temp = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(temp.path()).unwrap();
        let mut env = detached(Path::new("/"));
        env.set_var("HOME", canonical.to_string_lossy());

        let (code, _) = run::<Cd>(&[], &mut env);

        assert_eq!(code, 0);
        assert_eq!(env.current_dir(), canonical);
    }

    #[test]
    fn test_cd_without_home() {
        let mut env = detached(Path::new("/"));
        let (code, out) = run::<Cd>(&[], &mut env);
        assert_eq!(code, 1);
        assert_eq!(out, "cd: HOME not set\n");
        assert_eq!(env.current_dir(), Path::new("/"));
    }

    #[test]
    fn test_cd_with_two_arguments_changes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = detached(temp.path());

        let (code, out) = run::<Cd>(&["/", "/tmp"], &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "'cd' requires exactly one argument\n");
        assert_eq!(env.current_dir(), temp.path());
    }

    #[test]
    fn test_cd_nonexistent_path_reports() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = detached(temp.path());

        let (code, out) = run::<Cd>(&["/nonexistent_dir_for_cd_test"], &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "/nonexistent_dir_for_cd_test: No such file or directory\n");
        assert_eq!(env.current_dir(), temp.path());
    }

    #[test]
    fn test_factory_matches_by_name() {
        let env = detached(Path::new("/"));
        let factory = Factory::<Echo>::default();
        assert!(factory.try_create(&env, &Command::new("echo", ["x"])).is_some());
        assert!(factory.try_create(&env, &Command::new("cd", ["x"])).is_none());
    }
}
