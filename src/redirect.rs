//! Opening the files a stage redirects its standard streams to.
//!
//! Every handle is opened in the interpreter and handed to the child as a
//! [`Stdio`]; the interpreter's own descriptors are never rebound. Handles
//! opened before a failure are dropped, and thereby closed, on the error path.

use crate::command::{Command, Redirect};
use crate::env::Environment;
use crate::launch::LaunchError;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::Stdio;

/// Permission bits for output files created by a redirection.
pub const CREATE_MODE: u32 = 0o644;

/// The standard streams a child should start with.
///
/// `None` means the stream is inherited from the interpreter.
#[derive(Debug, Default)]
pub struct Redirections {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
    pub stderr: Option<File>,
}

impl Redirections {
    /// Open every redirection requested by `command`, in stdin, stdout,
    /// stderr order.
    ///
    /// Relative paths are taken from the environment's working directory. An
    /// output pipe marker is refused with [`LaunchError::UnsupportedPipe`]; an
    /// input pipe marker leaves stdin inherited.
    pub fn open(command: &Command, env: &Environment) -> Result<Self, LaunchError> {
        let stdin = match &command.stdin {
            Some(Redirect::File(path)) => Some(open_input(path, env)?),
            Some(Redirect::Pipe) | None => None,
        };
        let stdout = match &command.stdout {
            Some(Redirect::File(path)) => Some(open_output(path, command.append_stdout, env)?),
            Some(Redirect::Pipe) => return Err(LaunchError::UnsupportedPipe),
            None => None,
        };
        let stderr = match &command.stderr {
            Some(path) => Some(open_output(path, command.append_stderr, env)?),
            None => None,
        };
        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }

    /// Convert into the `(stdin, stdout, stderr)` handles for a child process.
    pub fn into_stdio(self) -> (Stdio, Stdio, Stdio) {
        fn stdio(file: Option<File>) -> Stdio {
            file.map_or_else(Stdio::inherit, Stdio::from)
        }
        (stdio(self.stdin), stdio(self.stdout), stdio(self.stderr))
    }
}

fn open_input(path: &Path, env: &Environment) -> Result<File, LaunchError> {
    File::open(env.resolve_path(path)).map_err(|source| LaunchError::Redirect {
        path: path.to_owned(),
        source,
    })
}

fn open_output(path: &Path, append: bool, env: &Environment) -> Result<File, LaunchError> {
    let mut options = OpenOptions::new();
    options.create(true).mode(CREATE_MODE);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options
        .open(env.resolve_path(path))
        .map_err(|source| LaunchError::Redirect {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn env_in(dir: &Path) -> Environment {
        Environment::detached(Vec::<(String, String)>::new(), dir)
    }

    fn with_stdout(file: &str, append: bool) -> Command {
        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stdout = Some(Redirect::File(PathBuf::from(file)));
        cmd.append_stdout = append;
        cmd
    }

    #[test]
    fn test_no_redirections_inherit_everything() {
        let temp = tempfile::tempdir().unwrap();
        let cmd = Command::new("tool", Vec::<String>::new());
        let redirs = Redirections::open(&cmd, &env_in(temp.path())).unwrap();
        assert!(redirs.stdin.is_none());
        assert!(redirs.stdout.is_none());
        assert!(redirs.stderr.is_none());
    }

    #[test]
    fn test_output_is_created_with_mode_0644() {
        let temp = tempfile::tempdir().unwrap();
        let cmd = with_stdout("new.txt", false);
        let redirs = Redirections::open(&cmd, &env_in(temp.path())).unwrap();
        drop(redirs);

        let meta = fs::metadata(temp.path().join("new.txt")).unwrap();
        // The process umask can only clear bits.
        assert_eq!(meta.permissions().mode() & 0o777 & !0o644, 0);
        assert_eq!(meta.permissions().mode() & 0o600, 0o600);
    }

    #[test]
    fn test_output_truncates_without_append() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("out.txt");
        fs::write(&target, "previous contents\n").unwrap();

        let redirs = Redirections::open(&with_stdout("out.txt", false), &env_in(temp.path())).unwrap();
        redirs.stdout.unwrap().write_all(b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new\n");
    }

    #[test]
    fn test_output_appends_with_flag() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("out.txt");
        fs::write(&target, "previous\n").unwrap();

        let redirs = Redirections::open(&with_stdout("out.txt", true), &env_in(temp.path())).unwrap();
        redirs.stdout.unwrap().write_all(b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "previous\nnew\n");
    }

    #[test]
    fn test_stderr_file_and_append() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("err.txt");
        fs::write(&target, "kept\n").unwrap();

        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stderr = Some(PathBuf::from("err.txt"));
        cmd.append_stderr = true;
        let redirs = Redirections::open(&cmd, &env_in(temp.path())).unwrap();
        redirs.stderr.unwrap().write_all(b"more\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "kept\nmore\n");
    }

    #[test]
    fn test_missing_input_reports_path() {
        let temp = tempfile::tempdir().unwrap();
        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stdin = Some(Redirect::File(PathBuf::from("absent.txt")));

        let err = Redirections::open(&cmd, &env_in(temp.path())).unwrap_err();
        assert_eq!(err.to_string(), "absent.txt: No such file or directory");
    }

    #[test]
    fn test_output_pipe_is_refused() {
        let temp = tempfile::tempdir().unwrap();
        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stdout = Some(Redirect::Pipe);

        let err = Redirections::open(&cmd, &env_in(temp.path())).unwrap_err();
        assert!(matches!(err, LaunchError::UnsupportedPipe));
    }

    #[test]
    fn test_input_pipe_is_inherited() {
        let temp = tempfile::tempdir().unwrap();
        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stdin = Some(Redirect::Pipe);

        let redirs = Redirections::open(&cmd, &env_in(temp.path())).unwrap();
        assert!(redirs.stdin.is_none());
    }

    #[test]
    fn test_failure_after_input_is_opened() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("in.txt"), "data").unwrap();

        let mut cmd = Command::new("tool", Vec::<String>::new());
        cmd.stdin = Some(Redirect::File(PathBuf::from("in.txt")));
        cmd.stdout = Some(Redirect::File(PathBuf::from("no/such/dir/out.txt")));

        let err = Redirections::open(&cmd, &env_in(temp.path())).unwrap_err();
        assert_eq!(err.to_string(), "no/such/dir/out.txt: No such file or directory");
    }
}
