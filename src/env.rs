use std::collections::HashMap;
use std::env as stdenv;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Mutable view of the process state the interpreter depends on.
///
/// The environment owns:
/// - the variables visible to expansion and to launched children;
/// - the working directory used for `cd`, redirection targets and children.
///
/// An *attached* environment mirrors working-directory changes onto the real
/// process. A *detached* one keeps everything in memory, which lets the core
/// run in isolation.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    current_dir: PathBuf,
    attached: bool,
}

impl Environment {
    /// Capture the current process state into a new attached `Environment`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            attached: true,
        }
    }

    /// Build an environment that never touches process-global state.
    pub fn detached<I, K, V>(vars: I, current_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            current_dir: current_dir.into(),
            attached: false,
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Interpret `path` relative to the current working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }

    /// Change the working directory, returning the new canonical location.
    ///
    /// On failure nothing changes.
    pub fn change_dir(&mut self, path: impl AsRef<Path>) -> io::Result<PathBuf> {
        let target = fs::canonicalize(self.resolve_path(path))?;
        if !target.is_dir() {
            return Err(io::Error::from(io::ErrorKind::NotADirectory));
        }
        if self.attached {
            stdenv::set_current_dir(&target)?;
        }
        self.current_dir = target.clone();
        Ok(target)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
