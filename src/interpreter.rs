use crate::command::{Command, CommandFactory, ExitCode};
use crate::dump::dump_chain;
use crate::env::Environment;
use crate::expand::expand;
use crate::launch::{LaunchError, LaunchFailure};
use crate::parser::parse_line;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried, in order, for the head of every chain it dispatches. See
/// [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use minishell::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run_line("echo hello world");
/// assert_eq!(code, Some(0));
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    debug: bool,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env,
            commands,
            debug: false,
        }
    }

    /// Create an interpreter with the default commands over `env`.
    pub fn with_env(env: Environment) -> Self {
        Self::new(env, default_commands())
    }

    /// When enabled, every parsed chain is dumped before it is executed.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Execute a parsed chain, writing the interpreter's own output to stdout.
    pub fn dispatch(&mut self, chain: Command) -> ExitCode {
        self.dispatch_to(chain, &mut io::stdout())
    }

    /// Execute the head of `chain`.
    ///
    /// Later stages are never run: a head whose output goes to a pipe is
    /// refused when it is launched. Failures are reported and turned into a
    /// non-zero exit code; they never propagate to the caller.
    pub fn dispatch_to(&mut self, chain: Command, stdout: &mut dyn Write) -> ExitCode {
        if chain.next.is_some() {
            tracing::debug!(
                stages = chain.stages().count(),
                "only the first stage of a pipeline is executed"
            );
        }

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, &chain) {
                tracing::debug!(command = chain.name(), "dispatching");
                return match cmd.execute(stdout, &mut self.env) {
                    Ok(code) => code,
                    Err(err) => {
                        eprintln!("{}: {err:#}", chain.name());
                        1
                    }
                };
            }
        }

        let failure = LaunchFailure::from(LaunchError::NotFound {
            name: chain.name().to_owned(),
        });
        let code = failure.error.exit_code();
        if let Err(err) = failure.report(stdout) {
            tracing::warn!(error = %err, "failed to report missing command");
        }
        code
    }

    /// Expand, parse and execute one input line.
    ///
    /// Returns `None` when there was nothing to execute: a blank line or a
    /// syntax error, which is reported on standard error.
    pub fn run_line(&mut self, line: &str) -> Option<ExitCode> {
        self.run_line_to(line, &mut io::stdout())
    }

    pub fn run_line_to(&mut self, line: &str, stdout: &mut dyn Write) -> Option<ExitCode> {
        let expanded = expand(line, &self.env);
        let chain = match parse_line(&expanded) {
            Ok(Some(chain)) => chain,
            Ok(None) => return None,
            Err(err) => {
                eprintln!("syntax error: {err}");
                return None;
            }
        };

        if self.debug {
            if let Err(err) = dump_chain(&chain, stdout) {
                tracing::warn!(error = %err, "failed to dump command chain");
            }
        }
        Some(self.dispatch_to(chain, stdout))
    }

    /// Read-Eval-Print Loop: runs lines until end of input.
    ///
    /// The prompt is the value of `PS1`, or nothing when it is unset.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = self.env.get_var("PS1").unwrap_or_default().to_owned();
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.run_line(&line);
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::launch::ExternalCommand;
    vec![
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter over the process environment with the default commands:
    /// - built-ins: `echo`, `cd`
    /// - external command launcher
    fn default() -> Self {
        Self::with_env(Environment::new())
    }
}
