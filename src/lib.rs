//! A minimal command interpreter.
//!
//! A line of input is expanded (`$NAME` and `${NAME}` references are replaced
//! with environment values), parsed into a chain of [`command::Command`]s, and
//! the head of the chain is executed: either as a built-in running inside the
//! interpreter (`echo`, `cd`) or as a child process located through `PATH`,
//! with its standard streams optionally redirected to files.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the data
//! model, the runtime [`env::Environment`] and the individual stages, which can
//! be used on their own.

mod builtin;
pub mod command;
pub mod dump;
pub mod env;
pub mod expand;
mod interpreter;
pub mod launch;
pub mod parser;
pub mod redirect;
pub mod resolve;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
