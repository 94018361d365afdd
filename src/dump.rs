//! Human-readable listing of a parsed chain, printed in debug mode.

use crate::command::{Command, Redirect};
use std::io::{self, Write};

/// Write every stage of `chain` to `out`, followed by a blank line.
///
/// Pipes are numbered from 1; a stage's output pipe and the following
/// stage's input pipe carry the same number.
pub fn dump_chain(chain: &Command, out: &mut dyn Write) -> io::Result<()> {
    let mut pipe = 1;
    for cmd in chain.stages() {
        writeln!(out, "Command name: '{}'", cmd.name())?;
        for (i, arg) in cmd.args().iter().enumerate() {
            writeln!(out, "    argv[{i}]: '{arg}'")?;
        }

        match &cmd.stdin {
            None => writeln!(out, "  stdin:  UNDIRECTED")?,
            Some(Redirect::Pipe) => {
                writeln!(out, "  stdin:  PIPE{pipe}")?;
                pipe += 1;
            }
            Some(Redirect::File(path)) => writeln!(out, "  stdin:  '{}'", path.display())?,
        }

        match &cmd.stdout {
            None => write!(out, "  stdout: UNDIRECTED")?,
            Some(Redirect::Pipe) => write!(out, "  stdout: PIPE{pipe}")?,
            Some(Redirect::File(path)) => write!(out, "  stdout: '{}'", path.display())?,
        }
        writeln!(out, "{}", append_suffix(cmd.append_stdout))?;

        match &cmd.stderr {
            None => write!(out, "  stderr: UNDIRECTED")?,
            Some(path) => write!(out, "  stderr: '{}'", path.display())?,
        }
        writeln!(out, "{}", append_suffix(cmd.append_stderr))?;
    }
    writeln!(out)
}

fn append_suffix(append: bool) -> &'static str {
    if append { " (append)" } else { "" }
}
