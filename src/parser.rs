//! Turns one input line into a command chain.
//!
//! The grammar is deliberately small: words separated by blanks, the
//! redirection operators `<`, `>`, `>>`, `2>`, `2>>` and the pipe `|`.
//! There is no quoting, escaping or globbing.

use crate::command::{Command, Redirect};
use std::path::PathBuf;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    /// `<`
    Input,
    /// `>` or `>>`
    Output { append: bool },
    /// `2>` or `2>>`
    Error { append: bool },
    /// `|`
    Pipe,
}

impl Token {
    fn symbol(&self) -> &'static str {
        match self {
            Token::Word(_) => "word",
            Token::Input => "<",
            Token::Output { append: false } => ">",
            Token::Output { append: true } => ">>",
            Token::Error { append: false } => "2>",
            Token::Error { append: true } => "2>>",
            Token::Pipe => "|",
        }
    }
}

/// Errors that can occur while parsing a line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A redirection operator is not followed by a file name.
    #[error("missing file name after '{0}'")]
    MissingTarget(&'static str),
    /// A pipeline stage or a redirection has no command.
    #[error("missing command near '|'")]
    EmptyStage,
    #[error("missing command")]
    EmptyCommand,
}

/// Split a line into tokens.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut word = String::new();
    let mut chars = line.chars().peekable();

    fn flush(word: &mut String, out: &mut Vec<Token>) {
        if !word.is_empty() {
            out.push(Token::Word(std::mem::take(word)));
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => flush(&mut word, &mut out),
            '|' => {
                flush(&mut word, &mut out);
                out.push(Token::Pipe);
            }
            '<' => {
                flush(&mut word, &mut out);
                out.push(Token::Input);
            }
            '>' => {
                let append = chars.next_if_eq(&'>').is_some();
                // A lone "2" right before '>' selects standard error.
                if word == "2" {
                    word.clear();
                    out.push(Token::Error { append });
                } else {
                    flush(&mut word, &mut out);
                    out.push(Token::Output { append });
                }
            }
            c => word.push(c),
        }
    }
    flush(&mut word, &mut out);
    out
}

#[derive(Default)]
struct Stage {
    words: Vec<String>,
    stdin: Option<Redirect>,
    stdout: Option<Redirect>,
    stderr: Option<PathBuf>,
    append_stdout: bool,
    append_stderr: bool,
}

impl Stage {
    fn is_blank(&self) -> bool {
        self.words.is_empty()
            && self.stdin.is_none()
            && self.stdout.is_none()
            && self.stderr.is_none()
    }

    fn finish(self) -> Option<Command> {
        let mut words = self.words.into_iter();
        let mut cmd = Command::new(words.next()?, words);
        cmd.stdin = self.stdin;
        cmd.stdout = self.stdout;
        cmd.stderr = self.stderr;
        cmd.append_stdout = self.append_stdout;
        cmd.append_stderr = self.append_stderr;
        Some(cmd)
    }
}

/// The file name following the redirection operator `op`.
fn redirect_target(
    tokens: &mut impl Iterator<Item = Token>,
    op: &Token,
) -> Result<PathBuf, ParseError> {
    match tokens.next() {
        Some(Token::Word(target)) => Ok(PathBuf::from(target)),
        _ => Err(ParseError::MissingTarget(op.symbol())),
    }
}

/// Parse a line into a command chain.
///
/// Returns `Ok(None)` for a blank line. Stages joined by `|` are linked
/// through [`Command::next`], with the pipe marker set on both sides.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let mut tokens = tokenize(line).into_iter();
    let mut stages = Vec::new();
    let mut stage = Stage::default();

    while let Some(token) = tokens.next() {
        match token {
            Token::Word(w) => stage.words.push(w),
            Token::Pipe => {
                let mut cmd = stage.finish().ok_or(ParseError::EmptyStage)?;
                cmd.stdout = Some(Redirect::Pipe);
                stages.push(cmd);
                stage = Stage {
                    stdin: Some(Redirect::Pipe),
                    ..Stage::default()
                };
            }
            Token::Input => {
                let target = redirect_target(&mut tokens, &Token::Input)?;
                stage.stdin = Some(Redirect::File(target));
            }
            Token::Output { append } => {
                let target = redirect_target(&mut tokens, &Token::Output { append })?;
                stage.stdout = Some(Redirect::File(target));
                stage.append_stdout = append;
            }
            Token::Error { append } => {
                stage.stderr = Some(redirect_target(&mut tokens, &Token::Error { append })?);
                stage.append_stderr = append;
            }
        }
    }

    if stages.is_empty() && stage.is_blank() {
        return Ok(None);
    }
    let last = match stage.finish() {
        Some(cmd) => cmd,
        None if stages.is_empty() => return Err(ParseError::EmptyCommand),
        None => return Err(ParseError::EmptyStage),
    };

    let chain = stages.into_iter().rev().fold(last, |next, mut cmd| {
        cmd.next = Some(Box::new(next));
        cmd
    });
    Ok(Some(chain))
}
