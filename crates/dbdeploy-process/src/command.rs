use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ProcessError, Result};

const MASK: &str = "********";

// ─── CommandLine ──────────────────────────────────────────────────────────

/// An executable plus the argument string it is invoked with.
///
/// The argument string is kept exactly as built so callers can assert on it;
/// it is only split into argv at spawn time (see [`split_args`]). Values
/// registered with [`CommandLine::mask`] are replaced in the `Display` and
/// `Debug` renderings, which is what ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: String,
    masked: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>, args: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
            masked: Vec::new(),
        }
    }

    /// Hide `secret` wherever it appears in the rendered command line.
    pub fn mask(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.masked.push(secret);
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    /// Split the argument string into the argv handed to the child process.
    pub fn argv(&self) -> Result<Vec<String>> {
        split_args(&self.args).ok_or_else(|| ProcessError::UnbalancedQuote {
            program: self.program.display().to_string(),
        })
    }

    /// The argument string with every masked value replaced.
    pub fn redacted_args(&self) -> String {
        self.masked
            .iter()
            .fold(self.args.clone(), |acc, secret| acc.replace(secret.as_str(), MASK))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        if !self.args.is_empty() {
            write!(f, " {}", self.redacted_args())?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLine")
            .field("program", &self.program)
            .field("args", &self.redacted_args())
            .finish()
    }
}

// ─── Argument splitting ───────────────────────────────────────────────────

/// Split a command-line string into individual arguments.
///
/// Whitespace outside double quotes separates arguments. Double quotes group
/// and are removed, including when they start mid-token
/// (`/SourceFile:"a b"` → `/SourceFile:a b`). Inside quotes a backslash
/// escapes a following `"`; any other escaped character keeps its backslash.
/// An explicitly quoted empty string (`""`) yields an empty argument.
///
/// Returns `None` when a quote is left open.
pub fn split_args(line: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut arg = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut escaped = false;

    for c in line.chars() {
        if c == '"' {
            if escaped {
                push_char(&mut arg, &mut escaped, c);
            } else {
                in_quotes = !in_quotes;
                quoted = true;
            }
            continue;
        }

        if c == '\\' && escaped {
            push_char(&mut arg, &mut escaped, c);
            continue;
        }

        if c == '\\' && in_quotes {
            escaped = true;
            continue;
        }

        if c.is_whitespace() && !in_quotes {
            if !arg.is_empty() || quoted {
                args.push(std::mem::take(&mut arg));
            }
            quoted = false;
            continue;
        }

        push_char(&mut arg, &mut escaped, c);
    }

    if in_quotes {
        return None;
    }
    if !arg.is_empty() || quoted {
        args.push(arg);
    }
    Some(args)
}

fn push_char(arg: &mut String, escaped: &mut bool, c: char) {
    if *escaped && c != '"' {
        arg.push('\\');
    }
    arg.push(c);
    *escaped = false;
}
