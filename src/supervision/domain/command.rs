//! Executable and argument value object for supervised services.

use super::SupervisionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Executable path plus argument list for one service process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCommand {
    executable: String,
    args: Vec<String>,
}

impl ServiceCommand {
    /// Creates a command with no arguments.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisionDomainError::EmptyExecutable`] when `executable`
    /// is empty after trimming.
    pub fn new(executable: impl Into<String>) -> Result<Self, SupervisionDomainError> {
        let normalized = executable.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(SupervisionDomainError::EmptyExecutable);
        }

        Ok(Self {
            executable: normalized,
            args: Vec::new(),
        })
    }

    /// Replaces the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = values.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the executable path.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Returns the argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Renders the command as a POSIX shell command line.
    ///
    /// Words made only of shell-safe characters are left bare; everything
    /// else is quoted with [`shell_escape`].
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_if_needed)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ServiceCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.command_line())
    }
}

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Uses single-quote wrapping and the standard `'\''` sequence for embedded
/// quotes.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

fn quote_if_needed(word: &str) -> String {
    let is_plain = !word.is_empty()
        && word.chars().all(|character| {
            character.is_ascii_alphanumeric()
                || matches!(character, '-' | '_' | '.' | '/' | ':' | '=' | ',' | '+' | '@')
        });
    if is_plain {
        word.to_owned()
    } else {
        shell_escape(word)
    }
}
