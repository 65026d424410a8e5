//! CLI error type and exit codes.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

use anyhow::anyhow;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn write_failed(err: &io::Error) -> Self {
        Self::failure(anyhow!("failed to write output: {err}"))
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl Error for CliError {}

/// Render an error and its source chain on one line.
pub(crate) fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("io")).exit_code(), 3);
    }

    #[test]
    fn failure_message_includes_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow!("disk full")).context("writing snapshot");
        let cli = CliError::failure(err.unwrap_err());
        assert_eq!(cli.display_message(), "writing snapshot: disk full");
        assert_eq!(cli.to_string(), "cli error");
    }

    #[test]
    fn describe_joins_sources() {
        let inner = io::Error::other("permission denied");
        let outer = anyhow::Error::new(inner).context("open script");
        assert_eq!(describe(&*outer), "open script: permission denied");
    }
}
