pub mod headless;
pub mod interactive;
pub mod obs;

use hybrid_domain::errors::{CoreError, ErrorKind};
use std::fmt;
use std::time::Instant;

/// Failure of a command, carrying the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub message: String,
    pub exit_code: i32,
}

impl CommandError {
    pub fn new(message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::new(message, 1)
    }
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        match err.kind() {
            ErrorKind::InsufficientData => {
                Self::new(format!("{err}; try again later"), 2)
            }
            _ => Self::new(err.to_string(), 1),
        }
    }
}

/// `status` label for command metrics: `ok`, `unavailable` (exit code 2) or `failed`.
pub fn outcome_label<T>(result: &Result<T, CommandError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(err) if err.exit_code == 2 => "unavailable",
        Err(_) => "failed",
    }
}

pub fn record_command<T>(
    command: &'static str,
    started: Instant,
    result: &Result<T, CommandError>,
) {
    let status = outcome_label(result);
    metrics::counter!("hybrid.cli.commands_total", "command" => command, "status" => status)
        .increment(1);
    metrics::histogram!("hybrid.cli.command_ms", "command" => command)
        .record(started.elapsed().as_millis() as f64);
}

#[cfg(test)]
mod tests {
    use super::{outcome_label, CommandError};
    use hybrid_domain::errors::CoreError;

    #[test]
    fn insufficient_data_exits_with_two() {
        let err: CommandError = CoreError::insufficient("rankable instruments", 4, 1).into();
        assert_eq!(err.exit_code, 2);
        assert!(err.message.ends_with("try again later"));

        let err: CommandError = CoreError::invalid("amount").into();
        assert_eq!(err.exit_code, 1);
    }

    #[test]
    fn outcome_label_follows_exit_code() {
        assert_eq!(outcome_label::<()>(&Ok(())), "ok");
        let short: Result<(), CommandError> =
            Err(CoreError::insufficient("universe price table", 4, 0).into());
        assert_eq!(outcome_label(&short), "unavailable");
        let strict: Result<(), CommandError> =
            Err(CommandError::new("strict validation failed: price files", 2));
        assert_eq!(outcome_label(&strict), "unavailable");
        let bad: Result<(), CommandError> = Err("unknown asset DOGE".to_string().into());
        assert_eq!(outcome_label(&bad), "failed");
    }
}
