//! Error types for driver operations.
//!
//! A driver call either fails inside the engine (`AtError`) or completes
//! an exchange whose outcome was not the one the operation needs. The
//! second case keeps the command and the outcome so callers can tell an
//! `ERROR` reply from a silent module.

use espat_core::{AtError, Outcome};
use espat_protocol::ExtractOutcome;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while driving the module.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The module answered `command` with the wrong outcome.
    #[error("{command} rejected: {outcome}")]
    Rejected { command: String, outcome: Outcome },

    /// A value could not be extracted from the reply to `command`.
    #[error("{command} returned no value: {outcome:?}")]
    NoValue {
        command: String,
        outcome: ExtractOutcome,
    },

    /// The `AT` probe never answered `OK`.
    #[error("Module not responding after {attempts} attempts")]
    NotResponding { attempts: u32 },

    /// Argument outside the range the module accepts.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Engine or transport failure.
    #[error(transparent)]
    At(#[from] AtError),
}

impl DriverError {
    /// Create a new rejected-command error.
    pub fn rejected(command: impl Into<String>, outcome: Outcome) -> Self {
        Self::Rejected {
            command: command.into(),
            outcome,
        }
    }

    /// Create a new missing-value error.
    pub fn no_value(command: impl Into<String>, outcome: ExtractOutcome) -> Self {
        Self::NoValue {
            command: command.into(),
            outcome,
        }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// True if the module stayed silent, as opposed to answering wrongly.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Rejected { outcome, .. } => outcome.is_timeout(),
            Self::NoValue { outcome, .. } => matches!(outcome, ExtractOutcome::TimedOut(_)),
            Self::NotResponding { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espat_core::Terminator;
    use espat_protocol::ExtractPhase;

    #[test]
    fn test_rejected_display() {
        let error = DriverError::rejected("AT+CWMODE=1", Outcome::Terminator(Terminator::Error));
        assert_eq!(error.to_string(), "AT+CWMODE=1 rejected: ERROR");
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_timeout_classification() {
        assert!(DriverError::rejected("AT", Outcome::TimedOut).is_timeout());
        assert!(
            DriverError::no_value("AT+GMR", ExtractOutcome::TimedOut(ExtractPhase::EndTag))
                .is_timeout()
        );
        assert!(DriverError::NotResponding { attempts: 5 }.is_timeout());
        assert!(!DriverError::invalid_argument("x").is_timeout());
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let error: DriverError = AtError::transport("port gone").into();
        assert_eq!(error.to_string(), "Transport error: port gone");
    }
}
