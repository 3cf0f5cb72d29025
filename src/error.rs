//! Error types for the mingle client flow.

/// Top-level error type for the flow engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Identity service error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),
}

/// Locally recoverable input validation errors.
///
/// These never leave the flow — they surface inline as an error signal and
/// the user retries from the same state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your {field}")]
    EmptyField { field: &'static str },

    #[error("That doesn't look like a valid phone number")]
    MalformedPhone { input: String },

    #[error("Verification codes are 6 digits")]
    BadCodeLength { len: usize },

    #[error("Unsupported country: {code}")]
    UnsupportedCountry { code: String },

    #[error("Social platform name cannot be empty")]
    EmptyPlatform,
}

/// Errors from the remote identity service (or its local fallback).
///
/// `Transport` is the only variant the verification client recovers from by
/// substituting the fallback simulation; every other variant is a business
/// rejection and propagates to the caller verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    #[error("That code isn't right — check it and try again")]
    InvalidCode,

    #[error("No account found for that number")]
    AccountNotFound,

    #[error("Phone number has not been verified")]
    PhoneNotVerified,

    #[error("Couldn't create your account: {0}")]
    AccountCreationFailed(String),

    #[error("Too many attempts — wait a moment and try again")]
    RateLimited,

    #[error("Identity service rejected the phone number: {0}")]
    MalformedPhone(String),

    #[error("Identity service unreachable: {0}")]
    Transport(String),
}

impl IdentityError {
    /// Whether this is a transport/availability failure (service unreachable)
    /// as opposed to a business-logic rejection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Store operation failed: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias for the flow engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_the_only_fallback_trigger() {
        assert!(IdentityError::Transport("connection refused".into()).is_transport());
        assert!(!IdentityError::InvalidCode.is_transport());
        assert!(!IdentityError::AccountNotFound.is_transport());
        assert!(!IdentityError::RateLimited.is_transport());
        assert!(!IdentityError::AccountCreationFailed("dup".into()).is_transport());
    }

    #[test]
    fn validation_messages_are_human_readable() {
        let e = ValidationError::EmptyField { field: "name" };
        assert_eq!(e.to_string(), "Please enter your name");

        let e = ValidationError::BadCodeLength { len: 4 };
        assert!(e.to_string().contains("6 digits"));
    }
}
