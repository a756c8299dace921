//! Generative backend error types

use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Configuration, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    pub fn class(&self) -> FailureClass {
        self.kind.class()
    }
}

/// Raw error classification, mapped from transport detail at the client edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// No credential configured; no request was sent
    Configuration,
    /// Bad request (400)
    InvalidRequest,
    /// Authentication failed (401, 403)
    Auth,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Connection failures, timeouts, unreadable bodies
    Network,
    /// 2xx response without a usable candidate
    MalformedResponse,
    /// Anything else
    Unknown,
}

/// What the generation pipeline does about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Request-format problem: retry once with a minimal prompt
    Retryable,
    /// Credential rejected: go straight to the static fallback
    Unauthorized,
    /// Everything else: go straight to the static fallback
    Fatal,
}

impl LlmErrorKind {
    pub fn class(self) -> FailureClass {
        match self {
            Self::InvalidRequest => FailureClass::Retryable,
            Self::Auth => FailureClass::Unauthorized,
            Self::Configuration
            | Self::RateLimit
            | Self::ServerError
            | Self::Network
            | Self::MalformedResponse
            | Self::Unknown => FailureClass::Fatal,
        }
    }

    pub fn is_retryable(self) -> bool {
        self.class() == FailureClass::Retryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_request_format_errors_are_retryable() {
        assert_eq!(LlmErrorKind::InvalidRequest.class(), FailureClass::Retryable);
        assert_eq!(LlmErrorKind::Auth.class(), FailureClass::Unauthorized);
        for kind in [
            LlmErrorKind::Configuration,
            LlmErrorKind::RateLimit,
            LlmErrorKind::ServerError,
            LlmErrorKind::Network,
            LlmErrorKind::MalformedResponse,
            LlmErrorKind::Unknown,
        ] {
            assert_eq!(kind.class(), FailureClass::Fatal, "{kind:?}");
            assert!(!kind.is_retryable());
        }
    }
}
