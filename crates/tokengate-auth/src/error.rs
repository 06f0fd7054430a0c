//! Authentication error types.
//!
//! Every failure the login, token and policy layers can produce is a
//! variant of [`AuthError`]. Protocol errors (bad tokens, CSRF failures,
//! missing request fields) are client errors; storage, signing and
//! configuration problems are server errors and never leak detail to the
//! caller (see `middleware::error`).

use std::fmt;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token failed signature, expiry or revocation checks.
    #[error("Token invalid")]
    TokenInvalid,

    /// The credential could not be parsed as a token.
    #[error("Token malformed")]
    TokenMalformed,

    /// The login callback arrived without a `state` cookie.
    #[error("Cookie missing: no state cookie in request")]
    NoStateCookie,

    /// The `state` cookie does not match the callback's state parameter.
    #[error("Invalid cookie: state cookie doesn't match the query parameter")]
    InvalidStateCookie,

    /// The requested identity provider is not registered.
    #[error("Unknown auth provider: {provider}")]
    UnknownProvider {
        /// Name used in the request path.
        provider: String,
    },

    /// The identity provider rejected or failed the code exchange.
    #[error("Identity provider exchange failed: {provider} - {message}")]
    ExchangeFailed {
        /// The identity provider name.
        provider: String,
        /// Description of the upstream failure.
        message: String,
    },

    /// The callback carried no authorization code.
    #[error("Authorization code not found")]
    MissingCode,

    /// The `return_to` cookie is absent or empty.
    #[error("No return_to cookie found")]
    MissingReturnTo,

    /// The request is missing a required field or is otherwise unusable.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description of what is wrong with the request.
        message: String,
    },

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The caller is authenticated but not allowed to access the resource.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The session store failed or timed out.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The service configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred (signing, key handling).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `UnknownProvider` error.
    #[must_use]
    pub fn unknown_provider(provider: impl Into<String>) -> Self {
        Self::UnknownProvider {
            provider: provider.into(),
        }
    }

    /// Creates a new `ExchangeFailed` error.
    #[must_use]
    pub fn exchange_failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExchangeFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a new `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::TokenInvalid
                | Self::TokenMalformed
                | Self::NoStateCookie
                | Self::InvalidStateCookie
                | Self::UnknownProvider { .. }
                | Self::MissingCode
                | Self::MissingReturnTo
                | Self::BadRequest { .. }
                | Self::Unauthorized { .. }
                | Self::Forbidden { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ExchangeFailed { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is a token-related error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(self, Self::TokenInvalid | Self::TokenMalformed)
    }

    /// Returns `true` if this is a CSRF state check failure.
    #[must_use]
    pub fn is_csrf_error(&self) -> bool {
        matches!(self, Self::NoStateCookie | Self::InvalidStateCookie)
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TokenInvalid | Self::TokenMalformed => ErrorCategory::Token,
            Self::NoStateCookie | Self::InvalidStateCookie => ErrorCategory::Csrf,
            Self::UnknownProvider { .. }
            | Self::MissingCode
            | Self::MissingReturnTo
            | Self::BadRequest { .. } => ErrorCategory::Validation,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::ExchangeFailed { .. } => ErrorCategory::Federation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the short machine-readable code sent to clients.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TokenInvalid | Self::TokenMalformed => "invalid_token",
            Self::NoStateCookie | Self::InvalidStateCookie => "invalid_state",
            Self::UnknownProvider { .. } => "unknown_provider",
            Self::MissingCode
            | Self::MissingReturnTo
            | Self::BadRequest { .. } => "invalid_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "access_denied",
            Self::ExchangeFailed { .. } => "exchange_failed",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }
}

/// Categories of authentication errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or rejected credentials.
    Authentication,
    /// Policy denials.
    Authorization,
    /// Token validation errors.
    Token,
    /// Anti-CSRF state failures.
    Csrf,
    /// Request validation errors.
    Validation,
    /// Upstream identity provider errors.
    Federation,
    /// Storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Csrf => write!(f, "csrf"),
            Self::Validation => write!(f, "validation"),
            Self::Federation => write!(f, "federation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
