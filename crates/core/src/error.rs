//! Authentication/authorization error model.

use thiserror::Error;

/// Result type used across the authorization layers.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure while turning a credential into a queryable user.
///
/// None of these are retried internally; retry (if any) belongs to the caller
/// or a cache layer in front of the parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The header does not have the `Bearer <token>` shape.
    #[error("authorization header format must be Bearer {{token}}")]
    MalformedCredentialFormat,

    /// The token was decoded but rejected (signature, expiry, algorithm...).
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The full-token fetch collaborator failed.
    #[error("token exchange failed: {0}")]
    TokenExchangeFailure(String),

    /// A required field inside a claim is missing or has the wrong shape.
    #[error("malformed claim at {path}: {reason}")]
    MalformedClaimShape { path: String, reason: String },

    /// Static configuration is unusable (e.g. an unparsable public key).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    pub fn token_exchange(msg: impl Into<String>) -> Self {
        Self::TokenExchangeFailure(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// One malformed element found while reading a claim structure.
///
/// Lenient readers skip the element and keep the issue for diagnostics;
/// strict readers turn the first one into [`AuthError::MalformedClaimShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimShapeIssue {
    /// Location of the element, e.g. `groups[0].g[2].c`.
    pub path: String,
    pub reason: String,
}

impl ClaimShapeIssue {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl core::fmt::Display for ClaimShapeIssue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl From<ClaimShapeIssue> for AuthError {
    fn from(issue: ClaimShapeIssue) -> Self {
        Self::MalformedClaimShape {
            path: issue.path,
            reason: issue.reason,
        }
    }
}
