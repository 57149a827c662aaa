//! Bearer-token authentication gate.
//!
//! The gate is transport-agnostic: it inspects the raw bytes of the
//! `authorization` header, so the HTTP middleware and the gRPC interceptor
//! share one decision.

use subtle::ConstantTimeEq;
use thiserror::Error;

/// Name of the header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Body returned to HTTP clients whose request is rejected.
pub const UNAUTHORIZED_BODY: &str = "Invalid or missing token";

/// Reason a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// No `authorization` header was sent.
    #[error("missing authorization header")]
    MissingHeader,

    /// The header did not match the expected bearer credential.
    #[error("invalid bearer token")]
    InvalidToken,
}

/// Validates inbound credentials against the expected client token.
///
/// # Example
///
/// ```
/// use shared::auth::{AuthGate, AuthRejection};
///
/// let gate = AuthGate::new("s3cret");
/// assert!(gate.check(Some(b"Bearer s3cret")).is_ok());
/// assert_eq!(gate.check(Some(b"bearer s3cret")), Err(AuthRejection::InvalidToken));
/// assert_eq!(gate.check(None), Err(AuthRejection::MissingHeader));
/// ```
#[derive(Clone)]
pub struct AuthGate {
    expected_header: String,
}

impl AuthGate {
    /// Creates a gate that accepts exactly `Bearer <expected_token>`.
    #[must_use]
    pub fn new(expected_token: &str) -> Self {
        Self {
            expected_header: format!("Bearer {expected_token}"),
        }
    }

    /// Checks the raw `authorization` header value, if any.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when the header is absent or does not
    /// exactly equal the expected bearer credential. Equal-length values are
    /// compared in constant time.
    pub fn check(&self, header: Option<&[u8]>) -> Result<(), AuthRejection> {
        let Some(value) = header else {
            return Err(AuthRejection::MissingHeader);
        };

        let expected = self.expected_header.as_bytes();
        if value.len() == expected.len() && bool::from(value.ct_eq(expected)) {
            Ok(())
        } else {
            Err(AuthRejection::InvalidToken)
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}
