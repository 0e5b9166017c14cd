//! Error types for identity operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by identity creation, lookup, and TLS configuration.
///
/// Every failure keeps its originating kind; nothing is retried or recovered
/// internally. Absent credentials are not errors and are modeled as
/// `Option` / `bool` results instead.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// RSA key pair generation failed (entropy or resource exhaustion).
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Self-signing the certificate failed.
    #[error("certificate signing failed: {0}")]
    Signing(String),

    /// The underlying credential store reported a failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Certificate bytes could not be parsed as X.509 DER.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The requested expiration interval was zero.
    #[error("expiration interval must be greater than zero")]
    InvalidExpiration,

    /// A rustls configuration could not be built from the identity.
    #[error("TLS configuration failed: {0}")]
    TlsConfig(String),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
