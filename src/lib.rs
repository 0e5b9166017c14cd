//! Anonymous self-signed TLS identity management.
//!
//! This crate lets a peer-to-peer application present a stable,
//! verifiable-by-fingerprint TLS server identity without a certificate
//! authority. An identity is a 2048-bit RSA key pair plus a self-signed
//! certificate whose subject and issuer are fixed placeholders, persisted
//! under a caller-chosen label in a pluggable credential store.
//!
//! The [`IdentityManager`] implements find-or-create semantics: an existing,
//! unexpired identity under a label is reused; an absent or expired one is
//! regenerated and the store entry replaced. Peers verify the identity by
//! comparing certificate digests exchanged out-of-band, for which the
//! [`digest`] module and the pinning client config in [`tls`] exist.
//!
//! ```no_run
//! use anonid::{IdentityManager, MemoryCredentialStore, DEFAULT_EXPIRATION};
//!
//! # fn main() -> anonid::Result<()> {
//! let manager = IdentityManager::new(MemoryCredentialStore::new());
//! let identity = manager.get_or_create("sync-server", DEFAULT_EXPIRATION, None)?;
//! println!("present this fingerprint out-of-band: {}", identity.fingerprint());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod digest;
pub mod error;
pub mod identity;
pub mod store;
pub mod tls;

pub use digest::{certificate_digest, sha1_fingerprint, sha256_fingerprint, Digest, DigestAlgorithm};
pub use error::{IdentityError, Result};
pub use identity::{CertificateFactory, Identity, IdentityManager, ANONYMOUS_COMMON_NAME, RSA_KEY_BITS};
pub use store::{
    AccessPolicy, CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError,
    StoredCredential,
};

use std::time::Duration;

/// Default certificate lifetime for newly created identities (one year).
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(60 * 60 * 24 * 365);
