//! Credential storage for anonymous identities.
//!
//! A [`CredentialStore`] is a key-value store addressed by caller-chosen
//! labels, holding opaque key and certificate blobs plus an access policy.
//! Two implementations ship with the crate:
//! - [`MemoryCredentialStore`] — ephemeral, concurrent, also the test double
//! - [`FileCredentialStore`] — persistent, one record file per label
//!
//! The store is injected into the identity manager as a constructor
//! dependency, never reached through a global.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// When a stored credential may be read back.
///
/// Absence of a caller-supplied policy resolves to the default
/// ([`AccessPolicy::WhenUnlocked`]) before the store is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    /// Readable regardless of device lock state.
    AlwaysAccessible,
    /// Readable only while the device is unlocked.
    #[default]
    WhenUnlocked,
    /// Readable only while unlocked, and never migrated to another device.
    WhenUnlockedThisDeviceOnly,
}

/// Failures reported by a credential store.
///
/// Underlying causes are surfaced verbatim; the identity layer performs no
/// silent recovery on top of them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure while reading or writing a record.
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record exists but could not be decoded.
    #[error("corrupt credential record for label {label:?}: {reason}")]
    Corrupt {
        /// Label whose record failed to decode.
        label: String,
        /// Decode failure detail.
        reason: String,
    },

    /// A record could not be serialized for storage.
    #[error("credential record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A credential record as persisted by a store.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// Label the record is stored under.
    pub label: String,
    /// DER-encoded X.509 certificate.
    pub certificate_der: Vec<u8>,
    /// PKCS#8 DER-encoded private key.
    pub private_key_der: Vec<u8>,
    /// Policy governing when the record may be read.
    pub access_policy: AccessPolicy,
}

/// Label-keyed storage of private key / certificate pairs.
///
/// `save` replaces an existing entry under the same label atomically: a
/// concurrent `find` observes either the old record or the new one, never a
/// torn write. Uniqueness of labels is enforced here, not by the caller.
pub trait CredentialStore: Send + Sync {
    /// Looks up the credential stored under `label`.
    fn find(&self, label: &str) -> Result<Option<StoredCredential>, StoreError>;

    /// Persists a credential under its label, replacing any existing entry.
    fn save(&self, credential: StoredCredential) -> Result<(), StoreError>;

    /// Removes the credential under `label`. Returns whether an entry was
    /// removed; an absent label is a non-error outcome.
    fn delete(&self, label: &str) -> Result<bool, StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn find(&self, label: &str) -> Result<Option<StoredCredential>, StoreError> {
        (**self).find(label)
    }

    fn save(&self, credential: StoredCredential) -> Result<(), StoreError> {
        (**self).save(credential)
    }

    fn delete(&self, label: &str) -> Result<bool, StoreError> {
        (**self).delete(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_policy_default_is_when_unlocked() {
        assert_eq!(AccessPolicy::default(), AccessPolicy::WhenUnlocked);
    }

    #[test]
    fn access_policy_serializes_to_kebab_case() {
        let rendered = |p: AccessPolicy| serde_json::to_string(&p).unwrap();
        assert_eq!(rendered(AccessPolicy::AlwaysAccessible), "\"always-accessible\"");
        assert_eq!(rendered(AccessPolicy::WhenUnlocked), "\"when-unlocked\"");
        assert_eq!(
            rendered(AccessPolicy::WhenUnlockedThisDeviceOnly),
            "\"when-unlocked-this-device-only\""
        );
    }
}
