//! Identity lifecycle: find-or-create, lookup, and deletion.
//!
//! The [`IdentityManager`] is the entry point. It probes the injected
//! [`CredentialStore`] for an existing identity under a label, checks the
//! certificate's expiry, and falls through to generation plus save when the
//! identity is absent or expired. Concurrent callers on the same label may
//! both generate; the store's atomic replace makes the last save win without
//! torn reads. Callers needing single-writer semantics serialize
//! `get_or_create` per label themselves.

pub mod factory;

pub use factory::{CertificateFactory, ANONYMOUS_COMMON_NAME, RSA_KEY_BITS};

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tracing::{debug, info};
use x509_parser::prelude::*;

use crate::digest::{self, Digest, DigestAlgorithm};
use crate::error::{IdentityError, Result};
use crate::store::{AccessPolicy, CredentialStore, StoredCredential};

/// A private key paired with its self-signed certificate, usable directly by
/// a TLS layer.
///
/// Owned by the caller once returned; the credential store retains its own
/// persisted copy independently. Immutable after creation — renewal is
/// delete-then-recreate.
pub struct Identity {
    label: String,
    certificate: CertificateDer<'static>,
    private_key: PrivateKeyDer<'static>,
    not_before: SystemTime,
    not_after: SystemTime,
}

impl Identity {
    /// Builds an identity from DER material, parsing the certificate's
    /// validity window.
    ///
    /// Fails with [`IdentityError::InvalidCertificate`] when the certificate
    /// bytes do not parse; a malformed stored credential surfaces here rather
    /// than being silently regenerated.
    pub fn from_parts(
        label: String,
        certificate: CertificateDer<'static>,
        private_key: PrivateKeyDer<'static>,
    ) -> Result<Self> {
        let (_, parsed) = X509Certificate::from_der(certificate.as_ref())
            .map_err(|e| IdentityError::InvalidCertificate(e.to_string()))?;
        let validity = parsed.validity();
        let not_before = systemtime_from_unix(validity.not_before.timestamp());
        let not_after = systemtime_from_unix(validity.not_after.timestamp());

        Ok(Self {
            label,
            certificate,
            private_key,
            not_before,
            not_after,
        })
    }

    fn from_stored(credential: StoredCredential) -> Result<Self> {
        let StoredCredential {
            label,
            certificate_der,
            private_key_der,
            ..
        } = credential;
        Self::from_parts(
            label,
            CertificateDer::from(certificate_der),
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(private_key_der)),
        )
    }

    /// Label this identity is stored under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// DER-encoded certificate.
    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// PKCS#8 DER-encoded private key.
    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.private_key
    }

    /// Start of the certificate's validity window.
    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    /// End of the certificate's validity window.
    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Whether the certificate is expired at `now`.
    ///
    /// The boundary itself counts as expired: a certificate whose `notAfter`
    /// equals `now` is not returned by the manager.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.not_after
    }

    /// Whether the certificate is expired at the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// SHA-256 fingerprint of the certificate as lowercase hex.
    pub fn fingerprint(&self) -> String {
        hex::encode(digest::sha256_fingerprint(self.certificate.as_ref()))
    }

    /// Fingerprint of the certificate under the given algorithm.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Digest {
        digest::certificate_digest(self.certificate.as_ref(), algorithm)
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            certificate: self.certificate.clone(),
            private_key: self.private_key.clone_key(),
            not_before: self.not_before,
            not_after: self.not_after,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of debug output.
        f.debug_struct("Identity")
            .field("label", &self.label)
            .field("fingerprint", &self.fingerprint())
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish()
    }
}

fn systemtime_from_unix(timestamp: i64) -> SystemTime {
    if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(timestamp.unsigned_abs())
    }
}

/// Orchestrates find-or-create semantics over an injected credential store.
pub struct IdentityManager<S> {
    store: S,
    factory: CertificateFactory,
    renewal_margin: Duration,
}

impl<S: CredentialStore> IdentityManager<S> {
    /// Creates a manager over `store` with the exact-boundary expiry check
    /// (no renewal margin).
    pub fn new(store: S) -> Self {
        Self {
            store,
            factory: CertificateFactory::new(),
            renewal_margin: Duration::ZERO,
        }
    }

    /// Opts into early renewal: a stored identity with less than `margin`
    /// of validity remaining is treated as expired and regenerated.
    pub fn with_renewal_margin(mut self, margin: Duration) -> Self {
        self.renewal_margin = margin;
        self
    }

    /// The injected credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the identity stored under `label`, creating one when none
    /// exists or the stored certificate is expired.
    ///
    /// A new certificate is valid over `[now, now + expiration_interval]`.
    /// `access_policy` of `None` resolves to [`AccessPolicy::WhenUnlocked`].
    /// An expired certificate is never returned; a stale store entry is
    /// overwritten by the replacement. Errors from the factory or the store
    /// propagate with their kind preserved and are not retried here.
    pub fn get_or_create(
        &self,
        label: &str,
        expiration_interval: Duration,
        access_policy: Option<AccessPolicy>,
    ) -> Result<Identity> {
        if expiration_interval.is_zero() {
            return Err(IdentityError::InvalidExpiration);
        }

        if let Some(stored) = self.store.find(label)? {
            let identity = Identity::from_stored(stored)?;
            let cutoff = SystemTime::now() + self.renewal_margin;
            if !identity.is_expired_at(cutoff) {
                debug!("Reusing stored identity for label: {}", label);
                return Ok(identity);
            }
            info!("Stored identity for label {} has expired, regenerating", label);
        }

        let now = SystemTime::now();
        let (private_key, certificate) = self.factory.generate(now, now + expiration_interval)?;
        let identity = Identity::from_parts(label.to_string(), certificate, private_key)?;

        self.store.save(StoredCredential {
            label: label.to_string(),
            certificate_der: identity.certificate().as_ref().to_vec(),
            private_key_der: identity.private_key().secret_der().to_vec(),
            access_policy: access_policy.unwrap_or_default(),
        })?;

        info!(
            "Created identity for label {} (fingerprint {})",
            label,
            identity.fingerprint()
        );
        Ok(identity)
    }

    /// Pure lookup: returns the stored identity without any expiration check
    /// and without triggering creation.
    ///
    /// The result may be expired; callers use this to inspect an existing
    /// identity, e.g. for explicit renewal logic.
    pub fn find(&self, label: &str) -> Result<Option<Identity>> {
        match self.store.find(label)? {
            Some(stored) => Ok(Some(Identity::from_stored(stored)?)),
            None => Ok(None),
        }
    }

    /// Removes the stored credential under `label`.
    ///
    /// Returns whether something was removed; an absent label is a non-error
    /// outcome.
    pub fn delete(&self, label: &str) -> Result<bool> {
        let removed = self.store.delete(label)?;
        if removed {
            info!("Deleted identity for label: {}", label);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    const ONE_HOUR: Duration = Duration::from_secs(3600);

    fn manager() -> IdentityManager<MemoryCredentialStore> {
        IdentityManager::new(MemoryCredentialStore::new())
    }

    /// Seeds the manager's store with an identity covering the given window.
    fn seed_with_window(
        manager: &IdentityManager<MemoryCredentialStore>,
        label: &str,
        not_before: SystemTime,
        not_after: SystemTime,
    ) -> Identity {
        let (key, cert) = CertificateFactory::new()
            .generate(not_before, not_after)
            .unwrap();
        let identity = Identity::from_parts(label.to_string(), cert, key).unwrap();
        manager
            .store()
            .save(StoredCredential {
                label: label.to_string(),
                certificate_der: identity.certificate().as_ref().to_vec(),
                private_key_der: identity.private_key().secret_der().to_vec(),
                access_policy: AccessPolicy::WhenUnlocked,
            })
            .unwrap();
        identity
    }

    #[test]
    fn creates_identity_when_absent() {
        let manager = manager();
        let identity = manager.get_or_create("server", ONE_HOUR, None).unwrap();
        assert_eq!(identity.label(), "server");
        assert!(!identity.is_expired());
    }

    #[test]
    fn second_call_returns_stored_identity() {
        let manager = manager();
        let first = manager.get_or_create("server", ONE_HOUR, None).unwrap();
        let second = manager.get_or_create("server", ONE_HOUR, None).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(
            first.certificate().as_ref(),
            second.certificate().as_ref()
        );
    }

    #[test]
    fn expired_identity_is_replaced() {
        let manager = manager();
        let now = SystemTime::now();
        let expired = seed_with_window(
            &manager,
            "server",
            now - Duration::from_secs(7200),
            now - Duration::from_secs(3600),
        );

        let fresh = manager.get_or_create("server", ONE_HOUR, None).unwrap();
        assert_ne!(fresh.fingerprint(), expired.fingerprint());
        assert!(!fresh.is_expired());
        assert!(fresh.not_after() > now);
    }

    #[test]
    fn find_skips_expiration_check() {
        let manager = manager();
        let now = SystemTime::now();
        let expired = seed_with_window(
            &manager,
            "server",
            now - Duration::from_secs(7200),
            now - Duration::from_secs(3600),
        );

        let found = manager.find("server").unwrap().unwrap();
        assert_eq!(found.fingerprint(), expired.fingerprint());
        assert!(found.is_expired());
    }

    #[test]
    fn find_absent_label_is_none() {
        assert!(manager().find("absent").unwrap().is_none());
    }

    #[test]
    fn delete_reports_removal() {
        let manager = manager();
        manager.get_or_create("server", ONE_HOUR, None).unwrap();

        assert!(manager.delete("server").unwrap());
        assert!(!manager.delete("server").unwrap());
        assert!(manager.find("server").unwrap().is_none());
    }

    #[test]
    fn zero_expiration_interval_is_rejected() {
        let err = manager()
            .get_or_create("server", Duration::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidExpiration));
    }

    #[test]
    fn renewal_margin_triggers_early_regeneration() {
        let manager = manager().with_renewal_margin(Duration::from_secs(7 * 86_400));
        let now = SystemTime::now();
        // Valid for one more hour, which is inside the seven-day margin.
        let near_expiry = seed_with_window(&manager, "server", now - ONE_HOUR, now + ONE_HOUR);

        let fresh = manager
            .get_or_create("server", Duration::from_secs(30 * 86_400), None)
            .unwrap();
        assert_ne!(fresh.fingerprint(), near_expiry.fingerprint());
    }

    #[test]
    fn zero_margin_returns_near_expiry_identity() {
        let manager = manager();
        let now = SystemTime::now();
        let near_expiry = seed_with_window(&manager, "server", now - ONE_HOUR, now + ONE_HOUR);

        let reused = manager.get_or_create("server", ONE_HOUR, None).unwrap();
        assert_eq!(reused.fingerprint(), near_expiry.fingerprint());
    }

    #[test]
    fn corrupt_stored_credential_is_an_error_not_a_regeneration() {
        let manager = manager();
        manager
            .store()
            .save(StoredCredential {
                label: "server".to_string(),
                certificate_der: vec![0xde, 0xad, 0xbe, 0xef],
                private_key_der: vec![0x30],
                access_policy: AccessPolicy::WhenUnlocked,
            })
            .unwrap();

        let err = manager.get_or_create("server", ONE_HOUR, None).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCertificate(_)));
    }

    #[test]
    fn access_policy_default_is_applied_on_save() {
        let manager = manager();
        manager.get_or_create("server", ONE_HOUR, None).unwrap();
        let stored = manager.store().find("server").unwrap().unwrap();
        assert_eq!(stored.access_policy, AccessPolicy::WhenUnlocked);

        manager.delete("server").unwrap();
        manager
            .get_or_create("server", ONE_HOUR, Some(AccessPolicy::AlwaysAccessible))
            .unwrap();
        let stored = manager.store().find("server").unwrap().unwrap();
        assert_eq!(stored.access_policy, AccessPolicy::AlwaysAccessible);
    }
}
