//! In-memory credential store.

use dashmap::DashMap;

use super::{CredentialStore, StoreError, StoredCredential};

/// Concurrent in-memory credential store.
///
/// Entries live for the lifetime of the process. Map insert/remove operations
/// are atomic per label, which satisfies the store replace contract.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: DashMap<String, StoredCredential>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no credentials.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find(&self, label: &str) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self.records.get(label).map(|r| r.value().clone()))
    }

    fn save(&self, credential: StoredCredential) -> Result<(), StoreError> {
        self.records.insert(credential.label.clone(), credential);
        Ok(())
    }

    fn delete(&self, label: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(label).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AccessPolicy;

    fn credential(label: &str) -> StoredCredential {
        StoredCredential {
            label: label.to_string(),
            certificate_der: vec![0x30, 0x82, 0x01, 0x0a],
            private_key_der: vec![0x30, 0x81, 0x02],
            access_policy: AccessPolicy::WhenUnlocked,
        }
    }

    #[test]
    fn save_then_find_returns_record() {
        let store = MemoryCredentialStore::new();
        store.save(credential("sync-server")).unwrap();

        let found = store.find("sync-server").unwrap().unwrap();
        assert_eq!(found.label, "sync-server");
        assert_eq!(found.certificate_der, vec![0x30, 0x82, 0x01, 0x0a]);
    }

    #[test]
    fn find_missing_label_is_none() {
        let store = MemoryCredentialStore::new();
        assert!(store.find("absent").unwrap().is_none());
    }

    #[test]
    fn save_replaces_existing_entry() {
        let store = MemoryCredentialStore::new();
        store.save(credential("sync-server")).unwrap();

        let mut replacement = credential("sync-server");
        replacement.certificate_der = vec![0xde, 0xad];
        store.save(replacement).unwrap();

        let found = store.find("sync-server").unwrap().unwrap();
        assert_eq!(found.certificate_der, vec![0xde, 0xad]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_distinguishes_removed_from_absent() {
        let store = MemoryCredentialStore::new();
        store.save(credential("sync-server")).unwrap();

        assert!(store.delete("sync-server").unwrap());
        assert!(!store.delete("sync-server").unwrap());
        assert!(store.find("sync-server").unwrap().is_none());
    }
}
