//! File-backed credential store.
//!
//! One JSON record per label under a root directory. Records are addressed by
//! the SHA-256 of the label, so arbitrary label strings never influence the
//! on-disk path. Key material is written with 0600 permissions on Unix, and
//! replacement goes through a temp file plus rename so a concurrent reader
//! never observes a half-written record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tracing::{debug, info};

use super::{AccessPolicy, CredentialStore, StoreError, StoredCredential};

/// On-disk record layout: DER blobs as base64 strings plus the access policy.
#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    label: String,
    certificate: String,
    private_key: String,
    access_policy: AccessPolicy,
}

/// Persistent credential store rooted at a directory.
#[derive(Debug)]
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    /// Opens a store at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory holding the record files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, label: &str) -> PathBuf {
        let name = hex::encode(Sha256::digest(label.as_bytes()));
        self.root.join(format!("{name}.json"))
    }
}

impl CredentialStore for FileCredentialStore {
    fn find(&self, label: &str) -> Result<Option<StoredCredential>, StoreError> {
        let path = self.record_path(label);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let corrupt = |reason: String| StoreError::Corrupt {
            label: label.to_string(),
            reason,
        };

        let record: CredentialRecord =
            serde_json::from_slice(&raw).map_err(|e| corrupt(e.to_string()))?;
        if record.label != label {
            return Err(corrupt(format!(
                "record belongs to label {:?}",
                record.label
            )));
        }
        let certificate_der = BASE64_STANDARD
            .decode(&record.certificate)
            .map_err(|e| corrupt(format!("certificate: {e}")))?;
        let private_key_der = BASE64_STANDARD
            .decode(&record.private_key)
            .map_err(|e| corrupt(format!("private key: {e}")))?;

        debug!("Loaded credential record for label: {}", label);
        Ok(Some(StoredCredential {
            label: record.label,
            certificate_der,
            private_key_der,
            access_policy: record.access_policy,
        }))
    }

    fn save(&self, credential: StoredCredential) -> Result<(), StoreError> {
        let path = self.record_path(&credential.label);
        let record = CredentialRecord {
            label: credential.label.clone(),
            certificate: BASE64_STANDARD.encode(&credential.certificate_der),
            private_key: BASE64_STANDARD.encode(&credential.private_key_der),
            access_policy: credential.access_policy,
        };
        let json = serde_json::to_vec_pretty(&record)?;

        // Write the full record to a sibling temp file, then rename over the
        // destination. Rename within one directory is atomic on POSIX.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&tmp)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp, perms)?;
        }

        fs::rename(&tmp, &path)?;
        info!("Saved credential record for label: {}", credential.label);
        Ok(())
    }

    fn delete(&self, label: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.record_path(label)) {
            Ok(()) => {
                info!("Removed credential record for label: {}", label);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
