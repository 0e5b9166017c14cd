//! Certificate fingerprinting.
//!
//! A fingerprint is the hash of a certificate's DER encoding. It is a
//! comparison and identification token only, never a capability: the owner of
//! an identity sends the digest to a peer over an existing secure channel, and
//! the peer verifies the TLS certificate it receives by recomputing the digest.

use std::fmt;

use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use tracing::warn;

/// Hash algorithm used for a certificate fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-256, the recommended and default algorithm.
    Sha256,
    /// SHA-1. Cryptographically weak; retained only for interoperability with
    /// legacy verifiers.
    Sha1,
}

impl DigestAlgorithm {
    /// Digest output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha1 => 20,
        }
    }
}

/// A certificate fingerprint together with the algorithm that produced it.
///
/// Equality includes the algorithm tag, so digests from different algorithms
/// never compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes (32 for SHA-256, 20 for SHA-1).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes the fingerprint of a DER-encoded certificate.
///
/// Deterministic: the same certificate bytes always yield the same digest.
pub fn certificate_digest(cert_der: &[u8], algorithm: DigestAlgorithm) -> Digest {
    let bytes = match algorithm {
        DigestAlgorithm::Sha256 => Sha256::digest(cert_der).to_vec(),
        DigestAlgorithm::Sha1 => {
            warn!("Computing SHA-1 certificate digest; prefer SHA-256");
            Sha1::digest(cert_der).to_vec()
        }
    };
    Digest { algorithm, bytes }
}

/// SHA-256 fingerprint of a DER-encoded certificate as a fixed-size array.
pub fn sha256_fingerprint(cert_der: &[u8]) -> [u8; 32] {
    Sha256::digest(cert_der).into()
}

/// SHA-1 fingerprint of a DER-encoded certificate as a fixed-size array.
///
/// Weak; use only when a legacy verifier requires it.
pub fn sha1_fingerprint(cert_der: &[u8]) -> [u8; 20] {
    Sha1::digest(cert_der).into()
}
