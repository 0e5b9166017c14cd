//! rustls integration for anonymous identities.
//!
//! The server side presents the identity's certificate and key. The client
//! side pins the peer's SHA-256 certificate fingerprint, exchanged
//! out-of-band, instead of walking a CA chain — the whole point of an
//! anonymous identity is that the digest is the trust anchor.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, ServerConfig, SignatureScheme};

use crate::digest;
use crate::error::{IdentityError, Result};
use crate::identity::Identity;

/// Builds a server TLS configuration presenting the identity's certificate,
/// with no client authentication.
pub fn server_config(identity: &Identity) -> Result<ServerConfig> {
    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(
            vec![identity.certificate().clone()],
            identity.private_key().clone_key(),
        )
        .map_err(|e| IdentityError::TlsConfig(e.to_string()))
}

/// Builds a client TLS configuration that accepts exactly the certificate
/// whose SHA-256 digest matches `fingerprint`.
pub fn client_config_for_fingerprint(fingerprint: [u8; 32]) -> ClientConfig {
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(FingerprintVerifier {
            expected: fingerprint,
        }))
        .with_no_client_auth()
}

/// Certificate verifier pinned to a single SHA-256 certificate digest.
///
/// Chain, hostname, and validity-period checks are intentionally absent: the
/// pinned digest identifies the self-signed peer completely. TLS 1.2/1.3
/// handshake signatures are still verified through the ring provider.
#[derive(Debug)]
struct FingerprintVerifier {
    expected: [u8; 32],
}

impl ServerCertVerifier for FingerprintVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let actual = digest::sha256_fingerprint(end_entity.as_ref());
        if actual == self.expected {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General(format!(
                "certificate fingerprint mismatch: expected {}, got {}",
                hex::encode(self.expected),
                hex::encode(actual)
            )))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CertificateFactory;
    use std::sync::Once;
    use std::time::{Duration, SystemTime};

    static INIT: Once = Once::new();

    fn init_crypto() {
        INIT.call_once(|| {
            let _ = rustls::crypto::ring::default_provider().install_default();
        });
    }

    fn test_identity(label: &str) -> Identity {
        let now = SystemTime::now();
        let (key, cert) = CertificateFactory::new()
            .generate(now, now + Duration::from_secs(3600))
            .unwrap();
        Identity::from_parts(label.to_string(), cert, key).unwrap()
    }

    #[test]
    fn server_config_builds_from_identity() {
        init_crypto();
        let identity = test_identity("server");
        assert!(server_config(&identity).is_ok());
    }

    #[test]
    fn verifier_accepts_matching_fingerprint() {
        init_crypto();
        let identity = test_identity("server");
        let verifier = FingerprintVerifier {
            expected: digest::sha256_fingerprint(identity.certificate().as_ref()),
        };

        let name = ServerName::try_from("localhost").unwrap();
        let result = verifier.verify_server_cert(
            identity.certificate(),
            &[],
            &name,
            &[],
            UnixTime::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn verifier_rejects_other_certificates() {
        init_crypto();
        let identity = test_identity("server");
        let verifier = FingerprintVerifier { expected: [0u8; 32] };

        let name = ServerName::try_from("localhost").unwrap();
        let result = verifier.verify_server_cert(
            identity.certificate(),
            &[],
            &name,
            &[],
            UnixTime::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn client_config_builds_for_pinned_fingerprint() {
        init_crypto();
        let config = client_config_for_fingerprint([0xab; 32]);
        assert!(config.alpn_protocols.is_empty());
    }
}
