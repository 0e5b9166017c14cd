//! Self-signed certificate generation.
//!
//! Key pairs come from the rsa crate (the rcgen backend cannot generate RSA
//! keys itself); the PKCS#8 export is then imported into rcgen for
//! self-signing. The distinguished name is a fixed placeholder on both the
//! subject and issuer side, so a generated certificate carries no information
//! about the application or device presenting it.

use std::time::SystemTime;

use rand::rngs::OsRng;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, KeyPair, KeyUsagePurpose, PKCS_RSA_SHA256,
};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tracing::{debug, info};

use crate::error::{IdentityError, Result};

/// Fixed placeholder subject and issuer common name.
pub const ANONYMOUS_COMMON_NAME: &str = "Anonymous";

/// RSA modulus size for generated key pairs.
pub const RSA_KEY_BITS: usize = 2048;

/// Builds fresh RSA key pairs and self-signed certificates.
///
/// Generation has no side effects beyond returning the new material; storage
/// is the identity manager's concern.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateFactory;

impl CertificateFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self
    }

    /// Generates a 2048-bit RSA key pair and a certificate self-signed with
    /// it, valid over `[not_before, not_after]`.
    ///
    /// Issuer and subject are both [`ANONYMOUS_COMMON_NAME`]. The certificate
    /// carries digitalSignature and keyEncipherment key usages, which is what
    /// an RSA TLS server certificate needs.
    pub fn generate(
        &self,
        not_before: SystemTime,
        not_after: SystemTime,
    ) -> Result<(PrivateKeyDer<'static>, CertificateDer<'static>)> {
        debug!("Generating RSA-{} key pair", RSA_KEY_BITS);
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| IdentityError::KeyGeneration(e.to_string()))?;
        let pkcs8 = private_key
            .to_pkcs8_der()
            .map_err(|e| IdentityError::KeyGeneration(e.to_string()))?;

        let key_pair = KeyPair::from_pkcs8_der_and_sign_algo(
            &PrivatePkcs8KeyDer::from(pkcs8.as_bytes()),
            &PKCS_RSA_SHA256,
        )
        .map_err(|e| IdentityError::Signing(e.to_string()))?;

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, ANONYMOUS_COMMON_NAME);
        params.distinguished_name = dn;
        params.not_before = time::OffsetDateTime::from(not_before);
        params.not_after = time::OffsetDateTime::from(not_after);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;

        info!(
            "Generated self-signed certificate ({} bytes DER)",
            cert.der().as_ref().len()
        );
        Ok((
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(pkcs8.as_bytes().to_vec())),
            cert.der().clone(),
        ))
    }
}
