//! TLS utilities for the SSM client
//!
//! Certificate loading, key loading and rustls client configuration for
//! TLS and mTLS towards the Secure Storage Module. TLS 1.2 is the minimum
//! protocol version.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};

use crate::error::{SsmError, SsmResult};

/// Get the ring crypto provider.
fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Load PEM-encoded certificates from a file path.
pub fn load_certs(path: &str) -> SsmResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| SsmError::TlsError(format!("Failed to open cert file {path}: {e}")))?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SsmError::TlsError(format!("Failed to parse certs from {path}: {e}")))?;

    if certs.is_empty() {
        return Err(SsmError::TlsError(format!("No certificates found in {path}")));
    }

    Ok(certs)
}

/// Load a PEM-encoded private key from a file path.
pub fn load_private_key(path: &str) -> SsmResult<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|e| SsmError::TlsError(format!("Failed to open key file {path}: {e}")))?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| SsmError::TlsError(format!("Failed to parse key from {path}: {e}")))?
        .ok_or_else(|| SsmError::TlsError(format!("No private key found in {path}")))
}

/// Trust the given CA bundle, or the webpki roots when none is configured.
fn root_store(ca_path: Option<&str>) -> SsmResult<RootCertStore> {
    let mut root_store = RootCertStore::empty();

    match ca_path {
        Some(ca) => {
            for cert in load_certs(ca)? {
                root_store
                    .add(cert)
                    .map_err(|e| SsmError::TlsError(format!("Failed to add CA cert: {e}")))?;
            }
        }
        None => root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
    }

    Ok(root_store)
}

/// Build a client-side TLS config.
///
/// With `identity` set the client presents that certificate chain (mTLS).
/// `insecure_skip_verify` disables server certificate verification.
pub fn build_client_config(
    ca_path: Option<&str>,
    identity: Option<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>,
    insecure_skip_verify: bool,
) -> SsmResult<ClientConfig> {
    let builder = ClientConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|e| SsmError::TlsError(format!("Failed to set protocol versions: {e}")))?
        .with_root_certificates(root_store(ca_path)?);

    let mut config = match identity {
        Some((certs, key)) => builder
            .with_client_auth_cert(certs, key)
            .map_err(|e| SsmError::TlsError(format!("Failed to set client cert: {e}")))?,
        None => builder.with_no_client_auth(),
    };

    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    if insecure_skip_verify {
        log::warn!("TLS verification disabled for SSM connections");
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(NoCertificateVerification(provider())));
    }

    Ok(config)
}

/// Dangerous: skip all server certificate verification (for testing only).
#[derive(Debug)]
struct NoCertificateVerification(Arc<rustls::crypto::CryptoProvider>);

impl rustls::client::danger::ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
