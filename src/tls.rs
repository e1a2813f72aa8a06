//! TLS trust policies and the connector built from them
//!
//! Each `imaps` account carries exactly one [`TrustPolicy`]. The rustls
//! connector is built once, when the account is configured, and reused
//! for every scrape.

use crate::error::{Error, Result};
use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;
use std::fmt;
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Which certificates a TLS account trusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// The operating system's trust store.
    System,
    /// Only the given root certificates.
    CustomRoots(Vec<CertificateDer<'static>>),
    /// Accept any certificate.
    SkipVerify,
}

impl TrustPolicy {
    /// Parse a PEM blob holding one or more root certificates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the blob is malformed or contains no
    /// certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let certs = rustls_pemfile::certs(&mut pem.as_bytes())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Config(format!("Invalid PEM certificate: {e}")))?;
        if certs.is_empty() {
            return Err(Error::Config(
                "PEM blob contains no certificate".to_string(),
            ));
        }
        Ok(Self::CustomRoots(certs))
    }

    fn root_store(&self) -> Result<RootCertStore> {
        let mut store = RootCertStore::empty();
        match self {
            Self::System => {
                let rustls_native_certs::CertificateResult { certs, errors, .. } =
                    rustls_native_certs::load_native_certs();
                if certs.is_empty() {
                    if let Some(err) = errors.into_iter().next() {
                        return Err(Error::Tls(format!(
                            "Failed to load system root certificates: {err}"
                        )));
                    }
                }
                add_system_roots(&mut store, certs);
            }
            Self::CustomRoots(certs) => {
                for cert in certs {
                    store
                        .add(cert.clone())
                        .map_err(|e| Error::Config(format!("Invalid root certificate: {e}")))?;
                }
            }
            Self::SkipVerify => {}
        }
        Ok(store)
    }
}

/// Add the OS trust store, skipping certificates rustls cannot parse.
/// Returns how many were skipped.
fn add_system_roots(store: &mut RootCertStore, certs: Vec<CertificateDer<'static>>) -> usize {
    let (_, ignored) = store.add_parsable_certificates(certs);
    if ignored > 0 {
        debug!("Ignored {} unparsable system root certificate(s)", ignored);
    }
    ignored
}

/// TLS settings of one account: its trust policy and the ready-to-use
/// connector.
#[derive(Clone)]
pub struct Tls {
    policy: TrustPolicy,
    connector: TlsConnector,
}

impl Tls {
    /// Build the connector for `policy`.
    ///
    /// The `ring` provider is passed explicitly so no process-wide
    /// default provider has to be installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root store cannot be assembled.
    pub fn new(policy: TrustPolicy) -> Result<Self> {
        let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

        let config = if policy == TrustPolicy::SkipVerify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
                .with_no_client_auth()
        } else {
            builder
                .with_root_certificates(policy.root_store()?)
                .with_no_client_auth()
        };

        Ok(Self {
            policy,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }

    #[must_use]
    pub const fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    pub(crate) const fn connector(&self) -> &TlsConnector {
        &self.connector
    }
}

impl fmt::Debug for Tls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tls").field("policy", &self.policy).finish()
    }
}

/// Certificate verifier that accepts all certificates.
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
