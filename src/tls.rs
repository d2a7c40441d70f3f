use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::types::ProtocolError;

const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Lowest TLS protocol version the client will negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinTlsVersion {
    Tls12,
    Tls13,
}

/// TLS settings applied uniformly to every `https` request a client issues.
///
/// The default policy validates server certificates against the Mozilla root
/// program (`webpki-roots`); `extra_roots` adds private CAs on top of that.
/// `skip_verify` disables certificate validation entirely and is meant for
/// test rigs, not production traffic.
#[derive(Debug, Clone)]
pub struct TlsPolicy {
    pub extra_roots: Vec<CertificateDer<'static>>,
    pub skip_verify: bool,
    pub min_version: MinTlsVersion,
    pub alpn_protocols: Vec<Vec<u8>>,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self {
            extra_roots: Vec::new(),
            skip_verify: false,
            min_version: MinTlsVersion::Tls12,
            alpn_protocols: vec![ALPN_HTTP11.to_vec()],
        }
    }
}

impl TlsPolicy {
    /// Policy that accepts any server certificate.
    pub fn insecure() -> Self {
        Self {
            skip_verify: true,
            ..Self::default()
        }
    }

    pub fn with_extra_root(mut self, root: CertificateDer<'static>) -> Self {
        self.extra_roots.push(root);
        self
    }

    pub(crate) fn connector(&self) -> Result<TlsConnector, ProtocolError> {
        // Ensure a crypto provider is installed (required for rustls >=0.23).
        let _ = default_provider().install_default();

        let versions: &[&rustls::SupportedProtocolVersion] = match self.min_version {
            MinTlsVersion::Tls12 => rustls::ALL_VERSIONS,
            MinTlsVersion::Tls13 => &[&rustls::version::TLS13],
        };
        let builder = ClientConfig::builder_with_protocol_versions(versions);

        let mut config = if self.skip_verify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
                .with_no_client_auth()
        } else {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            for der in &self.extra_roots {
                roots
                    .add(der.clone())
                    .map_err(|e| ProtocolError::TlsFailed(format!("Bad trust root: {}", e)))?;
            }
            builder
                .with_root_certificates(roots)
                .with_no_client_auth()
        };

        config.alpn_protocols = self.alpn_protocols.clone();

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

pub(crate) fn server_name_from_str(name: &str) -> Result<ServerName<'static>, ProtocolError> {
    ServerName::try_from(name.to_string()).map_err(|_| {
        ProtocolError::InvalidTarget(format!("Invalid server name: {}", name))
    })
}

#[derive(Debug)]
pub struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA1,
            rustls::SignatureScheme::ECDSA_SHA1_Legacy,
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
            rustls::SignatureScheme::ED448,
        ]
    }
}
