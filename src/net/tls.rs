//! TLS client configuration and handshakes.
//!
//! # Responsibilities
//! - Build one rustls `ClientConfig` per client (platform roots + optional CA file)
//! - Optionally accept any certificate for testing
//! - Handshake over any byte stream, direct or tunneled, with SNI set to the target

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::config::{ConfigError, TlsConfig};
use crate::error::{Phase, TransportError, TransportResult};
use crate::resilience::timeouts::with_deadline;
use crate::routing::Target;

/// Shared TLS state for one client. Cloning is cheap.
#[derive(Clone)]
pub struct TlsClient {
    connector: TlsConnector,
    verifies_certs: bool,
}

impl std::fmt::Debug for TlsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsClient")
            .field("verifies_certs", &self.verifies_certs)
            .finish()
    }
}

impl TlsClient {
    /// Build from configuration.
    pub fn from_config(config: &TlsConfig) -> Result<Self, ConfigError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| ConfigError::Tls(e.to_string()))?;

        let mut client_config = if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
                .with_no_client_auth()
        } else {
            let mut roots = load_platform_roots();
            if let Some(path) = &config.ca_cert_path {
                let added = add_pem_roots(&mut roots, Path::new(path))?;
                tracing::debug!(path = %path, added, "Loaded extra CA certificates");
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        };
        client_config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            verifies_certs: !config.accept_invalid_certs,
        })
    }

    pub fn verifies_certs(&self) -> bool {
        self.verifies_certs
    }

    /// Run the client handshake over `stream`, addressed to `target`.
    ///
    /// SNI and certificate validation use the target host, never a proxy.
    pub async fn handshake<S>(&self, stream: S, target: &Target, limit: Duration) -> TransportResult<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let host = target.server_name().to_string();
        let server_name = ServerName::try_from(host.clone()).map_err(|e| TransportError::Handshake {
            host: host.clone(),
            reason: format!("invalid server name: {e}"),
        })?;

        with_deadline(Phase::Handshake, limit, async {
            self.connector
                .connect(server_name, stream)
                .await
                .map_err(|e| TransportError::Handshake {
                    host: host.clone(),
                    reason: e.to_string(),
                })
        })
        .await
    }
}

fn load_platform_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(error = %err, "Failed to load a platform certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::trace!(added, ignored, "Platform trust roots loaded");
    roots
}

fn add_pem_roots(roots: &mut RootCertStore, path: &Path) -> Result<usize, ConfigError> {
    let file = File::open(path).map_err(ConfigError::Io)?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ConfigError::Io)?;
    if certs.is_empty() {
        return Err(ConfigError::Tls(format!("no certificates found in {}", path.display())));
    }
    let mut added = 0;
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| ConfigError::Tls(format!("{}: {e}", path.display())))?;
        added += 1;
    }
    Ok(added)
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn insecure_config_builds() {
        let tls = TlsClient::from_config(&TlsConfig {
            accept_invalid_certs: true,
            ca_cert_path: None,
        })
        .unwrap();
        assert!(!tls.verifies_certs());
    }

    #[test]
    fn extra_ca_file_is_loaded() {
        let tls = TlsClient::from_config(&TlsConfig {
            accept_invalid_certs: false,
            ca_cert_path: Some(fixture("ca-cert.pem")),
        })
        .unwrap();
        assert!(tls.verifies_certs());
    }

    #[test]
    fn file_without_certificates_is_rejected() {
        let err = TlsClient::from_config(&TlsConfig {
            accept_invalid_certs: false,
            ca_cert_path: Some(fixture("server-key.pem")),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Tls(_)));
    }
}
