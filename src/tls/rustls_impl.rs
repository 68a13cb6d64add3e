use std::fmt;
use std::io;
use std::io::prelude::*;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme, StreamOwned};

use crate::tunnel::TunnelSettings;
use crate::{ErrorKind, Result};

pub struct TlsHandshaker {
    accept_invalid_certs: bool,
    accept_invalid_hostnames: bool,
}

impl TlsHandshaker {
    pub fn new(settings: &TunnelSettings) -> TlsHandshaker {
        TlsHandshaker {
            accept_invalid_certs: settings.accept_invalid_certs,
            accept_invalid_hostnames: settings.accept_invalid_hostnames,
        }
    }

    fn client_config(&self) -> Result<Arc<ClientConfig>> {
        let provider = Arc::new(ring::default_provider());
        let root_store = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let upstream = WebPkiServerVerifier::builder_with_provider(Arc::new(root_store), Arc::clone(&provider))
            .build()
            .map_err(|err| rustls::Error::General(err.to_string()))?;

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(CustomCertVerifier {
                upstream,
                provider,
                accept_invalid_certs: self.accept_invalid_certs,
                accept_invalid_hostnames: self.accept_invalid_hostnames,
            }))
            .with_no_client_auth();

        Ok(Arc::new(config))
    }

    pub fn handshake<S>(&self, domain: &str, mut stream: S) -> Result<TlsStream<S>>
    where
        S: Read + Write,
    {
        let name = ServerName::try_from(domain.to_owned()).map_err(|_| ErrorKind::InvalidDNSName(domain.to_owned()))?;
        let config = self.client_config()?;
        let mut session = ClientConnection::new(config, name)?;

        // Read timeouts surface as WouldBlock or TimedOut, both converted to `Timeout`.
        while session.is_handshaking() {
            session.complete_io(&mut stream)?;
        }

        debug!("tls handshake with {} complete", domain);

        Ok(TlsStream {
            inner: StreamOwned::new(session, stream),
        })
    }
}

/// A TLS session over an inner stream, such as an established tunnel.
pub struct TlsStream<S>
where
    S: Read + Write,
{
    inner: StreamOwned<ClientConnection, S>,
}

impl<S> TlsStream<S>
where
    S: Read + Write,
{
    /// Get a reference to the stream carrying the TLS session.
    pub fn get_ref(&self) -> &S {
        self.inner.get_ref()
    }
}

impl<S> Read for TlsStream<S>
where
    S: Read + Write,
{
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            // Servers closing the connection without close_notify are common with `Connection: close`.
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
            res => res,
        }
    }
}

impl<S> Write for TlsStream<S>
where
    S: Read + Write,
{
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S> fmt::Debug for TlsStream<S>
where
    S: Read + Write,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TlsStream[rustls]")
    }
}

#[derive(Debug)]
struct CustomCertVerifier {
    upstream: Arc<WebPkiServerVerifier>,
    provider: Arc<CryptoProvider>,
    accept_invalid_certs: bool,
    accept_invalid_hostnames: bool,
}

impl ServerCertVerifier for CustomCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        match self
            .upstream
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(err))
                if self.accept_invalid_hostnames && format!("{:?}", err).starts_with("NotValidForName") =>
            {
                Ok(ServerCertVerified::assertion())
            }
            Err(rustls::Error::InvalidCertificate(_)) if self.accept_invalid_certs => Ok(ServerCertVerified::assertion()),
            upstream => upstream,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
