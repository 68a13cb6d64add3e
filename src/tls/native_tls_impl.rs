use std::fmt;
use std::io;
use std::io::prelude::*;

use native_tls::HandshakeError;

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

    pub fn handshake<S>(&self, domain: &str, stream: S) -> Result<TlsStream<S>>
    where
        S: Read + Write,
    {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .danger_accept_invalid_hostnames(self.accept_invalid_hostnames)
            .build()?;

        let stream = match connector.connect(domain, stream) {
            Ok(stream) => stream,
            Err(HandshakeError::Failure(err)) => return Err(err.into()),
            // Blocking streams only report WouldBlock when their read timeout elapses.
            Err(HandshakeError::WouldBlock(_)) => return Err(ErrorKind::Timeout.into()),
        };
        debug!("tls handshake with {} complete", domain);
        Ok(TlsStream { inner: stream })
    }
}

/// A TLS session over an inner stream, such as an established tunnel.
pub struct TlsStream<S>
where
    S: Read + Write,
{
    inner: native_tls::TlsStream<S>,
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
        self.inner.read(buf)
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
        f.debug_struct("TlsStream").field("backend", &"native-tls").finish()
    }
}
