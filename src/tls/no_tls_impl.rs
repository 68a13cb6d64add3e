use std::convert::Infallible;
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::marker::PhantomData;

use crate::tunnel::TunnelSettings;
use crate::{ErrorKind, Result};

pub struct TlsHandshaker;

impl TlsHandshaker {
    pub fn new(_settings: &TunnelSettings) -> TlsHandshaker {
        TlsHandshaker
    }

    pub fn handshake<S>(&self, domain: &str, _stream: S) -> Result<TlsStream<S>>
    where
        S: Read + Write,
    {
        debug!("cannot open a tls session with {}, no tls backend enabled", domain);
        Err(ErrorKind::TlsDisabled.into())
    }
}

/// A TLS session over an inner stream. Never created when no TLS backend is enabled.
pub struct TlsStream<S> {
    never: Infallible,
    _stream: PhantomData<S>,
}

impl<S> TlsStream<S> {
    /// Get a reference to the stream carrying the TLS session.
    pub fn get_ref(&self) -> &S {
        match self.never {}
    }
}

impl<S> Read for TlsStream<S> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        match self.never {}
    }
}

impl<S> Write for TlsStream<S> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        match self.never {}
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.never {}
    }
}

impl<S> fmt::Debug for TlsStream<S> {
    fn fmt(&self, _f: &mut fmt::Formatter) -> fmt::Result {
        match self.never {}
    }
}
