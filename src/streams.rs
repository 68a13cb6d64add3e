use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::happy;
use crate::tls::{TlsHandshaker, TlsStream};
use crate::tunnel::{ProxyEndpoint, Scheme, TunnelSettings};
use crate::{ErrorKind, Result};

/// A token used to abort a blocking tunnel setup from another thread.
///
/// Cancelling shuts down the socket of the operation currently using the token, which makes
/// it fail with [`ErrorKind::Timeout`](crate::ErrorKind::Timeout). A cancelled token stays
/// cancelled; operations started with it fail immediately.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    socket: Mutex<Option<TcpStream>>,
}

impl CancelToken {
    /// Create a token which is not cancelled.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Cancel the operation using this token, if any, and every later one.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Some(socket) = self.lock_socket().take() {
            debug!("cancelled, shutting down socket");
            let _ = socket.shutdown(Shutdown::Both);
        }
    }

    /// Check if this token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn register(&self, socket: &TcpStream) -> Result {
        let mut slot = self.lock_socket();
        if self.is_cancelled() {
            let _ = socket.shutdown(Shutdown::Both);
            return Err(ErrorKind::Timeout.into());
        }
        *slot = Some(socket.try_clone()?);
        Ok(())
    }

    pub(crate) fn release(&self) {
        self.lock_socket().take();
    }

    fn lock_socket(&self) -> std::sync::MutexGuard<'_, Option<TcpStream>> {
        // The guarded value is a plain handle, a panic while holding the lock cannot corrupt it.
        self.inner.socket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cancels a token once `timeout` elapses, unless dropped before.
pub(crate) struct Watchdog {
    _disarm: mpsc::Sender<()>,
}

impl Watchdog {
    pub(crate) fn arm(token: CancelToken, timeout: Duration) -> Watchdog {
        let (tx, rx) = mpsc::channel::<()>();
        thread::spawn(move || {
            if let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                debug!("deadline of {}ms elapsed", timeout.as_millis());
                token.cancel();
            }
        });
        Watchdog { _disarm: tx }
    }
}

/// A connection to a proxy, in clear text or over TLS for `https` proxies.
pub enum ProxyStream {
    Plain(TcpStream),
    Tls {
        stream: Box<TlsStream<TcpStream>>,
        socket: TcpStream,
    },
}

impl ProxyStream {
    /// Open a connection to the proxy, completing the TLS handshake for `https` proxies.
    ///
    /// Failing to reach the proxy is reported as `ProxyUnreachable`, running past the
    /// deadline or cancellation as `Timeout`.
    pub fn connect(
        proxy: &ProxyEndpoint,
        settings: &TunnelSettings,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> Result<ProxyStream> {
        debug!("trying to connect to proxy {}", proxy);

        let socket = match happy::connect((proxy.host(), proxy.port()), settings.connect_timeout, deadline) {
            Ok(socket) => socket,
            Err(err) if err.kind() == io::ErrorKind::TimedOut && deadline.map_or(false, |d| Instant::now() >= d) => {
                return Err(ErrorKind::Timeout.into())
            }
            Err(err) => return Err(ErrorKind::ProxyUnreachable(err).into()),
        };

        cancel.register(&socket)?;
        socket.set_read_timeout(Some(settings.read_timeout))?;
        socket.set_write_timeout(Some(settings.read_timeout))?;

        match proxy.scheme() {
            Scheme::Http => Ok(ProxyStream::Plain(socket)),
            Scheme::Https => {
                let handle = socket.try_clone()?;
                let stream = TlsHandshaker::new(settings).handshake(proxy.host(), socket)?;
                Ok(ProxyStream::Tls {
                    stream: Box::new(stream),
                    socket: handle,
                })
            }
        }
    }

    /// Close the connection in both directions.
    pub fn shutdown(&self) {
        let socket = match self {
            ProxyStream::Plain(socket) => socket,
            ProxyStream::Tls { socket, .. } => socket,
        };
        let _ = socket.shutdown(Shutdown::Both);
    }
}

impl Read for ProxyStream {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ProxyStream::Plain(stream) => stream.read(buf),
            ProxyStream::Tls { stream, .. } => stream.read(buf),
        }
    }
}

impl Write for ProxyStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ProxyStream::Plain(stream) => stream.write(buf),
            ProxyStream::Tls { stream, .. } => stream.write(buf),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        match self {
            ProxyStream::Plain(stream) => stream.flush(),
            ProxyStream::Tls { stream, .. } => stream.flush(),
        }
    }
}

impl fmt::Debug for ProxyStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProxyStream::Plain(stream) => f.debug_tuple("Plain").field(stream).finish(),
            ProxyStream::Tls { socket, .. } => f.debug_tuple("Tls").field(socket).finish(),
        }
    }
}
