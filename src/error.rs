use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::result;

use http::StatusCode;

use crate::parsing::HeaderList;

/// A type that contains all the errors that can possibly occur while accessing an HTTP server
/// through a proxy.
#[derive(Debug)]
pub struct Error(pub(crate) Box<ErrorKind>);

impl Error {
    /// Get a reference to the `ErrorKind` inside.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume this `Error` and get the `ErrorKind` inside.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Check if this error was caused by an elapsed deadline or a cancellation.
    pub fn is_timeout(&self) -> bool {
        matches!(*self.0, ErrorKind::Timeout)
    }

    /// Get the headers the proxy returned along with a refusal, if this error is a refusal.
    pub fn proxy_headers(&self) -> Option<&HeaderList> {
        match &*self.0 {
            ErrorKind::ProxyRefused { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, w: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, w)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::ProxyUnreachable(ref e) => Some(e),
            ErrorKind::Io(ref e) => Some(e),
            ErrorKind::Http(ref e) => Some(e),
            #[cfg(any(feature = "tls-native", feature = "tls-rustls"))]
            ErrorKind::Tls(ref e) => Some(e),
            _ => None,
        }
    }
}

/// Details about a response that could not be parsed.
#[derive(Debug)]
#[non_exhaustive]
pub enum InvalidResponseKind {
    /// The status line is not of the form `HTTP/x.y code reason`.
    StatusLine,
    /// The status code is not a valid three digit code.
    StatusCode,
    /// A header line is invalid.
    Header,
    /// The response has more headers than allowed by the settings.
    TooManyHeaders,
    /// A line of the response head is longer than allowed.
    LineTooLong,
    /// The connection closed before the end of the header block.
    Truncated,
    /// A chunk size line in a chunked body is invalid.
    ChunkSize,
    /// The `Content-Length` header is invalid.
    ContentLength,
}

impl Display for InvalidResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            InvalidResponseKind::StatusLine => "invalid status line",
            InvalidResponseKind::StatusCode => "invalid status code",
            InvalidResponseKind::Header => "invalid header",
            InvalidResponseKind::TooManyHeaders => "too many headers",
            InvalidResponseKind::LineTooLong => "line too long",
            InvalidResponseKind::Truncated => "connection closed before the end of the header block",
            InvalidResponseKind::ChunkSize => "invalid chunk size",
            InvalidResponseKind::ContentLength => "invalid content length",
        };
        f.write_str(msg)
    }
}

/// Common errors that can occur while opening a tunnel or sending a request.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The TCP connection to the proxy could not be established.
    ProxyUnreachable(io::Error),
    /// The proxy answered the CONNECT request with a non-2xx status.
    ProxyRefused {
        /// Status code returned by the proxy.
        status: StatusCode,
        /// Reason phrase returned by the proxy.
        reason: String,
        /// Headers returned by the proxy, with their original casing.
        headers: HeaderList,
    },
    /// The response head was truncated or could not be parsed.
    MalformedResponse(InvalidResponseKind),
    /// The deadline elapsed or the operation was cancelled.
    Timeout,
    /// The target server answered with a non-2xx status.
    UnexpectedStatus(StatusCode),
    /// The expected header was found neither in the tunnel response nor in the final response.
    HeaderNotFound(String),
    /// A required configuration value is missing.
    MissingConfig(String),
    /// The proxy URL is invalid or uses an unsupported scheme.
    InvalidProxyUrl(String),
    /// The tunnel target is not a `host:port` pair.
    InvalidTarget(String),
    /// A header name contains characters other than letters, digits and `-`.
    InvalidHeaderName(String),
    /// The request URL is invalid.
    InvalidUrl(String),
    /// IO Error
    Io(io::Error),
    /// HTTP Error
    Http(http::Error),
    /// Invalid DNS name used for TLS certificate verification
    InvalidDNSName(String),
    /// TLS error encountered while connecting to an https server or proxy.
    #[cfg(feature = "tls-native")]
    Tls(native_tls::Error),
    /// TLS error encountered while connecting to an https server or proxy.
    #[cfg(all(feature = "tls-rustls", not(feature = "tls-native")))]
    Tls(rustls::Error),
    /// TLS support is not compiled in.
    TlsDisabled,
}

impl Display for ErrorKind {
    fn fmt(&self, w: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind::*;

        match self {
            ProxyUnreachable(e) => write!(w, "Proxy unreachable: {}", e),
            ProxyRefused { status, reason, .. } => {
                if reason.is_empty() {
                    write!(w, "Proxy refused the tunnel: {}", status.as_u16())
                } else {
                    write!(w, "Proxy refused the tunnel: {} {}", status.as_u16(), reason)
                }
            }
            MalformedResponse(k) => write!(w, "Malformed response: {}", k),
            Timeout => write!(w, "Timed out"),
            UnexpectedStatus(status) => write!(w, "Unexpected response status: {}", status),
            HeaderNotFound(name) => write!(w, "Header '{}' not found in response", name),
            MissingConfig(name) => write!(w, "{} environment variable required", name),
            InvalidProxyUrl(url) => write!(w, "Invalid proxy URL: {}", url),
            InvalidTarget(target) => write!(w, "Invalid tunnel target: {}", target),
            InvalidHeaderName(name) => write!(w, "Invalid header name: {:?}", name),
            InvalidUrl(url) => write!(w, "Invalid URL: {}", url),
            Io(e) => write!(w, "Io Error: {}", e),
            Http(e) => write!(w, "Http Error: {}", e),
            InvalidDNSName(name) => write!(w, "Invalid DNS name: {}", name),
            #[cfg(any(feature = "tls-native", feature = "tls-rustls"))]
            Tls(e) => write!(w, "Tls Error: {}", e),
            TlsDisabled => write!(w, "TLS is disabled, activate one of the tls- features"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(err: ErrorKind) -> Error {
        Error(Box::new(err))
    }
}

impl From<InvalidResponseKind> for Error {
    fn from(kind: InvalidResponseKind) -> Error {
        ErrorKind::MalformedResponse(kind).into()
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            // Sockets with a read timeout report WouldBlock on unix and TimedOut on windows.
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout.into(),
            _ => ErrorKind::Io(err).into(),
        }
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Error {
        ErrorKind::Http(err).into()
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Error {
        match err {}
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Error {
        ErrorKind::Http(http::Error::from(err)).into()
    }
}

#[cfg(feature = "tls-native")]
impl From<native_tls::Error> for Error {
    fn from(err: native_tls::Error) -> Error {
        ErrorKind::Tls(err).into()
    }
}

#[cfg(all(feature = "tls-rustls", not(feature = "tls-native")))]
impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Error {
        ErrorKind::Tls(err).into()
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err.into_kind() {
            ErrorKind::Io(err) | ErrorKind::ProxyUnreachable(err) => err,
            ErrorKind::Timeout => io::ErrorKind::TimedOut.into(),
            kind => io::Error::new(io::ErrorKind::Other, Error::from(kind)),
        }
    }
}

/// Wrapper for the `Result` type with an `Error`.
pub type Result<T = ()> = result::Result<T, Error>;

#[test]
fn test_io_timeouts_become_timeout() {
    let err = Error::from(io::Error::from(io::ErrorKind::WouldBlock));
    assert!(err.is_timeout());

    let err = Error::from(io::Error::from(io::ErrorKind::TimedOut));
    assert!(err.is_timeout());

    let err = Error::from(io::Error::from(io::ErrorKind::ConnectionReset));
    assert!(matches!(err.kind(), ErrorKind::Io(_)));
}

#[test]
fn test_refusal_keeps_headers() {
    let mut headers = HeaderList::new();
    headers.append("Proxy-Authenticate", http::HeaderValue::from_static("Basic realm=\"proxy\""));

    let err = Error::from(ErrorKind::ProxyRefused {
        status: StatusCode::PROXY_AUTHENTICATION_REQUIRED,
        reason: "Proxy Authentication Required".into(),
        headers,
    });

    assert_eq!(
        err.to_string(),
        "Proxy refused the tunnel: 407 Proxy Authentication Required"
    );
    assert_eq!(
        err.proxy_headers().and_then(|h| h.get_str("proxy-authenticate")),
        Some("Basic realm=\"proxy\"")
    );
}

#[test]
fn test_header_not_found_message() {
    let err = Error::from(ErrorKind::HeaderNotFound("X-ProxyMesh-IP".into()));
    assert_eq!(err.to_string(), "Header 'X-ProxyMesh-IP' not found in response");
}
