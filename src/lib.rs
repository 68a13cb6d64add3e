//! This crate opens HTTP CONNECT tunnels through a proxy while keeping track of the headers
//! exchanged with that proxy.
//!
//! Extra headers can be attached to the CONNECT request, and the headers returned by the proxy
//! in its CONNECT response are handed back to the caller, on success as well as on refusal.
//! Once the tunnel is established, the raw stream can be upgraded to TLS for the target host.
//!
//! ```no_run
//! use proxy_headers::{ProxyEndpoint, ProxyHeaders, TunnelClient, TunnelSettings};
//!
//! # fn main() -> proxy_headers::Result {
//! let proxy: ProxyEndpoint = "http://proxy.example.com:31280".parse()?;
//! let mut headers = ProxyHeaders::new();
//! headers.insert("X-ProxyMesh-Country", "US")?;
//!
//! let client = TunnelClient::new(TunnelSettings::default());
//! let (response, _stream) = client.connect(&proxy, "api.ipify.org:443", &headers)?;
//! println!("{:?}", response.headers().get_str("X-ProxyMesh-IP"));
//! # Ok(())
//! # }
//! ```
#![deny(missing_debug_implementations)]

#[macro_use]
extern crate log;

mod error;
mod exchange;
mod happy;
mod parsing;
mod request;
mod streams;
mod tls;

pub mod config;
pub mod runner;
pub mod tunnel;

pub use crate::error::{Error, ErrorKind, InvalidResponseKind, Result};
pub use crate::exchange::HeaderExchangeRecord;
pub use crate::parsing::{HeaderList, Response};
pub use crate::streams::CancelToken;
pub use crate::tls::TlsStream;
pub use crate::tunnel::{ProxyEndpoint, ProxyHeaders, Scheme, TunnelClient, TunnelResponse, TunnelSettings, TunnelStream};
