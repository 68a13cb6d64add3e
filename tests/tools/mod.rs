#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// A proxy which records the request heads it receives.
pub struct ScriptedProxy {
    port: u16,
    heads: mpsc::UnboundedReceiver<String>,
}

impl ScriptedProxy {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// The next request head received, up to and including the blank line.
    pub async fn next_request(&mut self) -> anyhow::Result<String> {
        self.heads
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("proxy stopped before receiving a request"))
    }
}

async fn bind_local() -> anyhow::Result<(TcpListener, u16)> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

async fn read_head<S>(stream: &mut S) -> anyhow::Result<String>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];

    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}

/// Start a proxy answering every connection with the same bytes, then closing it.
pub async fn start_scripted_proxy(response: impl Into<Vec<u8>>) -> anyhow::Result<ScriptedProxy> {
    let (listener, port) = bind_local().await?;
    let response = Arc::new(response.into());
    let (tx, heads) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            let response = response.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_scripted(stream, &response, tx).await {
                    eprintln!("scripted proxy: {}", err);
                }
            });
        }
    });

    Ok(ScriptedProxy { port, heads })
}

async fn serve_scripted(mut stream: TcpStream, response: &[u8], tx: mpsc::UnboundedSender<String>) -> anyhow::Result<()> {
    let _ = tx.send(read_head(&mut stream).await?);

    stream.write_all(response).await?;
    stream.shutdown().await?;

    // Wait for the client to hang up.
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
    Ok(())
}

/// Start a proxy answering CONNECT requests with `answer`, then relaying the tunnel to the
/// local `upstream` port.
pub async fn start_relay_proxy(answer: impl Into<Vec<u8>>, upstream: u16) -> anyhow::Result<ScriptedProxy> {
    let (listener, port) = bind_local().await?;
    let answer = Arc::new(answer.into());
    let (tx, heads) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            let answer = answer.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_relay(stream, &answer, upstream, tx).await {
                    eprintln!("relay proxy: {}", err);
                }
            });
        }
    });

    Ok(ScriptedProxy { port, heads })
}

async fn serve_relay(
    mut stream: TcpStream,
    answer: &[u8],
    upstream: u16,
    tx: mpsc::UnboundedSender<String>,
) -> anyhow::Result<()> {
    let _ = tx.send(read_head(&mut stream).await?);

    let mut target = TcpStream::connect(("127.0.0.1", upstream)).await?;
    stream.write_all(answer).await?;
    tokio::io::copy_bidirectional(&mut stream, &mut target).await?;
    Ok(())
}

/// Start a TLS server for `localhost` with a self-signed certificate. Every request gets
/// `response`, then the connection is closed.
pub async fn start_tls_server(response: impl Into<Vec<u8>>) -> anyhow::Result<u16> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_owned()])?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der()));
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(vec![cert.cert.der().clone()], key)?;
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let (listener, port) = bind_local().await?;
    let response = Arc::new(response.into());

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let response = response.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_tls(acceptor, stream, &response).await {
                    eprintln!("tls server: {}", err);
                }
            });
        }
    });

    Ok(port)
}

async fn serve_tls(acceptor: TlsAcceptor, stream: TcpStream, response: &[u8]) -> anyhow::Result<()> {
    let mut stream = acceptor.accept(stream).await?;
    read_head(&mut stream).await?;
    stream.write_all(response).await?;
    stream.shutdown().await?;
    Ok(())
}

/// A local port with nothing listening on it.
pub fn closed_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
