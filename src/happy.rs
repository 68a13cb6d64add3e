use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const RACE_DELAY: Duration = Duration::from_millis(200);

/// Connect to the first reachable address of `addrs`, racing attempts in the spirit of the
/// happy eyeballs RFC.
///
/// Addresses are tried alternating IPv6 and IPv4, a new attempt starting every 200ms while the
/// previous ones are still pending. Each attempt is limited to `timeout`, and no attempt is
/// started or awaited past `deadline`.
pub fn connect<A>(addrs: A, timeout: Duration, deadline: Option<Instant>) -> io::Result<TcpStream>
where
    A: ToSocketAddrs,
{
    let addrs = interleave(addrs.to_socket_addrs()?.collect());
    let timeout = match deadline {
        Some(deadline) => timeout.min(remaining(deadline)?),
        None => timeout,
    };

    if let [addr] = &addrs[..] {
        debug!("single address {}, connecting directly", addr);
        return TcpStream::connect_timeout(addr, timeout);
    }

    let (tx, rx) = channel();
    let mut first_err = None;
    let start = Instant::now();

    for addr in addrs {
        let tx = tx.clone();
        thread::spawn(move || {
            debug!("trying to connect to {}", addr);
            let _ = tx.send((addr, TcpStream::connect_timeout(&addr, timeout)));
        });

        match rx.recv_timeout(RACE_DELAY) {
            Ok((addr, Ok(sock))) => {
                debug!("connected to {}, took {}ms", addr, start.elapsed().as_millis());
                return Ok(sock);
            }
            Ok((addr, Err(err))) => {
                debug!("connection error: {} addr={}", err, addr);
                first_err.get_or_insert(err);
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(deadline) = deadline {
                    remaining(deadline)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Dropping our sender lets the channel disconnect once every pending attempt is done.
    drop(tx);

    loop {
        let next = match deadline {
            Some(deadline) => rx
                .recv_timeout(remaining(deadline)?)
                .map_err(|err| matches!(err, RecvTimeoutError::Timeout)),
            None => rx.recv().map_err(|_| false),
        };

        match next {
            Ok((addr, Ok(sock))) => {
                debug!("connected to {}, took {}ms", addr, start.elapsed().as_millis());
                return Ok(sock);
            }
            Ok((addr, Err(err))) => {
                debug!("connection error: {} addr={}", err, addr);
                first_err.get_or_insert(err);
            }
            Err(true) => return Err(io::ErrorKind::TimedOut.into()),
            Err(false) => break,
        }
    }

    debug!(
        "could not connect to any address, took {}ms",
        start.elapsed().as_millis()
    );

    Err(first_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address resolved")))
}

fn remaining(deadline: Instant) -> io::Result<Duration> {
    let now = Instant::now();
    if now >= deadline {
        Err(io::ErrorKind::TimedOut.into())
    } else {
        Ok(deadline - now)
    }
}

/// Order addresses IPv6 first, alternating with IPv4 while both families remain.
fn interleave(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let (v6, v4): (Vec<_>, Vec<_>) = addrs.into_iter().partition(|a| a.is_ipv6());
    let mut out = Vec::with_capacity(v6.len() + v4.len());
    let mut v6 = v6.into_iter();
    let mut v4 = v4.into_iter();

    loop {
        match (v6.next(), v4.next()) {
            (None, None) => return out,
            (a, b) => out.extend(a.into_iter().chain(b)),
        }
    }
}
