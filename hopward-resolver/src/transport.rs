use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// One-second ceiling on a single upstream exchange, wrapping the whole
/// connect/send/receive sequence regardless of transport.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(1);

/// Sends one assembled query to an upstream authority and returns the raw
/// response bytes, or `None` on any failure. Behind a trait (mirroring the
/// `Resolver`/`Handler` mock seam used elsewhere in this workspace) so the
/// referral-walking algorithm in `IterativeResolver` can be exercised
/// against canned responses instead of real sockets.
#[async_trait::async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn send(&self, query: &[u8], host: &str, port: u16, prefer_tcp: bool) -> Option<Vec<u8>>;
}

/// The real transport: UDP or TCP over actual sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTcpTransport;

#[async_trait::async_trait]
impl Transport for UdpTcpTransport {
    async fn send(&self, query: &[u8], host: &str, port: u16, prefer_tcp: bool) -> Option<Vec<u8>> {
        send(query, host, port, prefer_tcp).await
    }
}

/// Sends one assembled query to `(host, port)` and returns the raw response
/// bytes, or `None` on any failure (timeout, connect error, truncated
/// read). There are no retries at this layer; a `None` is the resolver's
/// signal to try the next authority.
pub async fn send(query: &[u8], host: &str, port: u16, prefer_tcp: bool) -> Option<Vec<u8>> {
    let addr = format!("{host}:{port}");
    let result = if prefer_tcp {
        tokio::time::timeout(UPSTREAM_TIMEOUT, send_tcp(query, &addr)).await
    } else {
        tokio::time::timeout(UPSTREAM_TIMEOUT, send_udp(query, &addr)).await
    };

    match result {
        Ok(Ok(bytes)) => Some(bytes),
        Ok(Err(err)) => {
            tracing::debug!(%err, host, port, "upstream exchange failed");
            None
        }
        Err(_) => {
            tracing::debug!(host, port, "upstream exchange timed out");
            None
        }
    }
}

async fn send_udp(query: &[u8], addr: &str) -> std::io::Result<Vec<u8>> {
    let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), 0));
    let socket = UdpSocket::bind(bind).await?;
    socket.send_to(query, addr).await?;

    let mut buf = vec![0u8; hopward_proto::buffer::MAX_MESSAGE_SIZE];
    let (size, _) = socket.recv_from(&mut buf).await?;
    buf.truncate(size);
    Ok(buf)
}

async fn send_tcp(query: &[u8], addr: &str) -> std::io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).await?;

    let len = u16::try_from(query.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "query too large"))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(query).await?;

    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let reply_len = u16::from_be_bytes(len_buf) as usize;

    let mut reply = vec![0u8; reply_len];
    stream.read_exact(&mut reply).await?;
    Ok(reply)
}
