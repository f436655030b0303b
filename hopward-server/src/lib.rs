use std::net::SocketAddr;
use std::sync::Arc;

use futures::stream::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::Semaphore;

use prelude::{Handler, Message};

pub mod handler;
pub mod prelude;
pub mod receiver;
pub mod sender;

/// Ceiling on a single framed TCP DNS message, per RFC 1035's 16-bit length
/// prefix.
const MAX_TCP_MESSAGE: usize = u16::MAX as usize;

/// Listens on UDP, dispatching each inbound datagram through `handler`
/// bounded by `buffer_unordered(max_threads)` — the async analogue of a
/// bounded worker pool driving a receive/handle/send pipeline.
pub struct UdpServer<H> {
    address: SocketAddr,
    handler: Arc<H>,
    max_threads: usize,
}

impl<H: Handler + 'static> UdpServer<H> {
    pub fn new(address: SocketAddr, handler: Arc<H>, max_threads: usize) -> Self {
        Self {
            address,
            handler,
            max_threads,
        }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let socket = UdpSocket::bind(self.address).await?;
        let socket = Arc::new(socket);
        tracing::info!(address = ?self.address, "listening on udp");

        let incoming = receiver::Receiver::new(socket.clone());
        let sender = sender::Sender::new(socket);

        let handler = self.handler.clone();
        let stream = incoming.into_stream().map(|message| {
            let handler = handler.clone();
            async move {
                let Message {
                    address,
                    buffer,
                    size,
                } = message;
                let response = handler.handle(&buffer[..size]).await;
                response.map(|bytes| (address, bytes))
            }
        });

        tokio::pin!(stream);
        let mut stream = stream.buffer_unordered(self.max_threads);

        while let Some(item) = stream.next().await {
            if let Some((address, bytes)) = item {
                if let Err(error) = sender.send(address, &bytes).await {
                    tracing::error!(?address, ?error, "couldn't send response");
                }
            }
        }

        Ok(())
    }
}

/// Listens on TCP, accepting connections and handling each one's single
/// length-prefixed request/response exchange on its own task, bounded by a
/// semaphore sized `max_threads` so TCP and UDP share the same concurrency
/// budget in spirit.
pub struct TcpServer<H> {
    address: SocketAddr,
    handler: Arc<H>,
    limiter: Arc<Semaphore>,
}

impl<H: Handler + 'static> TcpServer<H> {
    pub fn new(address: SocketAddr, handler: Arc<H>, max_threads: usize) -> Self {
        Self {
            address,
            handler,
            limiter: Arc::new(Semaphore::new(max_threads)),
        }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.address).await?;
        tracing::info!(address = ?self.address, "listening on tcp");

        loop {
            let (stream, peer) = listener.accept().await?;
            let handler = self.handler.clone();
            let permit = self.limiter.clone().acquire_owned().await;

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(error) = handle_tcp_connection(stream, handler.as_ref()).await {
                    tracing::debug!(?peer, ?error, "tcp connection closed with error");
                }
            });
        }
    }
}

async fn handle_tcp_connection<H: Handler>(
    mut stream: tokio::net::TcpStream,
    handler: &H,
) -> std::io::Result<()> {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = u16::from_be_bytes(len_buf) as usize;
    if len > MAX_TCP_MESSAGE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "framed message too large",
        ));
    }

    let mut request = vec![0u8; len];
    stream.read_exact(&mut request).await?;

    let Some(response) = handler.handle(&request).await else {
        return Ok(());
    };

    let response_len = u16::try_from(response.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "response too large"))?;
    stream.write_all(&response_len.to_be_bytes()).await?;
    stream.write_all(&response).await?;
    Ok(())
}

/// Spawns the background task that ticks once a second and sweeps expired
/// cache entries, matching the original's hard-coded `time.sleep(1)`
/// maintenance loop.
pub fn spawn_cache_sweep(cache: Arc<hopward_cache::Cache>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            interval.tick().await;
            cache.sweep();
        }
    })
}
