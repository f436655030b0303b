use std::net::SocketAddr;

use hopward_proto::buffer::MAX_MESSAGE_SIZE;

/// One inbound UDP datagram, buffer-sized to the largest message this core
/// accepts and carrying the address to reply to.
pub struct Message {
    pub address: SocketAddr,
    pub buffer: [u8; MAX_MESSAGE_SIZE],
    pub size: usize,
}

/// Implemented by whatever turns raw request bytes into raw response bytes.
/// Transport-agnostic: both the UDP and TCP front-ends call `handle` with
/// the unframed message body and write back whatever comes out, or drop the
/// request silently on `None`.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &[u8]) -> Option<Vec<u8>>;
}
