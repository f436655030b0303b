pub mod reader;
pub mod writer;

pub use reader::ReaderError;
pub use writer::WriterError;

/// Messages accepted by this core are capped at 8192 bytes, well above a
/// single UDP datagram and generous for a TCP-framed answer.
pub const MAX_MESSAGE_SIZE: usize = 8192;

pub struct BytePacketBuffer {
    pub buf: [u8; MAX_MESSAGE_SIZE],
    pos: usize,
}

impl Default for BytePacketBuffer {
    /// This gives us a fresh buffer for holding the packet contents, and a
    /// field for keeping track of where we are.
    fn default() -> Self {
        BytePacketBuffer {
            buf: [0; MAX_MESSAGE_SIZE],
            pos: 0,
        }
    }
}

impl Clone for BytePacketBuffer {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf,
            pos: self.pos,
        }
    }
}

impl std::fmt::Debug for BytePacketBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BytePacketBuffer")
            .field("pos", &self.pos)
            .finish()
    }
}

impl BytePacketBuffer {
    /// Builds a buffer from bytes already received off the wire.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReaderError> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(ReaderError::EndOfBuffer);
        }
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        buf[..data.len()].copy_from_slice(data);
        Ok(Self { buf, pos: 0 })
    }

    /// Current position within buffer
    pub fn pos(&self) -> usize {
        self.pos
    }
}
