//! Async framed halves of a connection. Each half owns its frame codec and,
//! once enabled, its cipher; the cipher wraps the raw byte stream including
//! length prefixes.

use crate::cipher::{Decryptor, Encryptor};
use crate::frame::{FrameCodec, FrameError};
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

const READ_CHUNK: usize = 4096;

pub struct FramedReader<R> {
    inner: R,
    read_buf: BytesMut,
    codec: FrameCodec,
    decryptor: Option<Decryptor>,
}

impl<R: AsyncRead + Unpin> FramedReader<R> {
    pub fn new(inner: R, max_packet_size: usize) -> Self {
        Self {
            inner,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            codec: FrameCodec::new(max_packet_size),
            decryptor: None,
        }
    }

    /// Read the next frame body (`varint(id) | payload`).
    ///
    /// Returns `Ok(None)` on a clean end of stream at a frame boundary.
    /// Cancel safe: dropping the future never loses bytes.
    pub async fn read_frame(&mut self) -> Result<Option<BytesMut>, FrameError> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.read_buf)? {
                trace!("Read frame len={}", frame.len());
                return Ok(Some(frame));
            }
            self.read_buf.reserve(READ_CHUNK);
            let start = self.read_buf.len();
            let n = self.inner.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream ended inside a frame",
                )));
            }
            if let Some(ref mut decryptor) = self.decryptor {
                decryptor.apply(&mut self.read_buf[start..]);
            }
        }
    }

    /// Start decrypting. Bytes already buffered but not yet framed arrived
    /// after the last plaintext frame and are deciphered in place.
    pub fn enable_decryption(&mut self, mut decryptor: Decryptor) {
        decryptor.apply(&mut self.read_buf[..]);
        self.decryptor = Some(decryptor);
    }

    pub fn is_encrypted(&self) -> bool {
        self.decryptor.is_some()
    }

    pub fn set_compression(&mut self, threshold: i32) {
        self.codec.set_compression(threshold);
    }

    pub fn compression_threshold(&self) -> i32 {
        self.codec.compression_threshold()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}

pub struct FramedWriter<W> {
    inner: W,
    write_buf: BytesMut,
    codec: FrameCodec,
    encryptor: Option<Encryptor>,
}

impl<W: AsyncWrite + Unpin> FramedWriter<W> {
    pub fn new(inner: W, max_packet_size: usize) -> Self {
        Self {
            inner,
            write_buf: BytesMut::with_capacity(READ_CHUNK),
            codec: FrameCodec::new(max_packet_size),
            encryptor: None,
        }
    }

    /// Frame, encrypt and flush one body.
    pub async fn write_frame(&mut self, body: &[u8]) -> Result<(), FrameError> {
        self.write_buf.clear();
        self.codec.encode(body, &mut self.write_buf)?;
        if let Some(ref mut enc) = self.encryptor {
            enc.apply(&mut self.write_buf[..]);
        }
        self.inner.write_all(&self.write_buf).await?;
        self.inner.flush().await?;
        trace!("Wrote frame len={}", body.len());
        Ok(())
    }

    /// Every byte written after this call is enciphered.
    pub fn enable_encryption(&mut self, encryptor: Encryptor) {
        self.encryptor = Some(encryptor);
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryptor.is_some()
    }

    pub fn set_compression(&mut self, threshold: i32) {
        self.codec.set_compression(threshold);
    }

    pub fn compression_threshold(&self) -> i32 {
        self.codec.compression_threshold()
    }

    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.inner.shutdown().await
    }
}
