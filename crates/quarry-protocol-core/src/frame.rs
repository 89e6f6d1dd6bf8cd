//! Length-prefixed frames with optional zlib compression.
//!
//! ```text
//! uncompressed: varint(len) | varint(id) payload
//! compressed:   varint(len) | varint(data_len) | data_len == 0 ? raw body : zlib(body)
//! ```

use crate::codec::{peek_varint, read_varint, varint_len, write_varint, CodecError};
use bytes::{Buf, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};
use thiserror::Error;

/// Vanilla's limit on a frame, and on a decompressed body.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1 << 21;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Packet too large: {size} > {max}")]
    PacketTooLarge { size: usize, max: usize },
    #[error("Frame length VarInt too long")]
    VarIntTooLong,
    #[error("Invalid frame length {0}")]
    InvalidLength(i32),
    #[error("Bad compression: {0}")]
    BadCompression(String),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stateful frame encoder/decoder for one direction of a connection.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    threshold: i32,
    max_packet_size: usize,
    skip_remaining: usize,
}

impl FrameCodec {
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            threshold: -1,
            max_packet_size,
            skip_remaining: 0,
        }
    }

    /// Negative disables compression.
    pub fn set_compression(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    pub fn compression_threshold(&self) -> i32 {
        self.threshold
    }

    pub fn compression_enabled(&self) -> bool {
        self.threshold >= 0
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Frame `body` (`varint(id) | payload`) into `dst`.
    pub fn encode(&self, body: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
        if !self.compression_enabled() {
            write_varint(dst, body.len() as i32);
            dst.extend_from_slice(body);
            return Ok(());
        }

        let uncompressed_len = body.len() as i32;
        if uncompressed_len >= self.threshold {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(body)?;
            let compressed = encoder.finish()?;

            let total_length = varint_len(uncompressed_len) + compressed.len();
            write_varint(dst, total_length as i32);
            write_varint(dst, uncompressed_len);
            dst.extend_from_slice(&compressed);
        } else {
            write_varint(dst, 1 + body.len() as i32);
            write_varint(dst, 0);
            dst.extend_from_slice(body);
        }
        Ok(())
    }

    /// Take one complete frame off the front of `src`, returning its body.
    ///
    /// `Ok(None)` means more bytes are needed; `src` is left untouched apart
    /// from any oversized frame still being skipped. After `PacketTooLarge`
    /// the declared bytes are discarded as they arrive.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, FrameError> {
        if self.skip_remaining > 0 {
            let n = self.skip_remaining.min(src.len());
            src.advance(n);
            self.skip_remaining -= n;
            if self.skip_remaining > 0 {
                return Ok(None);
            }
        }

        let (length, header) = match peek_varint(src) {
            Ok(Some(v)) => v,
            Ok(None) => return Ok(None),
            Err(_) => return Err(FrameError::VarIntTooLong),
        };
        if length < 0 {
            return Err(FrameError::InvalidLength(length));
        }
        let length = length as usize;

        if length > self.max_packet_size {
            src.advance(header);
            let n = length.min(src.len());
            src.advance(n);
            self.skip_remaining = length - n;
            return Err(FrameError::PacketTooLarge {
                size: length,
                max: self.max_packet_size,
            });
        }

        if src.len() < header + length {
            src.reserve(header + length - src.len());
            return Ok(None);
        }

        src.advance(header);
        let mut frame = src.split_to(length);

        if self.compression_enabled() {
            let data_length = read_varint(&mut frame)?;
            if data_length < 0 {
                return Err(FrameError::BadCompression(format!(
                    "negative data length {}",
                    data_length
                )));
            }
            if data_length > 0 {
                if data_length < self.threshold {
                    return Err(FrameError::BadCompression(format!(
                        "data length {} below threshold {}",
                        data_length, self.threshold
                    )));
                }
                let data_length = data_length as usize;
                if data_length > self.max_packet_size {
                    return Err(FrameError::PacketTooLarge {
                        size: data_length,
                        max: self.max_packet_size,
                    });
                }
                let mut decompressed = vec![0u8; data_length];
                let mut decoder = ZlibDecoder::new(&frame[..]);
                decoder
                    .read_exact(&mut decompressed)
                    .map_err(|e| FrameError::BadCompression(e.to_string()))?;
                let mut extra = [0u8; 1];
                match decoder.read(&mut extra) {
                    Ok(0) => {}
                    Ok(_) => {
                        return Err(FrameError::BadCompression(format!(
                            "inflates past data length {}",
                            data_length
                        )))
                    }
                    Err(e) => return Err(FrameError::BadCompression(e.to_string())),
                }
                frame = BytesMut::from(&decompressed[..]);
            }
        }

        Ok(Some(frame))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKET_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn body(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 7) as u8).collect()
    }

    #[test]
    fn test_uncompressed_roundtrip() {
        let mut codec = FrameCodec::default();
        let payload = b"\x00hello frame".to_vec();
        let mut buf = BytesMut::new();
        codec.encode(&payload, &mut buf).unwrap();
        assert_eq!(buf[0] as usize, payload.len());

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &payload[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_compression_threshold_boundary() {
        let mut codec = FrameCodec::default();
        codec.set_compression(64);

        // Below threshold: raw with data length 0
        let small = body(63);
        let mut buf = BytesMut::new();
        codec.encode(&small, &mut buf).unwrap();
        let (frame_len, header) = peek_varint(&buf).unwrap().unwrap();
        assert_eq!(frame_len, 64);
        assert_eq!(buf[header], 0);
        assert_eq!(&buf[header + 1..], &small[..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &small[..]);

        // Above threshold: zlib with the uncompressed length up front
        let large = body(65);
        let mut buf = BytesMut::new();
        codec.encode(&large, &mut buf).unwrap();
        let (_, header) = peek_varint(&buf).unwrap().unwrap();
        assert_eq!(buf[header], 65);
        assert_eq!(buf[header + 1], 0x78);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &large[..]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut codec = FrameCodec::default();
        codec.set_compression(64);
        let mut buf = BytesMut::new();
        codec.encode(&body(64), &mut buf).unwrap();
        let (_, header) = peek_varint(&buf).unwrap().unwrap();
        assert_eq!(buf[header], 64);
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut codec = FrameCodec::default();
        let mut full = BytesMut::new();
        codec.encode(&body(300), &mut full).unwrap();

        let mut src = BytesMut::from(&full[..1]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), 1);

        src.extend_from_slice(&full[1..100]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), 100);

        src.extend_from_slice(&full[100..]);
        assert_eq!(codec.decode(&mut src).unwrap().unwrap().len(), 300);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut codec = FrameCodec::default();
        codec.set_compression(16);
        let mut buf = BytesMut::new();
        codec.encode(&body(4), &mut buf).unwrap();
        codec.encode(&body(40), &mut buf).unwrap();
        codec.encode(&body(2), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 4);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 40);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 2);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_too_large_frame_is_skipped() {
        let writer = FrameCodec::default();
        let mut src = BytesMut::new();
        writer.encode(&body(100), &mut src).unwrap();
        writer.encode(&[0x21, 0x01], &mut src).unwrap();

        let mut reader = FrameCodec::new(50);
        match reader.decode(&mut src) {
            Err(FrameError::PacketTooLarge { size, max }) => {
                assert_eq!(size, 100);
                assert_eq!(max, 50);
            }
            other => panic!("expected PacketTooLarge, got {:?}", other),
        }
        assert_eq!(&reader.decode(&mut src).unwrap().unwrap()[..], &[0x21, 0x01]);
    }

    #[test]
    fn test_too_large_frame_skipped_across_reads() {
        let writer = FrameCodec::default();
        let mut full = BytesMut::new();
        writer.encode(&body(100), &mut full).unwrap();
        writer.encode(&[0x05], &mut full).unwrap();

        let mut reader = FrameCodec::new(50);
        let mut src = BytesMut::from(&full[..30]);
        assert!(reader.decode(&mut src).is_err());
        assert!(src.is_empty());

        src.extend_from_slice(&full[30..]);
        assert_eq!(&reader.decode(&mut src).unwrap().unwrap()[..], &[0x05]);
    }

    #[test]
    fn test_bad_length_prefixes() {
        let mut codec = FrameCodec::default();
        let mut src = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01][..]);
        assert!(matches!(codec.decode(&mut src), Err(FrameError::VarIntTooLong)));

        let mut src = BytesMut::new();
        write_varint(&mut src, -1);
        assert!(matches!(
            codec.decode(&mut src),
            Err(FrameError::InvalidLength(-1))
        ));
    }

    #[test]
    fn test_corrupt_zlib_body() {
        let mut codec = FrameCodec::default();
        codec.set_compression(0);
        let mut src = BytesMut::new();
        write_varint(&mut src, 4);
        write_varint(&mut src, 10);
        src.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            codec.decode(&mut src),
            Err(FrameError::BadCompression(_))
        ));
    }

    fn compressed_frame(data_length: i32, body: &[u8]) -> BytesMut {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        let compressed = encoder.finish().unwrap();
        let mut src = BytesMut::new();
        write_varint(&mut src, (varint_len(data_length) + compressed.len()) as i32);
        write_varint(&mut src, data_length);
        src.extend_from_slice(&compressed);
        src
    }

    #[test]
    fn test_compressed_below_threshold_rejected() {
        let mut codec = FrameCodec::default();
        codec.set_compression(64);
        let mut src = compressed_frame(10, &body(10));
        assert!(matches!(
            codec.decode(&mut src),
            Err(FrameError::BadCompression(_))
        ));
    }

    #[test]
    fn test_inflating_past_data_length_rejected() {
        let mut codec = FrameCodec::default();
        codec.set_compression(8);
        let mut src = compressed_frame(10, &body(20));
        assert!(matches!(
            codec.decode(&mut src),
            Err(FrameError::BadCompression(_))
        ));

        // Exact length still decodes
        let mut src = compressed_frame(20, &body(20));
        assert_eq!(&codec.decode(&mut src).unwrap().unwrap()[..], &body(20)[..]);
    }

    proptest! {
        #[test]
        fn test_roundtrip_any_threshold(
            payload in proptest::collection::vec(any::<u8>(), 1..600),
            threshold in -1i32..300,
        ) {
            let mut codec = FrameCodec::default();
            codec.set_compression(threshold);
            let mut buf = BytesMut::new();
            codec.encode(&payload, &mut buf).unwrap();
            let frame = codec.decode(&mut buf).unwrap().unwrap();
            prop_assert_eq!(&frame[..], &payload[..]);
            prop_assert!(buf.is_empty());
        }
    }
}
