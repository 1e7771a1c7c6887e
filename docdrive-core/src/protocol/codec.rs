//! Codec implementation for framing queries and replies.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::header::{HEADER_SIZE, MAX_MESSAGE_SIZE};
use super::{Query, Reply};
use crate::error::{DriverError, Result};

/// Codec that writes queries and reads replies.
///
/// Implements the `tokio_util::codec::{Encoder, Decoder}` traits for use
/// with tokio's framed I/O. Frames are delimited by the leading
/// message-length field of the header.
#[derive(Debug, Default)]
pub struct WireCodec {
    _private: (),
}

impl WireCodec {
    /// Creates a new codec instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder<Query> for WireCodec {
    type Error = DriverError;

    fn encode(&mut self, item: Query, dst: &mut BytesMut) -> Result<()> {
        let message = item.encode()?;
        dst.extend_from_slice(&message);
        Ok(())
    }
}

impl Decoder for WireCodec {
    type Item = Reply;
    type Error = DriverError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(length) = frame_length(src)? else {
            return Ok(None);
        };
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }
        let frame = src.split_to(length);
        Reply::decode(&frame).map(Some)
    }
}

/// Reads the declared length of the next frame without consuming it.
fn frame_length(src: &BytesMut) -> Result<Option<usize>> {
    if src.len() < 4 {
        return Ok(None);
    }
    let length = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    if length < HEADER_SIZE as i32 || length as usize > MAX_MESSAGE_SIZE {
        return Err(DriverError::Protocol(format!(
            "invalid message length {}",
            length
        )));
    }
    Ok(Some(length as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_decode_partial_then_complete() {
        let reply = Reply::new(3, vec![doc! { "ok" => 1.0f64 }]);
        let bytes = reply.encode().unwrap();

        let mut codec = WireCodec::new();
        let mut buf = BytesMut::from(&bytes[..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&bytes[10..]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, reply);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_two_frames() {
        let first = Reply::new(1, Vec::new());
        let second = Reply::new(2, vec![doc! { "n" => 2i32 }]);

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first.encode().unwrap());
        buf.extend_from_slice(&second.encode().unwrap());

        let mut codec = WireCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), first);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), second);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_length() {
        let mut codec = WireCodec::new();
        let mut buf = BytesMut::from(&[0x02, 0x00, 0x00, 0x00, 0x00][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(DriverError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_query() {
        let query = Query::new("db", "c", doc! { "x" => 1i32 });
        let expected = query.encode().unwrap();

        let mut codec = WireCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(query, &mut dst).unwrap();
        assert_eq!(dst, expected);
    }
}
