//! Tokio codec for newline-delimited JSON envelopes

use std::marker::PhantomData;

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Maximum encoded size of a single envelope, including the newline.
///
/// A single output chunk from a remote shell rarely exceeds a few
/// kilobytes; 1 MiB leaves room for pathological bursts while bounding
/// what a misbehaving peer can make us buffer.
pub const MAX_ENVELOPE_SIZE: usize = 1024 * 1024;

/// Codec framing one JSON value per line.
///
/// Both gateway request/response traffic and attached session streams
/// use this framing. `Tx` is what we encode, `Rx` what we decode; a
/// symmetric stream (the terminal envelope) uses the same type for
/// both.
#[derive(Debug)]
pub struct EnvelopeCodec<Tx, Rx = Tx> {
    /// How far we have scanned for a newline in previous calls
    scanned: usize,
    _marker: PhantomData<(Tx, Rx)>,
}

impl<Tx, Rx> EnvelopeCodec<Tx, Rx> {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            scanned: 0,
            _marker: PhantomData,
        }
    }
}

impl<Tx, Rx> Default for EnvelopeCodec<Tx, Rx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tx, Rx: DeserializeOwned> Decoder for EnvelopeCodec<Tx, Rx> {
    type Item = Rx;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src[self.scanned..].iter().position(|&b| b == b'\n');

        match newline {
            Some(offset) => {
                let end = self.scanned + offset;
                self.scanned = 0;

                let line = src.split_to(end + 1);
                let payload = &line[..line.len() - 1];

                let item: Rx = serde_json::from_slice(payload)?;
                Ok(Some(item))
            }
            None => {
                if src.len() > MAX_ENVELOPE_SIZE {
                    return Err(ProtocolError::MessageTooLarge {
                        size: src.len(),
                        max: MAX_ENVELOPE_SIZE,
                    });
                }
                // Remember how far we scanned so the next call only
                // inspects newly arrived bytes.
                self.scanned = src.len();
                Ok(None)
            }
        }
    }
}

impl<Tx: Serialize, Rx> Encoder<Tx> for EnvelopeCodec<Tx, Rx> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Tx, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&item)?;

        if payload.len() + 1 > MAX_ENVELOPE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len() + 1,
                max: MAX_ENVELOPE_SIZE,
            });
        }

        dst.reserve(payload.len() + 1);
        dst.extend_from_slice(&payload);
        dst.put_u8(b'\n');

        Ok(())
    }
}
