//! # Response Encoder
//!
//! Serialize an envelope to UTF-8 JSON followed by one newline, so peers can
//! frame responses either by line or by closing brace.

use bytes::{BufMut, Bytes, BytesMut};

use trk_common::{Envelope, RESPONSE_DELIMITER};

/// Encodes `envelope` with its trailing delimiter.
///
/// Fails only if the payload holds something JSON cannot represent, which
/// well-formed envelopes never do.
pub fn encode(envelope: &Envelope) -> Result<Bytes, serde_json::Error> {
    let mut buf = BytesMut::with_capacity(128).writer();
    serde_json::to_writer(&mut buf, envelope)?;
    let mut buf = buf.into_inner();
    buf.put_u8(RESPONSE_DELIMITER);
    Ok(buf.freeze())
}
