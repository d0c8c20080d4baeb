//! Frame codec: every inbound Huobi frame is a gzip member holding one JSON
//! document; outbound requests are plain JSON text.

use std::io::Read;

use flate2::read::GzDecoder;
use hx_core::{DecodeError, EncodeError};

use super::protocol::SubscribeRequest;

/// Inflate one gzip-compressed frame payload.
///
/// Fails on an empty payload, a bad gzip header, or a truncated stream.
pub fn inflate(frame: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if frame.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut out = Vec::with_capacity(frame.len() * 4);
    GzDecoder::new(frame).read_to_end(&mut out)?;
    Ok(out)
}

/// Encode a subscribe request as a single JSON object.
pub fn encode_request(req: &SubscribeRequest) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(req)?)
}
