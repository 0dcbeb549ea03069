//! Loose JSON shape of an envelope, before validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every envelope field is optional on the wire; the codec decides which
/// combinations are valid.
#[derive(Debug, Default, Deserialize)]
pub struct EnvelopeDto {
    pub op: Option<u8>,
    pub error: Option<u16>,
    pub event: Option<String>,
    pub data: Option<Value>,
}

/// `data` of a `MESSAGE_CREATED` event.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageCreatedData {
    pub content: String,
}

/// `data` of a handshake; heartbeat interval in milliseconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct HandshakeData {
    pub heartbeat: u64,
}
