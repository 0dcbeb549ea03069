//! Envelope codec: domain `Envelope` <-> JSON text.
//!
//! `encode` is total. `decode` turns any peer input into either an envelope
//! or `DecodeError::InvalidPayload`; it never panics.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::{Envelope, ErrorCode, EventName, MessageContent, OpCode};

use super::dto::envelope::{EnvelopeDto, HandshakeData, MessageCreatedData};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl DecodeError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPayload(reason.into())
    }
}

/// Serialize an envelope to its canonical JSON text. Absent fields are omitted.
pub fn encode(envelope: &Envelope) -> String {
    let value = match envelope {
        Envelope::MessageCreated { content } => json!({
            "op": OpCode::Event.code(),
            "event": EventName::MessageCreated.as_str(),
            "data": { "content": content.as_str() },
        }),
        Envelope::Handshake { heartbeat } => json!({
            "op": OpCode::Handshake.code(),
            "data": { "heartbeat": duration_to_millis(*heartbeat) },
        }),
        Envelope::Heartbeat => json!({ "op": OpCode::Heartbeat.code() }),
        Envelope::HeartbeatAck => json!({ "op": OpCode::HeartbeatAck.code() }),
        Envelope::Error(code) => json!({ "error": code.code() }),
    };
    value.to_string()
}

/// Parse and validate an envelope from raw frame bytes.
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let dto: EnvelopeDto =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::invalid(e.to_string()))?;
    from_dto(dto)
}

/// Parse and validate an envelope from a text frame.
pub fn decode_str(text: &str) -> Result<Envelope, DecodeError> {
    decode(text.as_bytes())
}

fn from_dto(dto: EnvelopeDto) -> Result<Envelope, DecodeError> {
    match (dto.op, dto.error) {
        (Some(_), Some(_)) => Err(DecodeError::invalid("both op and error are set")),
        (None, None) => Err(DecodeError::invalid("missing op")),
        (None, Some(code)) => {
            reject_extras(&dto.event, &dto.data)?;
            let code = ErrorCode::try_from(code)
                .map_err(|code| DecodeError::invalid(format!("unknown error code {}", code)))?;
            Ok(Envelope::Error(code))
        }
        (Some(op), None) => {
            let op = OpCode::try_from(op)
                .map_err(|op| DecodeError::invalid(format!("unknown op {}", op)))?;
            match op {
                OpCode::Event => decode_event(dto.event, dto.data),
                OpCode::Handshake => {
                    reject_extras(&dto.event, &None)?;
                    let data: HandshakeData = payload(dto.data)?;
                    Ok(Envelope::Handshake {
                        heartbeat: Duration::from_millis(data.heartbeat),
                    })
                }
                OpCode::Heartbeat => {
                    reject_extras(&dto.event, &dto.data)?;
                    Ok(Envelope::Heartbeat)
                }
                OpCode::HeartbeatAck => {
                    reject_extras(&dto.event, &dto.data)?;
                    Ok(Envelope::HeartbeatAck)
                }
            }
        }
    }
}

fn decode_event(event: Option<String>, data: Option<Value>) -> Result<Envelope, DecodeError> {
    let name = event.ok_or_else(|| DecodeError::invalid("event envelope without event"))?;
    match EventName::parse(&name) {
        Some(EventName::MessageCreated) => {
            let data: MessageCreatedData = payload(data)?;
            let content = MessageContent::new(data.content)
                .map_err(|e| DecodeError::invalid(e.to_string()))?;
            Ok(Envelope::MessageCreated { content })
        }
        None => Err(DecodeError::invalid(format!("unknown event {}", name))),
    }
}

fn payload<T: serde::de::DeserializeOwned>(data: Option<Value>) -> Result<T, DecodeError> {
    let data = data.ok_or_else(|| DecodeError::invalid("missing data"))?;
    serde_json::from_value(data).map_err(|e| DecodeError::invalid(e.to_string()))
}

fn reject_extras(event: &Option<String>, data: &Option<Value>) -> Result<(), DecodeError> {
    if event.is_some() {
        return Err(DecodeError::invalid("unexpected event"));
    }
    if data.is_some() {
        return Err(DecodeError::invalid("unexpected data"));
    }
    Ok(())
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
