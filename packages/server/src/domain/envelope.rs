//! The opcode-tagged envelope exchanged over every connection.
//!
//! | Op | Name          | Direction | Payload                 |
//! |----|---------------|-----------|-------------------------|
//! | 0  | Event         | S→C       | `event` + `{content}`   |
//! | 1  | Handshake     | S→C       | `{heartbeat}` (ms)      |
//! | 10 | Heartbeat     | C→S       | none                    |
//! | 11 | Heartbeat ACK | S→C       | none                    |
//!
//! Error envelopes carry `error` instead of `op`; `4000` is the only code.

use std::time::Duration;

use super::message::MessageContent;

/// Opcode selecting an envelope's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Event = 0,
    Handshake = 1,
    Heartbeat = 10,
    HeartbeatAck = 11,
}

impl OpCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Event),
            1 => Ok(Self::Handshake),
            10 => Ok(Self::Heartbeat),
            11 => Ok(Self::HeartbeatAck),
            other => Err(other),
        }
    }
}

/// Error tag carried by error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    /// Malformed JSON or an opcode the server does not accept.
    InvalidPayload = 4000,
}

impl ErrorCode {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            4000 => Ok(Self::InvalidPayload),
            other => Err(other),
        }
    }
}

/// Domain event names carried by `op=0` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventName {
    MessageCreated,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreated => "MESSAGE_CREATED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MESSAGE_CREATED" => Some(Self::MessageCreated),
            _ => None,
        }
    }
}

/// A well-formed envelope.
///
/// Each variant fixes its opcode, event and payload shape, so an envelope can
/// never carry both an `op` and an `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// `{op:0, event:"MESSAGE_CREATED", data:{content}}`
    MessageCreated { content: MessageContent },
    /// `{op:1, data:{heartbeat}}`
    Handshake { heartbeat: Duration },
    /// `{op:10}`
    Heartbeat,
    /// `{op:11}`
    HeartbeatAck,
    /// `{error:code}`
    Error(ErrorCode),
}

impl Envelope {
    pub fn op(&self) -> Option<OpCode> {
        match self {
            Self::MessageCreated { .. } => Some(OpCode::Event),
            Self::Handshake { .. } => Some(OpCode::Handshake),
            Self::Heartbeat => Some(OpCode::Heartbeat),
            Self::HeartbeatAck => Some(OpCode::HeartbeatAck),
            Self::Error(_) => None,
        }
    }

    pub fn event(&self) -> Option<EventName> {
        match self {
            Self::MessageCreated { .. } => Some(EventName::MessageCreated),
            _ => None,
        }
    }

    pub fn invalid_payload() -> Self {
        Self::Error(ErrorCode::InvalidPayload)
    }
}
