//! Infrastructure layer: wire codec, DTOs and the in-memory registry.

pub mod codec;
pub mod dto;
pub mod registry;
