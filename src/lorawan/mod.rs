//! LoRaWAN message layer
//!
//! This module contains the frame-level protocol implementation, including:
//! - Data frame composition and decoding
//! - Over-the-air activation messages
//! - MAC command encoding
//! - Regional payload limits

/// Frame classification helpers
pub mod classify;

/// MAC command handling
pub mod commands;

/// Frame model and wire layout
pub mod frame;

/// Join-request and join-accept handling
pub mod join;

/// Data frame composition and decoding
pub mod mac;

/// Regional parameters
pub mod region;

pub use classify::{ack_request, ack_request_for, get_direction, max_payload_length, AckRequest};
pub use commands::{encode_commands, parse_commands, MacCommand};
pub use frame::{FCtrl, Frame, FrameHeader, MType, FHDR};
pub use join::{compose_join_request, decode_join_accept, CfList, JoinAccept, JoinMaterial, JoinRequest};
pub use mac::{MacError, Message, Result, STATUS_NO_ERROR};
pub use region::{DataRate, FrameFormat, Region};
