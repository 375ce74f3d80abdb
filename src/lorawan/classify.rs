//! Stateless queries over frames and raw MAC headers.
//!
//! Raw-header queries never fail: an MHDR that does not parse (wrong major
//! version) classifies as uplink and as not needing an acknowledgement.

use super::frame::{Frame, MType};
use crate::config::session::SessionContext;
use crate::crypto::Direction;

/// Acknowledgement requirement of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckRequest {
    /// No acknowledgement expected
    WithoutAck,
    /// Receiver must acknowledge
    WithAck,
}

/// Acknowledgement requirement of a decoded frame
pub fn ack_request(frame: &Frame) -> AckRequest {
    frame.ack_request()
}

/// Acknowledgement requirement for a raw MAC header byte
pub fn ack_request_for(mhdr: u8) -> AckRequest {
    MType::from_mhdr(mhdr).map_or(AckRequest::WithoutAck, MType::ack_request)
}

/// Direction for a raw MAC header byte
pub fn get_direction(mhdr: u8) -> Direction {
    MType::from_mhdr(mhdr).map_or(Direction::Up, MType::direction)
}

/// Maximum user payload length for the context's frame format, 0 when unset
pub fn max_payload_length(ctx: &SessionContext) -> usize {
    ctx.max_payload_length()
}
