//! Frame model and wire layout
//!
//! ```text
//! MHDR(1) | DevAddr(4,LE) | FCtrl(1) | FCnt(2,LE) | FOpts(0..15) | [FPort(1) | FRMPayload(N)] | MIC(4)
//! ```

use core::fmt;

use heapless::Vec;

use super::classify::AckRequest;
use super::mac::MacError;
use crate::config::device::DevAddr;
use crate::crypto::{Direction, Mic, MIC_SIZE};

/// Largest PHY payload a LoRa radio carries
pub const MAX_PHY_PAYLOAD_SIZE: usize = 255;

/// Maximum FOpts length
pub const MAX_FOPTS_LEN: usize = 15;

/// MHDR + DevAddr + FCtrl + FCnt
pub const DATA_HEADER_SIZE: usize = 8;

/// Shortest valid data frame: header and MIC, no options, no port
pub const MIN_DATA_FRAME_SIZE: usize = DATA_HEADER_SIZE + MIC_SIZE;

/// Maximum FRMPayload size that fits a PHY payload
pub const MAX_MAC_PAYLOAD_SIZE: usize = MAX_PHY_PAYLOAD_SIZE - DATA_HEADER_SIZE - 1 - MIC_SIZE;

/// Serialized frame buffer
pub type PhyPayload = Vec<u8, MAX_PHY_PAYLOAD_SIZE>;

/// Frame options buffer
pub type FOpts = Vec<u8, MAX_FOPTS_LEN>;

/// Frame payload buffer
pub type FrmPayload = Vec<u8, MAX_MAC_PAYLOAD_SIZE>;

const MAJOR_MASK: u8 = 0x03;
const MAJOR_LORAWAN_R1: u8 = 0x00;

/// MAC header types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MType {
    /// Join request (uplink)
    JoinRequest = 0x00,
    /// Join accept (downlink)
    JoinAccept = 0x20,
    /// Unconfirmed data uplink
    UnconfirmedDataUp = 0x40,
    /// Unconfirmed data downlink
    UnconfirmedDataDown = 0x60,
    /// Confirmed data uplink
    ConfirmedDataUp = 0x80,
    /// Confirmed data downlink
    ConfirmedDataDown = 0xA0,
    /// Rejoin request (uplink)
    RejoinRequest = 0xC0,
    /// Proprietary frame
    Proprietary = 0xE0,
}

impl MType {
    /// Parse a MAC header byte.
    ///
    /// Fails with [`MacError::Header`] for a major version other than LoRaWAN R1.
    pub fn from_mhdr(mhdr: u8) -> Result<Self, MacError> {
        if mhdr & MAJOR_MASK != MAJOR_LORAWAN_R1 {
            return Err(MacError::Header);
        }
        let mtype = match mhdr & 0xE0 {
            0x00 => MType::JoinRequest,
            0x20 => MType::JoinAccept,
            0x40 => MType::UnconfirmedDataUp,
            0x60 => MType::UnconfirmedDataDown,
            0x80 => MType::ConfirmedDataUp,
            0xA0 => MType::ConfirmedDataDown,
            0xC0 => MType::RejoinRequest,
            _ => MType::Proprietary,
        };
        Ok(mtype)
    }

    /// MAC header byte (major version R1, RFU bits clear)
    pub fn mhdr(self) -> u8 {
        self as u8 | MAJOR_LORAWAN_R1
    }

    /// Transmission direction of this frame type
    pub fn direction(self) -> Direction {
        match self {
            MType::JoinAccept | MType::UnconfirmedDataDown | MType::ConfirmedDataDown => Direction::Down,
            MType::JoinRequest
            | MType::UnconfirmedDataUp
            | MType::ConfirmedDataUp
            | MType::RejoinRequest
            | MType::Proprietary => Direction::Up,
        }
    }

    /// Whether the receiver must acknowledge this frame type
    pub fn ack_request(self) -> AckRequest {
        match self {
            MType::ConfirmedDataUp | MType::ConfirmedDataDown => AckRequest::WithAck,
            MType::JoinRequest
            | MType::JoinAccept
            | MType::UnconfirmedDataUp
            | MType::UnconfirmedDataDown
            | MType::RejoinRequest
            | MType::Proprietary => AckRequest::WithoutAck,
        }
    }

    /// Whether this type uses the data frame layout
    pub fn is_data(self) -> bool {
        matches!(
            self,
            MType::UnconfirmedDataUp | MType::UnconfirmedDataDown | MType::ConfirmedDataUp | MType::ConfirmedDataDown
        )
    }
}

impl fmt::Display for MType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MType::JoinRequest => "JoinRequest",
            MType::JoinAccept => "JoinAccept",
            MType::UnconfirmedDataUp => "UnconfirmedDataUp",
            MType::UnconfirmedDataDown => "UnconfirmedDataDown",
            MType::ConfirmedDataUp => "ConfirmedDataUp",
            MType::ConfirmedDataDown => "ConfirmedDataDown",
            MType::RejoinRequest => "RejoinRequest",
            MType::Proprietary => "Proprietary",
        };
        f.write_str(name)
    }
}

/// Frame header flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FCtrl {
    /// Adaptive data rate enabled
    pub adr: bool,
    /// ADR acknowledgement request (uplink only)
    pub adr_ack_req: bool,
    /// Acknowledges the last confirmed frame
    pub ack: bool,
    /// More data pending (downlink) / class B enabled (uplink)
    pub f_pending: bool,
    /// Length of FOpts, 0-15
    pub f_opts_len: u8,
}

impl FCtrl {
    /// Pack into the FCtrl byte
    pub fn to_byte(&self) -> u8 {
        let mut byte = self.f_opts_len & 0x0F;
        if self.adr {
            byte |= 0x80;
        }
        if self.adr_ack_req {
            byte |= 0x40;
        }
        if self.ack {
            byte |= 0x20;
        }
        if self.f_pending {
            byte |= 0x10;
        }
        byte
    }

    /// Unpack the FCtrl byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            adr: (byte & 0x80) != 0,
            adr_ack_req: (byte & 0x40) != 0,
            ack: (byte & 0x20) != 0,
            f_pending: (byte & 0x10) != 0,
            f_opts_len: byte & 0x0F,
        }
    }
}

/// Frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FHDR {
    /// Device address
    pub dev_addr: DevAddr,
    /// Control flags; `f_opts_len` always matches `f_opts`
    pub f_ctrl: FCtrl,
    /// Low 16 bits of the frame counter
    pub f_cnt: u16,
    /// Piggybacked MAC commands
    pub f_opts: FOpts,
}

impl FHDR {
    fn serialize(&self, buffer: &mut PhyPayload) -> Result<(), MacError> {
        buffer.extend_from_slice(&self.dev_addr.to_le_bytes()).map_err(|_| MacError::Length)?;
        buffer.push(self.f_ctrl.to_byte()).map_err(|_| MacError::Length)?;
        buffer.extend_from_slice(&self.f_cnt.to_le_bytes()).map_err(|_| MacError::Length)?;
        buffer.extend_from_slice(&self.f_opts).map_err(|_| MacError::Length)
    }
}

/// Everything in a data frame in front of the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Message type
    pub mtype: MType,
    /// Frame header
    pub fhdr: FHDR,
    /// Application port, absent when the frame carries no payload
    pub f_port: Option<u8>,
}

/// A decoded (or about to be encoded) data frame with plaintext payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type
    pub mtype: MType,
    /// Frame header
    pub fhdr: FHDR,
    /// Application port, absent when the frame carries no payload
    pub f_port: Option<u8>,
    /// Plaintext payload
    pub payload: FrmPayload,
    /// Integrity code as carried on the wire
    pub mic: Mic,
}

impl Frame {
    /// Transmission direction
    pub fn direction(&self) -> Direction {
        self.mtype.direction()
    }

    /// Acknowledgement requirement
    pub fn ack_request(&self) -> AckRequest {
        self.mtype.ack_request()
    }

    /// Device address
    pub fn dev_addr(&self) -> DevAddr {
        self.fhdr.dev_addr
    }

    /// Frame counter
    pub fn f_cnt(&self) -> u16 {
        self.fhdr.f_cnt
    }

    /// Frame options
    pub fn f_opts(&self) -> &[u8] {
        &self.fhdr.f_opts
    }

    /// Header part of the frame
    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            mtype: self.mtype,
            fhdr: self.fhdr.clone(),
            f_port: self.f_port,
        }
    }

    /// Serialized size including the MIC
    pub fn encoded_len(&self) -> usize {
        let port = if self.f_port.is_some() { 1 } else { 0 };
        DATA_HEADER_SIZE + self.fhdr.f_opts.len() + port + self.payload.len() + MIC_SIZE
    }
}

/// Serialize MHDR, FHDR, FPort and the (plaintext) payload, without the MIC.
///
/// The caller masks the payload region in place afterwards; it starts at the
/// returned offset.
pub(crate) fn pack(frame: &Frame) -> Result<(PhyPayload, usize), MacError> {
    if frame.encoded_len() > MAX_PHY_PAYLOAD_SIZE {
        return Err(MacError::Length);
    }
    if frame.f_port.is_none() && !frame.payload.is_empty() {
        return Err(MacError::Format);
    }

    let mut buffer = PhyPayload::new();
    buffer.push(frame.mtype.mhdr()).map_err(|_| MacError::Length)?;
    frame.fhdr.serialize(&mut buffer)?;
    if let Some(port) = frame.f_port {
        buffer.push(port).map_err(|_| MacError::Length)?;
    }
    let payload_start = buffer.len();
    buffer.extend_from_slice(&frame.payload).map_err(|_| MacError::Length)?;

    Ok((buffer, payload_start))
}

/// Structurally parsed data frame borrowing the receive buffer
#[derive(Debug)]
pub(crate) struct RawFrame<'a> {
    pub header: FrameHeader,
    /// Masked payload
    pub payload: &'a [u8],
    /// Bytes covered by the MIC
    pub signed: &'a [u8],
    pub mic: Mic,
}

/// Length and header checks for a received data frame; no cryptography
pub(crate) fn unpack(buf: &[u8]) -> Result<RawFrame<'_>, MacError> {
    if buf.len() < MIN_DATA_FRAME_SIZE || buf.len() > MAX_PHY_PAYLOAD_SIZE {
        debug!("frame length {} out of range", buf.len());
        return Err(MacError::Length);
    }

    let (signed, mic_bytes) = buf.split_at(buf.len() - MIC_SIZE);
    let mut mic = [0u8; MIC_SIZE];
    mic.copy_from_slice(mic_bytes);

    let mtype = MType::from_mhdr(signed[0])?;
    if !mtype.is_data() {
        debug!("not a data frame: {}", mtype);
        return Err(MacError::Header);
    }

    let dev_addr = DevAddr::from_le_bytes([signed[1], signed[2], signed[3], signed[4]]);
    let f_ctrl = FCtrl::from_byte(signed[5]);
    let f_cnt = u16::from_le_bytes([signed[6], signed[7]]);

    let opts_end = DATA_HEADER_SIZE + f_ctrl.f_opts_len as usize;
    let f_opts = signed
        .get(DATA_HEADER_SIZE..opts_end)
        .and_then(|opts| FOpts::from_slice(opts).ok())
        .ok_or(MacError::Header)?;

    let (f_port, payload) = match signed.get(opts_end..) {
        Some([port, payload @ ..]) => (Some(*port), payload),
        _ => (None, &[][..]),
    };

    Ok(RawFrame {
        header: FrameHeader {
            mtype,
            fhdr: FHDR {
                dev_addr,
                f_ctrl,
                f_cnt,
                f_opts,
            },
            f_port,
        },
        payload,
        signed,
        mic,
    })
}
