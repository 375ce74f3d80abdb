use core::fmt;

use super::frame::{self, FCtrl, FHDR, FOpts, Frame, FrameHeader, FrmPayload, MType, PhyPayload, MAX_FOPTS_LEN};
use crate::config::device::DevAddr;
use crate::config::session::{Session, SessionContext};
use crate::crypto::{self, Mic, MIC_SIZE};

/// Status code of a successful operation
pub const STATUS_NO_ERROR: i8 = 0;

/// Message layer error.
///
/// Checks run in a fixed order (length, header, MIC) and the first failure
/// wins. Every variant means "discard this frame"; none is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacError {
    /// Unsupported or uninitialised frame format, or impossible field combination
    Format,
    /// Integrity check failed: the frame is well formed but untrusted
    Mic,
    /// Buffer too short or too long, or payload/options over their limits
    Length,
    /// Structural header failure, or no active session
    Header,
}

impl MacError {
    /// Integer status code
    pub fn status(self) -> i8 {
        match self {
            MacError::Format => -4,
            MacError::Mic => -3,
            MacError::Length => -2,
            MacError::Header => -1,
        }
    }
}

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacError::Format => f.write_str("unsupported frame format"),
            MacError::Mic => f.write_str("message integrity check failed"),
            MacError::Length => f.write_str("invalid frame length"),
            MacError::Header => f.write_str("invalid frame header"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MacError {}

/// Message layer result
pub type Result<T> = core::result::Result<T, MacError>;

/// A composed frame together with its wire bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    frame: Frame,
    buffer: PhyPayload,
}

impl Message {
    /// The frame model, payload in plaintext
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Bytes to hand to the radio
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Integrity code
    pub fn mic(&self) -> Mic {
        self.frame.mic
    }

    /// Split into frame and wire bytes
    pub fn into_parts(self) -> (Frame, PhyPayload) {
        (self.frame, self.buffer)
    }
}

impl<'a> Session<'a> {
    /// Compose a data frame.
    ///
    /// FPort is only emitted when `payload` is non-empty. The payload is
    /// masked with the key selected by `f_port` and the MIC is computed with
    /// the network session key, both using the direction of `mtype`.
    /// `f_ctrl.f_opts_len` is taken from `f_opts`.
    pub fn compose(
        &self,
        mtype: MType,
        f_ctrl: FCtrl,
        f_port: u8,
        payload: &[u8],
        f_opts: &[u8],
        f_cnt: u16,
    ) -> Result<Message> {
        if !mtype.is_data() {
            return Err(MacError::Format);
        }
        if payload.len() > self.format.max_payload_length() {
            warn!("payload of {} bytes over limit {}", payload.len(), self.format.max_payload_length());
            return Err(MacError::Length);
        }
        if f_opts.len() > MAX_FOPTS_LEN {
            return Err(MacError::Length);
        }

        let frame = Frame {
            mtype,
            fhdr: FHDR {
                dev_addr: self.dev_addr,
                f_ctrl: FCtrl {
                    f_opts_len: f_opts.len() as u8,
                    ..f_ctrl
                },
                f_cnt,
                f_opts: FOpts::from_slice(f_opts).map_err(|_| MacError::Length)?,
            },
            f_port: if payload.is_empty() { None } else { Some(f_port) },
            payload: FrmPayload::from_slice(payload).map_err(|_| MacError::Length)?,
            mic: [0; MIC_SIZE],
        };

        self.seal(frame)
    }

    /// Serialize, mask and sign a frame; the returned frame carries the MIC
    fn seal(&self, mut frame: Frame) -> Result<Message> {
        let (mut buffer, payload_start) = frame::pack(&frame)?;
        let dir = frame.direction();
        let dev_addr = frame.fhdr.dev_addr;
        let f_cnt = u32::from(frame.fhdr.f_cnt);

        if let Some(port) = frame.f_port {
            crypto::mask_payload(self.payload_key(port), dev_addr, f_cnt, dir, &mut buffer[payload_start..]);
        }

        let mic = crypto::compute_mic(&self.keys.nwk_skey, &buffer, dev_addr, f_cnt, dir);
        buffer.extend_from_slice(&mic).map_err(|_| MacError::Length)?;
        frame.mic = mic;

        trace!("sealed {} fcnt {} ({} bytes)", frame.mtype, frame.fhdr.f_cnt, buffer.len());
        Ok(Message { frame, buffer })
    }

    /// Compute the integrity code a frame would carry on the wire
    pub fn authenticate(&self, frame: &Frame) -> Result<Mic> {
        self.seal(frame.clone()).map(|message| message.mic())
    }

    fn check_mic(&self, header: &FrameHeader, signed: &[u8], mic: &Mic) -> Result<()> {
        let computed = crypto::compute_mic(
            &self.keys.nwk_skey,
            signed,
            header.fhdr.dev_addr,
            u32::from(header.fhdr.f_cnt),
            header.mtype.direction(),
        );
        if &computed != mic {
            warn!("MIC mismatch for {} fcnt {}", header.fhdr.dev_addr, header.fhdr.f_cnt);
            return Err(MacError::Mic);
        }
        Ok(())
    }

    /// Verify a received frame's integrity without unmasking its payload
    pub fn verify(&self, buf: &[u8]) -> Result<()> {
        let raw = frame::unpack(buf)?;
        self.check_mic(&raw.header, raw.signed, &raw.mic)
    }

    /// Decode a received data frame.
    ///
    /// Checks, in order: length, header structure, then (after unmasking)
    /// the integrity code. The frame is returned only if all pass.
    pub fn decode(&self, buf: &[u8]) -> Result<Frame> {
        let raw = frame::unpack(buf)?;
        let header = raw.header;

        let mut payload = FrmPayload::from_slice(raw.payload).map_err(|_| MacError::Length)?;
        if let Some(port) = header.f_port {
            crypto::mask_payload(
                self.payload_key(port),
                header.fhdr.dev_addr,
                u32::from(header.fhdr.f_cnt),
                header.mtype.direction(),
                &mut payload,
            );
        }

        self.check_mic(&header, raw.signed, &raw.mic)?;

        trace!("decoded {} fcnt {}", header.mtype, header.fhdr.f_cnt);
        Ok(Frame {
            mtype: header.mtype,
            fhdr: header.fhdr,
            f_port: header.f_port,
            payload,
            mic: raw.mic,
        })
    }
}

impl SessionContext {
    /// Compose a data frame with the active session, see [`Session::compose`]
    pub fn compose(
        &self,
        mtype: MType,
        f_ctrl: FCtrl,
        f_port: u8,
        payload: &[u8],
        f_opts: &[u8],
        f_cnt: u16,
    ) -> Result<Message> {
        self.session()?.compose(mtype, f_ctrl, f_port, payload, f_opts, f_cnt)
    }

    /// Decode a data frame with the active session, see [`Session::decode`]
    pub fn decode(&self, buf: &[u8]) -> Result<Frame> {
        self.session()?.decode(buf)
    }

    /// Integrity code of a frame under the active session
    pub fn authenticate(&self, frame: &Frame) -> Result<Mic> {
        self.session()?.authenticate(frame)
    }

    /// Read only the device address of a received frame.
    ///
    /// Runs the length and header checks but no cryptography, so frames
    /// addressed elsewhere can be dropped cheaply. Needs a frame format but
    /// no session keys.
    pub fn get_address(&self, buf: &[u8]) -> Result<DevAddr> {
        self.require_format()?;
        Ok(frame::unpack(buf)?.header.fhdr.dev_addr)
    }

    /// Read the header of a received frame without decrypting or verifying it
    pub fn get_header(&self, buf: &[u8]) -> Result<FrameHeader> {
        self.require_format()?;
        Ok(frame::unpack(buf)?.header)
    }
}
