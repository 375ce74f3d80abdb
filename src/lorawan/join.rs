//! Over-the-air activation
//!
//! Join-request (plaintext, signed with the AppKey):
//! ```text
//! MHDR(1) | AppEUI(8,LE) | DevEUI(8,LE) | DevNonce(2,LE) | MIC(4)
//! ```
//!
//! Join-accept (everything after MHDR encrypted with the AppKey):
//! ```text
//! MHDR(1) | AppNonce(3) | NetID(3) | DevAddr(4) | DLSettings(1) | RxDelay(1) | [CFList(16)] | MIC(4)
//! ```

use heapless::Vec;

use super::frame::MType;
use super::mac::{MacError, Result};
use crate::config::device::{AESKey, DevAddr, NetId, EUI64};
use crate::config::session::SessionKeys;
use crate::crypto::{self, Mic, MIC_SIZE};

/// Size of a join-request frame
pub const JOIN_REQUEST_SIZE: usize = 23;

/// Size of a join-accept frame without CFList
pub const JOIN_ACCEPT_SIZE: usize = 17;

/// Size of a join-accept frame with CFList
pub const JOIN_ACCEPT_CFLIST_SIZE: usize = 33;

/// CFList size in bytes
pub const CF_LIST_SIZE: usize = 16;

/// Inputs to one join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinMaterial {
    /// Device EUI
    pub dev_eui: EUI64,
    /// Application EUI
    pub app_eui: EUI64,
    /// Device nonce; must not repeat for this device against the same network
    pub dev_nonce: u16,
    /// Application key
    pub app_key: AESKey,
}

impl JoinMaterial {
    /// Compose the join-request for this attempt
    pub fn request(&self) -> Result<JoinRequest> {
        compose_join_request(MType::JoinRequest, &self.dev_eui, &self.app_eui, self.dev_nonce, &self.app_key)
    }

    /// Decode the join-accept answering this attempt
    pub fn accept(&self, buf: &[u8]) -> Result<JoinAccept> {
        decode_join_accept(buf, &self.app_key, self.dev_nonce)
    }
}

/// Serialized join-request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequest {
    bytes: [u8; JOIN_REQUEST_SIZE],
}

impl JoinRequest {
    /// Bytes to hand to the radio
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Device nonce carried by the request
    pub fn dev_nonce(&self) -> u16 {
        u16::from_le_bytes([self.bytes[17], self.bytes[18]])
    }

    /// Integrity code
    pub fn mic(&self) -> Mic {
        let mut mic = [0u8; MIC_SIZE];
        mic.copy_from_slice(&self.bytes[JOIN_REQUEST_SIZE - MIC_SIZE..]);
        mic
    }
}

/// Write an EUI in wire order (least significant byte first)
fn write_eui(out: &mut [u8], eui: &EUI64) {
    for (dst, src) in out.iter_mut().zip(eui.iter().rev()) {
        *dst = *src;
    }
}

/// Compose a join-request.
///
/// The caller supplies `dev_nonce`; no randomness is generated here.
/// Fails with [`MacError::Format`] if `mtype` is not [`MType::JoinRequest`].
pub fn compose_join_request(
    mtype: MType,
    dev_eui: &EUI64,
    app_eui: &EUI64,
    dev_nonce: u16,
    app_key: &AESKey,
) -> Result<JoinRequest> {
    if mtype != MType::JoinRequest {
        return Err(MacError::Format);
    }

    let mut bytes = [0u8; JOIN_REQUEST_SIZE];
    bytes[0] = mtype.mhdr();
    write_eui(&mut bytes[1..9], app_eui);
    write_eui(&mut bytes[9..17], dev_eui);
    bytes[17..19].copy_from_slice(&dev_nonce.to_le_bytes());

    let mic = crypto::compute_join_mic(app_key, &bytes[..JOIN_REQUEST_SIZE - MIC_SIZE]);
    bytes[JOIN_REQUEST_SIZE - MIC_SIZE..].copy_from_slice(&mic);

    debug!("join-request composed, dev nonce {}", dev_nonce);
    Ok(JoinRequest { bytes })
}

/// Optional channel list of a join-accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfList {
    /// Type 0: additional channel frequencies in Hz (unused slots omitted)
    Frequencies(Vec<u32, 5>),
    /// Type 1: channel masks ChMask0..ChMask4
    ChannelMask([u16; 5]),
    /// Any other list type, kept as received
    Unknown([u8; CF_LIST_SIZE]),
}

impl CfList {
    /// Parse the 16-byte CFList
    pub fn parse(raw: &[u8; CF_LIST_SIZE]) -> Self {
        match raw[CF_LIST_SIZE - 1] {
            0 => {
                let mut frequencies = Vec::new();
                for entry in raw[..15].chunks_exact(3) {
                    let freq = u32::from_le_bytes([entry[0], entry[1], entry[2], 0]) * 100;
                    if freq != 0 {
                        // At most five entries fit a 15-byte list
                        let _ = frequencies.push(freq);
                    }
                }
                CfList::Frequencies(frequencies)
            }
            1 => {
                let mut masks = [0u16; 5];
                for (mask, entry) in masks.iter_mut().zip(raw[..10].chunks_exact(2)) {
                    *mask = u16::from_le_bytes([entry[0], entry[1]]);
                }
                CfList::ChannelMask(masks)
            }
            _ => CfList::Unknown(*raw),
        }
    }

    /// Channel frequencies, empty unless this is a frequency list
    pub fn frequencies(&self) -> &[u32] {
        match self {
            CfList::Frequencies(frequencies) => frequencies.as_slice(),
            _ => &[],
        }
    }
}

/// Session material negotiated by a join-accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAccept {
    /// Application (join) nonce, wire order
    pub app_nonce: [u8; 3],
    /// Network identifier
    pub net_id: NetId,
    /// Assigned device address
    pub dev_addr: DevAddr,
    /// RX1 data rate offset
    pub rx1_dr_offset: u8,
    /// RX2 data rate index
    pub rx2_dr: u8,
    /// RX1 delay setting, 0 and 1 both mean one second
    pub rx_delay: u8,
    /// Optional channel list
    pub cf_list: Option<CfList>,
    /// Derived session keys
    pub keys: SessionKeys,
}

impl JoinAccept {
    /// RX1 delay in seconds
    pub fn rx_delay_secs(&self) -> u8 {
        self.rx_delay.max(1)
    }
}

/// Decode a join-accept and derive the session keys.
///
/// Checks length, then header, then the MIC computed under `app_key` over the
/// decrypted frame.
pub fn decode_join_accept(buf: &[u8], app_key: &AESKey, dev_nonce: u16) -> Result<JoinAccept> {
    if buf.len() != JOIN_ACCEPT_SIZE && buf.len() != JOIN_ACCEPT_CFLIST_SIZE {
        debug!("join-accept length {} invalid", buf.len());
        return Err(MacError::Length);
    }
    if MType::from_mhdr(buf[0])? != MType::JoinAccept {
        return Err(MacError::Header);
    }

    let mut plain: Vec<u8, JOIN_ACCEPT_CFLIST_SIZE> = Vec::from_slice(buf).map_err(|_| MacError::Length)?;
    crypto::decrypt_join_accept(app_key, &mut plain[1..]);

    let (body, mic) = plain.split_at(plain.len() - MIC_SIZE);
    if crypto::compute_join_mic(app_key, body)[..] != *mic {
        warn!("join-accept MIC mismatch");
        return Err(MacError::Mic);
    }

    let app_nonce = [body[1], body[2], body[3]];
    let net_id = NetId::from_le_bytes([body[4], body[5], body[6]]);
    let dev_addr = DevAddr::from_le_bytes([body[7], body[8], body[9], body[10]]);
    let dl_settings = body[11];
    let rx_delay = body[12] & 0x0F;

    let cf_list = match body.get(13..) {
        Some(raw) if raw.len() == CF_LIST_SIZE => {
            let mut list = [0u8; CF_LIST_SIZE];
            list.copy_from_slice(raw);
            Some(CfList::parse(&list))
        }
        _ => None,
    };

    let keys = crypto::derive_session_keys(app_key, &app_nonce, net_id, dev_nonce);
    debug!("join-accepted as {}", dev_addr);

    Ok(JoinAccept {
        app_nonce,
        net_id,
        dev_addr,
        rx1_dr_offset: (dl_settings >> 4) & 0x07,
        rx2_dr: dl_settings & 0x0F,
        rx_delay,
        cf_list,
        keys,
    })
}
