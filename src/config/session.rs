//! Session context
//!
//! The context is written only at power-up or after a join (`&mut self`
//! methods) and read by every compose/decode call through a borrowed
//! [`Session`] view, so the borrow checker rules out re-keying while a frame
//! is being processed.

use crate::config::device::{AESKey, DevAddr, NetId};
use crate::lorawan::join::JoinAccept;
use crate::lorawan::mac::MacError;
use crate::lorawan::region::FrameFormat;

/// Network and application session keys. Always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKeys {
    /// Network session key (integrity, MAC-only payloads)
    pub nwk_skey: AESKey,
    /// Application session key (application payloads)
    pub app_skey: AESKey,
}

/// Process-wide message layer state
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    format: Option<FrameFormat>,
    net_id: NetId,
    dev_addr: DevAddr,
    keys: Option<SessionKeys>,
}

/// Read-only view of an active session.
///
/// Only obtainable from a [`SessionContext`] whose format and keys are set.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    pub(crate) format: FrameFormat,
    pub(crate) net_id: NetId,
    pub(crate) dev_addr: DevAddr,
    pub(crate) keys: &'a SessionKeys,
}

impl SessionContext {
    /// Uninitialised context: no frame format, no session keys
    pub const fn new() -> Self {
        Self {
            format: None,
            net_id: NetId::new(0),
            dev_addr: DevAddr::new(0),
            keys: None,
        }
    }

    /// Select the frame format. Normally called once at boot.
    pub fn init_format(&mut self, format: FrameFormat) {
        debug!("frame format set");
        self.format = Some(format);
    }

    /// Install session keys, keeping the current network ID and address
    pub fn init_session_keys(&mut self, nwk_skey: AESKey, app_skey: AESKey) {
        info!("session keys installed");
        self.keys = Some(SessionKeys { nwk_skey, app_skey });
    }

    /// Install network identity and session keys in one step
    pub fn init_ids(&mut self, net_id: NetId, dev_addr: DevAddr, nwk_skey: AESKey, app_skey: AESKey) {
        info!("session initialised for device {}", dev_addr);
        self.net_id = net_id;
        self.dev_addr = dev_addr;
        self.keys = Some(SessionKeys { nwk_skey, app_skey });
    }

    /// Replace the session with the one negotiated by a join-accept
    pub fn apply_join(&mut self, accept: &JoinAccept) {
        self.init_ids(
            accept.net_id,
            accept.dev_addr,
            accept.keys.nwk_skey,
            accept.keys.app_skey,
        );
    }

    /// Drop the session keys, returning to the pre-join state
    pub fn reset(&mut self) {
        info!("session cleared");
        self.keys = None;
    }

    /// Active frame format, if any
    pub fn format(&self) -> Option<FrameFormat> {
        self.format
    }

    /// Network identifier of the current session
    pub fn net_id(&self) -> NetId {
        self.net_id
    }

    /// Device address of the current session
    pub fn dev_addr(&self) -> DevAddr {
        self.dev_addr
    }

    /// Whether compose/decode can run
    pub fn is_active(&self) -> bool {
        self.format.is_some() && self.keys.is_some()
    }

    /// Maximum application payload for the active format, 0 when unset
    pub fn max_payload_length(&self) -> usize {
        self.format.map_or(0, |f| f.max_payload_length())
    }

    /// Frame format, or [`MacError::Format`] before `init_format`
    pub(crate) fn require_format(&self) -> Result<FrameFormat, MacError> {
        self.format.ok_or(MacError::Format)
    }

    /// Borrow the active session.
    ///
    /// Fails with [`MacError::Format`] when no format has been selected and
    /// with [`MacError::Header`] when no keys are installed yet.
    pub fn session(&self) -> Result<Session<'_>, MacError> {
        let format = self.require_format()?;
        let keys = self.keys.as_ref().ok_or(MacError::Header)?;
        Ok(Session {
            format,
            net_id: self.net_id,
            dev_addr: self.dev_addr,
            keys,
        })
    }
}

impl<'a> Session<'a> {
    /// Active frame format
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Network identifier
    pub fn net_id(&self) -> NetId {
        self.net_id
    }

    /// Device address
    pub fn dev_addr(&self) -> DevAddr {
        self.dev_addr
    }

    /// Session keys
    pub fn keys(&self) -> &'a SessionKeys {
        self.keys
    }

    /// Key used to mask the payload carried on `f_port`.
    ///
    /// Port 0 carries MAC commands and uses the network session key; every
    /// other port carries application data under the application session key.
    pub fn payload_key(&self, f_port: u8) -> &'a AESKey {
        if f_port == 0 {
            &self.keys.nwk_skey
        } else {
            &self.keys.app_skey
        }
    }
}
