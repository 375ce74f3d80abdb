use core::fmt;

use crate::config::session::SessionContext;
use crate::lorawan::join::JoinMaterial;
use crate::lorawan::region::FrameFormat;

/// EUI-64 (8 bytes, most significant byte first)
pub type EUI64 = [u8; 8];

/// AES-128 key (16 bytes)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AESKey([u8; 16]);

impl AESKey {
    /// Wrap raw key material
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for AESKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

// Key material never ends up in logs or panic messages.
impl fmt::Debug for AESKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AESKey(..)")
    }
}

/// Device address, 32 bits, unique within a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevAddr(u32);

impl DevAddr {
    /// Create a device address
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Read an address in wire (little-endian) order
    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Address in wire (little-endian) order
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Address as an integer
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Network identifier, 24 bits, assigned by the network operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetId(u32);

impl NetId {
    /// Create a network identifier. Bits above the low 24 are discarded.
    pub const fn new(id: u32) -> Self {
        Self(id & 0x00FF_FFFF)
    }

    /// Read a network identifier in wire (little-endian) order
    pub const fn from_le_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    /// Identifier in wire (little-endian) order
    pub const fn to_le_bytes(self) -> [u8; 3] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2]]
    }

    /// Identifier as an integer
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Activation-by-personalisation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbpConfig {
    /// Network identifier
    pub net_id: NetId,
    /// Device address
    pub dev_addr: DevAddr,
    /// Network session key
    pub nwk_skey: AESKey,
    /// Application session key
    pub app_skey: AESKey,
}

/// Device provisioning record for both OTAA and ABP activation
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device EUI (unique device identifier)
    pub dev_eui: EUI64,
    /// Application EUI
    pub app_eui: EUI64,
    /// Application key (used for OTAA)
    pub app_key: AESKey,
    /// Pre-provisioned session (ABP only)
    pub abp: Option<AbpConfig>,
}

impl DeviceConfig {
    /// Create a new OTAA device configuration
    pub fn new_otaa(dev_eui: EUI64, app_eui: EUI64, app_key: AESKey) -> Self {
        Self {
            dev_eui,
            app_eui,
            app_key,
            abp: None,
        }
    }

    /// Create a new ABP device configuration
    pub fn new_abp(
        dev_eui: EUI64,
        app_eui: EUI64,
        net_id: NetId,
        dev_addr: DevAddr,
        nwk_skey: AESKey,
        app_skey: AESKey,
    ) -> Self {
        Self {
            dev_eui,
            app_eui,
            app_key: AESKey::new([0; 16]), // Not used in ABP
            abp: Some(AbpConfig {
                net_id,
                dev_addr,
                nwk_skey,
                app_skey,
            }),
        }
    }

    /// Whether the device is personalised (ABP)
    pub fn is_abp(&self) -> bool {
        self.abp.is_some()
    }

    /// Build the session context for this device.
    ///
    /// ABP devices come out active; OTAA devices come out in the pre-join
    /// state and become active once a join-accept is applied.
    pub fn session_context(&self, format: FrameFormat) -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.init_format(format);
        if let Some(abp) = &self.abp {
            ctx.init_ids(abp.net_id, abp.dev_addr, abp.nwk_skey, abp.app_skey);
        }
        ctx
    }

    /// Material for one OTAA join attempt.
    ///
    /// `dev_nonce` must never have been used by this device against the
    /// same network. Returns `None` for ABP devices.
    pub fn join_material(&self, dev_nonce: u16) -> Option<JoinMaterial> {
        if self.is_abp() {
            return None;
        }
        Some(JoinMaterial {
            dev_eui: self.dev_eui,
            app_eui: self.app_eui,
            dev_nonce,
            app_key: self.app_key,
        })
    }
}
