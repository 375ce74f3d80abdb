//! Device provisioning and session context
//!
//! This module contains the types that configure the message layer:
//! - Device identifiers and keys (DevEUI, AppEUI, AppKey, DevAddr, NetID)
//! - OTAA/ABP provisioning records
//! - The session context shared by every compose/decode call

/// Device identifiers, keys and provisioning
pub mod device;

/// Session context and its active view
pub mod session;

pub use device::DeviceConfig;
pub use session::{Session, SessionContext, SessionKeys};
