//! LoRaWAN MAC message layer in Rust
//!
//! This crate turns application payloads into authenticated, optionally
//! encrypted LoRaWAN frames and turns received frames back into validated
//! application data and MAC commands. It does not drive a radio: it only
//! transforms byte buffers handed to it.
//!
//! # Features
//! - Data frame composition and decoding (LoRaWAN 1.0.x layout)
//! - AES-128 payload masking and AES-CMAC message integrity codes
//! - OTAA join-request composition and join-accept decoding with session key derivation
//! - Partial decodes (address, header) for cheap frame routing
//! - MAC command parsing and encoding for FOpts and port 0 payloads
//! - No allocator, no unsafe code
//!
//! # Example
//! ```
//! use lorawan_message::{
//!     config::device::{AESKey, DevAddr, NetId},
//!     config::session::SessionContext,
//!     lorawan::{
//!         frame::{FCtrl, MType},
//!         region::{DataRate, FrameFormat, Region},
//!     },
//! };
//!
//! let mut ctx = SessionContext::new();
//! ctx.init_format(FrameFormat::new(Region::EU868, DataRate::DR5));
//! ctx.init_ids(
//!     NetId::new(0x000001),
//!     DevAddr::new(0x0102_0304),
//!     AESKey::new([0x00; 16]),
//!     AESKey::new([0x00; 16]),
//! );
//!
//! let message = ctx
//!     .compose(MType::UnconfirmedDataUp, FCtrl::default(), 1, &[0xAA, 0xBB], &[], 0)
//!     .unwrap();
//! let frame = ctx.decode(message.as_bytes()).unwrap();
//! assert_eq!(frame.f_port, Some(1));
//! assert_eq!(&frame.payload[..], &[0xAA, 0xBB]);
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("The `defmt` and `log` features are mutually exclusive");

// Must stay first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

/// Device provisioning and session context
pub mod config;

/// Cryptographic functions
pub mod crypto;

/// LoRaWAN message layer implementation
pub mod lorawan;

pub use config::session::{Session, SessionContext};
pub use lorawan::mac::{MacError, Message};
