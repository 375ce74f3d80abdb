//! LoRaWAN cryptographic operations
//!
//! This module provides cryptographic functions for LoRaWAN security:
//! - AES-128 block encryption
//! - Payload masking (AES keystream, encryption and decryption are the same operation)
//! - Message Integrity Code (MIC) computation with AES-CMAC
//! - Join accept encryption/decryption
//! - Session key derivation

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use cmac::{Cmac, Mac};

use crate::config::device::{AESKey, DevAddr, NetId};
use crate::config::session::SessionKeys;

/// MIC size in bytes
pub const MIC_SIZE: usize = 4;

/// Block size for AES-128
pub const BLOCK_SIZE: usize = 16;

/// Message Integrity Code
pub type Mic = [u8; MIC_SIZE];

/// Direction identifiers for cryptographic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Uplink (device to network)
    Up = 0,
    /// Downlink (network to device)
    Down = 1,
}

/// Encrypt a single block with AES-128
pub fn block_encrypt(key: &AESKey, block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let cipher = Aes128::new(GenericArray::from_slice(key.as_bytes()));
    let mut out = *block;
    cipher.encrypt_block(GenericArray::from_mut_slice(&mut out));
    out
}

/// Counter block shared by the payload mask (`A_i`) and the MIC prefix (`B_0`)
fn counter_block(tag: u8, dev_addr: DevAddr, fcnt: u32, dir: Direction, last: u8) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[0] = tag;
    block[5] = dir as u8;
    block[6..10].copy_from_slice(&dev_addr.to_le_bytes());
    block[10..14].copy_from_slice(&fcnt.to_le_bytes());
    block[15] = last;
    block
}

/// Generate one keystream block for payload masking.
///
/// `block_index` starts at 1 for the first 16 payload bytes.
pub fn payload_mask(
    key: &AESKey,
    dev_addr: DevAddr,
    dir: Direction,
    fcnt: u32,
    block_index: u8,
) -> [u8; BLOCK_SIZE] {
    block_encrypt(key, &counter_block(0x01, dev_addr, fcnt, dir, block_index))
}

/// Encrypt or decrypt a payload in place.
///
/// The last partial block uses only the leading bytes of its keystream block.
///
/// # Arguments
/// * `key` - AES key for encryption/decryption
/// * `dev_addr` - Device address
/// * `fcnt` - Frame counter
/// * `dir` - Message direction
/// * `payload` - Data to encrypt/decrypt
pub fn mask_payload(key: &AESKey, dev_addr: DevAddr, fcnt: u32, dir: Direction, payload: &mut [u8]) {
    let cipher = Aes128::new(GenericArray::from_slice(key.as_bytes()));

    // A LoRa frame never exceeds 255 bytes, so the block index fits a u8
    for (i, chunk) in payload.chunks_mut(BLOCK_SIZE).enumerate() {
        let mut s = counter_block(0x01, dev_addr, fcnt, dir, (i + 1) as u8);
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut s));
        for (b, k) in chunk.iter_mut().zip(s.iter()) {
            *b ^= k;
        }
    }
}

fn cmac(key: &AESKey, parts: &[&[u8]]) -> Mic {
    let mut mac = <Cmac<Aes128> as Mac>::new(GenericArray::from_slice(key.as_bytes()));
    for part in parts {
        mac.update(part);
    }
    let tag = mac.finalize().into_bytes();

    let mut mic = [0u8; MIC_SIZE];
    mic.copy_from_slice(&tag[..MIC_SIZE]);
    mic
}

/// Compute Message Integrity Code (MIC) for a LoRaWAN data message
///
/// # Arguments
/// * `key` - Network session key
/// * `data` - Serialized frame without the MIC (MHDR to end of FRMPayload)
/// * `dev_addr` - Device address
/// * `fcnt` - Frame counter
/// * `dir` - Message direction
pub fn compute_mic(key: &AESKey, data: &[u8], dev_addr: DevAddr, fcnt: u32, dir: Direction) -> Mic {
    // Frames are at most 255 bytes, so the length fits the single B0 byte
    let b0 = counter_block(0x49, dev_addr, fcnt, dir, data.len() as u8);
    cmac(key, &[&b0, data])
}

/// Compute the MIC of a join-request or (decrypted) join-accept
pub fn compute_join_mic(key: &AESKey, data: &[u8]) -> Mic {
    cmac(key, &[data])
}

/// Decrypt a join-accept body in place (device side).
///
/// The network encrypts with the AES inverse cipher, so the device applies
/// the forward cipher. Only whole blocks are processed; a trailing partial
/// block is left untouched.
pub fn decrypt_join_accept(key: &AESKey, data: &mut [u8]) {
    let cipher = Aes128::new(GenericArray::from_slice(key.as_bytes()));
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

/// Encrypt a join-accept body in place (network side)
pub fn encrypt_join_accept(key: &AESKey, data: &mut [u8]) {
    let cipher = Aes128::new(GenericArray::from_slice(key.as_bytes()));
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

/// Derive network and application session keys from join accept
///
/// # Arguments
/// * `app_key` - Application key
/// * `app_nonce` - Application nonce from join accept (wire order)
/// * `net_id` - Network ID from join accept
/// * `dev_nonce` - Device nonce from join request
pub fn derive_session_keys(app_key: &AESKey, app_nonce: &[u8; 3], net_id: NetId, dev_nonce: u16) -> SessionKeys {
    let derive = |tag: u8| {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = tag;
        block[1..4].copy_from_slice(app_nonce);
        block[4..7].copy_from_slice(&net_id.to_le_bytes());
        block[7..9].copy_from_slice(&dev_nonce.to_le_bytes());
        AESKey::new(block_encrypt(app_key, &block))
    };

    debug!("deriving session keys for dev nonce {}", dev_nonce);
    SessionKeys {
        nwk_skey: derive(0x01),
        app_skey: derive(0x02),
    }
}
