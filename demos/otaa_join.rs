//! OTAA join example
//!
//! This example walks through over-the-air activation on the message layer:
//! - Join-request composition from the device provisioning record
//! - A simulated network answering with an encrypted join-accept and CFList
//! - Join-accept decoding, session key derivation and session activation
//! - A first confirmed uplink under the negotiated session

use lorawan_message::{
    config::device::{AESKey, DeviceConfig},
    config::session::SessionContext,
    crypto,
    lorawan::{
        frame::{FCtrl, MType},
        join::CfList,
        region::{DataRate, FrameFormat, Region},
    },
    MacError,
};

// Example DevEUI, AppEUI and AppKey - replace with your own
const DEVEUI: [u8; 8] = [0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C];
const APPEUI: [u8; 8] = [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01];
const APPKEY: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10,
];

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// What a network server would send back: AppNonce, NetID, DevAddr, settings
/// and a CFList of three extra EU868 channels.
fn network_join_accept(app_key: &AESKey) -> Vec<u8> {
    let mut frame = vec![MType::JoinAccept.mhdr()];
    frame.extend_from_slice(&[0x5E, 0x2A, 0x01]);
    frame.extend_from_slice(&[0x13, 0x00, 0x00]);
    frame.extend_from_slice(&0x2601_1BDAu32.to_le_bytes());
    frame.push(0x03);
    frame.push(1);

    let mut cf_list = [0u8; 16];
    for (entry, freq) in cf_list.chunks_exact_mut(3).zip([867_100_000u32, 867_300_000, 867_500_000]) {
        entry.copy_from_slice(&(freq / 100).to_le_bytes()[..3]);
    }
    frame.extend_from_slice(&cf_list);

    let mic = crypto::compute_join_mic(app_key, &frame);
    frame.extend_from_slice(&mic);
    crypto::encrypt_join_accept(app_key, &mut frame[1..]);
    frame
}

fn main() -> Result<(), MacError> {
    let config = DeviceConfig::new_otaa(DEVEUI, APPEUI, AESKey::new(APPKEY));
    let mut ctx: SessionContext = config.session_context(FrameFormat::new(Region::EU868, DataRate::DR0));
    println!("session active before join: {}", ctx.is_active());

    // DevNonce normally comes from the radio's random number generator
    let Some(material) = config.join_material(0x1F2E) else {
        println!("device is personalised, nothing to join");
        return Ok(());
    };
    let request = material.request()?;
    println!("join-request: {}", hex(request.as_bytes()));

    let accept = material.accept(&network_join_accept(&config.app_key))?;
    println!(
        "joined as {} on network {:06X}, RX1 delay {}s, RX2 DR{}",
        accept.dev_addr,
        accept.net_id.as_u32(),
        accept.rx_delay_secs(),
        accept.rx2_dr
    );
    if let Some(CfList::Frequencies(frequencies)) = &accept.cf_list {
        println!("extra channels: {:?}", frequencies);
    }

    ctx.apply_join(&accept);
    println!("session active after join: {}", ctx.is_active());

    let message = ctx.compose(MType::ConfirmedDataUp, FCtrl::default(), 2, b"first", &[], 0)?;
    println!("uplink: {}", hex(message.as_bytes()));

    Ok(())
}
