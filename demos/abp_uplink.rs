//! ABP uplink example
//!
//! This example demonstrates the message layer with a personalised device:
//! - Session context built from an ABP provisioning record
//! - Periodic unconfirmed uplinks on port 1 with MAC answers in FOpts
//! - Cheap address filtering of received frames before full decoding
//! - Decoding a network downlink and its piggybacked MAC commands
//!
//! No radio is involved: frames are printed as hex and the "network" side
//! is simulated with a second context holding the same session.

use lorawan_message::{
    config::device::{AESKey, DevAddr, DeviceConfig, NetId},
    lorawan::{
        commands::{encode_commands, parse_commands, MacCommand},
        frame::{FCtrl, MType},
        region::{DataRate, FrameFormat, Region},
    },
    MacError,
};

// Example keys - replace with the ones from your network server
const DEVADDR: u32 = 0x2601_1BDA;
const NWKSKEY: [u8; 16] = [
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F, 0x3C,
];
const APPSKEY: [u8; 16] = [
    0x3C, 0x4F, 0xCF, 0x09, 0x88, 0x15, 0xF7, 0xAB, 0xA6, 0xD2, 0xAE, 0x28, 0x16, 0x15, 0x7E, 0x2B,
];

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

fn main() -> Result<(), MacError> {
    let config = DeviceConfig::new_abp(
        [0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C],
        [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01],
        NetId::new(0x000013),
        DevAddr::new(DEVADDR),
        AESKey::new(NWKSKEY),
        AESKey::new(APPSKEY),
    );
    let format = FrameFormat::new(Region::EU868, DataRate::DR5);
    let device = config.session_context(format);
    let network = config.session_context(format);

    println!("device {} ready, max payload {} bytes", device.dev_addr(), device.max_payload_length());

    for f_cnt in 0..3u16 {
        let payload = format!("Hello, LoRaWAN! #{}", f_cnt);
        let answers = if f_cnt == 0 {
            encode_commands(&[MacCommand::DevStatusAns { battery: 254, margin: 7 }])?
        } else {
            Default::default()
        };

        let message = device.compose(
            MType::UnconfirmedDataUp,
            FCtrl {
                adr: true,
                ..FCtrl::default()
            },
            1,
            payload.as_bytes(),
            &answers,
            f_cnt,
        )?;
        println!("uplink  #{}: {}", f_cnt, hex(message.as_bytes()));

        // Network side: route by address, then authenticate and decrypt
        if network.get_address(message.as_bytes())? != network.dev_addr() {
            continue;
        }
        let frame = network.decode(message.as_bytes())?;
        println!(
            "  received {:?} on port {:?}",
            String::from_utf8_lossy(&frame.payload),
            frame.f_port
        );
        for command in parse_commands(frame.direction(), frame.f_opts()) {
            println!("  MAC answer {:?}", command?);
        }
    }

    let requests = encode_commands(&[MacCommand::DevStatusReq, MacCommand::RXTimingSetupReq { delay: 1 }])?;
    let downlink = network.compose(
        MType::UnconfirmedDataDown,
        FCtrl {
            ack: true,
            ..FCtrl::default()
        },
        0,
        &[],
        &requests,
        0,
    )?;
    println!("downlink:   {}", hex(downlink.as_bytes()));

    let frame = device.decode(downlink.as_bytes())?;
    for command in parse_commands(frame.direction(), frame.f_opts()) {
        println!("  MAC request {:?}", command?);
    }

    let mut tampered = downlink.as_bytes().to_vec();
    tampered[1] ^= 0xFF;
    match device.decode(&tampered) {
        Err(err) => println!("tampered downlink rejected: {} (status {})", err, err.status()),
        Ok(_) => println!("tampered downlink accepted"),
    }

    Ok(())
}
