use lorawan_message::{
    config::device::{AESKey, DevAddr, NetId},
    config::session::SessionContext,
    crypto::Direction,
    lorawan::{
        commands::{encode_commands, parse_commands, CommandIdentifier, MacCommand},
        frame::{FCtrl, FOpts, MType},
        mac::MacError,
        region::{DataRate, FrameFormat, Region},
    },
};

#[test]
fn test_parse_uplink_commands() {
    let data = [0x02, 0x03, 0x07, 0x06, 0xFF, 0x3F, 0x0D];
    let commands: Vec<_> = parse_commands(Direction::Up, &data).collect();

    assert_eq!(
        commands,
        vec![
            Ok(MacCommand::LinkCheckReq),
            Ok(MacCommand::LinkADRAns {
                power_ack: true,
                data_rate_ack: true,
                channel_mask_ack: true,
            }),
            Ok(MacCommand::DevStatusAns { battery: 0xFF, margin: -1 }),
            Ok(MacCommand::DeviceTimeReq),
        ]
    );
}

#[test]
fn test_parse_downlink_commands() {
    let data = [0x02, 20, 3, 0x03, 0x53, 0xFF, 0x00, 0x01, 0x08, 0x02];
    let mut commands = parse_commands(Direction::Down, &data);

    assert_eq!(
        commands.next(),
        Some(Ok(MacCommand::LinkCheckAns {
            margin: 20,
            gateway_count: 3,
        }))
    );
    assert_eq!(
        commands.next(),
        Some(Ok(MacCommand::LinkADRReq {
            data_rate: 5,
            tx_power: 3,
            ch_mask: 0x00FF,
            ch_mask_cntl: 0,
            nb_trans: 1,
        }))
    );
    assert_eq!(commands.next(), Some(Ok(MacCommand::RXTimingSetupReq { delay: 2 })));
    assert_eq!(commands.next(), None);
}

#[test]
fn test_same_cid_differs_by_direction() {
    let data = [0x06];
    assert_eq!(parse_commands(Direction::Down, &data).next(), Some(Ok(MacCommand::DevStatusReq)));
    assert_eq!(parse_commands(Direction::Up, &data).next(), Some(Err(MacError::Length)));
}

#[test]
fn test_unknown_cid_stops_parsing() {
    let data = [0x02, 0x7F, 0x02];
    let commands: Vec<_> = parse_commands(Direction::Up, &data).collect();
    assert_eq!(commands, vec![Ok(MacCommand::LinkCheckReq), Err(MacError::Format)]);
}

#[test]
fn test_truncated_command() {
    let data = [0x0D, 0x01, 0x02];
    let commands: Vec<_> = parse_commands(Direction::Down, &data).collect();
    assert_eq!(commands, vec![Err(MacError::Length)]);
}

#[test]
fn test_encode_commands() {
    let commands = [
        MacCommand::LinkADRAns {
            power_ack: true,
            data_rate_ack: false,
            channel_mask_ack: true,
        },
        MacCommand::DevStatusAns { battery: 200, margin: -5 },
        MacCommand::LinkCheckReq,
    ];

    let encoded = encode_commands(&commands).unwrap();
    assert_eq!(&encoded[..], &[0x03, 0x05, 0x06, 200, 0x3B, 0x02]);

    let parsed: Vec<_> = parse_commands(Direction::Up, &encoded).map(Result::unwrap).collect();
    assert_eq!(parsed, commands);
}

#[test]
fn test_encode_frequency_commands() {
    let commands = [
        MacCommand::NewChannelReq {
            ch_index: 3,
            freq: 867_100_000,
            max_dr: 5,
            min_dr: 0,
        },
        MacCommand::RXParamSetupReq {
            rx1_dr_offset: 1,
            rx2_data_rate: 3,
            freq: 869_525_000,
        },
    ];

    let encoded = encode_commands(&commands).unwrap();
    assert_eq!(encoded.len(), 11);
    assert_eq!(&encoded[..6], &[0x07, 0x03, 0x18, 0x4F, 0x84, 0x50]);

    let parsed: Vec<_> = parse_commands(Direction::Down, &encoded).map(Result::unwrap).collect();
    assert_eq!(parsed, commands);
}

#[test]
fn test_encode_over_fopts_limit() {
    let request = MacCommand::LinkADRReq {
        data_rate: 0,
        tx_power: 0,
        ch_mask: 0xFFFF,
        ch_mask_cntl: 0,
        nb_trans: 1,
    };
    assert_eq!(request.encoded_len(), 5);
    assert!(encode_commands(&[request; 3]).is_ok());
    assert_eq!(encode_commands(&[request; 4]), Err(MacError::Length));
}

#[test]
fn test_write_that_does_not_fit_leaves_buffer_untouched() {
    let mut out = FOpts::from_slice(&[0x02; 12]).unwrap();
    let answer = MacCommand::DevStatusAns { battery: 1, margin: 0 };
    assert_eq!(answer.encoded_len(), 3);

    MacCommand::LinkCheckReq.write_to(&mut out).unwrap();
    assert_eq!(out.len(), 13);

    assert_eq!(answer.write_to(&mut out), Err(MacError::Length));
    assert_eq!(&out[..], &[0x02; 13]);
}

#[test]
fn test_command_metadata() {
    assert_eq!(MacCommand::DeviceTimeReq.cid(), CommandIdentifier::DeviceTime);
    assert_eq!(MacCommand::DeviceTimeReq.direction(), Direction::Up);
    assert_eq!(MacCommand::DeviceTimeReq.encoded_len(), 1);
    assert_eq!(
        MacCommand::DeviceTimeAns {
            seconds: 0,
            fraction: 0
        }
        .encoded_len(),
        6
    );
    assert_eq!(CommandIdentifier::from_byte(0x0A), Some(CommandIdentifier::DlChannel));
    assert_eq!(CommandIdentifier::from_byte(0x0B), None);
}

#[test]
fn test_commands_in_frame_options() {
    let mut ctx = SessionContext::new();
    ctx.init_format(FrameFormat::new(Region::EU868, DataRate::DR0));
    ctx.init_ids(
        NetId::new(0x000001),
        DevAddr::new(0x2601_1BDA),
        AESKey::new([0x01; 16]),
        AESKey::new([0x02; 16]),
    );

    let answers = [
        MacCommand::RXTimingSetupAns,
        MacCommand::NewChannelAns {
            channel_freq_ok: true,
            data_rate_ok: true,
        },
    ];
    let f_opts = encode_commands(&answers).unwrap();
    let message = ctx
        .compose(MType::UnconfirmedDataUp, FCtrl::default(), 1, b"data", &f_opts, 12)
        .unwrap();

    let frame = ctx.decode(message.as_bytes()).unwrap();
    let parsed: Vec<_> = parse_commands(frame.direction(), frame.f_opts()).collect();
    assert_eq!(parsed, vec![Ok(answers[0]), Ok(answers[1])]);
}
