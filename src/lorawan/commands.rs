//! MAC commands carried in FOpts or in port 0 payloads.
//!
//! A command identifier means a request or an answer depending on the frame
//! direction, so parsing always takes a [`Direction`].

use super::frame::{FOpts, MAX_FOPTS_LEN};
use super::mac::{MacError, Result};
use crate::crypto::Direction;

/// MAC command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandIdentifier {
    /// Link connectivity check
    LinkCheck = 0x02,
    /// Adaptive data rate
    LinkADR = 0x03,
    /// Transmit duty cycle
    DutyCycle = 0x04,
    /// Receive window parameters
    RXParamSetup = 0x05,
    /// Device status
    DevStatus = 0x06,
    /// Channel definition
    NewChannel = 0x07,
    /// RX1 timing
    RXTimingSetup = 0x08,
    /// Transmit parameters
    TxParamSetup = 0x09,
    /// Downlink channel frequency
    DlChannel = 0x0A,
    /// Network time
    DeviceTime = 0x0D,
}

impl CommandIdentifier {
    /// Look up a CID
    pub fn from_byte(cid: u8) -> Option<Self> {
        match cid {
            0x02 => Some(CommandIdentifier::LinkCheck),
            0x03 => Some(CommandIdentifier::LinkADR),
            0x04 => Some(CommandIdentifier::DutyCycle),
            0x05 => Some(CommandIdentifier::RXParamSetup),
            0x06 => Some(CommandIdentifier::DevStatus),
            0x07 => Some(CommandIdentifier::NewChannel),
            0x08 => Some(CommandIdentifier::RXTimingSetup),
            0x09 => Some(CommandIdentifier::TxParamSetup),
            0x0A => Some(CommandIdentifier::DlChannel),
            0x0D => Some(CommandIdentifier::DeviceTime),
            _ => None,
        }
    }

    /// Payload length of this command in the given direction
    pub fn payload_len(self, dir: Direction) -> usize {
        match (self, dir) {
            (CommandIdentifier::LinkCheck, Direction::Up) => 0,
            (CommandIdentifier::LinkCheck, Direction::Down) => 2,
            (CommandIdentifier::LinkADR, Direction::Up) => 1,
            (CommandIdentifier::LinkADR, Direction::Down) => 4,
            (CommandIdentifier::DutyCycle, Direction::Up) => 0,
            (CommandIdentifier::DutyCycle, Direction::Down) => 1,
            (CommandIdentifier::RXParamSetup, Direction::Up) => 1,
            (CommandIdentifier::RXParamSetup, Direction::Down) => 4,
            (CommandIdentifier::DevStatus, Direction::Up) => 2,
            (CommandIdentifier::DevStatus, Direction::Down) => 0,
            (CommandIdentifier::NewChannel, Direction::Up) => 1,
            (CommandIdentifier::NewChannel, Direction::Down) => 5,
            (CommandIdentifier::RXTimingSetup, Direction::Up) => 0,
            (CommandIdentifier::RXTimingSetup, Direction::Down) => 1,
            (CommandIdentifier::TxParamSetup, Direction::Up) => 0,
            (CommandIdentifier::TxParamSetup, Direction::Down) => 1,
            (CommandIdentifier::DlChannel, Direction::Up) => 1,
            (CommandIdentifier::DlChannel, Direction::Down) => 4,
            (CommandIdentifier::DeviceTime, Direction::Up) => 0,
            (CommandIdentifier::DeviceTime, Direction::Down) => 5,
        }
    }
}

/// MAC command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacCommand {
    /// Link check request
    LinkCheckReq,
    /// Link check answer
    LinkCheckAns {
        /// Link margin in dB
        margin: u8,
        /// Number of gateways that received the request
        gateway_count: u8,
    },
    /// Link ADR request
    LinkADRReq {
        /// Data rate
        data_rate: u8,
        /// TX power
        tx_power: u8,
        /// Channel mask
        ch_mask: u16,
        /// Channel mask control
        ch_mask_cntl: u8,
        /// Number of transmissions
        nb_trans: u8,
    },
    /// Link ADR answer
    LinkADRAns {
        /// Power ACK
        power_ack: bool,
        /// Data rate ACK
        data_rate_ack: bool,
        /// Channel mask ACK
        channel_mask_ack: bool,
    },
    /// Duty cycle request
    DutyCycleReq {
        /// Maximum duty cycle
        max_duty_cycle: u8,
    },
    /// Duty cycle answer
    DutyCycleAns,
    /// RX parameter setup request
    RXParamSetupReq {
        /// RX1 data rate offset
        rx1_dr_offset: u8,
        /// RX2 data rate
        rx2_data_rate: u8,
        /// RX2 frequency in Hz
        freq: u32,
    },
    /// RX parameter setup answer
    RXParamSetupAns {
        /// RX1 data rate offset ACK
        rx1_dr_offset_ack: bool,
        /// RX2 data rate ACK
        rx2_data_rate_ack: bool,
        /// Channel ACK
        channel_ack: bool,
    },
    /// Device status request
    DevStatusReq,
    /// Device status answer
    DevStatusAns {
        /// Battery level (0 = external power, 1-254 = level, 255 = unknown)
        battery: u8,
        /// Demodulation margin in dB, 6-bit signed
        margin: i8,
    },
    /// New channel request
    NewChannelReq {
        /// Channel index
        ch_index: u8,
        /// Frequency in Hz
        freq: u32,
        /// Maximum data rate
        max_dr: u8,
        /// Minimum data rate
        min_dr: u8,
    },
    /// New channel answer
    NewChannelAns {
        /// Channel frequency OK
        channel_freq_ok: bool,
        /// Data rate OK
        data_rate_ok: bool,
    },
    /// RX timing setup request
    RXTimingSetupReq {
        /// Delay (0-15)
        delay: u8,
    },
    /// RX timing setup answer
    RXTimingSetupAns,
    /// TX parameter setup request
    TxParamSetupReq {
        /// Downlink dwell time
        downlink_dwell_time: bool,
        /// Uplink dwell time
        uplink_dwell_time: bool,
        /// Maximum EIRP index
        max_eirp: u8,
    },
    /// TX parameter setup answer
    TxParamSetupAns,
    /// Downlink channel request
    DlChannelReq {
        /// Channel index
        ch_index: u8,
        /// Frequency in Hz
        freq: u32,
    },
    /// Downlink channel answer
    DlChannelAns {
        /// Channel frequency OK
        channel_freq_ok: bool,
        /// Uplink frequency exists
        uplink_freq_exists: bool,
    },
    /// Device time request
    DeviceTimeReq,
    /// Device time answer
    DeviceTimeAns {
        /// Seconds since the GPS epoch
        seconds: u32,
        /// Fractional second in 1/256 s steps
        fraction: u8,
    },
}

fn freq_from(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) * 100
}

fn freq_to(freq: u32) -> [u8; 3] {
    let b = (freq / 100).to_le_bytes();
    [b[0], b[1], b[2]]
}

impl MacCommand {
    /// Parse one command body. `payload` holds exactly the bytes after the CID.
    fn from_parts(cid: CommandIdentifier, dir: Direction, payload: &[u8]) -> Self {
        match (cid, dir) {
            (CommandIdentifier::LinkCheck, Direction::Up) => MacCommand::LinkCheckReq,
            (CommandIdentifier::LinkCheck, Direction::Down) => MacCommand::LinkCheckAns {
                margin: payload[0],
                gateway_count: payload[1],
            },
            (CommandIdentifier::LinkADR, Direction::Down) => MacCommand::LinkADRReq {
                data_rate: payload[0] >> 4,
                tx_power: payload[0] & 0x0F,
                ch_mask: u16::from_le_bytes([payload[1], payload[2]]),
                ch_mask_cntl: (payload[3] >> 4) & 0x07,
                nb_trans: payload[3] & 0x0F,
            },
            (CommandIdentifier::LinkADR, Direction::Up) => MacCommand::LinkADRAns {
                power_ack: (payload[0] & 0x04) != 0,
                data_rate_ack: (payload[0] & 0x02) != 0,
                channel_mask_ack: (payload[0] & 0x01) != 0,
            },
            (CommandIdentifier::DutyCycle, Direction::Down) => MacCommand::DutyCycleReq {
                max_duty_cycle: payload[0] & 0x0F,
            },
            (CommandIdentifier::DutyCycle, Direction::Up) => MacCommand::DutyCycleAns,
            (CommandIdentifier::RXParamSetup, Direction::Down) => MacCommand::RXParamSetupReq {
                rx1_dr_offset: (payload[0] >> 4) & 0x07,
                rx2_data_rate: payload[0] & 0x0F,
                freq: freq_from(&payload[1..4]),
            },
            (CommandIdentifier::RXParamSetup, Direction::Up) => MacCommand::RXParamSetupAns {
                rx1_dr_offset_ack: (payload[0] & 0x04) != 0,
                rx2_data_rate_ack: (payload[0] & 0x02) != 0,
                channel_ack: (payload[0] & 0x01) != 0,
            },
            (CommandIdentifier::DevStatus, Direction::Down) => MacCommand::DevStatusReq,
            (CommandIdentifier::DevStatus, Direction::Up) => MacCommand::DevStatusAns {
                battery: payload[0],
                // Sign-extend the 6-bit margin
                margin: ((payload[1] << 2) as i8) >> 2,
            },
            (CommandIdentifier::NewChannel, Direction::Down) => MacCommand::NewChannelReq {
                ch_index: payload[0],
                freq: freq_from(&payload[1..4]),
                max_dr: payload[4] >> 4,
                min_dr: payload[4] & 0x0F,
            },
            (CommandIdentifier::NewChannel, Direction::Up) => MacCommand::NewChannelAns {
                data_rate_ok: (payload[0] & 0x02) != 0,
                channel_freq_ok: (payload[0] & 0x01) != 0,
            },
            (CommandIdentifier::RXTimingSetup, Direction::Down) => MacCommand::RXTimingSetupReq {
                delay: payload[0] & 0x0F,
            },
            (CommandIdentifier::RXTimingSetup, Direction::Up) => MacCommand::RXTimingSetupAns,
            (CommandIdentifier::TxParamSetup, Direction::Down) => MacCommand::TxParamSetupReq {
                downlink_dwell_time: (payload[0] & 0x20) != 0,
                uplink_dwell_time: (payload[0] & 0x10) != 0,
                max_eirp: payload[0] & 0x0F,
            },
            (CommandIdentifier::TxParamSetup, Direction::Up) => MacCommand::TxParamSetupAns,
            (CommandIdentifier::DlChannel, Direction::Down) => MacCommand::DlChannelReq {
                ch_index: payload[0],
                freq: freq_from(&payload[1..4]),
            },
            (CommandIdentifier::DlChannel, Direction::Up) => MacCommand::DlChannelAns {
                uplink_freq_exists: (payload[0] & 0x02) != 0,
                channel_freq_ok: (payload[0] & 0x01) != 0,
            },
            (CommandIdentifier::DeviceTime, Direction::Up) => MacCommand::DeviceTimeReq,
            (CommandIdentifier::DeviceTime, Direction::Down) => MacCommand::DeviceTimeAns {
                seconds: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
                fraction: payload[4],
            },
        }
    }

    /// Command identifier
    pub fn cid(&self) -> CommandIdentifier {
        match self {
            MacCommand::LinkCheckReq | MacCommand::LinkCheckAns { .. } => CommandIdentifier::LinkCheck,
            MacCommand::LinkADRReq { .. } | MacCommand::LinkADRAns { .. } => CommandIdentifier::LinkADR,
            MacCommand::DutyCycleReq { .. } | MacCommand::DutyCycleAns => CommandIdentifier::DutyCycle,
            MacCommand::RXParamSetupReq { .. } | MacCommand::RXParamSetupAns { .. } => CommandIdentifier::RXParamSetup,
            MacCommand::DevStatusReq | MacCommand::DevStatusAns { .. } => CommandIdentifier::DevStatus,
            MacCommand::NewChannelReq { .. } | MacCommand::NewChannelAns { .. } => CommandIdentifier::NewChannel,
            MacCommand::RXTimingSetupReq { .. } | MacCommand::RXTimingSetupAns => CommandIdentifier::RXTimingSetup,
            MacCommand::TxParamSetupReq { .. } | MacCommand::TxParamSetupAns => CommandIdentifier::TxParamSetup,
            MacCommand::DlChannelReq { .. } | MacCommand::DlChannelAns { .. } => CommandIdentifier::DlChannel,
            MacCommand::DeviceTimeReq | MacCommand::DeviceTimeAns { .. } => CommandIdentifier::DeviceTime,
        }
    }

    /// Direction this command travels in
    pub fn direction(&self) -> Direction {
        match self {
            MacCommand::LinkCheckReq
            | MacCommand::LinkADRAns { .. }
            | MacCommand::DutyCycleAns
            | MacCommand::RXParamSetupAns { .. }
            | MacCommand::DevStatusAns { .. }
            | MacCommand::NewChannelAns { .. }
            | MacCommand::RXTimingSetupAns
            | MacCommand::TxParamSetupAns
            | MacCommand::DlChannelAns { .. }
            | MacCommand::DeviceTimeReq => Direction::Up,
            _ => Direction::Down,
        }
    }

    /// Encoded length in bytes, CID included
    pub fn encoded_len(&self) -> usize {
        1 + self.cid().payload_len(self.direction())
    }

    /// Append CID and body to `out`.
    ///
    /// Fails with [`MacError::Length`] without touching `out` when the
    /// command does not fit.
    pub fn write_to(&self, out: &mut FOpts) -> Result<()> {
        if out.len() + self.encoded_len() > MAX_FOPTS_LEN {
            return Err(MacError::Length);
        }

        let mut body = [0u8; 5];
        match *self {
            MacCommand::LinkCheckAns { margin, gateway_count } => {
                body[0] = margin;
                body[1] = gateway_count;
            }
            MacCommand::LinkADRReq {
                data_rate,
                tx_power,
                ch_mask,
                ch_mask_cntl,
                nb_trans,
            } => {
                body[0] = (data_rate << 4) | (tx_power & 0x0F);
                body[1..3].copy_from_slice(&ch_mask.to_le_bytes());
                body[3] = ((ch_mask_cntl & 0x07) << 4) | (nb_trans & 0x0F);
            }
            MacCommand::LinkADRAns {
                power_ack,
                data_rate_ack,
                channel_mask_ack,
            }
            | MacCommand::RXParamSetupAns {
                rx1_dr_offset_ack: power_ack,
                rx2_data_rate_ack: data_rate_ack,
                channel_ack: channel_mask_ack,
            } => {
                body[0] = (u8::from(power_ack) << 2) | (u8::from(data_rate_ack) << 1) | u8::from(channel_mask_ack);
            }
            MacCommand::DutyCycleReq { max_duty_cycle } => body[0] = max_duty_cycle & 0x0F,
            MacCommand::RXParamSetupReq {
                rx1_dr_offset,
                rx2_data_rate,
                freq,
            } => {
                body[0] = ((rx1_dr_offset & 0x07) << 4) | (rx2_data_rate & 0x0F);
                body[1..4].copy_from_slice(&freq_to(freq));
            }
            MacCommand::DevStatusAns { battery, margin } => {
                body[0] = battery;
                body[1] = (margin as u8) & 0x3F;
            }
            MacCommand::NewChannelReq {
                ch_index,
                freq,
                max_dr,
                min_dr,
            } => {
                body[0] = ch_index;
                body[1..4].copy_from_slice(&freq_to(freq));
                body[4] = (max_dr << 4) | (min_dr & 0x0F);
            }
            MacCommand::NewChannelAns {
                channel_freq_ok,
                data_rate_ok,
            } => body[0] = (u8::from(data_rate_ok) << 1) | u8::from(channel_freq_ok),
            MacCommand::RXTimingSetupReq { delay } => body[0] = delay & 0x0F,
            MacCommand::TxParamSetupReq {
                downlink_dwell_time,
                uplink_dwell_time,
                max_eirp,
            } => {
                body[0] = (u8::from(downlink_dwell_time) << 5) | (u8::from(uplink_dwell_time) << 4) | (max_eirp & 0x0F);
            }
            MacCommand::DlChannelReq { ch_index, freq } => {
                body[0] = ch_index;
                body[1..4].copy_from_slice(&freq_to(freq));
            }
            MacCommand::DlChannelAns {
                channel_freq_ok,
                uplink_freq_exists,
            } => body[0] = (u8::from(uplink_freq_exists) << 1) | u8::from(channel_freq_ok),
            MacCommand::DeviceTimeAns { seconds, fraction } => {
                body[..4].copy_from_slice(&seconds.to_le_bytes());
                body[4] = fraction;
            }
            MacCommand::LinkCheckReq
            | MacCommand::DutyCycleAns
            | MacCommand::DevStatusReq
            | MacCommand::RXTimingSetupAns
            | MacCommand::TxParamSetupAns
            | MacCommand::DeviceTimeReq => {}
        }

        out.push(self.cid() as u8).map_err(|_| MacError::Length)?;
        out.extend_from_slice(&body[..self.encoded_len() - 1]).map_err(|_| MacError::Length)
    }
}

/// Iterator over the MAC commands in a byte string
#[derive(Debug, Clone)]
pub struct MacCommandIter<'a> {
    data: &'a [u8],
    dir: Direction,
}

impl<'a> Iterator for MacCommandIter<'a> {
    type Item = Result<MacCommand>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&cid, rest) = self.data.split_first()?;

        let Some(cid) = CommandIdentifier::from_byte(cid) else {
            debug!("unknown MAC command {}", cid);
            self.data = &[];
            return Some(Err(MacError::Format));
        };

        let len = cid.payload_len(self.dir);
        if rest.len() < len {
            self.data = &[];
            return Some(Err(MacError::Length));
        }

        let (payload, rest) = rest.split_at(len);
        self.data = rest;
        Some(Ok(MacCommand::from_parts(cid, self.dir, payload)))
    }
}

/// Parse the MAC commands in FOpts or a port 0 payload.
///
/// `dir` is the direction of the frame that carried them. Iteration stops
/// after the first error.
pub fn parse_commands(dir: Direction, data: &[u8]) -> MacCommandIter<'_> {
    MacCommandIter { data, dir }
}

/// Encode commands into an FOpts field.
///
/// Fails with [`MacError::Length`] once the encoding would exceed 15 bytes.
pub fn encode_commands(commands: &[MacCommand]) -> Result<FOpts> {
    let mut out = FOpts::new();
    for command in commands {
        command.write_to(&mut out)?;
    }
    Ok(out)
}
