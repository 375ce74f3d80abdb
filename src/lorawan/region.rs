/// Regional parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// Europe 863-870 MHz
    EU868,
    /// United States 902-928 MHz
    US915,
}

/// Data rate index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    /// Data rate 0
    DR0 = 0,
    /// Data rate 1
    DR1 = 1,
    /// Data rate 2
    DR2 = 2,
    /// Data rate 3
    DR3 = 3,
    /// Data rate 4
    DR4 = 4,
    /// Data rate 5
    DR5 = 5,
    /// Data rate 6
    DR6 = 6,
    /// Data rate 7
    DR7 = 7,
}

impl DataRate {
    /// Data rate from its index, `None` above DR7
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(DataRate::DR0),
            1 => Some(DataRate::DR1),
            2 => Some(DataRate::DR2),
            3 => Some(DataRate::DR3),
            4 => Some(DataRate::DR4),
            5 => Some(DataRate::DR5),
            6 => Some(DataRate::DR6),
            7 => Some(DataRate::DR7),
            _ => None,
        }
    }

    /// Data rate index
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl Region {
    /// Maximum FRMPayload size (N) for a data rate, without FOpts.
    ///
    /// Reserved data rates report 0.
    pub fn max_payload_size(self, data_rate: DataRate) -> usize {
        match self {
            Region::EU868 => match data_rate {
                DataRate::DR0 | DataRate::DR1 | DataRate::DR2 => 51,
                DataRate::DR3 => 115,
                DataRate::DR4 | DataRate::DR5 | DataRate::DR6 | DataRate::DR7 => 222,
            },
            Region::US915 => match data_rate {
                DataRate::DR0 => 11,
                DataRate::DR1 => 53,
                DataRate::DR2 => 125,
                DataRate::DR3 | DataRate::DR4 => 242,
                DataRate::DR5 | DataRate::DR6 | DataRate::DR7 => 0,
            },
        }
    }
}

/// Frame format in effect: region plus current data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    /// Regional parameter set
    pub region: Region,
    /// Current uplink data rate
    pub data_rate: DataRate,
}

impl FrameFormat {
    /// Create a frame format
    pub const fn new(region: Region, data_rate: DataRate) -> Self {
        Self { region, data_rate }
    }

    /// Switch to another data rate within the same region
    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self { data_rate, ..self }
    }

    /// Maximum user payload length for this format
    pub fn max_payload_length(&self) -> usize {
        self.region.max_payload_size(self.data_rate)
    }
}
