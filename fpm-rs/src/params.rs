use crate::SensorError;
use fpm_sys::cmd;
use std::convert::TryFrom;

/// Length of the parameter block returned by `ReadSysPara`.
pub const PARAMS_LEN: usize = 16;

/// The module's basic parameter table. Mostly useful for diagnostics and to
/// learn the library capacity of a module instead of configuring it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SystemParams {
    /// Status register; bit 0 is "busy", bit 1 "passed matching".
    pub status: u16,
    pub system_id: u16,
    /// Number of template slots in the library.
    pub capacity: u16,
    /// Matching threshold, 1 (loose) to 5 (strict).
    pub security_level: u16,
    pub address: u32,
    pub packet_size: PacketSize,
    /// UART speed in bits per second.
    pub baud_rate: u32,
}

impl SystemParams {
    pub fn is_busy(&self) -> bool {
        self.status & 0x0001 != 0
    }
}

/// Maximum length of a data packet the module will send.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PacketSize {
    Bytes32,
    Bytes64,
    Bytes128,
    Bytes256,
}

impl PacketSize {
    pub fn bytes(self) -> usize {
        match self {
            PacketSize::Bytes32 => 32,
            PacketSize::Bytes64 => 64,
            PacketSize::Bytes128 => 128,
            PacketSize::Bytes256 => 256,
        }
    }
}

impl From<u16> for PacketSize {
    fn from(value: u16) -> Self {
        match value & 0x3 {
            0 => PacketSize::Bytes32,
            1 => PacketSize::Bytes64,
            2 => PacketSize::Bytes128,
            _ => PacketSize::Bytes256,
        }
    }
}

impl TryFrom<&[u8]> for SystemParams {
    type Error = SensorError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < PARAMS_LEN {
            return Err(SensorError::ShortReply {
                instruction: cmd::READ_SYS_PARAM,
                got: bytes.len(),
                need: PARAMS_LEN,
            });
        }

        let word = |at: usize| u16::from_be_bytes([bytes[at], bytes[at + 1]]);

        Ok(SystemParams {
            status: word(0),
            system_id: word(2),
            capacity: word(4),
            security_level: word(6),
            address: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            packet_size: PacketSize::from(word(12)),
            baud_rate: u32::from(word(14)) * 9_600,
        })
    }
}
