use crate::Confirmation;
use failure::Fail;
use fpm_sys::{PacketError, PacketKind};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Fail)]
pub enum SensorError {
    #[fail(display = "Module rejected instruction {:#04x}: {}", instruction, code)]
    Rejected {
        instruction: u8,
        code: Confirmation,
    },
    #[fail(display = "{}", _0)]
    Packet(#[cause] PacketError),
    #[fail(display = "Expected an acknowledge packet, got {}", _0)]
    UnexpectedKind(PacketKind),
    #[fail(
        display = "Reply came from address {:#010x}, expected {:#010x}",
        got, expected
    )]
    WrongAddress { got: u32, expected: u32 },
    #[fail(display = "Acknowledge packet carries no confirmation code")]
    EmptyReply,
    #[fail(
        display = "Reply to instruction {:#04x} has {} bytes, expected {}",
        instruction, got, need
    )]
    ShortReply {
        instruction: u8,
        got: usize,
        need: usize,
    },
    #[fail(display = "Can not open `{}`: {}", _0, _1)]
    Open(String, #[cause] io::Error),
    #[fail(display = "No fingerprint module answered on any of {:?}", _0)]
    NoModule(Vec<PathBuf>),
}

impl SensorError {
    /// Confirmation code of a rejected instruction.
    pub fn confirmation(&self) -> Option<Confirmation> {
        match self {
            SensorError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the link to the module misbehaved rather than the module
    /// refusing the instruction.
    pub fn is_communication(&self) -> bool {
        match self {
            SensorError::Rejected { code, .. } => *code == Confirmation::PacketReceive,
            SensorError::Packet(_)
            | SensorError::UnexpectedKind(_)
            | SensorError::WrongAddress { .. }
            | SensorError::EmptyReply
            | SensorError::ShortReply { .. } => true,
            SensorError::Open(..) | SensorError::NoModule(_) => false,
        }
    }
}

impl From<PacketError> for SensorError {
    fn from(error: PacketError) -> Self {
        SensorError::Packet(error)
    }
}
