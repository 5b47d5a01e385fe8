use crate::consts::{pid, CHECKSUM_LEN, HEADER_LEN, MAX_PAYLOAD_LEN, START_CODE};
use failure::Fail;
use std::convert::TryFrom;
use std::fmt;
use std::io::{self, Read, Write};

#[derive(Debug, Fail)]
pub enum PacketError {
    #[fail(display = "Frame does not start with 0xEF01 (got {:#06x})", _0)]
    BadStartCode(u16),
    #[fail(display = "Unknown packet identifier {:#04x}", _0)]
    UnknownKind(u8),
    #[fail(display = "Declared length {} is out of range", _0)]
    BadLength(u16),
    #[fail(
        display = "Checksum mismatch: computed {:#06x}, received {:#06x}",
        computed, received
    )]
    Checksum { computed: u16, received: u16 },
    #[fail(display = "Frame truncated: need {} bytes, have {}", need, have)]
    Truncated { need: usize, have: usize },
    #[fail(display = "Payload of {} bytes does not fit in a frame", _0)]
    Oversized(usize),
    #[fail(display = "No reply from module before the read timeout")]
    Timeout,
    #[fail(display = "I/O error on the module link: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for PacketError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::UnexpectedEof => {
                PacketError::Timeout
            }
            _ => PacketError::Io(error),
        }
    }
}

/// Packet identifier byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PacketKind {
    Command = 0x01,
    Data = 0x02,
    Ack = 0x07,
    EndData = 0x08,
}

impl TryFrom<u8> for PacketKind {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            pid::COMMAND => Ok(PacketKind::Command),
            pid::DATA => Ok(PacketKind::Data),
            pid::ACK => Ok(PacketKind::Ack),
            pid::END_DATA => Ok(PacketKind::EndData),
            n => Err(PacketError::UnknownKind(n)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            PacketKind::Command => "Command",
            PacketKind::Data => "Data",
            PacketKind::Ack => "Ack",
            PacketKind::EndData => "EndData",
        };

        write!(f, "{}", string)
    }
}

/// One frame of the module protocol:
///
/// ```text
/// EF 01 | address (4, BE) | pid (1) | length (2, BE) | payload | checksum (2, BE)
/// ```
///
/// `length` counts the payload plus the checksum. The checksum is the wrapping
/// 16-bit sum of the pid, both length bytes and every payload byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(address: u32, kind: PacketKind, payload: Vec<u8>) -> Self {
        Packet {
            address,
            kind,
            payload,
        }
    }

    /// Instruction packet: `payload[0]` is the instruction code, the rest its parameters.
    pub fn command(address: u32, instruction: u8, params: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(params.len() + 1);
        payload.push(instruction);
        payload.extend_from_slice(params);

        Packet::new(address, PacketKind::Command, payload)
    }

    /// Value of the length field for this packet.
    pub fn length_field(&self) -> u16 {
        (self.payload.len() + CHECKSUM_LEN) as u16
    }

    pub fn checksum(&self) -> u16 {
        checksum(self.kind as u8, self.length_field(), &self.payload)
    }

    /// First payload byte. For acknowledge packets this is the confirmation code.
    pub fn code(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(PacketError::Oversized(self.payload.len()));
        }

        let mut frame = Vec::with_capacity(HEADER_LEN + self.payload.len() + CHECKSUM_LEN);
        frame.extend_from_slice(&START_CODE.to_be_bytes());
        frame.extend_from_slice(&self.address.to_be_bytes());
        frame.push(self.kind as u8);
        frame.extend_from_slice(&self.length_field().to_be_bytes());
        frame.extend_from_slice(&self.payload);
        frame.extend_from_slice(&self.checksum().to_be_bytes());

        Ok(frame)
    }

    /// Decodes one frame from the front of `bytes`, returning it with the number
    /// of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Packet, usize), PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::Truncated {
                need: HEADER_LEN,
                have: bytes.len(),
            });
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&bytes[..HEADER_LEN]);
        let (address, kind, length) = parse_header(&header)?;

        let total = HEADER_LEN + length as usize;
        if bytes.len() < total {
            return Err(PacketError::Truncated {
                need: total,
                have: bytes.len(),
            });
        }

        let packet = parse_body(address, kind, length, &bytes[HEADER_LEN..total])?;

        Ok((packet, total))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), PacketError> {
        let frame = self.encode()?;
        writer.write_all(&frame)?;
        writer.flush()?;

        Ok(())
    }

    /// Reads exactly one frame. Bytes ahead of the next start code are
    /// skipped, so a garbled reply costs only the command it answered. A reader
    /// that reports end of input or a timeout before the frame is complete
    /// yields `PacketError::Timeout`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Packet, PacketError> {
        let mut header = [0u8; HEADER_LEN];
        skip_to_start(reader)?;
        header[..2].copy_from_slice(&START_CODE.to_be_bytes());
        reader.read_exact(&mut header[2..])?;
        let (address, kind, length) = parse_header(&header)?;

        let mut body = vec![0u8; length as usize];
        reader.read_exact(&mut body)?;

        parse_body(address, kind, length, &body)
    }
}

pub fn checksum(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [hi, lo] = length.to_be_bytes();

    payload
        .iter()
        .fold(u16::from(kind), |sum, byte| sum.wrapping_add(u16::from(*byte)))
        .wrapping_add(u16::from(hi))
        .wrapping_add(u16::from(lo))
}

/// Consumes bytes up to and including the next start code.
fn skip_to_start<R: Read>(reader: &mut R) -> Result<(), PacketError> {
    let [hi, lo] = START_CODE.to_be_bytes();
    let mut previous = None;
    let mut byte = [0u8; 1];

    loop {
        reader.read_exact(&mut byte)?;
        if previous == Some(hi) && byte[0] == lo {
            return Ok(());
        }
        previous = Some(byte[0]);
    }
}

fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(u32, PacketKind, u16), PacketError> {
    let start = u16::from_be_bytes([header[0], header[1]]);
    if start != START_CODE {
        return Err(PacketError::BadStartCode(start));
    }

    let address = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
    let kind = PacketKind::try_from(header[6])?;
    let length = u16::from_be_bytes([header[7], header[8]]);

    if (length as usize) < CHECKSUM_LEN || (length as usize) > MAX_PAYLOAD_LEN + CHECKSUM_LEN {
        return Err(PacketError::BadLength(length));
    }

    Ok((address, kind, length))
}

fn parse_body(
    address: u32,
    kind: PacketKind,
    length: u16,
    body: &[u8],
) -> Result<Packet, PacketError> {
    let split = body.len() - CHECKSUM_LEN;
    let (payload, sum) = body.split_at(split);
    let received = u16::from_be_bytes([sum[0], sum[1]]);
    let computed = checksum(kind as u8, length, payload);

    if computed != received {
        return Err(PacketError::Checksum { computed, received });
    }

    Ok(Packet::new(address, kind, payload.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{cmd, DEFAULT_ADDRESS};
    use proptest::prelude::*;

    #[test]
    fn get_image_frame_matches_datasheet() {
        let packet = Packet::command(DEFAULT_ADDRESS, cmd::GET_IMAGE, &[]);
        let frame = packet.encode().unwrap();

        assert_eq!(
            frame,
            vec![0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
        );
    }

    #[test]
    fn verify_password_frame_matches_datasheet() {
        let packet = Packet::command(DEFAULT_ADDRESS, cmd::VERIFY_PASSWORD, &[0, 0, 0, 0]);
        let frame = packet.encode().unwrap();

        assert_eq!(&frame[6..9], &[0x01, 0x00, 0x07]);
        assert_eq!(&frame[frame.len() - 2..], &[0x00, 0x1B]);
    }

    #[test]
    fn decode_reads_ack_and_reports_consumed_bytes() {
        let ack = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00, 0x00, 0x05]);
        let mut bytes = ack.encode().unwrap();
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let (decoded, used) = Packet::decode(&bytes).unwrap();

        assert_eq!(decoded, ack);
        assert_eq!(used, bytes.len() - 2);
        assert_eq!(decoded.code(), Some(0x00));
    }

    #[test]
    fn corrupt_checksum_is_rejected() {
        let ack = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x02]);
        let mut bytes = ack.encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        match Packet::decode(&bytes) {
            Err(PacketError::Checksum { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_start_code_is_rejected() {
        let mut bytes = Packet::command(DEFAULT_ADDRESS, cmd::EMPTY, &[])
            .encode()
            .unwrap();
        bytes[0] = 0x00;

        match Packet::decode(&bytes) {
            Err(PacketError::BadStartCode(0x0001)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn short_read_maps_to_timeout() {
        let frame = Packet::command(DEFAULT_ADDRESS, cmd::TEMPLATE_COUNT, &[])
            .encode()
            .unwrap();
        let mut reader = &frame[..frame.len() - 1];

        match Packet::read_from(&mut reader) {
            Err(PacketError::Timeout) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn read_skips_noise_before_start_code() {
        let ack = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00, 0x00, 0x07]);
        let mut bytes = vec![0x00, 0xEF, 0x42];
        bytes.extend(ack.encode().unwrap());
        bytes.extend(ack.encode().unwrap());
        let mut reader = &bytes[..];

        assert_eq!(Packet::read_from(&mut reader).unwrap(), ack);
        assert_eq!(Packet::read_from(&mut reader).unwrap(), ack);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_recovers_after_corrupt_frame() {
        let ack = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00, 0x00, 0x02]);
        let mut bytes = ack.encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        bytes.extend(ack.encode().unwrap());
        let mut reader = &bytes[..];

        match Packet::read_from(&mut reader) {
            Err(PacketError::Checksum { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Packet::read_from(&mut reader).unwrap(), ack);
    }

    #[test]
    fn oversized_payload_is_refused() {
        let packet = Packet::new(DEFAULT_ADDRESS, PacketKind::Data, vec![0; MAX_PAYLOAD_LEN + 1]);

        assert!(packet.encode().is_err());
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            let _ = Packet::decode(&bytes);
        }

        #[test]
        fn single_bit_flip_in_payload_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..64),
            index in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let packet = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, payload);
            let mut bytes = packet.encode().unwrap();
            let at = HEADER_LEN + index.index(packet.payload.len());
            bytes[at] ^= 1 << bit;

            prop_assert!(Packet::decode(&bytes).is_err());
        }
    }
}
