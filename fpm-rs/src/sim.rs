//! An in-memory module for exercising code that drives a `Sensor` without
//! hardware. Fingers are plain numbers: two readings of the same number
//! produce matching templates, different numbers never match.

use crate::{LedColor, LedMode, SensorError, Transport};
use fpm_sys::{cmd, code, Packet, PacketError, PacketKind, DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::convert::TryFrom;

/// What the sensor window sees on one `get_image`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Reading {
    Finger(u32),
    NoFinger,
    /// The image is taken but too messy to extract features from.
    Smudged,
    /// The image is taken but carries no usable minutiae.
    Featureless,
    /// The imaging hardware fails.
    ImageFail,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Image {
    Print(u32),
    Smudged,
    Featureless,
}

/// Scores reported for a match; real modules report roughly 50..300.
pub const MATCH_CONFIDENCE: u16 = 142;

#[derive(Debug)]
pub struct SimulatedSensor {
    address: u32,
    password: u32,
    capacity: u16,
    library: BTreeMap<u16, u32>,
    image: Option<Image>,
    buffers: [Option<u32>; 2],
    readings: VecDeque<Reading>,
    resting: Reading,
    forced: HashMap<u8, VecDeque<u8>>,
    reply: Option<Packet>,
    unplugged: bool,
    instructions: Vec<u8>,
    leds: Vec<(LedMode, LedColor)>,
}

impl SimulatedSensor {
    pub fn new(capacity: u16) -> Self {
        SimulatedSensor {
            address: DEFAULT_ADDRESS,
            password: DEFAULT_PASSWORD,
            capacity,
            library: BTreeMap::new(),
            image: None,
            buffers: [None, None],
            readings: VecDeque::new(),
            resting: Reading::NoFinger,
            forced: HashMap::new(),
            reply: None,
            unplugged: false,
            instructions: Vec::new(),
            leds: Vec::new(),
        }
    }

    /// Answers only on `address` and accepts only `password` in the handshake.
    pub fn with_credentials(mut self, address: u32, password: u32) -> Self {
        self.address = address;
        self.password = password;
        self
    }

    /// Queues readings returned by successive `get_image` instructions.
    pub fn script<I: IntoIterator<Item = Reading>>(&mut self, readings: I) {
        self.readings.extend(readings);
    }

    /// Reading returned once the script runs out. Defaults to `NoFinger`.
    pub fn rest_on(&mut self, reading: Reading) {
        self.resting = reading;
    }

    /// Stores `finger` at `id` as if it had been enrolled earlier.
    pub fn preload(&mut self, id: u16, finger: u32) {
        self.library.insert(id, finger);
    }

    /// Makes the next `instruction` answer with `confirmation` regardless of state.
    pub fn fail_next(&mut self, instruction: u8, confirmation: u8) {
        self.forced
            .entry(instruction)
            .or_insert_with(VecDeque::new)
            .push_back(confirmation);
    }

    /// From now on the module never answers.
    pub fn unplug(&mut self) {
        self.unplugged = true;
    }

    pub fn stored(&self, id: u16) -> Option<u32> {
        self.library.get(&id).copied()
    }

    pub fn template_count(&self) -> usize {
        self.library.len()
    }

    pub fn remaining_readings(&self) -> usize {
        self.readings.len()
    }

    /// Instruction codes received so far, oldest first.
    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    pub fn led_history(&self) -> &[(LedMode, LedColor)] {
        &self.leds
    }

    fn respond(&mut self, instruction: u8, params: &[u8]) -> Vec<u8> {
        if let Some(code) = self.forced.get_mut(&instruction).and_then(VecDeque::pop_front) {
            return vec![code];
        }

        match instruction {
            cmd::VERIFY_PASSWORD => {
                let ok = params.len() == 4
                    && u32::from_be_bytes([params[0], params[1], params[2], params[3]])
                        == self.password;
                vec![if ok { code::OK } else { code::PASS_FAIL }]
            }
            cmd::GET_IMAGE => {
                let reading = self.readings.pop_front().unwrap_or(self.resting);
                match reading {
                    Reading::Finger(finger) => self.take(Image::Print(finger)),
                    Reading::Smudged => self.take(Image::Smudged),
                    Reading::Featureless => self.take(Image::Featureless),
                    Reading::NoFinger => vec![code::NO_FINGER],
                    Reading::ImageFail => vec![code::IMAGE_FAIL],
                }
            }
            cmd::IMAGE_2_TZ => match (buffer_index(params.get(0)), self.image) {
                (None, _) => vec![code::INVALID_REG],
                (_, None) => vec![code::INVALID_IMAGE],
                (_, Some(Image::Smudged)) => vec![code::IMAGE_MESS],
                (_, Some(Image::Featureless)) => vec![code::FEATURE_FAIL],
                (Some(index), Some(Image::Print(finger))) => {
                    self.buffers[index] = Some(finger);
                    vec![code::OK]
                }
            },
            cmd::REG_MODEL => match self.buffers {
                [Some(a), Some(b)] if a == b => vec![code::OK],
                _ => vec![code::ENROLL_MISMATCH],
            },
            cmd::STORE => {
                let index = buffer_index(params.get(0));
                let id = word(params, 1);
                match (index, id) {
                    (Some(index), Some(id)) if self.in_library(id) => match self.buffers[index] {
                        Some(finger) => {
                            self.library.insert(id, finger);
                            vec![code::OK]
                        }
                        None => vec![code::INVALID_REG],
                    },
                    _ => vec![code::BAD_LOCATION],
                }
            }
            cmd::LOAD => {
                let index = buffer_index(params.get(0));
                let stored = word(params, 1).and_then(|id| self.library.get(&id).copied());
                match (index, stored) {
                    (Some(index), Some(finger)) => {
                        self.buffers[index] = Some(finger);
                        vec![code::OK]
                    }
                    _ => vec![code::DB_READ_FAIL],
                }
            }
            cmd::DELETE => match (word(params, 0), word(params, 2)) {
                (Some(id), Some(count)) if self.in_library(id) => {
                    let end = id.saturating_add(count);
                    let doomed: Vec<u16> = self.library.range(id..end).map(|(k, _)| *k).collect();
                    for id in doomed {
                        self.library.remove(&id);
                    }
                    vec![code::OK]
                }
                _ => vec![code::DELETE_FAIL],
            },
            cmd::EMPTY => {
                self.library.clear();
                vec![code::OK]
            }
            cmd::SEARCH | cmd::HI_SPEED_SEARCH => {
                let probe = buffer_index(params.get(0)).and_then(|index| self.buffers[index]);
                let start = word(params, 1).unwrap_or(0);
                let count = word(params, 3).unwrap_or(0);
                let end = u32::from(start) + u32::from(count);
                let hit = probe.and_then(|finger| {
                    self.library
                        .iter()
                        .find(|(id, stored)| u32::from(**id) < end && **id >= start && **stored == finger)
                        .map(|(id, _)| *id)
                });
                match hit {
                    Some(id) => {
                        let mut reply = vec![code::OK];
                        reply.extend_from_slice(&id.to_be_bytes());
                        reply.extend_from_slice(&MATCH_CONFIDENCE.to_be_bytes());
                        reply
                    }
                    None => vec![code::NOT_FOUND, 0, 0, 0, 0],
                }
            }
            cmd::TEMPLATE_COUNT => {
                let mut reply = vec![code::OK];
                reply.extend_from_slice(&(self.library.len() as u16).to_be_bytes());
                reply
            }
            cmd::READ_SYS_PARAM => {
                let mut reply = vec![code::OK];
                reply.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
                reply.extend_from_slice(&self.capacity.to_be_bytes());
                reply.extend_from_slice(&[0x00, 0x03]);
                reply.extend_from_slice(&self.address.to_be_bytes());
                reply.extend_from_slice(&[0x00, 0x02, 0x00, 0x06]);
                reply
            }
            cmd::AURA_LED_CONFIG => {
                let mode = params.get(0).and_then(|m| LedMode::try_from(*m).ok());
                let color = params.get(2).and_then(|c| LedColor::try_from(*c).ok());
                match (mode, color) {
                    (Some(mode), Some(color)) => {
                        self.leds.push((mode, color));
                        vec![code::OK]
                    }
                    _ => vec![code::PACKET_RECEIVE_ERR],
                }
            }
            _ => vec![code::PACKET_RECEIVE_ERR],
        }
    }

    fn take(&mut self, image: Image) -> Vec<u8> {
        self.image = Some(image);
        vec![code::OK]
    }

    fn in_library(&self, id: u16) -> bool {
        id >= 1 && id <= self.capacity
    }
}

impl Transport for SimulatedSensor {
    fn send(&mut self, packet: &Packet) -> crate::Result<()> {
        self.reply = None;
        if self.unplugged || packet.address != self.address || packet.kind != PacketKind::Command {
            return Ok(());
        }

        let (instruction, params) = match packet.payload.split_first() {
            Some((instruction, params)) => (*instruction, params.to_vec()),
            None => return Ok(()),
        };
        self.instructions.push(instruction);

        let payload = self.respond(instruction, &params);
        self.reply = Some(Packet::new(self.address, PacketKind::Ack, payload));

        Ok(())
    }

    fn receive(&mut self) -> crate::Result<Packet> {
        self.reply
            .take()
            .ok_or(SensorError::Packet(PacketError::Timeout))
    }
}

fn buffer_index(byte: Option<&u8>) -> Option<usize> {
    match byte {
        Some(1) => Some(0),
        Some(2) => Some(1),
        _ => None,
    }
}

fn word(params: &[u8], at: usize) -> Option<u16> {
    match (params.get(at), params.get(at + 1)) {
        (Some(hi), Some(lo)) => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}
