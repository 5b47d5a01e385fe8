use crate::{Confirmation, LedColor, LedMode, SensorError, SystemParams, Transport};
use fpm_sys::{cmd, Packet, PacketKind, DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use std::convert::TryFrom;
use std::fmt;

/// Library size of the R307, used until told otherwise.
pub const DEFAULT_CAPACITY: u16 = 127;

/// One of the two feature buffers images are converted into.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CharBuffer {
    One = 1,
    Two = 2,
}

impl fmt::Display for CharBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", *self as u8)
    }
}

/// Outcome of a single image capture attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Presence {
    /// An image was taken and sits in the image buffer.
    Finger,
    NoFinger,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Match {
    pub id: u16,
    pub confidence: u16,
}

/// A search that ran to completion. Like `Presence`, a negative answer is
/// not an error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SearchResult {
    Found(Match),
    NotFound,
}

/// An optical fingerprint module.
///
/// Every method sends one instruction packet and waits for the acknowledge.
/// A module stores templates in numbered slots `1..=capacity` and keeps two
/// feature buffers; enrollment fills both, merges them into a model and
/// stores it, identification fills buffer one and searches the library.
#[derive(Debug)]
pub struct Sensor<T> {
    transport: T,
    address: u32,
    password: u32,
    capacity: u16,
}

impl<T: Transport> Sensor<T> {
    pub fn new(transport: T) -> Self {
        Sensor {
            transport,
            address: DEFAULT_ADDRESS,
            password: DEFAULT_PASSWORD,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn with_capacity(mut self, capacity: u16) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Performs the password handshake. Until it succeeds most modules refuse
    /// every other instruction, so this doubles as a presence check.
    pub fn verify_password(&mut self) -> crate::Result<()> {
        self.execute_ok(cmd::VERIFY_PASSWORD, &self.password.to_be_bytes())
            .map(|_| ())
    }

    /// Tries to capture an image into the image buffer. Returns immediately
    /// with `Presence::NoFinger` when the window is empty.
    pub fn get_image(&mut self) -> crate::Result<Presence> {
        let (code, _) = self.execute(cmd::GET_IMAGE, &[])?;

        match code {
            Confirmation::Ok => Ok(Presence::Finger),
            Confirmation::NoFinger => Ok(Presence::NoFinger),
            code => Err(rejected(cmd::GET_IMAGE, code)),
        }
    }

    /// Extracts features from the image buffer into `buffer`.
    pub fn image_to_template(&mut self, buffer: CharBuffer) -> crate::Result<()> {
        self.execute_ok(cmd::IMAGE_2_TZ, &[buffer as u8]).map(|_| ())
    }

    /// Merges both feature buffers into a model. Fails with
    /// `Confirmation::EnrollMismatch` when they come from different fingers.
    pub fn create_model(&mut self) -> crate::Result<()> {
        self.execute_ok(cmd::REG_MODEL, &[]).map(|_| ())
    }

    /// Writes the model in buffer one to library slot `id`.
    pub fn store_model(&mut self, id: u16) -> crate::Result<()> {
        let [hi, lo] = id.to_be_bytes();
        self.execute_ok(cmd::STORE, &[CharBuffer::One as u8, hi, lo])
            .map(|_| ())
    }

    /// Reads library slot `id` back into buffer one.
    pub fn load_model(&mut self, id: u16) -> crate::Result<()> {
        let [hi, lo] = id.to_be_bytes();
        self.execute_ok(cmd::LOAD, &[CharBuffer::One as u8, hi, lo])
            .map(|_| ())
    }

    pub fn delete_model(&mut self, id: u16) -> crate::Result<()> {
        let [hi, lo] = id.to_be_bytes();
        self.execute_ok(cmd::DELETE, &[hi, lo, 0x00, 0x01]).map(|_| ())
    }

    /// Deletes every template in the library.
    pub fn empty_library(&mut self) -> crate::Result<()> {
        self.execute_ok(cmd::EMPTY, &[]).map(|_| ())
    }

    /// High speed search of buffer one against the whole library.
    pub fn fast_search(&mut self) -> crate::Result<SearchResult> {
        let [hi, lo] = self.capacity.to_be_bytes();
        let params = [CharBuffer::One as u8, 0x00, 0x00, hi, lo];
        let (code, data) = self.execute(cmd::HI_SPEED_SEARCH, &params)?;

        match code {
            Confirmation::Ok => {
                let data = need(cmd::HI_SPEED_SEARCH, &data, 4)?;

                Ok(SearchResult::Found(Match {
                    id: u16::from_be_bytes([data[0], data[1]]),
                    confidence: u16::from_be_bytes([data[2], data[3]]),
                }))
            }
            Confirmation::NotFound => Ok(SearchResult::NotFound),
            code => Err(rejected(cmd::HI_SPEED_SEARCH, code)),
        }
    }

    /// Number of templates currently stored.
    pub fn template_count(&mut self) -> crate::Result<u16> {
        let data = self.execute_ok(cmd::TEMPLATE_COUNT, &[])?;
        let data = need(cmd::TEMPLATE_COUNT, &data, 2)?;

        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    pub fn read_params(&mut self) -> crate::Result<SystemParams> {
        let data = self.execute_ok(cmd::READ_SYS_PARAM, &[])?;

        SystemParams::try_from(&data[..])
    }

    /// Drives the ring LED. `speed` only matters for breathing and flashing,
    /// `cycles` of 0 repeats forever.
    pub fn led_control(
        &mut self,
        mode: LedMode,
        speed: u8,
        color: LedColor,
        cycles: u8,
    ) -> crate::Result<()> {
        self.execute_ok(
            cmd::AURA_LED_CONFIG,
            &[mode as u8, speed, color as u8, cycles],
        )
        .map(|_| ())
    }

    pub fn led_on(&mut self, color: LedColor) -> crate::Result<()> {
        self.led_control(LedMode::On, 0, color, 0)
    }

    pub fn led_off(&mut self) -> crate::Result<()> {
        self.led_control(LedMode::Off, 0, LedColor::Red, 0)
    }

    /// Sends an instruction and returns the confirmation code together with
    /// the rest of the acknowledge payload.
    fn execute(&mut self, instruction: u8, params: &[u8]) -> crate::Result<(Confirmation, Vec<u8>)> {
        let command = Packet::command(self.address, instruction, params);
        self.transport.send(&command)?;
        let reply = self.transport.receive()?;

        if reply.kind != PacketKind::Ack {
            return Err(SensorError::UnexpectedKind(reply.kind));
        }
        if reply.address != self.address {
            return Err(SensorError::WrongAddress {
                got: reply.address,
                expected: self.address,
            });
        }

        let mut payload = reply.payload;
        if payload.is_empty() {
            return Err(SensorError::EmptyReply);
        }
        let code = Confirmation::from(payload.remove(0));
        log::debug!("instruction {:#04x} -> {}", instruction, code);

        Ok((code, payload))
    }

    fn execute_ok(&mut self, instruction: u8, params: &[u8]) -> crate::Result<Vec<u8>> {
        let (code, data) = self.execute(instruction, params)?;

        if code.is_ok() {
            Ok(data)
        } else {
            Err(rejected(instruction, code))
        }
    }
}

fn rejected(instruction: u8, code: Confirmation) -> SensorError {
    SensorError::Rejected { instruction, code }
}

fn need(instruction: u8, data: &[u8], len: usize) -> crate::Result<&[u8]> {
    if data.len() < len {
        Err(SensorError::ShortReply {
            instruction,
            got: data.len(),
            need: len,
        })
    } else {
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Reading, SimulatedSensor};

    fn sensor() -> Sensor<SimulatedSensor> {
        Sensor::new(SimulatedSensor::new(DEFAULT_CAPACITY))
    }

    #[test]
    fn password_handshake() {
        let mut good = sensor();
        assert!(good.verify_password().is_ok());

        let mut bad = sensor().with_password(0xDEAD_BEEF);
        let error = bad.verify_password().unwrap_err();
        assert_eq!(error.confirmation(), Some(Confirmation::PasswordFail));
    }

    #[test]
    fn empty_window_is_not_an_error() {
        let mut sensor = sensor();

        assert_eq!(sensor.get_image().unwrap(), Presence::NoFinger);
    }

    #[test]
    fn enroll_then_search_finds_the_slot() {
        let mut sensor = sensor();
        sensor.transport_mut().script(vec![Reading::Finger(7), Reading::Finger(7)]);

        assert_eq!(sensor.get_image().unwrap(), Presence::Finger);
        sensor.image_to_template(CharBuffer::One).unwrap();
        assert_eq!(sensor.get_image().unwrap(), Presence::Finger);
        sensor.image_to_template(CharBuffer::Two).unwrap();
        sensor.create_model().unwrap();
        sensor.store_model(3).unwrap();
        assert_eq!(sensor.template_count().unwrap(), 1);

        sensor.transport_mut().script(vec![Reading::Finger(7)]);
        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::One).unwrap();

        match sensor.fast_search().unwrap() {
            SearchResult::Found(found) => assert_eq!(found.id, 3),
            SearchResult::NotFound => panic!("stored finger not found"),
        }
    }

    #[test]
    fn different_fingers_do_not_make_a_model() {
        let mut sensor = sensor();
        sensor.transport_mut().script(vec![Reading::Finger(1), Reading::Finger(2)]);

        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::One).unwrap();
        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::Two).unwrap();

        let error = sensor.create_model().unwrap_err();
        assert_eq!(error.confirmation(), Some(Confirmation::EnrollMismatch));
    }

    #[test]
    fn unknown_finger_is_not_found() {
        let mut sensor = sensor();
        sensor.transport_mut().script(vec![Reading::Finger(9)]);

        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::One).unwrap();

        assert_eq!(sensor.fast_search().unwrap(), SearchResult::NotFound);
    }

    #[test]
    fn store_outside_library_is_bad_location() {
        let mut sensor = sensor();
        sensor.transport_mut().script(vec![Reading::Finger(1), Reading::Finger(1)]);
        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::One).unwrap();
        sensor.get_image().unwrap();
        sensor.image_to_template(CharBuffer::Two).unwrap();
        sensor.create_model().unwrap();

        let error = sensor.store_model(DEFAULT_CAPACITY + 1).unwrap_err();
        assert_eq!(error.confirmation(), Some(Confirmation::BadLocation));
    }

    #[test]
    fn delete_and_empty_shrink_the_library() {
        let mut sensor = sensor();
        sensor.transport_mut().preload(1, 11);
        sensor.transport_mut().preload(2, 12);
        sensor.transport_mut().preload(3, 13);

        sensor.delete_model(2).unwrap();
        assert_eq!(sensor.template_count().unwrap(), 2);
        assert!(sensor.load_model(2).is_err());
        sensor.load_model(3).unwrap();

        sensor.empty_library().unwrap();
        assert_eq!(sensor.template_count().unwrap(), 0);
    }

    #[test]
    fn params_report_configured_capacity() {
        let mut sensor = Sensor::new(SimulatedSensor::new(300)).with_capacity(300);

        let params = sensor.read_params().unwrap();

        assert_eq!(params.capacity, 300);
        assert_eq!(params.baud_rate, 57_600);
    }

    #[test]
    fn led_commands_are_acknowledged() {
        let mut sensor = sensor();

        sensor.led_control(LedMode::Flashing, 200, LedColor::Purple, 0).unwrap();
        sensor.led_off().unwrap();

        assert_eq!(
            sensor.transport().led_history(),
            &[(LedMode::Flashing, LedColor::Purple), (LedMode::Off, LedColor::Red)]
        );
    }

    #[test]
    fn unplugged_module_is_a_communication_error() {
        let mut sensor = sensor();
        sensor.transport_mut().unplug();

        let error = sensor.template_count().unwrap_err();
        assert!(error.is_communication());
    }

    #[test]
    fn reply_from_another_address_is_refused() {
        let mut sensor = sensor().with_address(0x1234_5678);

        match sensor.template_count() {
            Err(SensorError::Packet(fpm_sys::PacketError::Timeout)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
