use crate::config::TimingConfig;
use crate::errors::AttemptError;
use crate::notify::{Event, Notify};
use crate::outputs::{Blink, Outputs};
use fpm_rs::{CharBuffer, Confirmation, LedColor, LedMode, Match, Presence, SearchResult, Sensor, Transport};
use std::thread;
use std::time::{Duration, Instant};

/// Flash speed of the "lift your finger" ring signal.
const REMOVE_FLASH_SPEED: u8 = 200;

/// Library slot that follows `count` stored templates, or `None` when the
/// library is full. Gaps left by deleted templates are not reused.
pub fn next_free_slot(count: u16, capacity: u16) -> Option<u16> {
    if count >= capacity {
        None
    } else {
        Some(count + 1)
    }
}

/// The capture-and-report loop: one sensor, one relay, one feedback LED and
/// one notifier, driven one command at a time.
pub struct Terminal<T, N> {
    sensor: Sensor<T>,
    notifier: N,
    outputs: Outputs,
    timing: TimingConfig,
}

impl<T: Transport, N: Notify> Terminal<T, N> {
    pub fn new(sensor: Sensor<T>, notifier: N, outputs: Outputs, timing: TimingConfig) -> Self {
        Terminal {
            sensor,
            notifier,
            outputs,
            timing,
        }
    }

    pub fn capacity(&self) -> u16 {
        self.sensor.capacity()
    }

    pub fn sensor(&self) -> &Sensor<T> {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut Sensor<T> {
        &mut self.sensor
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn signal(&mut self, blink: Blink) {
        self.outputs.status_led.blink(blink);
    }

    /// Waits for a finger, then extracts its features into `buffer`.
    pub fn acquire_and_template(&mut self, buffer: CharBuffer) -> Result<(), AttemptError> {
        log::info!("Place finger on sensor for image {}", buffer);
        self.ring(LedMode::On, LedColor::Blue);

        let result = self.wait_for_finger().and_then(|()| {
            log::info!("Image taken.");
            self.sensor
                .image_to_template(buffer)
                .map_err(AttemptError::from)
        });
        self.ring_off();

        match &result {
            Ok(()) => log::info!("Image converted to template slot {}", buffer),
            Err(e) => log::warn!("{}", e),
        }

        result
    }

    /// Finds the slot the next auto-enrollment will use.
    pub fn find_next_free_slot(&mut self) -> Result<u16, AttemptError> {
        log::info!("Searching for an available ID...");
        let count = self.sensor.template_count()?;
        log::info!("Current number of stored templates: {}", count);

        match next_free_slot(count, self.capacity()) {
            Some(id) => {
                log::info!("Next available ID for enrollment: {}", id);
                Ok(id)
            }
            None => Err(AttemptError::Full(count)),
        }
    }

    /// Enrolls into the next free slot and reports it to the server.
    pub fn auto_enroll(&mut self) -> Result<u16, AttemptError> {
        log::info!("Starting automatic enrollment...");

        let id = match self.find_next_free_slot() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Enrollment failed: {}", e);
                self.signal(Blink::FAILED);
                return Err(e);
            }
        };

        self.enroll(id, true).map(|()| id)
    }

    /// Two captures, model creation and storage at `id`. On success the
    /// enrollment is reported when `report` is set.
    pub fn enroll(&mut self, id: u16, report: bool) -> Result<(), AttemptError> {
        log::info!("Starting enrollment for ID #{}", id);

        let result = self.capture_model(id).and_then(|()| self.store(id));
        match &result {
            Ok(()) => {
                log::info!("Enrollment successful for ID #{}", id);
                self.show(LedColor::Blue);
                if report {
                    self.report(Event::Enrolled { id });
                }
            }
            Err(e) => log::warn!("Enrollment process failed: {}", e),
        }
        self.ring_off();

        result
    }

    /// One capture and a library search. A match opens the relay and is
    /// reported to the server.
    pub fn identify(&mut self) -> Result<Match, AttemptError> {
        log::info!("Starting login process. Place finger on sensor...");
        self.acquire_and_template(CharBuffer::One)?;

        log::info!("Searching for match...");
        self.ring(LedMode::On, LedColor::Blue);
        let search = self.sensor.fast_search();
        self.ring_off();

        let found = match search {
            Ok(SearchResult::Found(found)) => found,
            Ok(SearchResult::NotFound) => {
                log::warn!("Fingerprint not found in database.");
                self.show(LedColor::Red);
                return Err(AttemptError::NotFound);
            }
            Err(e) => {
                let e = AttemptError::from(e);
                log::warn!("Search failed: {}", e);
                self.show(LedColor::Red);
                return Err(e);
            }
        };

        log::info!(
            "Fingerprint match found! ID: {} Confidence: {}",
            found.id,
            found.confidence
        );
        self.show(LedColor::Blue);
        self.outputs.relay.pulse(self.timing.relay_hold());
        self.report(Event::Login {
            id: found.id,
            confidence: found.confidence,
        });

        Ok(found)
    }

    fn capture_model(&mut self, id: u16) -> Result<(), AttemptError> {
        self.acquire_and_template(CharBuffer::One)?;

        log::info!("Remove finger.");
        self.ring(LedMode::Flashing, LedColor::Purple);
        thread::sleep(self.timing.removal_settle());
        let removed = self.wait_for_removal();
        self.ring_off();
        removed?;
        log::info!("Finger removed.");

        self.acquire_and_template(CharBuffer::Two)?;

        log::info!("Creating model for ID #{}", id);
        self.ring(LedMode::On, LedColor::Blue);
        match self.sensor.create_model() {
            Ok(()) => {
                log::info!("Fingerprints matched! Model created.");
                Ok(())
            }
            Err(e) => {
                let e = AttemptError::from(e);
                if let AttemptError::Mismatch = e {
                    self.show(LedColor::Red);
                }
                Err(e)
            }
        }
    }

    fn store(&mut self, id: u16) -> Result<(), AttemptError> {
        log::info!("Storing model at ID #{}", id);
        self.ring(LedMode::On, LedColor::Blue);

        self.sensor.store_model(id).map_err(|e| {
            let e = match e.confirmation() {
                Some(Confirmation::BadLocation) => AttemptError::BadSlot(id),
                _ => AttemptError::from(e),
            };
            self.show(LedColor::Red);
            e
        })
    }

    fn wait_for_finger(&mut self) -> Result<(), AttemptError> {
        let timeout = self.timing.finger_timeout();
        self.poll_until(Presence::Finger, timeout, AttemptError::NoFingerTimeout)
    }

    fn wait_for_removal(&mut self) -> Result<(), AttemptError> {
        let timeout = self.timing.removal_timeout();
        self.poll_until(Presence::NoFinger, timeout, AttemptError::RemovalTimeout)
    }

    /// Polls `get_image` until it reports `wanted`. While waiting for a
    /// finger any sensor error ends the wait; while waiting for removal the
    /// module is simply asked again.
    fn poll_until(
        &mut self,
        wanted: Presence,
        timeout: Duration,
        expired: AttemptError,
    ) -> Result<(), AttemptError> {
        let started = Instant::now();

        loop {
            match self.sensor.get_image() {
                Ok(presence) if presence == wanted => return Ok(()),
                Ok(_) => {}
                Err(e) if wanted == Presence::Finger => return Err(e.into()),
                Err(e) => log::debug!("while waiting for removal: {}", e),
            }

            if started.elapsed() > timeout {
                return Err(expired);
            }
            thread::sleep(self.timing.poll_interval());
        }
    }

    fn report(&mut self, event: Event) {
        match self.notifier.notify(&event) {
            Ok(delivery) => {
                log::info!("HTTP Response code ({}): {}", event.kind(), delivery.status);
                log::info!("Response: {}", delivery.body);
                if let Event::Enrolled { .. } = event {
                    self.signal(Blink::REPORTED);
                }
            }
            Err(e) => {
                log::error!("Failed to send {} data to server: {}", event.kind(), e);
                self.signal(Blink::FAILED);
            }
        }
    }

    /// Holds a colour on the ring for the feedback period, then clears it.
    fn show(&mut self, color: LedColor) {
        self.ring(LedMode::On, color);
        thread::sleep(self.timing.feedback());
        self.ring_off();
    }

    fn ring(&mut self, mode: LedMode, color: LedColor) {
        let speed = if mode == LedMode::Flashing {
            REMOVE_FLASH_SPEED
        } else {
            0
        };
        if let Err(e) = self.sensor.led_control(mode, speed, color, 0) {
            log::debug!("ring LED: {}", e);
        }
    }

    fn ring_off(&mut self) {
        if let Err(e) = self.sensor.led_off() {
            log::debug!("ring LED: {}", e);
        }
    }
}
