use failure::Fail;
use fpm_rs::{Confirmation, SensorError};

/// Why a single enroll or identify attempt ended early. None of these
/// outlive the command that produced them.
#[derive(Debug, Fail)]
pub enum AttemptError {
    #[fail(display = "Timeout: no fingerprint detected")]
    NoFingerTimeout,
    #[fail(display = "Timeout waiting for finger removal")]
    RemovalTimeout,
    #[fail(display = "Communication error: {}", _0)]
    CommError(#[cause] SensorError),
    #[fail(display = "Imaging error: {}", _0)]
    ImageQuality(Confirmation),
    #[fail(display = "Could not find fingerprint features")]
    FeatureExtractionFailed,
    #[fail(display = "Fingerprints did not match")]
    Mismatch,
    #[fail(display = "Invalid storage location #{}", _0)]
    BadSlot(u16),
    #[fail(display = "Error writing to flash memory")]
    StorageWriteError,
    #[fail(display = "Fingerprint not found in database")]
    NotFound,
    #[fail(display = "Fingerprint database is full ({} templates)", _0)]
    Full(u16),
    #[fail(display = "Invalid ID `{}`: expected 1-{}", input, capacity)]
    InvalidId { input: String, capacity: u16 },
    #[fail(display = "{}", _0)]
    Sensor(#[cause] SensorError),
}

impl From<SensorError> for AttemptError {
    fn from(error: SensorError) -> Self {
        if error.is_communication() {
            return AttemptError::CommError(error);
        }

        match error.confirmation() {
            Some(code @ Confirmation::ImageFail)
            | Some(code @ Confirmation::ImageMess)
            | Some(code @ Confirmation::InvalidImage) => AttemptError::ImageQuality(code),
            Some(Confirmation::FeatureFail) => AttemptError::FeatureExtractionFailed,
            Some(Confirmation::EnrollMismatch) => AttemptError::Mismatch,
            Some(Confirmation::FlashError) => AttemptError::StorageWriteError,
            _ => AttemptError::Sensor(error),
        }
    }
}

#[derive(Debug, Fail)]
pub enum NotifyError {
    #[fail(display = "Network link `{}` is down", _0)]
    LinkDown(String),
    #[fail(display = "HTTP POST to {} failed: {}", url, reason)]
    Transport { url: String, reason: String },
    #[fail(display = "Can not read response body: {}", _0)]
    Body(#[cause] std::io::Error),
    #[fail(display = "Can not encode event: {}", _0)]
    Encode(#[cause] serde_json::Error),
}
