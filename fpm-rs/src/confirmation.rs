use fpm_sys::code;
use std::fmt;

/// Confirmation code carried in the first byte of every acknowledge packet.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Confirmation {
    Ok,
    PacketReceive,
    NoFinger,
    ImageFail,
    ImageMess,
    FeatureFail,
    NoMatch,
    NotFound,
    EnrollMismatch,
    BadLocation,
    DbReadFail,
    UploadFeatureFail,
    PacketResponseFail,
    UploadFail,
    DeleteFail,
    DbClearFail,
    PasswordFail,
    InvalidImage,
    FlashError,
    InvalidRegister,
    AddressCode,
    PasswordVerify,
    Unknown(u8),
}

impl Confirmation {
    pub fn code(self) -> u8 {
        match self {
            Confirmation::Ok => code::OK,
            Confirmation::PacketReceive => code::PACKET_RECEIVE_ERR,
            Confirmation::NoFinger => code::NO_FINGER,
            Confirmation::ImageFail => code::IMAGE_FAIL,
            Confirmation::ImageMess => code::IMAGE_MESS,
            Confirmation::FeatureFail => code::FEATURE_FAIL,
            Confirmation::NoMatch => code::NO_MATCH,
            Confirmation::NotFound => code::NOT_FOUND,
            Confirmation::EnrollMismatch => code::ENROLL_MISMATCH,
            Confirmation::BadLocation => code::BAD_LOCATION,
            Confirmation::DbReadFail => code::DB_READ_FAIL,
            Confirmation::UploadFeatureFail => code::UPLOAD_FEATURE_FAIL,
            Confirmation::PacketResponseFail => code::PACKET_RESPONSE_FAIL,
            Confirmation::UploadFail => code::UPLOAD_FAIL,
            Confirmation::DeleteFail => code::DELETE_FAIL,
            Confirmation::DbClearFail => code::DB_CLEAR_FAIL,
            Confirmation::PasswordFail => code::PASS_FAIL,
            Confirmation::InvalidImage => code::INVALID_IMAGE,
            Confirmation::FlashError => code::FLASH_ERR,
            Confirmation::InvalidRegister => code::INVALID_REG,
            Confirmation::AddressCode => code::ADDR_CODE,
            Confirmation::PasswordVerify => code::PASS_VERIFY,
            Confirmation::Unknown(n) => n,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Confirmation::Ok
    }
}

impl From<u8> for Confirmation {
    fn from(value: u8) -> Self {
        match value {
            code::OK => Confirmation::Ok,
            code::PACKET_RECEIVE_ERR => Confirmation::PacketReceive,
            code::NO_FINGER => Confirmation::NoFinger,
            code::IMAGE_FAIL => Confirmation::ImageFail,
            code::IMAGE_MESS => Confirmation::ImageMess,
            code::FEATURE_FAIL => Confirmation::FeatureFail,
            code::NO_MATCH => Confirmation::NoMatch,
            code::NOT_FOUND => Confirmation::NotFound,
            code::ENROLL_MISMATCH => Confirmation::EnrollMismatch,
            code::BAD_LOCATION => Confirmation::BadLocation,
            code::DB_READ_FAIL => Confirmation::DbReadFail,
            code::UPLOAD_FEATURE_FAIL => Confirmation::UploadFeatureFail,
            code::PACKET_RESPONSE_FAIL => Confirmation::PacketResponseFail,
            code::UPLOAD_FAIL => Confirmation::UploadFail,
            code::DELETE_FAIL => Confirmation::DeleteFail,
            code::DB_CLEAR_FAIL => Confirmation::DbClearFail,
            code::PASS_FAIL => Confirmation::PasswordFail,
            code::INVALID_IMAGE => Confirmation::InvalidImage,
            code::FLASH_ERR => Confirmation::FlashError,
            code::INVALID_REG => Confirmation::InvalidRegister,
            code::ADDR_CODE => Confirmation::AddressCode,
            code::PASS_VERIFY => Confirmation::PasswordVerify,
            n => Confirmation::Unknown(n),
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            Confirmation::Ok => "ok",
            Confirmation::PacketReceive => "communication error",
            Confirmation::NoFinger => "no finger on the sensor",
            Confirmation::ImageFail => "imaging error",
            Confirmation::ImageMess => "image too messy",
            Confirmation::FeatureFail => "could not find fingerprint features",
            Confirmation::NoMatch => "fingerprints do not match",
            Confirmation::NotFound => "no matching fingerprint in the library",
            Confirmation::EnrollMismatch => "the two captures did not match",
            Confirmation::BadLocation => "invalid storage location",
            Confirmation::DbReadFail => "error reading template from the library",
            Confirmation::UploadFeatureFail => "error uploading template",
            Confirmation::PacketResponseFail => "module cannot receive the following data packet",
            Confirmation::UploadFail => "error uploading image",
            Confirmation::DeleteFail => "error deleting template",
            Confirmation::DbClearFail => "error clearing the library",
            Confirmation::PasswordFail => "wrong password",
            Confirmation::InvalidImage => "invalid image",
            Confirmation::FlashError => "error writing to flash memory",
            Confirmation::InvalidRegister => "invalid register number",
            Confirmation::AddressCode => "wrong address code",
            Confirmation::PasswordVerify => "password must be verified first",
            Confirmation::Unknown(n) => return write!(f, "unknown code {:#04x}", n),
        };

        write!(f, "{}", string)
    }
}
