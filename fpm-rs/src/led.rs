use fpm_sys::led;
use std::convert::TryFrom;
use std::fmt;

/// Behaviour of the ring LED around the sensor window.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LedMode {
    Breathing = 1,
    Flashing = 2,
    On = 3,
    Off = 4,
    GradualOn = 5,
    GradualOff = 6,
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            LedMode::Breathing => "Breathing",
            LedMode::Flashing => "Flashing",
            LedMode::On => "On",
            LedMode::Off => "Off",
            LedMode::GradualOn => "GradualOn",
            LedMode::GradualOff => "GradualOff",
        };

        write!(f, "{}", string)
    }
}

impl TryFrom<u8> for LedMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            led::BREATHING => Ok(LedMode::Breathing),
            led::FLASHING => Ok(LedMode::Flashing),
            led::ON => Ok(LedMode::On),
            led::OFF => Ok(LedMode::Off),
            led::GRADUAL_ON => Ok(LedMode::GradualOn),
            led::GRADUAL_OFF => Ok(LedMode::GradualOff),
            n => Err(n),
        }
    }
}

/// Ring LED colour. Green is not available on the R30x modules.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LedColor {
    Red = 1,
    Blue = 2,
    Purple = 3,
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            LedColor::Red => "Red",
            LedColor::Blue => "Blue",
            LedColor::Purple => "Purple",
        };

        write!(f, "{}", string)
    }
}

impl TryFrom<u8> for LedColor {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            led::RED => Ok(LedColor::Red),
            led::BLUE => Ok(LedColor::Blue),
            led::PURPLE => Ok(LedColor::Purple),
            n => Err(n),
        }
    }
}
