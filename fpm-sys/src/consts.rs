//! Instruction codes, confirmation codes and defaults of the ZFM/R30x
//! command set, as they appear on the wire.

/// Every frame starts with this big-endian header.
pub const START_CODE: u16 = 0xEF01;

/// Module address a factory-fresh sensor answers to.
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Handshake password a factory-fresh sensor accepts.
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Factory baud rate of the UART.
pub const DEFAULT_BAUD: u32 = 57_600;

/// Bytes before the payload: start code, address, packet id, length.
pub const HEADER_LEN: usize = 9;

/// Trailing checksum width.
pub const CHECKSUM_LEN: usize = 2;

/// Largest payload the module ever sends in one frame (data packets of 256 bytes).
pub const MAX_PAYLOAD_LEN: usize = 256;

pub mod pid {
    pub const COMMAND: u8 = 0x01;
    pub const DATA: u8 = 0x02;
    pub const ACK: u8 = 0x07;
    pub const END_DATA: u8 = 0x08;
}

pub mod cmd {
    pub const GET_IMAGE: u8 = 0x01;
    pub const IMAGE_2_TZ: u8 = 0x02;
    pub const SEARCH: u8 = 0x04;
    pub const REG_MODEL: u8 = 0x05;
    pub const STORE: u8 = 0x06;
    pub const LOAD: u8 = 0x07;
    pub const UPLOAD: u8 = 0x08;
    pub const DELETE: u8 = 0x0C;
    pub const EMPTY: u8 = 0x0D;
    pub const READ_SYS_PARAM: u8 = 0x0F;
    pub const SET_PASSWORD: u8 = 0x12;
    pub const VERIFY_PASSWORD: u8 = 0x13;
    pub const HI_SPEED_SEARCH: u8 = 0x1B;
    pub const TEMPLATE_COUNT: u8 = 0x1D;
    pub const AURA_LED_CONFIG: u8 = 0x35;
    pub const LED_ON: u8 = 0x50;
    pub const LED_OFF: u8 = 0x51;
}

pub mod code {
    pub const OK: u8 = 0x00;
    pub const PACKET_RECEIVE_ERR: u8 = 0x01;
    pub const NO_FINGER: u8 = 0x02;
    pub const IMAGE_FAIL: u8 = 0x03;
    pub const IMAGE_MESS: u8 = 0x06;
    pub const FEATURE_FAIL: u8 = 0x07;
    pub const NO_MATCH: u8 = 0x08;
    pub const NOT_FOUND: u8 = 0x09;
    pub const ENROLL_MISMATCH: u8 = 0x0A;
    pub const BAD_LOCATION: u8 = 0x0B;
    pub const DB_READ_FAIL: u8 = 0x0C;
    pub const UPLOAD_FEATURE_FAIL: u8 = 0x0D;
    pub const PACKET_RESPONSE_FAIL: u8 = 0x0E;
    pub const UPLOAD_FAIL: u8 = 0x0F;
    pub const DELETE_FAIL: u8 = 0x10;
    pub const DB_CLEAR_FAIL: u8 = 0x11;
    pub const PASS_FAIL: u8 = 0x13;
    pub const INVALID_IMAGE: u8 = 0x15;
    pub const FLASH_ERR: u8 = 0x18;
    pub const INVALID_REG: u8 = 0x1A;
    pub const ADDR_CODE: u8 = 0x20;
    pub const PASS_VERIFY: u8 = 0x21;
}

/// Control byte of the aura LED instruction.
pub mod led {
    pub const BREATHING: u8 = 0x01;
    pub const FLASHING: u8 = 0x02;
    pub const ON: u8 = 0x03;
    pub const OFF: u8 = 0x04;
    pub const GRADUAL_ON: u8 = 0x05;
    pub const GRADUAL_OFF: u8 = 0x06;

    pub const RED: u8 = 0x01;
    pub const BLUE: u8 = 0x02;
    pub const PURPLE: u8 = 0x03;
}
