//! Lumatone SysEx codec
//!
//! Every Lumatone message shares one envelope:
//!
//! ```text
//! | 0..=2            | 3           | 4       | 5                | 6..     |
//! | manufacturer id  | board index | command | status / param 1 | payload |
//! ```
//!
//! Board 0 addresses the whole keyboard (macro buttons, peripherals), boards
//! 1..=5 the octave sections. On requests byte 5 carries the first parameter;
//! on responses it carries the [`StatusCode`]. Every byte stays within 0..=127.

pub mod commands;
pub mod decode;
pub mod encode;
pub mod error;

pub use decode::{decode_response, PeripheralChannels, PresetFlags, Response, SerialIdentity};
pub use error::SysExError;

use crate::midi::RawMessage;

/// Lumatone manufacturer id
pub const MANUFACTURER_ID: [u8; 3] = [0x00, 0x21, 0x50];

pub const BOARD_INDEX: usize = 3;
pub const CMD_INDEX: usize = 4;
pub const STATUS_INDEX: usize = 5;
pub const PAYLOAD_INIT: usize = 6;

/// Bytes before the payload of a response
pub const HEADER_LEN: usize = PAYLOAD_INIT;

/// Board 0 is the keyboard itself, 1..=5 the octave boards
pub const MAX_BOARD_INDEX: u8 = 5;
pub const OCTAVE_BOARD_COUNT: u8 = 5;

/// Sentinel placed in byte 5 of ping requests
pub const TEST_ECHO: u8 = 0x7F;

/// Keys per octave board on 56-key firmware
pub const KEYS_PER_BOARD: usize = 56;

/// Keys per octave board on the earliest hardware
pub const KEYS_PER_BOARD_LEGACY: usize = 55;

/// Entries in velocity/fader/aftertouch curve tables
pub const CURVE_TABLE_SIZE: usize = 128;

/// Entries in the velocity interval table
pub const VELOCITY_INTERVAL_COUNT: usize = 127;

/// 12-bit values carried by a peripheral calibration message
pub const PERIPHERAL_CALIBRATION_VALUES: usize = 8;

/// Status byte of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Nak,
    Ack,
    Busy,
    Error,
    State,
    EchoTest,
}

impl StatusCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(StatusCode::Nak),
            0x01 => Some(StatusCode::Ack),
            0x02 => Some(StatusCode::Busy),
            0x03 => Some(StatusCode::Error),
            0x04 => Some(StatusCode::State),
            TEST_ECHO => Some(StatusCode::EchoTest),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            StatusCode::Nak => 0x00,
            StatusCode::Ack => 0x01,
            StatusCode::Busy => 0x02,
            StatusCode::Error => 0x03,
            StatusCode::State => 0x04,
            StatusCode::EchoTest => TEST_ECHO,
        }
    }
}

/// Validated envelope of a received message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub manufacturer_id: [u8; 3],
    pub board_index: u8,
    pub command: u8,
    pub status: StatusCode,
}

impl ParsedHeader {
    pub fn is_echo(&self) -> bool {
        self.status == StatusCode::EchoTest
    }
}

/// Check the fixed header fields and return them.
///
/// Echoes pass this check; callers that care must branch on
/// [`ParsedHeader::is_echo`]. Payload length is not checked here.
pub fn parse_header(msg: &RawMessage) -> Result<ParsedHeader, SysExError> {
    if !msg.is_sysex() {
        return Err(SysExError::NotSysEx);
    }

    let data = msg.sysex_data();
    if data.len() < HEADER_LEN {
        return Err(SysExError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let manufacturer_id = [data[0], data[1], data[2]];
    if manufacturer_id != MANUFACTURER_ID {
        return Err(SysExError::BadManufacturerId(manufacturer_id));
    }

    let board_index = data[BOARD_INDEX];
    if board_index > MAX_BOARD_INDEX {
        return Err(SysExError::BadBoardIndex(board_index));
    }

    let status = StatusCode::from_byte(data[STATUS_INDEX])
        .ok_or(SysExError::BadStatusByte(data[STATUS_INDEX]))?;

    Ok(ParsedHeader {
        manufacturer_id,
        board_index,
        command: data[CMD_INDEX],
        status,
    })
}

/// Full envelope validation: header fields, echo, and exact payload length
pub fn validate_envelope(
    msg: &RawMessage,
    expected_payload_len: usize,
) -> Result<ParsedHeader, SysExError> {
    let header = parse_header(msg)?;

    if header.is_echo() {
        return Err(SysExError::IsEcho);
    }

    check_payload_len(msg, expected_payload_len)?;
    Ok(header)
}

/// Payload bytes of a message that already passed [`parse_header`]
pub fn payload(msg: &RawMessage) -> &[u8] {
    msg.sysex_data().get(PAYLOAD_INIT..).unwrap_or(&[])
}

pub(crate) fn check_payload_len(msg: &RawMessage, expected: usize) -> Result<(), SysExError> {
    let actual = payload(msg).len();
    if actual < expected {
        return Err(SysExError::TooShort {
            expected: HEADER_LEN + expected,
            actual: HEADER_LEN + actual,
        });
    }
    if actual > expected {
        return Err(SysExError::TooLong {
            expected: HEADER_LEN + expected,
            actual: HEADER_LEN + actual,
        });
    }
    Ok(())
}
