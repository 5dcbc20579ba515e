//! Response unpackers
//!
//! The four generic unpackers work on payload slices. The message-level
//! functions validate the envelope first, gate on the response status and
//! then reinterpret fields per command.

use std::fmt;

use super::commands::*;
use super::{
    check_payload_len, parse_header, payload, ParsedHeader, StatusCode, SysExError,
    CURVE_TABLE_SIZE, PERIPHERAL_CALIBRATION_VALUES, VELOCITY_INTERVAL_COUNT,
};
use crate::firmware::FirmwareVersion;
use crate::midi::RawMessage;

/// N raw bytes → N values, copied verbatim
pub fn unpack_7bit(payload: &[u8]) -> Vec<u8> {
    payload.to_vec()
}

/// 2N raw bytes → N values, `hi << 4 | lo`
pub fn unpack_8bit_nibbles(payload: &[u8]) -> Vec<u8> {
    payload
        .chunks_exact(2)
        .map(|pair| ((pair[0] & 0x0F) << 4) | (pair[1] & 0x0F))
        .collect()
}

/// 2N raw bytes → N values, `hi << 7 | lo`
pub fn unpack_12bit_7bit(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks_exact(2)
        .map(|pair| (((pair[0] & 0x1F) as u16) << 7) | (pair[1] & 0x7F) as u16)
        .collect()
}

/// 3N raw bytes → N values, `a << 8 | b << 4 | c`
pub fn unpack_12bit_nibbles(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks_exact(3)
        .map(|t| ((t[0] as u16 & 0x0F) << 8) | ((t[1] as u16 & 0x0F) << 4) | (t[2] as u16 & 0x0F))
        .collect()
}

/// Validate a message as the answer to `cmd` carrying `expected_len` payload bytes
fn expect_response(
    msg: &RawMessage,
    cmd: u8,
    expected_len: usize,
) -> Result<ParsedHeader, SysExError> {
    let header = parse_header(msg)?;

    if header.is_echo() {
        return Err(SysExError::IsEcho);
    }
    if header.command != cmd {
        return Err(SysExError::NotAResponseToCommand {
            expected: cmd,
            actual: header.command,
        });
    }
    check_status(&header)?;
    check_payload_len(msg, expected_len)?;

    Ok(header)
}

fn check_status(header: &ParsedHeader) -> Result<(), SysExError> {
    match header.status {
        StatusCode::Ack | StatusCode::State => Ok(()),
        StatusCode::Nak => Err(SysExError::Rejected(header.command)),
        StatusCode::Busy => Err(SysExError::Busy(header.command)),
        StatusCode::Error => Err(SysExError::ExternalError(header.command)),
        StatusCode::EchoTest => Err(SysExError::IsEcho),
    }
}

/// Per-key 7-bit table (notes, channels, key types)
pub fn unpack_7bit_table(msg: &RawMessage, cmd: u8, count: usize) -> Result<Vec<u8>, SysExError> {
    expect_response(msg, cmd, count)?;
    Ok(unpack_7bit(payload(msg)))
}

/// Per-key 8-bit table (LED channels, thresholds)
pub fn unpack_8bit_table(msg: &RawMessage, cmd: u8, count: usize) -> Result<Vec<u8>, SysExError> {
    expect_response(msg, cmd, count * 2)?;
    Ok(unpack_8bit_nibbles(payload(msg)))
}

pub fn unpack_velocity_intervals(msg: &RawMessage) -> Result<Vec<u16>, SysExError> {
    expect_response(msg, GET_VELOCITY_INTERVALS, VELOCITY_INTERVAL_COUNT * 2)?;
    Ok(unpack_12bit_7bit(payload(msg)))
}

pub fn unpack_peripheral_calibration(msg: &RawMessage) -> Result<Vec<u16>, SysExError> {
    expect_response(msg, PERIPHERAL_CALIBRATION_DATA, PERIPHERAL_CALIBRATION_VALUES * 3)?;
    Ok(unpack_12bit_nibbles(payload(msg)))
}

/// Six-byte serial number reported by the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialIdentity(pub [u8; 6]);

impl SerialIdentity {
    /// Hardware predating serial numbers answers with all zeros
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for SerialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

pub fn unpack_serial_identity(msg: &RawMessage) -> Result<SerialIdentity, SysExError> {
    expect_response(msg, GET_SERIAL_IDENTITY, 6)?;
    let mut serial = [0u8; 6];
    serial.copy_from_slice(&unpack_7bit(payload(msg)));
    Ok(SerialIdentity(serial))
}

pub fn unpack_firmware_revision(msg: &RawMessage) -> Result<FirmwareVersion, SysExError> {
    expect_response(msg, GET_FIRMWARE_REVISION, 3)?;
    let fields = unpack_7bit(payload(msg));
    Ok(FirmwareVersion::new(
        fields[0] as i32,
        fields[1] as i32,
        fields[2] as i32,
    ))
}

fn ping_id(fields: &[u8]) -> u32 {
    ((fields[0] as u32) << 14) | ((fields[1] as u32) << 7) | fields[2] as u32
}

/// Id carried by the device's answer to a ping
pub fn unpack_ping(msg: &RawMessage) -> Result<u32, SysExError> {
    expect_response(msg, LUMA_PING, 3)?;
    Ok(ping_id(&unpack_7bit(payload(msg))))
}

/// Id carried by a ping that came back to us unanswered
pub fn unpack_ping_echo(msg: &RawMessage) -> Result<u32, SysExError> {
    let header = parse_header(msg)?;
    if header.command != LUMA_PING {
        return Err(SysExError::NotAResponseToCommand {
            expected: LUMA_PING,
            actual: header.command,
        });
    }
    if !header.is_echo() {
        return Err(SysExError::BadStatusByte(header.status.to_byte()));
    }
    check_payload_len(msg, 3)?;
    Ok(ping_id(payload(msg)))
}

/// MIDI channels (1-16) of the peripheral controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralChannels {
    pub pitch_wheel: u8,
    pub mod_wheel: u8,
    pub expression: u8,
    pub sustain: u8,
}

pub fn unpack_peripheral_channels(msg: &RawMessage) -> Result<PeripheralChannels, SysExError> {
    expect_response(msg, GET_PERIPHERAL_CHANNELS, 4)?;
    // 0-based on the wire
    let ch = unpack_7bit(payload(msg));
    Ok(PeripheralChannels {
        pitch_wheel: (ch[0] & 0x0F) + 1,
        mod_wheel: (ch[1] & 0x0F) + 1,
        expression: (ch[2] & 0x0F) + 1,
        sustain: (ch[3] & 0x0F) + 1,
    })
}

/// Global preset options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetFlags {
    pub light_on_keystrokes: bool,
    pub polyphonic_aftertouch: bool,
    pub invert_expression: bool,
    pub invert_sustain: bool,
}

impl PresetFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            light_on_keystrokes: bits & 0x01 != 0,
            polyphonic_aftertouch: bits & 0x02 != 0,
            invert_expression: bits & 0x04 != 0,
            invert_sustain: bits & 0x08 != 0,
        }
    }

    pub fn to_bits(self) -> u8 {
        (self.light_on_keystrokes as u8)
            | (self.polyphonic_aftertouch as u8) << 1
            | (self.invert_expression as u8) << 2
            | (self.invert_sustain as u8) << 3
    }
}

pub fn unpack_preset_flags(msg: &RawMessage) -> Result<PresetFlags, SysExError> {
    expect_response(msg, GET_PRESET_FLAGS, 1)?;
    Ok(PresetFlags::from_bits(payload(msg)[0]))
}

/// A decoded device response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Acknowledgement of a command that returns no data
    Ack { board: u8, command: u8 },
    Ping { id: u32 },
    SerialIdentity(SerialIdentity),
    FirmwareRevision(FirmwareVersion),
    PeripheralChannels(PeripheralChannels),
    PresetFlags(PresetFlags),
    /// Per-key table for one board
    KeyTable { board: u8, command: u8, values: Vec<u8> },
    /// Velocity, fader or aftertouch curve
    Curve { command: u8, values: Vec<u8> },
    VelocityIntervals(Vec<u16>),
    PeripheralCalibration(Vec<u16>),
}

/// Decode any response into its structured form.
///
/// `key_count` is the number of keys per board for the connected firmware.
pub fn decode_response(msg: &RawMessage, key_count: usize) -> Result<Response, SysExError> {
    let header = parse_header(msg)?;

    if header.is_echo() {
        return Err(SysExError::IsEcho);
    }
    if !is_known(header.command) {
        return Err(SysExError::UnknownCommand(header.command));
    }
    check_status(&header)?;

    let cmd = header.command;
    let response = match cmd {
        LUMA_PING => Response::Ping { id: unpack_ping(msg)? },
        GET_SERIAL_IDENTITY => Response::SerialIdentity(unpack_serial_identity(msg)?),
        GET_FIRMWARE_REVISION => Response::FirmwareRevision(unpack_firmware_revision(msg)?),
        GET_PERIPHERAL_CHANNELS => Response::PeripheralChannels(unpack_peripheral_channels(msg)?),
        GET_PRESET_FLAGS => Response::PresetFlags(unpack_preset_flags(msg)?),
        GET_CHANNEL_CONFIG | GET_NOTE_CONFIG | GET_KEYTYPE_CONFIG => Response::KeyTable {
            board: header.board_index,
            command: cmd,
            values: unpack_7bit_table(msg, cmd, key_count)?,
        },
        GET_RED_LED_CONFIG | GET_GREEN_LED_CONFIG | GET_BLUE_LED_CONFIG | GET_MAX_THRESHOLD
        | GET_MIN_THRESHOLD => Response::KeyTable {
            board: header.board_index,
            command: cmd,
            values: unpack_8bit_table(msg, cmd, key_count)?,
        },
        GET_VELOCITY_CONFIG | GET_FADER_CONFIG | GET_AFTERTOUCH_CONFIG | GET_FADER_TYPE_CONFIG => {
            Response::Curve {
                command: cmd,
                values: unpack_7bit_table(msg, cmd, CURVE_TABLE_SIZE)?,
            }
        }
        GET_VELOCITY_INTERVALS => Response::VelocityIntervals(unpack_velocity_intervals(msg)?),
        PERIPHERAL_CALIBRATION_DATA => {
            Response::PeripheralCalibration(unpack_peripheral_calibration(msg)?)
        }
        GET_AFTERTOUCH_MAX
        | GET_KEY_VALIDITY
        | GET_BOARD_THRESHOLD_VALUES
        | GET_BOARD_SENSITIVITY_VALUES
        | GET_AFTERTOUCH_TRIGGER_DELAY
        | GET_LUMATOUCH_NOTE_OFF_DELAY
        | GET_EXPRESSION_PEDAL_THRESHOLD
        | GET_EXPRESSION_PEDAL_SENSITIVITY
        | GET_MACRO_LIGHT_INTENSITY
        | GET_SYSEX_RESPONSE_MODE => return Err(SysExError::NotImplemented(cmd)),
        _ => Response::Ack {
            board: header.board_index,
            command: cmd,
        },
    };

    Ok(response)
}
