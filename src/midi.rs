//! Raw MIDI messages and SysEx framing
//!
//! Transports hand over whatever bytes the driver delivered. `RawMessage`
//! records whether those bytes form a complete System Exclusive message and
//! exposes the data between the `0xF0`/`0xF7` delimiters to the codec.

use std::fmt;

/// SysEx lead-in byte
pub const SYSEX_START: u8 = 0xF0;

/// SysEx lead-out byte
pub const SYSEX_END: u8 = 0xF7;

/// A message as received from (or sent to) a MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    bytes: Vec<u8>,
    is_sysex: bool,
}

impl RawMessage {
    /// Wrap bytes exactly as the MIDI driver delivered them
    pub fn from_midi(bytes: &[u8]) -> Self {
        let is_sysex = bytes.len() >= 2
            && bytes[0] == SYSEX_START
            && bytes[bytes.len() - 1] == SYSEX_END;

        Self {
            bytes: bytes.to_vec(),
            is_sysex,
        }
    }

    /// Build a SysEx message from its inner data (no delimiters)
    pub fn sysex(data: &[u8]) -> Self {
        Self {
            bytes: frame_sysex(data),
            is_sysex: true,
        }
    }

    /// Whether the bytes form a delimited SysEx message
    pub fn is_sysex(&self) -> bool {
        self.is_sysex
    }

    /// The SysEx data between the delimiters, empty for other messages
    pub fn sysex_data(&self) -> &[u8] {
        if self.is_sysex {
            &self.bytes[1..self.bytes.len() - 1]
        } else {
            &[]
        }
    }

    /// The full message, including delimiters
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sysex {
            write!(f, "SysEx {} bytes", self.sysex_data().len())
        } else {
            write!(f, "{} ({} bytes)", status_name(&self.bytes), self.bytes.len())
        }
    }
}

/// Wrap SysEx data in `0xF0 … 0xF7`
pub fn frame_sysex(data: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(data.len() + 2);
    framed.push(SYSEX_START);
    framed.extend_from_slice(data);
    framed.push(SYSEX_END);
    framed
}

/// Short name for the status byte of a non-SysEx message
fn status_name(bytes: &[u8]) -> &'static str {
    let Some(&status) = bytes.first() else {
        return "Empty";
    };

    if status < 0x80 {
        return "Data";
    }

    if status < 0xF0 {
        return match status & 0xF0 {
            0x80 => "NoteOff",
            0x90 => "NoteOn",
            0xA0 => "PolyPressure",
            0xB0 => "CC",
            0xC0 => "ProgramChange",
            0xD0 => "ChannelPressure",
            _ => "PitchBend",
        };
    }

    match status {
        SYSEX_START => "SysEx (unterminated)",
        0xF8 => "TimingClock",
        0xFE => "ActiveSensing",
        0xFF => "SystemReset",
        _ => "System",
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
