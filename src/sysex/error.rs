//! Decode errors for Lumatone SysEx responses

use thiserror::Error;

/// Why a received message could not be decoded
///
/// Malformed input from a physical device is an expected operating
/// condition, so every decode path reports one of these as a value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysExError {
    #[error("message is not a SysEx message")]
    NotSysEx,

    #[error("message too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("message too long: expected {expected} bytes, got {actual}")]
    TooLong { expected: usize, actual: usize },

    #[error("message is an echo of our own request")]
    IsEcho,

    #[error("manufacturer id {0:02X?} does not match")]
    BadManufacturerId([u8; 3]),

    #[error("board index {0} out of range")]
    BadBoardIndex(u8),

    #[error("status byte 0x{0:02X} out of range")]
    BadStatusByte(u8),

    #[error("expected a response to 0x{expected:02X}, got 0x{actual:02X}")]
    NotAResponseToCommand { expected: u8, actual: u8 },

    #[error("unknown command 0x{0:02X}")]
    UnknownCommand(u8),

    #[error("device reported an error for command 0x{0:02X}")]
    ExternalError(u8),

    #[error("device rejected command 0x{0:02X}")]
    Rejected(u8),

    #[error("device busy while handling command 0x{0:02X}")]
    Busy(u8),

    #[error("no decoder for command 0x{0:02X}")]
    NotImplemented(u8),
}

impl SysExError {
    /// The message was our own request coming back, not an answer
    pub fn is_echo(&self) -> bool {
        matches!(self, SysExError::IsEcho)
    }

    /// Errors that most likely come from unrelated traffic on the port
    pub fn is_unrelated_traffic(&self) -> bool {
        matches!(
            self,
            SysExError::NotSysEx
                | SysExError::BadManufacturerId(_)
                | SysExError::BadBoardIndex(_)
                | SysExError::BadStatusByte(_)
                | SysExError::NotAResponseToCommand { .. }
        )
    }
}
