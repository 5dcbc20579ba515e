//! Firmware versions and capability releases
//!
//! A keyboard reports a raw `major.minor.revision` triple. The protocol
//! capabilities, however, move in steps ("releases"), and the mapping between
//! the two is irregular, so both directions are kept as explicit tables here.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::sysex::commands::{self, LUMA_PING};
use crate::sysex::{KEYS_PER_BOARD, KEYS_PER_BOARD_LEGACY};

/// Version triple as reported by the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FirmwareVersion {
    pub major: i32,
    pub minor: i32,
    pub revision: i32,
}

impl FirmwareVersion {
    pub const fn new(major: i32, minor: i32, revision: i32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid firmware version '{0}' (expected major.minor.revision)")]
pub struct FirmwareParseError(String);

impl FromStr for FirmwareVersion {
    type Err = FirmwareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<i32> = s
            .trim()
            .split('.')
            .map(|part| part.parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| FirmwareParseError(s.to_string()))?;

        match fields.as_slice() {
            [major, minor, revision] => Ok(Self::new(*major, *minor, *revision)),
            _ => Err(FirmwareParseError(s.to_string())),
        }
    }
}

/// Protocol capability tier, totally ordered from oldest to newest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Release {
    Unknown,
    /// Hardware predating version reporting
    V55Keys,
    V1_0_3,
    V1_0_4,
    V1_0_5,
    V1_0_6,
    V1_0_7,
    V1_0_8,
    V1_0_9,
    V1_0_10,
    V1_0_11,
    V1_0_12,
    V1_1_0,
    V1_2_0,
    /// Newer than anything this crate knows about
    Future,
}

/// Releases for firmware 1.0.x, indexed by `revision - 3`
const V1_0_RELEASES: [Release; 10] = [
    Release::V1_0_3,
    Release::V1_0_4,
    Release::V1_0_5,
    Release::V1_0_6,
    Release::V1_0_7,
    Release::V1_0_8,
    Release::V1_0_9,
    Release::V1_0_10,
    Release::V1_0_11,
    Release::V1_0_12,
];

/// First 1.0.x revision that reports a version of its own
const FIRST_VERSIONED_REVISION: i32 = 3;

/// Command introduction history: `(highest command id, release that added it)`.
/// Scanned in order; must stay sorted by both columns.
const COMMAND_RELEASES: &[(u8, Release)] = &[
    (commands::GET_AFTERTOUCH_CONFIG, Release::V55Keys),
    (commands::GET_FADER_TYPE_CONFIG, Release::V1_0_3),
    (commands::DEMO_MODE, Release::V1_0_4),
    (commands::SET_PITCH_WHEEL_SENSITIVITY, Release::V1_0_5),
    (commands::RESET_WHEELS_THRESHOLD, Release::V1_0_6),
    (commands::SET_PITCH_WHEEL_CENTER_THRESHOLD, Release::V1_0_7),
    (commands::GET_BOARD_SENSITIVITY_VALUES, Release::V1_0_8),
    (commands::GET_AFTERTOUCH_TRIGGER_DELAY, Release::V1_0_9),
    (commands::GET_EXPRESSION_PEDAL_SENSITIVITY, Release::V1_0_10),
    (commands::LUMA_PING, Release::V1_0_11),
    (commands::SET_KEY_COLOUR_EXTENDED, Release::V1_1_0),
    (commands::SET_PERIPHERAL_SYNC, Release::V1_2_0),
];

/// Map a reported version triple to its release
pub fn version_to_release(version: FirmwareVersion) -> Release {
    let FirmwareVersion {
        major,
        minor,
        revision,
    } = version;

    if major == 0 && minor == 0 && revision == 0 {
        return Release::V55Keys;
    }
    if major < 0 || minor < 0 || revision < 0 {
        return Release::Unknown;
    }

    match (major, minor) {
        (1, 0) if revision < FIRST_VERSIONED_REVISION => Release::V55Keys,
        (1, 0) => V1_0_RELEASES
            .get((revision - FIRST_VERSIONED_REVISION) as usize)
            .copied()
            .unwrap_or(Release::Future),
        (1, 1) => Release::V1_1_0,
        (1, 2) => Release::V1_2_0,
        _ if major < 9 && minor < 9 && revision < 999 => Release::Future,
        _ => Release::Unknown,
    }
}

/// Oldest release that acknowledges `cmd`
pub fn minimum_release_for_command(cmd: u8) -> Release {
    COMMAND_RELEASES
        .iter()
        .find(|(max_cmd, _)| cmd <= *max_cmd)
        .map(|(_, release)| *release)
        .unwrap_or(Release::Future)
}

pub fn command_is_supported(release: Release, cmd: u8) -> bool {
    minimum_release_for_command(cmd) <= release
}

impl Release {
    pub fn supports(self, cmd: u8) -> bool {
        command_is_supported(self, cmd)
    }

    pub fn supports_ping(self) -> bool {
        self.supports(LUMA_PING)
    }

    /// Keys per octave board
    pub fn key_count(self) -> usize {
        match self {
            Release::V55Keys => KEYS_PER_BOARD_LEGACY,
            _ => KEYS_PER_BOARD,
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Release::Unknown => "unknown",
            Release::V55Keys => "55-key",
            Release::V1_0_3 => "1.0.3",
            Release::V1_0_4 => "1.0.4",
            Release::V1_0_5 => "1.0.5",
            Release::V1_0_6 => "1.0.6",
            Release::V1_0_7 => "1.0.7",
            Release::V1_0_8 => "1.0.8",
            Release::V1_0_9 => "1.0.9",
            Release::V1_0_10 => "1.0.10",
            Release::V1_0_11 => "1.0.11",
            Release::V1_0_12 => "1.0.12",
            Release::V1_1_0 => "1.1.0",
            Release::V1_2_0 => "1.2.0",
            Release::Future => "future",
        };
        f.write_str(name)
    }
}
