//! Request builders and value packers
//!
//! Builders return the SysEx data without the `0xF0`/`0xF7` delimiters;
//! use [`crate::midi::frame_sysex`] before handing them to a transport.
//! Out-of-range arguments are caller bugs and panic.

use super::commands::*;
use super::{MANUFACTURER_ID, MAX_BOARD_INDEX, TEST_ECHO, VELOCITY_INTERVAL_COUNT};

/// Largest id a ping can carry (three 7-bit bytes)
pub const MAX_PING_ID: u32 = 0x1F_FFFF;

fn assert_board(board: u8) {
    assert!(
        board <= MAX_BOARD_INDEX,
        "board index {} out of range (0-{})",
        board,
        MAX_BOARD_INDEX
    );
}

fn assert_7bit(value: u8, what: &str) {
    assert!(value <= 0x7F, "{} {} exceeds 127", what, value);
}

/// Generic 4-parameter command (9 bytes)
pub fn build_fixed_command(board: u8, cmd: u8, d1: u8, d2: u8, d3: u8, d4: u8) -> [u8; 9] {
    assert_board(board);
    assert_7bit(cmd, "command");
    for value in [d1, d2, d3, d4] {
        assert_7bit(value, "parameter");
    }

    let [m0, m1, m2] = MANUFACTURER_ID;
    [m0, m1, m2, board, cmd, d1, d2, d3, d4]
}

/// Key colour command with each 8-bit channel split into two nibbles (12 bytes)
pub fn build_extended_colour_command(
    board: u8,
    cmd: u8,
    key: u8,
    red: u8,
    green: u8,
    blue: u8,
) -> [u8; 12] {
    assert_board(board);
    assert_7bit(cmd, "command");
    assert_7bit(key, "key index");

    let [m0, m1, m2] = MANUFACTURER_ID;
    [
        m0,
        m1,
        m2,
        board,
        cmd,
        key,
        red >> 4,
        red & 0x0F,
        green >> 4,
        green & 0x0F,
        blue >> 4,
        blue & 0x0F,
    ]
}

/// Header followed by the table bytes verbatim
///
/// # Panics
/// If any table value exceeds 127.
pub fn build_table_command(board: u8, cmd: u8, table: &[u8]) -> Vec<u8> {
    assert_board(board);
    assert_7bit(cmd, "command");
    for &value in table {
        assert_7bit(value, "table value");
    }

    let mut data = Vec::with_capacity(MANUFACTURER_ID.len() + 2 + table.len());
    data.extend_from_slice(&MANUFACTURER_ID);
    data.push(board);
    data.push(cmd);
    data.extend_from_slice(table);
    data
}

/// 7-bit values are sent verbatim
pub fn pack_7bit(values: &[u8]) -> Vec<u8> {
    for &value in values {
        assert_7bit(value, "7-bit value");
    }
    values.to_vec()
}

/// Each 8-bit value becomes a high nibble and a low nibble
pub fn pack_8bit_nibbles(values: &[u8]) -> Vec<u8> {
    values.iter().flat_map(|&v| [v >> 4, v & 0x0F]).collect()
}

/// Each 12-bit value becomes two 7-bit bytes, most significant first
pub fn pack_12bit_7bit(values: &[u16]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|&v| {
            assert!(v <= 0x0FFF, "12-bit value {} exceeds 4095", v);
            [(v >> 7) as u8, (v & 0x7F) as u8]
        })
        .collect()
}

/// Each 12-bit value becomes three nibbles, most significant first
pub fn pack_12bit_nibbles(values: &[u16]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|&v| {
            assert!(v <= 0x0FFF, "12-bit value {} exceeds 4095", v);
            [(v >> 8) as u8, ((v >> 4) & 0x0F) as u8, (v & 0x0F) as u8]
        })
        .collect()
}

/// Ping carrying a 21-bit id, answered by firmware 1.0.11 and later
pub fn build_ping(id: u32) -> [u8; 9] {
    assert!(id <= MAX_PING_ID, "ping id {} exceeds 21 bits", id);
    build_fixed_command(
        0,
        LUMA_PING,
        TEST_ECHO,
        ((id >> 14) & 0x7F) as u8,
        ((id >> 7) & 0x7F) as u8,
        (id & 0x7F) as u8,
    )
}

pub fn build_get_serial_identity() -> [u8; 9] {
    build_fixed_command(0, GET_SERIAL_IDENTITY, 0, 0, 0, 0)
}

pub fn build_get_firmware_revision() -> [u8; 9] {
    build_fixed_command(0, GET_FIRMWARE_REVISION, 0, 0, 0, 0)
}

/// Start or stop pitch/mod wheel calibration
pub fn build_calibrate_pitch_mod_wheel(start: bool) -> [u8; 9] {
    build_fixed_command(0, CALIBRATE_PITCH_MOD_WHEEL, start as u8, 0, 0, 0)
}

pub fn build_get_peripheral_channels() -> [u8; 9] {
    build_fixed_command(0, GET_PERIPHERAL_CHANNELS, 0, 0, 0, 0)
}

pub fn build_get_preset_flags() -> [u8; 9] {
    build_fixed_command(0, GET_PRESET_FLAGS, 0, 0, 0, 0)
}

/// Request a per-board table (colours, notes, channels, thresholds, ...)
pub fn build_get_board_table(board: u8, cmd: u8) -> [u8; 9] {
    build_fixed_command(board, cmd, 0, 0, 0, 0)
}

/// Set a single key's note, channel and key type
pub fn build_change_key_note(board: u8, key: u8, note: u8, channel: u8, key_type: u8) -> [u8; 9] {
    assert!((1..=16).contains(&channel), "MIDI channel {} out of range (1-16)", channel);
    build_fixed_command(board, CHANGE_KEY_NOTE, key, note, channel - 1, key_type)
}

pub fn build_set_key_colour(board: u8, key: u8, red: u8, green: u8, blue: u8) -> [u8; 12] {
    build_extended_colour_command(board, SET_KEY_COLOUR, key, red, green, blue)
}

/// Assign MIDI channels (1-based) to pitch wheel, mod wheel, expression and sustain
pub fn build_set_peripheral_channels(
    pitch_wheel: u8,
    mod_wheel: u8,
    expression: u8,
    sustain: u8,
) -> [u8; 9] {
    let wire = [pitch_wheel, mod_wheel, expression, sustain].map(|channel| {
        assert!((1..=16).contains(&channel), "MIDI channel {} out of range (1-16)", channel);
        channel - 1
    });
    build_fixed_command(0, SET_PERIPHERAL_CHANNELS, wire[0], wire[1], wire[2], wire[3])
}

pub fn build_set_velocity_intervals(intervals: &[u16; VELOCITY_INTERVAL_COUNT]) -> Vec<u8> {
    build_table_command(0, SET_VELOCITY_INTERVALS, &pack_12bit_7bit(intervals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysex::STATUS_INDEX;

    #[test]
    fn test_fixed_command_layout() {
        let msg = build_fixed_command(3, GET_NOTE_CONFIG, 1, 2, 3, 4);
        assert_eq!(msg, [0x00, 0x21, 0x50, 3, GET_NOTE_CONFIG, 1, 2, 3, 4]);
    }

    #[test]
    fn test_extended_colour_splits_nibbles() {
        let msg = build_set_key_colour(1, 10, 0xFF, 0x80, 0x0F);
        assert_eq!(
            msg,
            [0x00, 0x21, 0x50, 1, SET_KEY_COLOUR, 10, 0x0F, 0x0F, 0x08, 0x00, 0x00, 0x0F]
        );
        assert!(msg.iter().all(|&b| b < 0x80));
    }

    #[test]
    fn test_table_command_copies_values() {
        let msg = build_table_command(2, SET_VELOCITY_CONFIG, &[0, 64, 127]);
        assert_eq!(msg, vec![0x00, 0x21, 0x50, 2, SET_VELOCITY_CONFIG, 0, 64, 127]);
    }

    #[test]
    #[should_panic(expected = "exceeds 127")]
    fn test_table_command_rejects_8bit_values() {
        build_table_command(1, SET_VELOCITY_CONFIG, &[10, 128]);
    }

    #[test]
    #[should_panic(expected = "board index")]
    fn test_rejects_bad_board() {
        build_fixed_command(6, GET_NOTE_CONFIG, 0, 0, 0, 0);
    }

    #[test]
    fn test_ping_carries_sentinel_and_id() {
        let msg = build_ping(0x4001);
        assert_eq!(msg[STATUS_INDEX], TEST_ECHO);
        assert_eq!(&msg[6..], &[0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_channels_are_zero_based_on_the_wire() {
        let msg = build_set_peripheral_channels(1, 2, 16, 3);
        assert_eq!(&msg[5..], &[0, 1, 15, 2]);

        let msg = build_change_key_note(1, 5, 60, 1, 1);
        assert_eq!(&msg[5..], &[5, 60, 0, 1]);
    }

    #[test]
    fn test_packers_boundary_values() {
        assert_eq!(pack_8bit_nibbles(&[0, 255]), vec![0, 0, 0x0F, 0x0F]);
        assert_eq!(pack_12bit_7bit(&[0, 4095]), vec![0, 0, 0x1F, 0x7F]);
        assert_eq!(pack_12bit_nibbles(&[0, 4095]), vec![0, 0, 0, 0x0F, 0x0F, 0x0F]);
    }

    #[test]
    fn test_velocity_interval_message_length() {
        let intervals = [4095u16; VELOCITY_INTERVAL_COUNT];
        let msg = build_set_velocity_intervals(&intervals);
        assert_eq!(msg.len(), 5 + VELOCITY_INTERVAL_COUNT * 2);
        assert!(msg.iter().all(|&b| b < 0x80));
    }
}
