//! Lumatone SysEx command ids
//!
//! Ids are grouped by the firmware release that introduced them. Newer
//! releases only ever append at the high end of the id space, which is what
//! lets `firmware::minimum_release_for_command` work as a step table.

// Original 55/56-key firmware (0x00 - 0x1F)
pub const CHANGE_KEY_NOTE: u8 = 0x00;
pub const SET_KEY_COLOUR: u8 = 0x01;
pub const SAVE_PROGRAM: u8 = 0x02;
pub const SET_FOOT_CONTROLLER_SENSITIVITY: u8 = 0x03;
pub const INVERT_FOOT_CONTROLLER: u8 = 0x04;
pub const MACROBUTTON_COLOUR_ON: u8 = 0x05;
pub const MACROBUTTON_COLOUR_OFF: u8 = 0x06;
pub const SET_LIGHT_ON_KEYSTROKES: u8 = 0x07;
pub const SET_VELOCITY_CONFIG: u8 = 0x08;
pub const SAVE_VELOCITY_CONFIG: u8 = 0x09;
pub const RESET_VELOCITY_CONFIG: u8 = 0x0A;
pub const SET_FADER_CONFIG: u8 = 0x0B;
pub const SAVE_FADER_CONFIG: u8 = 0x0C;
pub const RESET_FADER_CONFIG: u8 = 0x0D;
pub const SET_AFTERTOUCH_FLAG: u8 = 0x0E;
pub const CALIBRATE_AFTERTOUCH: u8 = 0x0F;
pub const SET_AFTERTOUCH_CONFIG: u8 = 0x10;
pub const SAVE_AFTERTOUCH_CONFIG: u8 = 0x11;
pub const RESET_AFTERTOUCH_CONFIG: u8 = 0x12;
pub const GET_RED_LED_CONFIG: u8 = 0x13;
pub const GET_GREEN_LED_CONFIG: u8 = 0x14;
pub const GET_BLUE_LED_CONFIG: u8 = 0x15;
pub const GET_CHANNEL_CONFIG: u8 = 0x16;
pub const GET_NOTE_CONFIG: u8 = 0x17;
pub const GET_KEYTYPE_CONFIG: u8 = 0x18;
pub const GET_MAX_THRESHOLD: u8 = 0x19;
pub const GET_MIN_THRESHOLD: u8 = 0x1A;
pub const GET_AFTERTOUCH_MAX: u8 = 0x1B;
pub const GET_KEY_VALIDITY: u8 = 0x1C;
pub const GET_VELOCITY_CONFIG: u8 = 0x1D;
pub const GET_FADER_CONFIG: u8 = 0x1E;
pub const GET_AFTERTOUCH_CONFIG: u8 = 0x1F;

// 1.0.3
pub const SET_VELOCITY_INTERVALS: u8 = 0x20;
pub const GET_VELOCITY_INTERVALS: u8 = 0x21;
pub const GET_FADER_TYPE_CONFIG: u8 = 0x22;

// 1.0.4
pub const GET_SERIAL_IDENTITY: u8 = 0x23;
pub const CALIBRATE_KEYS: u8 = 0x24;
pub const DEMO_MODE: u8 = 0x25;

// 1.0.5
pub const CALIBRATE_PITCH_MOD_WHEEL: u8 = 0x26;
pub const SET_MOD_WHEEL_SENSITIVITY: u8 = 0x27;
pub const SET_PITCH_WHEEL_SENSITIVITY: u8 = 0x28;

// 1.0.6
pub const SET_KEY_MAX_THRESHOLD: u8 = 0x29;
pub const SET_KEY_MIN_THRESHOLD: u8 = 0x2A;
pub const SET_KEY_FADER_SENSITIVITY: u8 = 0x2B;
pub const SET_KEY_AFTERTOUCH_SENSITIVITY: u8 = 0x2C;
pub const SET_CC_ACTIVE_THRESHOLD: u8 = 0x2D;
pub const RESET_BOARD_THRESHOLDS: u8 = 0x2E;
pub const SET_KEY_SAMPLING: u8 = 0x2F;
pub const RESET_WHEELS_THRESHOLD: u8 = 0x30;

// 1.0.7
pub const GET_FIRMWARE_REVISION: u8 = 0x31;
pub const SET_PITCH_WHEEL_CENTER_THRESHOLD: u8 = 0x32;

// 1.0.8
pub const CALIBRATE_EXPRESSION_PEDAL: u8 = 0x33;
pub const RESET_EXPRESSION_PEDAL_BOUNDS: u8 = 0x34;
pub const GET_BOARD_THRESHOLD_VALUES: u8 = 0x35;
pub const GET_BOARD_SENSITIVITY_VALUES: u8 = 0x36;

// 1.0.9
pub const SET_PERIPHERAL_CHANNELS: u8 = 0x37;
pub const GET_PERIPHERAL_CHANNELS: u8 = 0x38;
pub const PERIPHERAL_CALIBRATION_DATA: u8 = 0x39;
pub const SET_AFTERTOUCH_TRIGGER_DELAY: u8 = 0x3A;
pub const GET_AFTERTOUCH_TRIGGER_DELAY: u8 = 0x3B;

// 1.0.10
pub const SET_LUMATOUCH_NOTE_OFF_DELAY: u8 = 0x3C;
pub const GET_LUMATOUCH_NOTE_OFF_DELAY: u8 = 0x3D;
pub const SET_EXPRESSION_PEDAL_THRESHOLD: u8 = 0x3E;
pub const GET_EXPRESSION_PEDAL_THRESHOLD: u8 = 0x3F;
pub const INVERT_SUSTAIN_PEDAL: u8 = 0x40;
pub const RESET_DEFAULT_PRESETS: u8 = 0x41;
pub const GET_PRESET_FLAGS: u8 = 0x42;
pub const GET_EXPRESSION_PEDAL_SENSITIVITY: u8 = 0x43;

// 1.0.11
pub const LUMA_PING: u8 = 0x44;

// 1.1.0
pub const SET_MACRO_LIGHT_INTENSITY: u8 = 0x45;
pub const GET_MACRO_LIGHT_INTENSITY: u8 = 0x46;
pub const RESET_MACRO_LIGHT_INTENSITY: u8 = 0x47;
pub const SET_RAINBOW_MODE: u8 = 0x48;
pub const SET_KEY_COLOUR_EXTENDED: u8 = 0x49;

// 1.2.0
pub const SET_SYSEX_RESPONSE_MODE: u8 = 0x4A;
pub const GET_SYSEX_RESPONSE_MODE: u8 = 0x4B;
pub const SET_PERIPHERAL_SYNC: u8 = 0x4C;

/// Highest command id any known release understands
pub const LAST_KNOWN_COMMAND: u8 = SET_PERIPHERAL_SYNC;

/// Get human-readable name for command byte
pub fn name(cmd: u8) -> &'static str {
    match cmd {
        CHANGE_KEY_NOTE => "CHANGE_KEY_NOTE",
        SET_KEY_COLOUR => "SET_KEY_COLOUR",
        SAVE_PROGRAM => "SAVE_PROGRAM",
        SET_FOOT_CONTROLLER_SENSITIVITY => "SET_FOOT_CONTROLLER_SENSITIVITY",
        INVERT_FOOT_CONTROLLER => "INVERT_FOOT_CONTROLLER",
        MACROBUTTON_COLOUR_ON => "MACROBUTTON_COLOUR_ON",
        MACROBUTTON_COLOUR_OFF => "MACROBUTTON_COLOUR_OFF",
        SET_LIGHT_ON_KEYSTROKES => "SET_LIGHT_ON_KEYSTROKES",
        SET_VELOCITY_CONFIG => "SET_VELOCITY_CONFIG",
        SAVE_VELOCITY_CONFIG => "SAVE_VELOCITY_CONFIG",
        RESET_VELOCITY_CONFIG => "RESET_VELOCITY_CONFIG",
        SET_FADER_CONFIG => "SET_FADER_CONFIG",
        SAVE_FADER_CONFIG => "SAVE_FADER_CONFIG",
        RESET_FADER_CONFIG => "RESET_FADER_CONFIG",
        SET_AFTERTOUCH_FLAG => "SET_AFTERTOUCH_FLAG",
        CALIBRATE_AFTERTOUCH => "CALIBRATE_AFTERTOUCH",
        SET_AFTERTOUCH_CONFIG => "SET_AFTERTOUCH_CONFIG",
        SAVE_AFTERTOUCH_CONFIG => "SAVE_AFTERTOUCH_CONFIG",
        RESET_AFTERTOUCH_CONFIG => "RESET_AFTERTOUCH_CONFIG",
        GET_RED_LED_CONFIG => "GET_RED_LED_CONFIG",
        GET_GREEN_LED_CONFIG => "GET_GREEN_LED_CONFIG",
        GET_BLUE_LED_CONFIG => "GET_BLUE_LED_CONFIG",
        GET_CHANNEL_CONFIG => "GET_CHANNEL_CONFIG",
        GET_NOTE_CONFIG => "GET_NOTE_CONFIG",
        GET_KEYTYPE_CONFIG => "GET_KEYTYPE_CONFIG",
        GET_MAX_THRESHOLD => "GET_MAX_THRESHOLD",
        GET_MIN_THRESHOLD => "GET_MIN_THRESHOLD",
        GET_AFTERTOUCH_MAX => "GET_AFTERTOUCH_MAX",
        GET_KEY_VALIDITY => "GET_KEY_VALIDITY",
        GET_VELOCITY_CONFIG => "GET_VELOCITY_CONFIG",
        GET_FADER_CONFIG => "GET_FADER_CONFIG",
        GET_AFTERTOUCH_CONFIG => "GET_AFTERTOUCH_CONFIG",
        SET_VELOCITY_INTERVALS => "SET_VELOCITY_INTERVALS",
        GET_VELOCITY_INTERVALS => "GET_VELOCITY_INTERVALS",
        GET_FADER_TYPE_CONFIG => "GET_FADER_TYPE_CONFIG",
        GET_SERIAL_IDENTITY => "GET_SERIAL_IDENTITY",
        CALIBRATE_KEYS => "CALIBRATE_KEYS",
        DEMO_MODE => "DEMO_MODE",
        CALIBRATE_PITCH_MOD_WHEEL => "CALIBRATE_PITCH_MOD_WHEEL",
        SET_MOD_WHEEL_SENSITIVITY => "SET_MOD_WHEEL_SENSITIVITY",
        SET_PITCH_WHEEL_SENSITIVITY => "SET_PITCH_WHEEL_SENSITIVITY",
        SET_KEY_MAX_THRESHOLD => "SET_KEY_MAX_THRESHOLD",
        SET_KEY_MIN_THRESHOLD => "SET_KEY_MIN_THRESHOLD",
        SET_KEY_FADER_SENSITIVITY => "SET_KEY_FADER_SENSITIVITY",
        SET_KEY_AFTERTOUCH_SENSITIVITY => "SET_KEY_AFTERTOUCH_SENSITIVITY",
        SET_CC_ACTIVE_THRESHOLD => "SET_CC_ACTIVE_THRESHOLD",
        RESET_BOARD_THRESHOLDS => "RESET_BOARD_THRESHOLDS",
        SET_KEY_SAMPLING => "SET_KEY_SAMPLING",
        RESET_WHEELS_THRESHOLD => "RESET_WHEELS_THRESHOLD",
        GET_FIRMWARE_REVISION => "GET_FIRMWARE_REVISION",
        SET_PITCH_WHEEL_CENTER_THRESHOLD => "SET_PITCH_WHEEL_CENTER_THRESHOLD",
        CALIBRATE_EXPRESSION_PEDAL => "CALIBRATE_EXPRESSION_PEDAL",
        RESET_EXPRESSION_PEDAL_BOUNDS => "RESET_EXPRESSION_PEDAL_BOUNDS",
        GET_BOARD_THRESHOLD_VALUES => "GET_BOARD_THRESHOLD_VALUES",
        GET_BOARD_SENSITIVITY_VALUES => "GET_BOARD_SENSITIVITY_VALUES",
        SET_PERIPHERAL_CHANNELS => "SET_PERIPHERAL_CHANNELS",
        GET_PERIPHERAL_CHANNELS => "GET_PERIPHERAL_CHANNELS",
        PERIPHERAL_CALIBRATION_DATA => "PERIPHERAL_CALIBRATION_DATA",
        SET_AFTERTOUCH_TRIGGER_DELAY => "SET_AFTERTOUCH_TRIGGER_DELAY",
        GET_AFTERTOUCH_TRIGGER_DELAY => "GET_AFTERTOUCH_TRIGGER_DELAY",
        SET_LUMATOUCH_NOTE_OFF_DELAY => "SET_LUMATOUCH_NOTE_OFF_DELAY",
        GET_LUMATOUCH_NOTE_OFF_DELAY => "GET_LUMATOUCH_NOTE_OFF_DELAY",
        SET_EXPRESSION_PEDAL_THRESHOLD => "SET_EXPRESSION_PEDAL_THRESHOLD",
        GET_EXPRESSION_PEDAL_THRESHOLD => "GET_EXPRESSION_PEDAL_THRESHOLD",
        INVERT_SUSTAIN_PEDAL => "INVERT_SUSTAIN_PEDAL",
        RESET_DEFAULT_PRESETS => "RESET_DEFAULT_PRESETS",
        GET_PRESET_FLAGS => "GET_PRESET_FLAGS",
        GET_EXPRESSION_PEDAL_SENSITIVITY => "GET_EXPRESSION_PEDAL_SENSITIVITY",
        LUMA_PING => "LUMA_PING",
        SET_MACRO_LIGHT_INTENSITY => "SET_MACRO_LIGHT_INTENSITY",
        GET_MACRO_LIGHT_INTENSITY => "GET_MACRO_LIGHT_INTENSITY",
        RESET_MACRO_LIGHT_INTENSITY => "RESET_MACRO_LIGHT_INTENSITY",
        SET_RAINBOW_MODE => "SET_RAINBOW_MODE",
        SET_KEY_COLOUR_EXTENDED => "SET_KEY_COLOUR_EXTENDED",
        SET_SYSEX_RESPONSE_MODE => "SET_SYSEX_RESPONSE_MODE",
        GET_SYSEX_RESPONSE_MODE => "GET_SYSEX_RESPONSE_MODE",
        SET_PERIPHERAL_SYNC => "SET_PERIPHERAL_SYNC",
        _ => "UNKNOWN",
    }
}

/// Whether the id belongs to the known command space
pub fn is_known(cmd: u8) -> bool {
    cmd <= LAST_KNOWN_COMMAND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_id_has_a_name() {
        for cmd in 0..=LAST_KNOWN_COMMAND {
            assert_ne!(name(cmd), "UNKNOWN", "command 0x{:02X} has no name", cmd);
        }
        assert_eq!(name(LAST_KNOWN_COMMAND + 1), "UNKNOWN");
    }
}
