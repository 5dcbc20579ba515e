//! Lumatone keyboard link
//!
//! SysEx codec, firmware capability tables and a connection monitor that
//! finds a Lumatone among the available MIDI devices and keeps checking that
//! it is still there.

pub mod config;
pub mod firmware;
pub mod midi;
pub mod monitor;
pub mod sniffer;
pub mod sysex;
pub mod transport;

pub use firmware::{FirmwareVersion, Release};
pub use monitor::{ConnectionMonitor, MonitorConfig, MonitorEvent, MonitorState};
pub use transport::{MidiTransport, MidirTransport};
