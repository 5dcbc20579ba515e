//! MIDI transport abstraction
//!
//! The connection monitor only needs to enumerate devices, open and close
//! them by index, and push bytes out. Inbound bytes arrive on the driver's own
//! threads and are handed over through an [`InboundSender`], so the monitor
//! stays single-threaded.

pub mod midir_backend;

pub use midir_backend::MidirTransport;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use thiserror::Error;
use tracing::trace;

use crate::midi::format_hex;

/// An input or output device as enumerated by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Stable identifier (survives re-enumeration)
    pub id: String,
    pub name: String,
    /// Position in the most recent enumeration
    pub index: usize,
}

/// Bytes received on one of the open inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub input_index: usize,
    pub bytes: Vec<u8>,
}

/// Cloneable handle transports use to deliver inbound messages
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: Sender<InboundMessage>,
}

impl InboundSender {
    /// Queue a message. Never blocks; drops the message if the monitor is gone.
    pub fn push(&self, input_index: usize, bytes: &[u8]) {
        trace!("RX input {} <- {}", input_index, format_hex(bytes));
        let message = InboundMessage {
            input_index,
            bytes: bytes.to_vec(),
        };
        if let Err(TrySendError::Disconnected(_)) = self.tx.try_send(message) {
            trace!("Inbound queue closed, dropping message from input {}", input_index);
        }
    }
}

/// Create the inbound queue; the receiver stays with the monitor
pub fn inbound_queue() -> (InboundSender, Receiver<InboundMessage>) {
    let (tx, rx) = channel::unbounded();
    (InboundSender { tx }, rx)
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("MIDI backend unavailable: {0}")]
    Backend(String),

    #[error("no input device at index {0}")]
    NoSuchInput(usize),

    #[error("no output device at index {0}")]
    NoSuchOutput(usize),

    #[error("failed to open {kind} device '{name}': {reason}")]
    Open {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("output {0} is not open")]
    NotOpen(usize),

    #[error("send to output {index} failed: {reason}")]
    Send { index: usize, reason: String },
}

/// Device access used by the connection monitor
///
/// Indices refer to the most recent `list_*_devices` call.
pub trait MidiTransport {
    fn list_input_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError>;

    fn list_output_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError>;

    /// Open an input; every message it receives is pushed into `sink`.
    /// Opening an already open input is a no-op.
    fn open_input(&mut self, index: usize, sink: InboundSender) -> Result<(), TransportError>;

    /// Opening an already open output is a no-op.
    fn open_output(&mut self, index: usize) -> Result<(), TransportError>;

    fn close_input(&mut self, index: usize);

    fn close_output(&mut self, index: usize);

    fn close_all(&mut self);

    /// Send a complete MIDI message (SysEx framing included)
    fn send(&mut self, output_index: usize, bytes: &[u8]) -> Result<(), TransportError>;
}
