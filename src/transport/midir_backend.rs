//! Transport over the platform MIDI API (via `midir`)

use std::collections::HashMap;

use midir::{
    Ignore, MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection,
    MidiOutputPort,
};
use tracing::{debug, info, warn};

use super::{DeviceDescriptor, InboundSender, MidiTransport, TransportError};
use crate::midi::format_hex;

/// Production transport; one midir connection per open device
pub struct MidirTransport {
    client_name: String,
    input_ports: Vec<MidiInputPort>,
    output_ports: Vec<MidiOutputPort>,
    inputs: HashMap<usize, MidiInputConnection<()>>,
    outputs: HashMap<usize, MidiOutputConnection>,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    fn midi_input(&self, suffix: &str) -> Result<MidiInput, TransportError> {
        MidiInput::new(&format!("{}-{}", self.client_name, suffix))
            .map_err(|e| TransportError::Backend(e.to_string()))
    }

    fn midi_output(&self, suffix: &str) -> Result<MidiOutput, TransportError> {
        MidiOutput::new(&format!("{}-{}", self.client_name, suffix))
            .map_err(|e| TransportError::Backend(e.to_string()))
    }
}

impl MidiTransport for MidirTransport {
    fn list_input_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        let midi_in = self.midi_input("Scanner")?;
        let ports = midi_in.ports();

        let devices = ports
            .iter()
            .enumerate()
            .map(|(index, port)| DeviceDescriptor {
                id: port.id(),
                name: midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Input {}", index)),
                index,
            })
            .collect();

        self.input_ports = ports;
        Ok(devices)
    }

    fn list_output_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        let midi_out = self.midi_output("Scanner")?;
        let ports = midi_out.ports();

        let devices = ports
            .iter()
            .enumerate()
            .map(|(index, port)| DeviceDescriptor {
                id: port.id(),
                name: midi_out
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Output {}", index)),
                index,
            })
            .collect();

        self.output_ports = ports;
        Ok(devices)
    }

    fn open_input(&mut self, index: usize, sink: InboundSender) -> Result<(), TransportError> {
        if self.inputs.contains_key(&index) {
            return Ok(());
        }

        let port = self
            .input_ports
            .get(index)
            .cloned()
            .ok_or(TransportError::NoSuchInput(index))?;

        let mut midi_in = self.midi_input("Input")?;
        // SysEx is filtered by default on some backends
        midi_in.ignore(Ignore::None);
        let name = midi_in.port_name(&port).unwrap_or_default();

        let connection = midi_in
            .connect(
                &port,
                &self.client_name,
                move |_timestamp, data, _| sink.push(index, data),
                (),
            )
            .map_err(|e| TransportError::Open {
                kind: "input",
                name: name.clone(),
                reason: e.to_string(),
            })?;

        info!("Opened MIDI input {}: {}", index, name);
        self.inputs.insert(index, connection);
        Ok(())
    }

    fn open_output(&mut self, index: usize) -> Result<(), TransportError> {
        if self.outputs.contains_key(&index) {
            return Ok(());
        }

        let port = self
            .output_ports
            .get(index)
            .cloned()
            .ok_or(TransportError::NoSuchOutput(index))?;

        let midi_out = self.midi_output("Output")?;
        let name = midi_out.port_name(&port).unwrap_or_default();

        let connection = midi_out
            .connect(&port, &self.client_name)
            .map_err(|e| TransportError::Open {
                kind: "output",
                name: name.clone(),
                reason: e.to_string(),
            })?;

        info!("Opened MIDI output {}: {}", index, name);
        self.outputs.insert(index, connection);
        Ok(())
    }

    fn close_input(&mut self, index: usize) {
        if let Some(connection) = self.inputs.remove(&index) {
            connection.close();
            debug!("Closed MIDI input {}", index);
        }
    }

    fn close_output(&mut self, index: usize) {
        if let Some(connection) = self.outputs.remove(&index) {
            connection.close();
            debug!("Closed MIDI output {}", index);
        }
    }

    fn close_all(&mut self) {
        let inputs: Vec<usize> = self.inputs.keys().copied().collect();
        for index in inputs {
            self.close_input(index);
        }
        let outputs: Vec<usize> = self.outputs.keys().copied().collect();
        for index in outputs {
            self.close_output(index);
        }
    }

    fn send(&mut self, output_index: usize, bytes: &[u8]) -> Result<(), TransportError> {
        let connection = self
            .outputs
            .get_mut(&output_index)
            .ok_or(TransportError::NotOpen(output_index))?;

        connection.send(bytes).map_err(|e| {
            warn!("MIDI send to output {} failed: {}", output_index, e);
            TransportError::Send {
                index: output_index,
                reason: e.to_string(),
            }
        })?;

        debug!("TX output {} -> {}", output_index, format_hex(bytes));
        Ok(())
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        self.close_all();
    }
}
