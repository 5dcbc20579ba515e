//! Connection monitor
//!
//! Finds the Lumatone among the available MIDI devices, then keeps checking
//! that it is still there. Everything is driven by [`ConnectionMonitor::tick`]:
//! each call drains the inbound queue in arrival order and then fires the
//! single pending timer if it is due. Nothing here blocks.
//!
//! Detection runs in rounds. A round first re-probes the last known good pair
//! (if both devices are still present), then pings every output with a unique
//! id and matches the answering input to the output the id went to. Firmware
//! older than 1.0.11 ignores pings, so if no ping is answered each output is
//! probed on its own. A round that finds nothing reports
//! [`MonitorEvent::ConnectionFailed`] and the next one starts after
//! `detect_routine_timeout`.

pub mod events;
pub mod state;
pub mod timer;

#[cfg(test)]
mod tests;

pub use events::{EventCallback, MonitorEvent, MonitorStatus, StatusBoard};
pub use state::{ConnectionSnapshot, MonitorState, PingRegistry};
pub use timer::{Wake, WakeReason};

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::firmware::{version_to_release, FirmwareVersion, Release};
use crate::midi::{format_hex, frame_sysex, RawMessage};
use crate::sysex::commands::{
    self, CALIBRATE_PITCH_MOD_WHEEL, GET_FIRMWARE_REVISION, LUMA_PING,
    PERIPHERAL_CALIBRATION_DATA,
};
use crate::sysex::encode::{self, MAX_PING_ID};
use crate::sysex::{decode, parse_header, ParsedHeader, StatusCode, SysExError, CMD_INDEX};
use crate::transport::{
    inbound_queue, DeviceDescriptor, InboundMessage, InboundSender, MidiTransport,
    TransportError,
};
use events::EventBus;
use state::DetectRound;
use timer::Timer;

/// Delay between `start_detection` and the first round
const DETECTION_KICKOFF: Duration = Duration::from_millis(10);

/// Monitor tuning, usually built from the `connection` config section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Search for a device whenever none is connected
    pub detect_if_disconnected: bool,
    /// Probe the connected device after a period of silence
    pub check_if_inactive: bool,
    pub response_timeout: Duration,
    pub detect_routine_timeout: Duration,
    pub inactivity_timeout: Duration,
    /// Consecutive unanswered probes before the device is considered gone
    pub max_missed_probes: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detect_if_disconnected: true,
            check_if_inactive: true,
            response_timeout: Duration::from_millis(600),
            detect_routine_timeout: Duration::from_millis(1000),
            inactivity_timeout: Duration::from_millis(2000),
            max_missed_probes: 2,
        }
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("no Lumatone connected")]
    NotConnected,

    #[error("command 0x{command:02X} is not supported by firmware release {release}")]
    Unsupported { command: u8, release: Release },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// How an inbound message bears on the current probe
enum Inbound {
    /// Our own request coming back
    Echo(ParsedHeader),
    /// The device answered with an error status
    Failed(ParsedHeader),
    Reply(ParsedHeader),
}

pub struct ConnectionMonitor<T: MidiTransport> {
    transport: T,
    config: MonitorConfig,
    state: MonitorState,
    snapshot: ConnectionSnapshot,
    pings: PingRegistry,
    round: Option<DetectRound>,
    detect_in_progress: bool,
    waiting_for_response: bool,
    /// Device ids (input, output) of the last established pair
    last_known_good: Option<(String, String)>,
    calibration_probe_pending: bool,
    firmware: Option<FirmwareVersion>,
    release: Release,
    missed_probes: u32,
    keepalive_id: u32,
    /// Framed bytes of the last probe, to spot it looping back
    last_probe: Option<Vec<u8>>,
    inputs: Vec<DeviceDescriptor>,
    outputs: Vec<DeviceDescriptor>,
    open_inputs: BTreeSet<usize>,
    open_outputs: BTreeSet<usize>,
    timer: Timer,
    inbound_tx: InboundSender,
    inbound_rx: Receiver<InboundMessage>,
    events: EventBus,
    status: StatusBoard,
}

impl<T: MidiTransport> ConnectionMonitor<T> {
    pub fn new(transport: T, config: MonitorConfig) -> Self {
        let (inbound_tx, inbound_rx) = inbound_queue();

        Self {
            transport,
            config,
            state: MonitorState::Idle,
            snapshot: ConnectionSnapshot::default(),
            pings: PingRegistry::default(),
            round: None,
            detect_in_progress: false,
            waiting_for_response: false,
            last_known_good: None,
            calibration_probe_pending: false,
            firmware: None,
            release: Release::Unknown,
            missed_probes: 0,
            keepalive_id: 0,
            last_probe: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            open_inputs: BTreeSet::new(),
            open_outputs: BTreeSet::new(),
            timer: Timer::default(),
            inbound_tx,
            inbound_rx,
            events: EventBus::default(),
            status: StatusBoard::default(),
        }
    }

    /// Seed the pair probed first by each detection round
    pub fn with_preferred_devices(mut self, input_id: String, output_id: String) -> Self {
        self.last_known_good = Some((input_id, output_id));
        self
    }

    // ===== Accessors =====

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.snapshot
    }

    pub fn is_established(&self) -> bool {
        self.snapshot.is_established()
    }

    pub fn firmware(&self) -> Option<FirmwareVersion> {
        self.firmware
    }

    pub fn release(&self) -> Release {
        self.release
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn input_devices(&self) -> &[DeviceDescriptor] {
        &self.inputs
    }

    pub fn output_devices(&self) -> &[DeviceDescriptor] {
        &self.outputs
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// When the driver loop must call `tick` next, if anything is scheduled
    pub fn next_wake(&self) -> Option<Instant> {
        self.timer.pending().map(|wake| wake.at)
    }

    pub fn pending_wake(&self) -> Option<Wake> {
        self.timer.pending()
    }

    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    pub fn subscribe(&self, callback: EventCallback) {
        self.events.subscribe(callback);
    }

    /// Queue handle for transports delivering inbound bytes
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound_tx.clone()
    }

    // ===== Lifecycle =====

    /// Begin looking for a device. No-op unless `detect_if_disconnected`.
    pub fn start_detection(&mut self, now: Instant) {
        if !self.config.detect_if_disconnected {
            debug!("Device detection disabled");
            return;
        }
        if self.snapshot.is_established() {
            debug!("Already connected, detection not started");
            return;
        }

        self.reset_round();
        self.set_state(MonitorState::LookingForDevice);
        self.timer.arm(now, DETECTION_KICKOFF, WakeReason::Detect);
    }

    /// Stop all activity and release the devices. Safe to call repeatedly.
    pub fn stop_monitoring(&mut self) {
        self.timer.cancel();
        self.reset_round();
        self.close_devices();
        self.snapshot.clear();
        self.firmware = None;
        self.release = Release::Unknown;
        self.missed_probes = 0;

        if self.state != MonitorState::Idle {
            info!("Connection monitoring stopped");
        }
        self.set_state(MonitorState::Idle);
    }

    /// Probe an explicit device pair instead of searching
    pub fn connect_to(
        &mut self,
        input: usize,
        output: usize,
        now: Instant,
    ) -> Result<(), MonitorError> {
        self.stop_monitoring();
        self.refresh_devices()?;

        if input >= self.inputs.len() {
            return Err(TransportError::NoSuchInput(input).into());
        }
        if output >= self.outputs.len() {
            return Err(TransportError::NoSuchOutput(output).into());
        }

        self.transport.open_input(input, self.inbound_tx.clone())?;
        self.open_inputs.insert(input);

        info!(
            "Confirming {} / {}",
            self.inputs[input].name, self.outputs[output].name
        );
        self.detect_in_progress = true;
        self.begin_confirm(output, now);
        Ok(())
    }

    /// Swap in new settings; takes effect from the next armed timer
    pub fn apply_config(&mut self, config: MonitorConfig, now: Instant) {
        if config == self.config {
            return;
        }

        let was_detecting = self.config.detect_if_disconnected;
        let was_checking = self.config.check_if_inactive;
        self.config = config;
        info!("Connection settings updated");

        if self.snapshot.is_established() {
            if !self.config.check_if_inactive
                && self.state == MonitorState::WaitingForInactivityTimeout
            {
                self.timer.cancel();
                self.set_state(MonitorState::Monitoring);
            } else if self.config.check_if_inactive && !was_checking && !self.waiting_for_response
            {
                self.arm_inactivity(now);
            }
            return;
        }

        if !self.config.detect_if_disconnected && was_detecting {
            self.stop_monitoring();
        } else if self.config.detect_if_disconnected
            && !was_detecting
            && self.state == MonitorState::Idle
        {
            self.start_detection(now);
        }
    }

    /// Drain inbound messages, then fire the timer if due
    pub fn tick(&mut self, now: Instant) {
        while let Ok(message) = self.inbound_rx.try_recv() {
            self.handle_inbound(message, now);
        }

        if let Some(reason) = self.timer.take_due(now) {
            trace!("Timer fired: {:?}", reason);
            match reason {
                WakeReason::Detect => self.begin_round(now),
                WakeReason::RoundTimeout => self.on_round_timeout(now),
                WakeReason::Inactivity => self.on_inactive(now),
                WakeReason::ProbeTimeout => self.on_probe_missed(now),
            }
        }
    }

    /// Send a request (SysEx data without framing) to the connected device
    pub fn send_request(&mut self, data: &[u8]) -> Result<(), MonitorError> {
        let output = self.snapshot.output().ok_or(MonitorError::NotConnected)?;

        if let Some(&command) = data.get(CMD_INDEX) {
            if self.release != Release::Unknown && !self.release.supports(command) {
                return Err(MonitorError::Unsupported {
                    command,
                    release: self.release,
                });
            }
        }

        self.send_framed(output, data)?;
        Ok(())
    }

    // ===== Detection =====

    fn begin_round(&mut self, now: Instant) {
        if self.state != MonitorState::LookingForDevice || self.detect_in_progress {
            return;
        }

        self.close_devices();
        if let Err(e) = self.refresh_devices() {
            warn!("Failed to enumerate MIDI devices: {}", e);
            self.fail_round(now);
            return;
        }
        self.open_all_inputs();
        self.detect_in_progress = true;

        match self.last_known_good_pair() {
            Some(output) => self.begin_confirm(output, now),
            None => self.begin_ping_round(now),
        }
    }

    /// Output index of the last known good pair, if both devices are present
    fn last_known_good_pair(&self) -> Option<usize> {
        let (input_id, output_id) = self.last_known_good.as_ref()?;
        self.inputs.iter().find(|d| &d.id == input_id)?;
        self.outputs
            .iter()
            .find(|d| &d.id == output_id)
            .map(|d| d.index)
    }

    fn begin_confirm(&mut self, output: usize, now: Instant) {
        self.set_state(MonitorState::ConfirmingDevice);
        self.round = Some(DetectRound::Confirming { output });

        match self.send_probe(output, &encode::build_get_serial_identity()) {
            Ok(()) => {
                self.waiting_for_response = true;
                self.timer
                    .arm(now, self.config.response_timeout, WakeReason::RoundTimeout);
            }
            Err(e) => {
                debug!("Confirm probe to output {} failed: {}", output, e);
                self.on_round_timeout(now);
            }
        }
    }

    fn begin_ping_round(&mut self, now: Instant) {
        self.set_state(MonitorState::LookingForDevice);

        if self.inputs.is_empty() || self.outputs.is_empty() {
            debug!("No MIDI devices to probe");
            self.fail_round(now);
            return;
        }

        let outputs: Vec<usize> = self.outputs.iter().map(|d| d.index).collect();
        let issued = self.pings.start_round(&outputs);
        let mut excluded = BTreeSet::new();

        debug!("Pinging {} outputs", issued.len());
        for (id, output) in issued {
            if let Err(e) = self.send_framed(output, &encode::build_ping(id)) {
                debug!("Ping {} to output {} failed: {}", id, output, e);
                self.pings.remove(id);
                excluded.insert(output);
            }
        }

        self.round = Some(DetectRound::Pinging { excluded });
        self.waiting_for_response = true;
        self.timer
            .arm(now, self.config.response_timeout, WakeReason::RoundTimeout);
    }

    fn on_round_timeout(&mut self, now: Instant) {
        self.waiting_for_response = false;

        match self.round.take() {
            Some(DetectRound::Confirming { output }) => {
                debug!("Output {} did not confirm", output);
                if self.config.detect_if_disconnected && !self.inputs.is_empty() {
                    self.open_all_inputs();
                    self.begin_ping_round(now);
                } else {
                    self.fail_round(now);
                }
            }
            Some(DetectRound::Pinging { excluded }) => {
                self.pings.clear();
                let queue: Vec<usize> = self
                    .outputs
                    .iter()
                    .map(|d| d.index)
                    .filter(|index| !excluded.contains(index))
                    .collect();
                let calibration = std::mem::take(&mut self.calibration_probe_pending);

                debug!(
                    "No ping answered, probing {} outputs individually",
                    queue.len()
                );
                self.probe_individually(queue, 0, calibration, now);
            }
            Some(DetectRound::Individual {
                queue,
                position,
                calibration,
            }) => self.probe_individually(queue, position + 1, calibration, now),
            None => {}
        }
    }

    /// Probe `queue[position]`, skipping outputs that cannot be written to
    fn probe_individually(
        &mut self,
        queue: Vec<usize>,
        mut position: usize,
        calibration: bool,
        now: Instant,
    ) {
        let probe = if calibration {
            encode::build_calibrate_pitch_mod_wheel(false)
        } else {
            encode::build_get_serial_identity()
        };

        while let Some(&output) = queue.get(position) {
            match self.send_probe(output, &probe) {
                Ok(()) => {
                    self.round = Some(DetectRound::Individual {
                        queue,
                        position,
                        calibration,
                    });
                    self.waiting_for_response = true;
                    self.timer
                        .arm(now, self.config.response_timeout, WakeReason::RoundTimeout);
                    return;
                }
                Err(e) => {
                    debug!("Probe to output {} failed: {}", output, e);
                    position += 1;
                }
            }
        }

        self.fail_round(now);
    }

    fn fail_round(&mut self, now: Instant) {
        self.reset_round();
        info!("No Lumatone found");
        self.events.emit(MonitorEvent::ConnectionFailed);

        if self.config.detect_if_disconnected {
            self.set_state(MonitorState::LookingForDevice);
            self.timer
                .arm(now, self.config.detect_routine_timeout, WakeReason::Detect);
        } else {
            self.close_devices();
            self.set_state(MonitorState::Idle);
        }
    }

    fn reset_round(&mut self) {
        self.round = None;
        self.pings.clear();
        self.detect_in_progress = false;
        self.waiting_for_response = false;
        self.last_probe = None;
    }

    fn implicit_output(&self) -> Option<usize> {
        match (self.inputs.as_slice(), self.outputs.as_slice()) {
            ([_], [output]) => Some(output.index),
            _ => None,
        }
    }

    fn establish_connection(&mut self, input: usize, output: usize, now: Instant) {
        self.timer.cancel();
        self.reset_round();
        self.missed_probes = 0;
        self.snapshot.set(input, output);

        if let (Some(i), Some(o)) = (self.inputs.get(input), self.outputs.get(output)) {
            info!("Lumatone connected: in '{}', out '{}'", i.name, o.name);
            self.last_known_good = Some((i.id.clone(), o.id.clone()));
        }

        for index in self.open_inputs.clone() {
            if index != input {
                self.transport.close_input(index);
                self.open_inputs.remove(&index);
            }
        }
        for index in self.open_outputs.clone() {
            if index != output {
                self.transport.close_output(index);
                self.open_outputs.remove(&index);
            }
        }

        self.set_state(MonitorState::Monitoring);
        self.events.emit(MonitorEvent::ConnectionEstablished {
            input_index: input,
            output_index: output,
        });

        // Doubles as the first liveness probe
        let request = encode::build_get_firmware_revision();
        if let Err(e) = self.send_probe(output, &request) {
            warn!("Failed to request firmware revision: {}", e);
        }
        if self.config.check_if_inactive {
            self.waiting_for_response = true;
            self.timer
                .arm(now, self.config.response_timeout, WakeReason::ProbeTimeout);
        }
    }

    // ===== Monitoring =====

    fn on_inactive(&mut self, now: Instant) {
        if !self.snapshot.is_established() {
            return;
        }
        trace!("Device quiet, probing");
        self.set_state(MonitorState::Monitoring);
        self.send_liveness_probe(now);
    }

    fn send_liveness_probe(&mut self, now: Instant) {
        let Some(output) = self.snapshot.output() else {
            return;
        };

        let probe = if self.release.supports_ping() {
            self.keepalive_id = self.keepalive_id % MAX_PING_ID + 1;
            encode::build_ping(self.keepalive_id).to_vec()
        } else {
            encode::build_get_serial_identity().to_vec()
        };

        if let Err(e) = self.send_probe(output, &probe) {
            warn!("Liveness probe failed: {}", e);
        }
        self.waiting_for_response = true;
        self.timer
            .arm(now, self.config.response_timeout, WakeReason::ProbeTimeout);
    }

    fn on_probe_missed(&mut self, now: Instant) {
        if !self.snapshot.is_established() {
            return;
        }

        self.missed_probes += 1;
        if self.missed_probes >= self.config.max_missed_probes {
            self.lose_connection(now);
            return;
        }

        debug!(
            "Device did not answer ({}/{})",
            self.missed_probes, self.config.max_missed_probes
        );
        self.send_liveness_probe(now);
    }

    fn on_alive(&mut self, now: Instant) {
        if self.waiting_for_response {
            trace!("Probe answered");
        }
        self.waiting_for_response = false;
        self.missed_probes = 0;

        if self.config.check_if_inactive {
            self.arm_inactivity(now);
        } else {
            self.timer.cancel();
            self.set_state(MonitorState::Monitoring);
        }
    }

    fn arm_inactivity(&mut self, now: Instant) {
        self.timer
            .arm(now, self.config.inactivity_timeout, WakeReason::Inactivity);
        self.set_state(MonitorState::WaitingForInactivityTimeout);
    }

    fn lose_connection(&mut self, now: Instant) {
        warn!("Lumatone connection lost");

        self.timer.cancel();
        self.reset_round();
        self.snapshot.clear();
        self.firmware = None;
        self.release = Release::Unknown;
        self.missed_probes = 0;
        self.close_devices();

        self.events.emit(MonitorEvent::ConnectionLost);

        if self.config.detect_if_disconnected {
            self.start_detection(now);
        } else {
            self.set_state(MonitorState::Idle);
        }
    }

    // ===== Inbound =====

    fn handle_inbound(&mut self, message: InboundMessage, now: Instant) {
        if self.state == MonitorState::Idle {
            trace!("Idle, dropping message from input {}", message.input_index);
            return;
        }

        let raw = RawMessage::from_midi(&message.bytes);
        trace!(
            "Input {} <- {} | {}",
            message.input_index,
            format_hex(raw.as_bytes()),
            raw
        );

        if self.snapshot.is_established() {
            self.handle_connected_inbound(message.input_index, &raw, now);
        } else {
            self.handle_detection_inbound(message.input_index, &raw, now);
        }
    }

    fn classify(&self, raw: &RawMessage) -> Option<Inbound> {
        let header = match parse_header(raw) {
            Ok(header) => header,
            Err(e) => {
                trace!("Not a Lumatone response: {}", e);
                return None;
            }
        };

        if header.is_echo() || self.last_probe.as_deref() == Some(raw.as_bytes()) {
            return Some(Inbound::Echo(header));
        }
        if !commands::is_known(header.command) {
            trace!("{}", SysExError::UnknownCommand(header.command));
            return None;
        }

        match header.status {
            StatusCode::Error => Some(Inbound::Failed(header)),
            StatusCode::Busy => {
                debug!("Device busy ({})", commands::name(header.command));
                None
            }
            _ => Some(Inbound::Reply(header)),
        }
    }

    fn handle_detection_inbound(&mut self, input: usize, raw: &RawMessage, now: Instant) {
        let Some(inbound) = self.classify(raw) else {
            return;
        };

        let is_calibration = match &inbound {
            Inbound::Echo(_) => false,
            Inbound::Failed(h) | Inbound::Reply(h) => {
                matches!(h.command, PERIPHERAL_CALIBRATION_DATA | CALIBRATE_PITCH_MOD_WHEEL)
            }
        };

        match inbound {
            Inbound::Echo(header) => self.on_detection_echo(input, raw, &header),
            Inbound::Failed(header) => {
                if let Some(output) = self.round.as_ref().and_then(|r| r.probed_output()) {
                    debug!(
                        "Output {} answered {} with an error",
                        output,
                        commands::name(header.command)
                    );
                    self.timer.cancel();
                    self.on_round_timeout(now);
                }
            }
            Inbound::Reply(header) => self.on_detection_reply(input, raw, &header, now),
        }

        if is_calibration && !self.snapshot.is_established() && !self.calibration_probe_pending {
            debug!("Calibration traffic seen, next individual round ends calibration");
            self.calibration_probe_pending = true;
        }
    }

    fn on_detection_echo(&mut self, input: usize, raw: &RawMessage, header: &ParsedHeader) {
        if header.command != LUMA_PING {
            trace!("Probe looped back on input {}", input);
            return;
        }
        let Some(DetectRound::Pinging { excluded }) = self.round.as_mut() else {
            return;
        };

        match decode::unpack_ping_echo(raw) {
            Ok(id) => {
                if let Some(output) = self.pings.remove(id) {
                    debug!("Output {} loops back to input {}, excluded", output, input);
                    excluded.insert(output);
                }
            }
            Err(e) => trace!("Malformed ping echo: {}", e),
        }
    }

    fn on_detection_reply(
        &mut self,
        input: usize,
        raw: &RawMessage,
        header: &ParsedHeader,
        now: Instant,
    ) {
        let target = match &self.round {
            Some(DetectRound::Pinging { .. }) if header.command == LUMA_PING => {
                match decode::unpack_ping(raw) {
                    Ok(id) => self.pings.output_for(id),
                    Err(e) => {
                        debug!("Unusable ping answer on input {}: {}", input, e);
                        None
                    }
                }
            }
            Some(round) => round.probed_output(),
            None => None,
        };

        match target.or_else(|| self.implicit_output()) {
            Some(output) => {
                debug!(
                    "{} answered on input {}, matched to output {}",
                    commands::name(header.command),
                    input,
                    output
                );
                self.establish_connection(input, output, now);
            }
            None => trace!(
                "Unmatched {} on input {}",
                commands::name(header.command),
                input
            ),
        }
    }

    fn handle_connected_inbound(&mut self, input: usize, raw: &RawMessage, now: Instant) {
        if self.snapshot.input() != Some(input) {
            trace!("Ignoring input {} while connected", input);
            return;
        }
        // Notes, controllers, Busy answers and other SysEx all prove the
        // keyboard is there; only our own echo and Error replies do not
        let Some(inbound) = self.classify(raw) else {
            self.on_alive(now);
            return;
        };

        match inbound {
            Inbound::Echo(_) => trace!("Echo on connected input"),
            Inbound::Failed(header) => {
                debug!(
                    "Device reported an error for {}",
                    commands::name(header.command)
                );
                if self.waiting_for_response {
                    self.on_probe_missed(now);
                }
            }
            Inbound::Reply(header) => {
                if header.command == GET_FIRMWARE_REVISION {
                    self.on_firmware_reply(raw);
                }
                self.on_alive(now);
            }
        }
    }

    fn on_firmware_reply(&mut self, raw: &RawMessage) {
        match decode::unpack_firmware_revision(raw) {
            Ok(version) => {
                let release = version_to_release(version);
                info!("Lumatone firmware {} (release {})", version, release);
                self.firmware = Some(version);
                self.release = release;
                self.publish_status();
                self.events
                    .emit(MonitorEvent::FirmwareVersionResolved { version, release });
            }
            Err(SysExError::Rejected(_)) => {
                debug!("Firmware revision request not supported, release stays unknown");
            }
            Err(e) => debug!("Bad firmware revision reply: {}", e),
        }
    }

    // ===== Devices =====

    fn refresh_devices(&mut self) -> Result<(), TransportError> {
        self.inputs = self.transport.list_input_devices()?;
        self.outputs = self.transport.list_output_devices()?;
        debug!(
            "Found {} MIDI inputs, {} outputs",
            self.inputs.len(),
            self.outputs.len()
        );
        Ok(())
    }

    fn open_all_inputs(&mut self) {
        for index in 0..self.inputs.len() {
            if self.open_inputs.contains(&index) {
                continue;
            }
            match self.transport.open_input(index, self.inbound_tx.clone()) {
                Ok(()) => {
                    self.open_inputs.insert(index);
                }
                Err(e) => warn!("{}", e),
            }
        }
    }

    fn close_devices(&mut self) {
        self.transport.close_all();
        self.open_inputs.clear();
        self.open_outputs.clear();
    }

    fn send_framed(&mut self, output: usize, data: &[u8]) -> Result<Vec<u8>, TransportError> {
        if !self.open_outputs.contains(&output) {
            self.transport.open_output(output)?;
            self.open_outputs.insert(output);
        }

        let framed = frame_sysex(data);
        trace!("Output {} -> {}", output, format_hex(&framed));
        self.transport.send(output, &framed)?;
        Ok(framed)
    }

    fn send_probe(&mut self, output: usize, data: &[u8]) -> Result<(), TransportError> {
        let framed = self.send_framed(output, data)?;
        self.last_probe = Some(framed);
        Ok(())
    }

    // ===== Status =====

    fn set_state(&mut self, state: MonitorState) {
        if self.state == state {
            return;
        }
        debug!("Monitor state: {} -> {}", self.state, state);
        self.state = state;
        self.publish_status();
        self.events.emit(MonitorEvent::StateChanged(state));
    }

    fn publish_status(&self) {
        let name_of = |devices: &[DeviceDescriptor], index: Option<usize>| {
            index
                .and_then(|i| devices.get(i))
                .map(|d| d.name.clone())
        };

        self.status.publish(MonitorStatus {
            state: self.state,
            snapshot: self.snapshot,
            firmware: self.firmware,
            release: self.release,
            input_name: name_of(&self.inputs, self.snapshot.input()),
            output_name: name_of(&self.outputs, self.snapshot.output()),
        });
    }
}
