//! Scenario tests for the connection monitor
//!
//! Time is virtual: every `tick` gets `base + offset`, so timeouts are exact.

use super::*;
use crate::sysex::encode::{
    build_calibrate_pitch_mod_wheel, build_get_serial_identity, build_ping,
};
use crate::sysex::MANUFACTURER_ID;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct ScriptedTransport {
    inputs: Vec<DeviceDescriptor>,
    outputs: Vec<DeviceDescriptor>,
    open_inputs: BTreeSet<usize>,
    open_outputs: BTreeSet<usize>,
    sent: Vec<(usize, Vec<u8>)>,
}

impl ScriptedTransport {
    fn with_devices(inputs: usize, outputs: usize) -> Self {
        let device = |kind: &str, index: usize| DeviceDescriptor {
            id: format!("{}-{}", kind, index),
            name: format!("Port {} {}", kind, index),
            index,
        };

        Self {
            inputs: (0..inputs).map(|i| device("in", i)).collect(),
            outputs: (0..outputs).map(|i| device("out", i)).collect(),
            ..Self::default()
        }
    }

    fn sent_to(&self, output: usize) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|(index, _)| *index == output)
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }

    fn last_sent_to(&self, output: usize) -> Option<Vec<u8>> {
        self.sent_to(output).pop()
    }
}

impl MidiTransport for ScriptedTransport {
    fn list_input_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        Ok(self.inputs.clone())
    }

    fn list_output_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        Ok(self.outputs.clone())
    }

    fn open_input(&mut self, index: usize, _sink: InboundSender) -> Result<(), TransportError> {
        if index >= self.inputs.len() {
            return Err(TransportError::NoSuchInput(index));
        }
        self.open_inputs.insert(index);
        Ok(())
    }

    fn open_output(&mut self, index: usize) -> Result<(), TransportError> {
        if index >= self.outputs.len() {
            return Err(TransportError::NoSuchOutput(index));
        }
        self.open_outputs.insert(index);
        Ok(())
    }

    fn close_input(&mut self, index: usize) {
        self.open_inputs.remove(&index);
    }

    fn close_output(&mut self, index: usize) {
        self.open_outputs.remove(&index);
    }

    fn close_all(&mut self) {
        self.open_inputs.clear();
        self.open_outputs.clear();
    }

    fn send(&mut self, output_index: usize, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.open_outputs.contains(&output_index) {
            return Err(TransportError::NotOpen(output_index));
        }
        self.sent.push((output_index, bytes.to_vec()));
        Ok(())
    }
}

type Monitor = ConnectionMonitor<ScriptedTransport>;
type EventLog = Arc<Mutex<Vec<MonitorEvent>>>;

fn at(base: Instant, ms: u64) -> Instant {
    base + Duration::from_millis(ms)
}

fn record_events(monitor: &Monitor) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    monitor.subscribe(Arc::new(move |event: &MonitorEvent| {
        sink.lock().push(event.clone());
    }));
    log
}

fn count(log: &EventLog, wanted: &MonitorEvent) -> usize {
    log.lock().iter().filter(|event| *event == wanted).count()
}

fn established_count(log: &EventLog) -> usize {
    log.lock()
        .iter()
        .filter(|event| matches!(event, MonitorEvent::ConnectionEstablished { .. }))
        .count()
}

/// Framed device response
fn reply(cmd: u8, status: StatusCode, payload: &[u8]) -> Vec<u8> {
    let mut data = MANUFACTURER_ID.to_vec();
    data.extend_from_slice(&[0, cmd, status.to_byte()]);
    data.extend_from_slice(payload);
    frame_sysex(&data)
}

fn ping_reply(id: u32) -> Vec<u8> {
    reply(
        LUMA_PING,
        StatusCode::Ack,
        &[(id >> 14) as u8 & 0x7F, (id >> 7) as u8 & 0x7F, id as u8 & 0x7F],
    )
}

fn serial_reply() -> Vec<u8> {
    reply(
        commands::GET_SERIAL_IDENTITY,
        StatusCode::Ack,
        &[0x12, 0x34, 0x56, 0x01, 0x02, 0x03],
    )
}

fn firmware_reply(major: u8, minor: u8, revision: u8) -> Vec<u8> {
    reply(GET_FIRMWARE_REVISION, StatusCode::Ack, &[major, minor, revision])
}

fn framed_ping(id: u32) -> Vec<u8> {
    frame_sysex(&build_ping(id))
}

fn framed_serial_probe() -> Vec<u8> {
    frame_sysex(&build_get_serial_identity())
}

/// Single-pair monitor connected at t=20ms with the firmware request pending
fn connected_monitor() -> (Monitor, EventLog, Instant) {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.inbound_sender().push(0, &ping_reply(1));
    monitor.tick(at(base, 20));

    assert_eq!(monitor.state(), MonitorState::Monitoring);
    (monitor, events, base)
}

#[test]
fn test_start_detection_arms_kickoff() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    monitor.start_detection(base);

    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
    assert_eq!(monitor.next_wake(), Some(at(base, 10)));
    assert!(monitor.transport().sent.is_empty());
}

#[test]
fn test_start_detection_disabled_is_noop() {
    let base = Instant::now();
    let config = MonitorConfig {
        detect_if_disconnected: false,
        ..MonitorConfig::default()
    };
    let mut monitor = ConnectionMonitor::new(ScriptedTransport::with_devices(1, 1), config);

    monitor.start_detection(base);

    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.next_wake(), None);
}

#[test]
fn test_ping_round_matches_answering_output() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(3, 3),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.start_detection(base);
    monitor.tick(at(base, 10));

    for output in 0..3 {
        assert_eq!(
            monitor.transport().sent_to(output),
            vec![framed_ping(output as u32 + 1)]
        );
    }

    // Output 0 loops back, output 1 is the keyboard, output 2 stays silent
    let inbound = monitor.inbound_sender();
    inbound.push(0, &framed_ping(1));
    inbound.push(1, &ping_reply(2));
    monitor.tick(at(base, 100));

    assert_eq!(monitor.state(), MonitorState::Monitoring);
    assert_eq!(
        monitor.snapshot(),
        ConnectionSnapshot {
            input_index: 1,
            output_index: 1
        }
    );
    assert_eq!(
        count(
            &events,
            &MonitorEvent::ConnectionEstablished {
                input_index: 1,
                output_index: 1
            }
        ),
        1
    );

    // Unused devices are released
    assert_eq!(monitor.transport().open_inputs, BTreeSet::from([1]));
    assert_eq!(monitor.transport().open_outputs, BTreeSet::from([1]));

    // The round's timeout no longer applies
    monitor.tick(at(base, 700));
    assert_eq!(established_count(&events), 1);
    assert!(monitor.is_established());
}

#[test]
fn test_echoing_output_is_skipped_by_individual_detection() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.inbound_sender().push(0, &framed_ping(1));
    monitor.tick(at(base, 100));

    // Ping round times out, only output 1 is probed
    monitor.tick(at(base, 610));
    assert_eq!(monitor.transport().sent_to(0), vec![framed_ping(1)]);
    assert_eq!(
        monitor.transport().last_sent_to(1),
        Some(framed_serial_probe())
    );

    monitor.inbound_sender().push(1, &serial_reply());
    monitor.tick(at(base, 700));

    assert_eq!(
        monitor.snapshot(),
        ConnectionSnapshot {
            input_index: 1,
            output_index: 1
        }
    );
}

#[test]
fn test_exhausted_round_fails_and_restarts() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.start_detection(base);
    monitor.tick(at(base, 10)); // pings
    monitor.tick(at(base, 610)); // probe output 0
    monitor.tick(at(base, 1210)); // probe output 1
    assert_eq!(count(&events, &MonitorEvent::ConnectionFailed), 0);

    monitor.tick(at(base, 1810));
    assert_eq!(count(&events, &MonitorEvent::ConnectionFailed), 1);
    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
    assert_eq!(monitor.next_wake(), Some(at(base, 2810)));

    monitor.tick(at(base, 2810));
    assert_eq!(
        monitor.transport().sent_to(0),
        vec![framed_ping(1), framed_serial_probe(), framed_ping(1)]
    );
}

#[test]
fn test_calibration_traffic_switches_probe_once() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );
    let calibration_off = frame_sysex(&build_calibrate_pitch_mod_wheel(false));

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.inbound_sender().push(
        0,
        &reply(PERIPHERAL_CALIBRATION_DATA, StatusCode::Ack, &[0; 24]),
    );
    monitor.tick(at(base, 100));
    assert!(!monitor.is_established());

    monitor.tick(at(base, 610));
    assert_eq!(monitor.transport().last_sent_to(0), Some(calibration_off.clone()));
    monitor.tick(at(base, 1210));
    assert_eq!(monitor.transport().last_sent_to(1), Some(calibration_off));

    // Next round is back to serial identity probes
    monitor.tick(at(base, 1810));
    monitor.tick(at(base, 2810));
    monitor.tick(at(base, 3410));
    assert_eq!(
        monitor.transport().last_sent_to(0),
        Some(framed_serial_probe())
    );
}

#[test]
fn test_looped_back_probe_does_not_establish() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.tick(at(base, 610));

    // A plain request reads as a Nak response when it comes straight back
    monitor.inbound_sender().push(0, &framed_serial_probe());
    monitor.tick(at(base, 650));

    assert!(!monitor.is_established());
    assert_eq!(established_count(&events), 0);
    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
}

#[test]
fn test_implicit_match_with_single_pair() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    // Pre-ping firmware answers something other than the ping
    monitor.inbound_sender().push(0, &serial_reply());
    monitor.tick(at(base, 50));

    assert_eq!(
        monitor.snapshot(),
        ConnectionSnapshot {
            input_index: 0,
            output_index: 0
        }
    );
}

#[test]
fn test_single_missed_probe_is_tolerated() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 12));
    monitor.tick(at(base, 30));
    assert_eq!(monitor.release(), Release::V1_0_12);
    assert_eq!(monitor.state(), MonitorState::WaitingForInactivityTimeout);

    monitor.tick(at(base, 2030));
    assert_eq!(monitor.state(), MonitorState::Monitoring);
    assert_eq!(monitor.transport().last_sent_to(0), Some(framed_ping(1)));

    // First probe unanswered, second one answered
    monitor.tick(at(base, 2630));
    assert_eq!(monitor.transport().last_sent_to(0), Some(framed_ping(2)));
    monitor.inbound_sender().push(0, &ping_reply(2));
    monitor.tick(at(base, 2700));

    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 0);
    assert_eq!(monitor.state(), MonitorState::WaitingForInactivityTimeout);
    assert_eq!(monitor.next_wake(), Some(at(base, 4700)));
    assert!(monitor.is_established());
}

#[test]
fn test_two_missed_probes_lose_connection() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 12));
    monitor.tick(at(base, 30));
    monitor.tick(at(base, 2030));
    monitor.tick(at(base, 2630));
    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 0);

    monitor.tick(at(base, 3230));
    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 1);
    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
    assert!(!monitor.is_established());
    assert_eq!(monitor.firmware(), None);
    assert_eq!(monitor.release(), Release::Unknown);
    assert_eq!(monitor.next_wake(), Some(at(base, 3240)));

    // Detection resumes without repeating the loss
    monitor.tick(at(base, 3240));
    monitor.tick(at(base, 3840));
    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 1);
}

#[test]
fn test_error_reply_counts_as_miss() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 1, 0));
    monitor.tick(at(base, 30));
    monitor.tick(at(base, 2030));

    let error = reply(LUMA_PING, StatusCode::Error, &[0, 0, 1]);
    monitor.inbound_sender().push(0, &error);
    monitor.tick(at(base, 2100));
    assert!(monitor.is_established());

    monitor.inbound_sender().push(0, &error);
    monitor.tick(at(base, 2200));
    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 1);
}

#[test]
fn test_firmware_resolution_is_reported() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 9));
    monitor.tick(at(base, 30));

    assert_eq!(
        count(
            &events,
            &MonitorEvent::FirmwareVersionResolved {
                version: FirmwareVersion::new(1, 0, 9),
                release: Release::V1_0_9,
            }
        ),
        1
    );
    assert_eq!(monitor.status().current().release, Release::V1_0_9);
}

#[test]
fn test_firmware_nak_keeps_release_unknown() {
    let (mut monitor, _events, base) = connected_monitor();

    monitor
        .inbound_sender()
        .push(0, &reply(GET_FIRMWARE_REVISION, StatusCode::Nak, &[]));
    monitor.tick(at(base, 30));
    assert_eq!(monitor.release(), Release::Unknown);
    assert_eq!(monitor.state(), MonitorState::WaitingForInactivityTimeout);

    // Without ping support the keep-alive falls back to serial identity
    monitor.tick(at(base, 2030));
    assert_eq!(
        monitor.transport().last_sent_to(0),
        Some(framed_serial_probe())
    );
}

#[test]
fn test_stop_monitoring_is_idempotent() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.stop_monitoring();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.next_wake(), None);
    assert!(!monitor.is_established());
    assert!(monitor.transport().open_inputs.is_empty());
    assert!(monitor.transport().open_outputs.is_empty());

    monitor.stop_monitoring();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.next_wake(), None);
    assert_eq!(
        count(&events, &MonitorEvent::StateChanged(MonitorState::Idle)),
        1
    );

    // Late traffic is ignored while idle
    monitor.inbound_sender().push(0, &ping_reply(1));
    monitor.tick(at(base, 5000));
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 0);
}

#[test]
fn test_stop_monitoring_on_fresh_monitor() {
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.stop_monitoring();
    monitor.stop_monitoring();

    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(events.lock().is_empty());
}

#[test]
fn test_last_known_good_pair_is_confirmed_first() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    )
    .with_preferred_devices("in-1".to_string(), "out-1".to_string());

    monitor.start_detection(base);
    monitor.tick(at(base, 10));

    assert_eq!(monitor.state(), MonitorState::ConfirmingDevice);
    assert!(monitor.transport().sent_to(0).is_empty());
    assert_eq!(monitor.transport().sent_to(1), vec![framed_serial_probe()]);

    monitor.inbound_sender().push(1, &serial_reply());
    monitor.tick(at(base, 50));
    assert_eq!(
        monitor.snapshot(),
        ConnectionSnapshot {
            input_index: 1,
            output_index: 1
        }
    );
}

#[test]
fn test_unconfirmed_pair_falls_back_to_ping_round() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    )
    .with_preferred_devices("in-0".to_string(), "out-0".to_string());

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.tick(at(base, 610));

    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
    assert_eq!(monitor.transport().sent_to(1), vec![framed_ping(2)]);
}

#[test]
fn test_connect_to_explicit_pair() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );

    monitor.connect_to(0, 1, base).unwrap();
    assert_eq!(monitor.state(), MonitorState::ConfirmingDevice);
    assert_eq!(monitor.transport().sent_to(1), vec![framed_serial_probe()]);

    // Old firmware rejects the request, which still proves it is there
    monitor.inbound_sender().push(
        0,
        &reply(commands::GET_SERIAL_IDENTITY, StatusCode::Nak, &[]),
    );
    monitor.tick(at(base, 40));

    assert_eq!(
        monitor.snapshot(),
        ConnectionSnapshot {
            input_index: 0,
            output_index: 1
        }
    );
}

#[test]
fn test_connect_to_rejects_unknown_device() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    assert!(matches!(
        monitor.connect_to(0, 3, base),
        Err(MonitorError::Transport(TransportError::NoSuchOutput(3)))
    ));
}

#[test]
fn test_send_request_respects_release() {
    let (mut monitor, _events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 4));
    monitor.tick(at(base, 30));

    assert!(matches!(
        monitor.send_request(&build_ping(5)),
        Err(MonitorError::Unsupported {
            command: LUMA_PING,
            release: Release::V1_0_4
        })
    ));

    monitor.send_request(&build_get_serial_identity()).unwrap();
    assert_eq!(
        monitor.transport().last_sent_to(0),
        Some(framed_serial_probe())
    );
}

#[test]
fn test_send_request_requires_connection() {
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    assert!(matches!(
        monitor.send_request(&build_get_serial_identity()),
        Err(MonitorError::NotConnected)
    ));
}

#[test]
fn test_apply_config_disables_inactivity_checks() {
    let (mut monitor, _events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 12));
    monitor.tick(at(base, 30));
    assert!(monitor.next_wake().is_some());

    monitor.apply_config(
        MonitorConfig {
            check_if_inactive: false,
            ..MonitorConfig::default()
        },
        at(base, 40),
    );

    assert_eq!(monitor.state(), MonitorState::Monitoring);
    assert_eq!(monitor.next_wake(), None);
    assert!(monitor.is_established());
}

#[test]
fn test_unrelated_traffic_is_ignored() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    monitor.start_detection(base);
    monitor.tick(at(base, 10));

    let inbound = monitor.inbound_sender();
    inbound.push(0, &[0x90, 60, 100]);
    inbound.push(0, &frame_sysex(&[0x7E, 0x7F, 0x06, 0x01]));
    inbound.push(0, &reply(LUMA_PING, StatusCode::Busy, &[0, 0, 1]));
    monitor.tick(at(base, 50));

    assert!(!monitor.is_established());
    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
}

#[test]
fn test_playing_postpones_liveness_probe() {
    let (mut monitor, _events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 12));
    monitor.tick(at(base, 30));
    assert_eq!(monitor.next_wake(), Some(at(base, 2030)));

    monitor.inbound_sender().push(0, &[0x90, 60, 100]);
    monitor.tick(at(base, 1500));
    assert_eq!(monitor.next_wake(), Some(at(base, 3500)));
    assert_eq!(monitor.state(), MonitorState::WaitingForInactivityTimeout);

    // No probe while the keyboard is being played
    let sent_before = monitor.transport().sent_to(0).len();
    monitor.tick(at(base, 2030));
    assert_eq!(monitor.transport().sent_to(0).len(), sent_before);
}

#[test]
fn test_busy_answer_keeps_connection() {
    let (mut monitor, events, base) = connected_monitor();

    monitor.inbound_sender().push(0, &firmware_reply(1, 0, 12));
    monitor.tick(at(base, 30));

    monitor.tick(at(base, 2030));
    assert_eq!(monitor.transport().last_sent_to(0), Some(framed_ping(1)));
    monitor
        .inbound_sender()
        .push(0, &reply(LUMA_PING, StatusCode::Busy, &[0, 0, 1]));
    monitor.tick(at(base, 2100));

    assert_eq!(monitor.state(), MonitorState::WaitingForInactivityTimeout);
    assert_eq!(monitor.next_wake(), Some(at(base, 4100)));

    monitor.tick(at(base, 4100));
    monitor
        .inbound_sender()
        .push(0, &reply(LUMA_PING, StatusCode::Busy, &[0, 0, 2]));
    monitor.tick(at(base, 4200));
    monitor.tick(at(base, 4800));

    assert_eq!(count(&events, &MonitorEvent::ConnectionLost), 0);
    assert!(monitor.is_established());
}

#[test]
fn test_error_reply_moves_individual_detection_on() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(2, 2),
        MonitorConfig::default(),
    );
    let events = record_events(&monitor);

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    monitor.tick(at(base, 610));
    assert_eq!(
        monitor.transport().last_sent_to(0),
        Some(framed_serial_probe())
    );
    assert_eq!(monitor.transport().sent_to(1), vec![framed_ping(2)]);

    monitor.inbound_sender().push(
        0,
        &reply(commands::GET_SERIAL_IDENTITY, StatusCode::Error, &[]),
    );
    monitor.tick(at(base, 650));

    assert_eq!(
        monitor.transport().last_sent_to(1),
        Some(framed_serial_probe())
    );
    assert_eq!(monitor.next_wake(), Some(at(base, 1250)));
    assert!(!monitor.is_established());
    assert_eq!(established_count(&events), 0);
    assert_eq!(count(&events, &MonitorEvent::ConnectionFailed), 0);
}

#[test]
fn test_apply_config_disabling_detection_stops_search() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig::default(),
    );

    monitor.start_detection(base);
    monitor.tick(at(base, 10));
    assert_eq!(monitor.state(), MonitorState::LookingForDevice);

    monitor.apply_config(
        MonitorConfig {
            detect_if_disconnected: false,
            ..MonitorConfig::default()
        },
        at(base, 100),
    );

    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.next_wake(), None);
    assert!(monitor.transport().open_inputs.is_empty());
    assert!(monitor.transport().open_outputs.is_empty());
}

#[test]
fn test_apply_config_enabling_detection_starts_search() {
    let base = Instant::now();
    let mut monitor = ConnectionMonitor::new(
        ScriptedTransport::with_devices(1, 1),
        MonitorConfig {
            detect_if_disconnected: false,
            ..MonitorConfig::default()
        },
    );

    monitor.start_detection(base);
    assert_eq!(monitor.state(), MonitorState::Idle);

    monitor.apply_config(MonitorConfig::default(), at(base, 100));

    assert_eq!(monitor.state(), MonitorState::LookingForDevice);
    assert_eq!(monitor.next_wake(), Some(at(base, 110)));
}
