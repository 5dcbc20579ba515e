//! Port lister and SysEx sniffer for debugging
//!
//! Both tools go through the same transport as the monitor, so what they show
//! is what the monitor sees.

use anyhow::{Context, Result};
use colored::*;
use std::time::{Duration, Instant};
use tracing::info;

use crate::midi::{format_hex, RawMessage};
use crate::sysex::{self, commands, decode_response, KEYS_PER_BOARD};
use crate::transport::{inbound_queue, DeviceDescriptor, MidiTransport};

/// One-line interpretation of a received message
pub fn describe(bytes: &[u8]) -> String {
    let raw = RawMessage::from_midi(bytes);

    let header = match sysex::parse_header(&raw) {
        Ok(header) => header,
        Err(e) => return format!("{} ({})", raw, e),
    };

    let summary = format!(
        "board {} {} [{:?}]",
        header.board_index,
        commands::name(header.command),
        header.status
    );

    if header.is_echo() {
        return format!("{} echo", summary);
    }

    match decode_response(&raw, KEYS_PER_BOARD) {
        Ok(response) => format!("{} {:?}", summary, response),
        Err(e) => format!("{} ({})", summary, e),
    }
}

fn print_devices(title: &str, devices: &[DeviceDescriptor]) {
    println!("\n{}", title.bold());
    if devices.is_empty() {
        println!("  {}", "none".dimmed());
        return;
    }
    for device in devices {
        println!(
            "  {:>2}: {} {}",
            device.index,
            device.name.bright_white(),
            format!("[{}]", device.id).dimmed()
        );
    }
}

/// Print input and output devices with their indices and ids
pub fn list_ports<T: MidiTransport>(transport: &mut T) -> Result<()> {
    let inputs = transport
        .list_input_devices()
        .context("Failed to list MIDI inputs")?;
    let outputs = transport
        .list_output_devices()
        .context("Failed to list MIDI outputs")?;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());
    print_devices("Inputs:", &inputs);
    print_devices("Outputs:", &outputs);
    println!();
    Ok(())
}

/// Print every message arriving on inputs whose name contains `pattern`
/// (case-insensitive; empty matches all) until Ctrl+C
pub async fn run_cli_sniffer<T: MidiTransport>(transport: &mut T, pattern: &str) -> Result<()> {
    let inputs = transport
        .list_input_devices()
        .context("Failed to list MIDI inputs")?;
    let needle = pattern.to_lowercase();
    let selected: Vec<DeviceDescriptor> = inputs
        .into_iter()
        .filter(|d| d.name.to_lowercase().contains(&needle))
        .collect();

    if selected.is_empty() {
        anyhow::bail!("No MIDI input matching '{}'", pattern);
    }

    let (sink, rx) = inbound_queue();
    for device in &selected {
        transport
            .open_input(device.index, sink.clone())
            .with_context(|| format!("Failed to open '{}'", device.name))?;
        info!("Sniffing {}", device.name);
    }

    println!("{}", "=== SysEx Sniffer ===".bold().cyan());
    println!("Press Ctrl+C to exit");
    println!("{}", "Format: [timestamp] PORT | HEX => DECODED".dimmed());
    println!("{}\n", "─".repeat(80).dimmed());

    let start = Instant::now();
    let mut poll = tokio::time::interval(Duration::from_millis(10));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = poll.tick() => {
                while let Ok(message) = rx.try_recv() {
                    let port = selected
                        .iter()
                        .find(|d| d.index == message.input_index)
                        .map(|d| d.name.as_str())
                        .unwrap_or("?");
                    print_message(start, port, &message.bytes);
                }
            }
        }
    }

    transport.close_all();
    println!("\n{}", "Sniffer stopped".yellow());
    Ok(())
}

fn print_message(start: Instant, port: &str, bytes: &[u8]) {
    let port = if port.chars().count() > 20 {
        format!("{}...", port.chars().take(17).collect::<String>())
    } else {
        port.to_string()
    };

    let hex = format_hex(bytes);
    let hex = if RawMessage::from_midi(bytes).is_sysex() {
        hex.bright_magenta()
    } else {
        hex.bright_black()
    };

    println!(
        "[{}ms] {:20} | {} => {}",
        format!("{:08}", start.elapsed().as_millis()).dimmed(),
        port.white(),
        hex,
        describe(bytes).bright_blue()
    );
}
