use crate::types::{RawMessage, SessionClock};
use crossbeam_channel::Sender;
use log::{info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::error::Error;

/// Names of all available MIDI input ports, in port order.
pub fn list_ports() -> Result<Vec<String>, Box<dyn Error>> {
    let mut midi_in = MidiInput::new("breath-trainer port scan")?;
    midi_in.ignore(Ignore::None);
    let mut names = Vec::new();
    for port in midi_in.ports() {
        names.push(midi_in.port_name(&port)?);
    }
    Ok(names)
}

/// Connects to a MIDI input device and forwards every incoming message,
/// stamped with the session clock, into the raw-message channel.
///
/// Device problems (nothing attached, connect failure) are this layer's to
/// surface; the core downstream never sees them.
pub struct MidiReader {
    /// Port index ("0", "1", ...) or a case-insensitive name substring.
    selector: String,
    tx: Sender<RawMessage>,
    clock: SessionClock,
}

impl MidiReader {
    pub fn new(selector: String, tx: Sender<RawMessage>, clock: SessionClock) -> Self {
        Self {
            selector,
            tx,
            clock,
        }
    }

    /// Open the connection. The returned handle must be kept alive for the
    /// duration of the session; dropping it closes the device.
    pub fn connect(self) -> Result<MidiInputConnection<()>, Box<dyn Error>> {
        let mut midi_in = MidiInput::new("breath-trainer input")?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err("no MIDI input devices found".into());
        }

        let port = match self.selector.parse::<usize>() {
            Ok(index) => ports
                .get(index)
                .ok_or_else(|| {
                    format!("MIDI port index {} out of range ({} ports)", index, ports.len())
                })?
                .clone(),
            Err(_) => {
                let wanted = self.selector.to_lowercase();
                ports
                    .iter()
                    .find(|p| {
                        midi_in
                            .port_name(p)
                            .map(|n| n.to_lowercase().contains(&wanted))
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| format!("no MIDI input port matching '{}'", self.selector))?
                    .clone()
            }
        };

        let name = midi_in.port_name(&port)?;
        info!("using MIDI device: {}", name);

        let tx = self.tx;
        let clock = self.clock;
        let conn = midi_in.connect(
            &port,
            "breath-trainer-read",
            move |_stamp, message, _| {
                if tx.send(RawMessage::new(clock.now_us(), message)).is_err() {
                    // Runner is gone; nothing left to feed.
                    warn!("raw message channel closed, dropping MIDI input");
                }
            },
            (),
        )?;

        Ok(conn)
    }
}
