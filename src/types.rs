use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Tuning constants ───────────────────────────────────────────────────────

/// Number of velocity readings kept in the rolling history.
pub const DEFAULT_HISTORY_LEN: usize = 300;

/// MIDI controller that feeds the displayed intensity by default.
/// CC7 (Volume) is what most EWI/WX-style breath controllers transmit
/// out of the box.
pub const DEFAULT_CONTROLLER: u8 = 7;

// ─── Colors ─────────────────────────────────────────────────────────────────

/// An RGB color, serialized as a `[r, g, b]` triple for downstream renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Fixed palette cycled through as new notes are seen.
pub const NOTE_PALETTE: [Rgb; 12] = [
    Rgb(65, 156, 255),  // blue
    Rgb(255, 100, 100), // red
    Rgb(100, 255, 100), // green
    Rgb(255, 255, 100), // yellow
    Rgb(255, 100, 255), // magenta
    Rgb(100, 255, 255), // cyan
    Rgb(255, 150, 100), // orange
    Rgb(150, 100, 255), // purple
    Rgb(255, 200, 150), // peach
    Rgb(150, 255, 150), // light green
    Rgb(200, 150, 255), // lavender
    Rgb(255, 150, 200), // pink
];

// ─── History samples ────────────────────────────────────────────────────────

/// One occupied history slot: a non-zero intensity reading attributed to a
/// note. Empty slots (silence, or zero breath pressure) are `None` in the
/// buffer rather than a zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Intensity reading, 1–127. Zero readings are never stored.
    pub velocity: u8,
    /// MIDI note number the reading belongs to.
    pub note: u8,
}

/// One element of the smoothed display series. Gap-bridged positions carry
/// an interpolated velocity and the note being transitioned into; positions
/// that stayed empty carry velocity 0.0 and no note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySample {
    pub velocity: f32,
    pub note: Option<u8>,
}

impl DisplaySample {
    pub fn silent() -> Self {
        Self {
            velocity: 0.0,
            note: None,
        }
    }
}

// ─── Statistics ─────────────────────────────────────────────────────────────

/// Windowed statistics over the currently sounding note's history samples.
/// All-zero means "no data yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
}

impl Stats {
    /// Consistency score in 0–100: 100 is a perfectly steady tone, each
    /// point of standard deviation costs 5. Zero until there is data.
    pub fn consistency_score(&self) -> f32 {
        if self.mean > 0.0 {
            (100.0 - 5.0 * self.std_dev).max(0.0)
        } else {
            0.0
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean={:.2} sd={:.2} min={:.0} max={:.0}",
            self.mean, self.std_dev, self.min, self.max
        )
    }
}

// ─── Snapshots for consumers ────────────────────────────────────────────────

/// Complete state snapshot published by the runner at the render cadence.
/// Consumed by the console display and the JSON stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_us: u64,
    /// Currently (or most recently) sounding note.
    pub note: Option<u8>,
    /// Latest intensity reading, 0–127.
    pub velocity: u8,
    /// Controller currently feeding the intensity reading.
    pub controller: u8,
    pub note_active: bool,
    /// Seconds the current note has been held. 0.0 when silent.
    pub time_held_s: f32,
    pub stats: Stats,
    pub consistency: f32,
    /// Smoothed, gap-bridged display series (same length as the history).
    pub series: Vec<DisplaySample>,
    /// Notes seen so far with their assigned colors, in assignment order.
    pub colors: Vec<(u8, Rgb)>,
}

/// Short-key representation for line-delimited JSON streaming.
/// Field mapping: t=timestamp_us, n=note, v=velocity, cc=controller,
/// a=note_active, h=time_held_s, m/sd/mn/mx=stats, sc=consistency,
/// sv=series velocities, sn=series notes (-1 = none).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactSnapshot {
    pub t: u64,
    pub n: Option<u8>,
    pub v: u8,
    pub cc: u8,
    pub a: bool,
    pub h: f32,
    pub m: f32,
    pub sd: f32,
    pub mn: f32,
    pub mx: f32,
    pub sc: f32,
    pub sv: Vec<f32>,
    pub sn: Vec<i16>,
}

impl From<&Snapshot> for CompactSnapshot {
    fn from(s: &Snapshot) -> Self {
        Self {
            t: s.timestamp_us,
            n: s.note,
            v: s.velocity,
            cc: s.controller,
            a: s.note_active,
            h: s.time_held_s,
            m: s.stats.mean,
            sd: s.stats.std_dev,
            mn: s.stats.min,
            mx: s.stats.max,
            sc: s.consistency,
            sv: s.series.iter().map(|d| d.velocity).collect(),
            sn: s
                .series
                .iter()
                .map(|d| d.note.map(i16::from).unwrap_or(-1))
                .collect(),
        }
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// One raw MIDI message as it arrived from the transport (or simulator).
/// Standard channel messages are at most 3 bytes; anything longer is
/// truncated and will classify as `Other`.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage {
    pub timestamp_us: u64,
    data: [u8; 3],
    len: u8,
}

impl RawMessage {
    pub fn new(timestamp_us: u64, bytes: &[u8]) -> Self {
        let mut data = [0u8; 3];
        let len = bytes.len().min(3);
        data[..len].copy_from_slice(&bytes[..len]);
        Self {
            timestamp_us,
            data,
            len: len as u8,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// User commands forwarded to the runner (original keyboard shortcuts:
/// C = clear history, 1–9 = pick the CC that drives intensity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Clear,
    SelectController(u8),
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the practice session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Naming helpers ─────────────────────────────────────────────────────────

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical name for a MIDI note number ("C4", "F#5", ...).
pub fn note_name(note: u8) -> String {
    let name = NOTE_NAMES[(note % 12) as usize];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", name, octave)
}

/// Conventional name for a controller number, if it has one.
pub fn cc_name(cc: u8) -> Option<&'static str> {
    match cc {
        1 => Some("Modulation"),
        2 => Some("Breath"),
        7 => Some("Volume"),
        11 => Some("Expression"),
        64 => Some("Sustain"),
        74 => Some("Filter Cutoff"),
        _ => None,
    }
}
