use crate::colors::NoteColorTable;
use crate::history::History;
use crate::midi_event::MidiEvent;
use crate::player_state::PlayerState;
use crate::smoother;
use crate::stats::note_stats;
use crate::types::{DisplaySample, Rgb, Sample, Snapshot, Stats, DEFAULT_HISTORY_LEN};
use log::{debug, info, trace};

/// The telemetry core: one owned struct holding note/controller state, the
/// rolling history, the note color table, and the latest per-note stats.
///
/// Constructed once and driven from a single thread at two cadences:
/// `ingest` whenever a raw MIDI message arrives, `tick` once per sampling
/// interval. Reads (`smoothed_series`, `current_stats`, `snapshot`) are pure
/// derivations over the buffer and never mutate it, so every operation
/// completes within one O(N) buffer scan.
pub struct TrainerEngine {
    state: PlayerState,
    history: History,
    colors: NoteColorTable,
    stats: Stats,
    ticks: u64,
}

impl TrainerEngine {
    pub fn new() -> Self {
        Self::with_history_len(DEFAULT_HISTORY_LEN)
    }

    pub fn with_history_len(len: usize) -> Self {
        Self {
            state: PlayerState::new(),
            history: History::new(len),
            colors: NoteColorTable::new(),
            stats: Stats::default(),
            ticks: 0,
        }
    }

    /// Pick the controller that drives intensity at construction time
    /// (the `--cc` flag).
    pub fn with_controller(mut self, cc: u8) -> Self {
        self.state.select_controller(cc);
        self
    }

    /// Feed one raw MIDI message. Returns the classified event so callers
    /// can surface it in their own diagnostics.
    pub fn ingest(&mut self, bytes: &[u8], now_us: u64) -> MidiEvent {
        let event = MidiEvent::parse(bytes);
        match event {
            MidiEvent::NoteOn { note, velocity, .. } => {
                self.state.on_note_on(note, velocity, now_us);
                self.colors.color_for(note);
                debug!("{}", event);
            }
            MidiEvent::NoteOff { note, .. } => {
                self.state.on_note_off(note);
                debug!("{}", event);
            }
            MidiEvent::ControlChange {
                controller, value, ..
            } => {
                self.state.on_control_change(controller, value);
                trace!("{}", event);
            }
            MidiEvent::Other { .. } => {
                // Unrecognized messages are ignored, not errors.
                trace!("{}", event);
            }
        }
        event
    }

    /// Advance the rolling buffer by one sample from the current state.
    /// Called once per sampling interval regardless of event or render
    /// activity, so gap lengths in the buffer are proportional to real time.
    ///
    /// A zero intensity reading stores an empty slot: "no data at this
    /// tick", the raw material for gap detection.
    pub fn tick(&mut self, now_us: u64) {
        let slot = match self.state.current_note {
            Some(note) if self.state.note_active && self.state.velocity > 0 => Some(Sample {
                velocity: self.state.velocity,
                note,
            }),
            _ => None,
        };
        self.history.push(slot);

        if let Some(note) = self.state.current_note {
            if self.state.note_active {
                self.stats = note_stats(self.history.slots(), note);
            }
        }

        self.ticks += 1;
        if self.ticks % 300 == 0 {
            trace!(
                "tick {} t={}µs active={} {}",
                self.ticks,
                now_us,
                self.state.note_active,
                self.stats
            );
        }
    }

    /// Display-ready series: gap-bridged and jitter-smoothed, same length
    /// as the history. Recomputed on every call; idempotent between
    /// `ingest`/`tick` mutations.
    pub fn smoothed_series(&self) -> Vec<DisplaySample> {
        smoother::smooth(self.history.slots())
    }

    /// Latest per-note statistics (all zeros until a note has sounded).
    pub fn current_stats(&self) -> Stats {
        self.stats
    }

    pub fn select_controller(&mut self, cc: u8) {
        self.state.select_controller(cc);
    }

    /// Allocate-or-lookup the color for a note.
    pub fn note_color(&mut self, note: u8) -> Rgb {
        self.colors.color_for(note)
    }

    /// Reset history, player state, colors, and stats in one step. The
    /// selected controller is a user preference and survives.
    pub fn clear(&mut self) {
        self.history.clear();
        self.colors.clear();
        self.state.reset();
        self.stats = Stats::default();
        info!("history cleared");
    }

    /// Complete state snapshot for downstream consumers.
    pub fn snapshot(&self, now_us: u64) -> Snapshot {
        Snapshot {
            timestamp_us: now_us,
            note: self.state.current_note,
            velocity: self.state.velocity,
            controller: self.state.selected_controller(),
            note_active: self.state.note_active,
            time_held_s: self.state.time_held_s(now_us),
            stats: self.stats,
            consistency: self.stats.consistency_score(),
            series: self.smoothed_series(),
            colors: self.colors.legend(),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn selected_controller(&self) -> u8 {
        self.state.selected_controller()
    }
}

impl Default for TrainerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOTE_PALETTE;

    fn note_on(note: u8, vel: u8) -> [u8; 3] {
        [0x90, note, vel]
    }

    fn note_off(note: u8) -> [u8; 3] {
        [0x80, note, 0]
    }

    fn cc(controller: u8, value: u8) -> [u8; 3] {
        [0xB0, controller, value]
    }

    #[test]
    fn test_tick_pushes_sample_while_sounding() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 90), 0);
        for t in 0..5 {
            eng.tick(t * 33_000);
        }
        let series = eng.smoothed_series();
        let occupied = series.iter().filter(|d| d.velocity > 0.0).count();
        assert_eq!(occupied, 5);
        assert!(series.iter().all(|d| d.note.is_none() || d.note == Some(60)));
    }

    #[test]
    fn test_tick_pushes_empty_during_silence() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 90), 0);
        eng.tick(0);
        eng.ingest(&note_off(60), 1_000);
        for t in 1..10 {
            eng.tick(t * 33_000);
        }
        // One occupied slot from the sounding tick, rest empty
        let series = eng.smoothed_series();
        assert_eq!(series.iter().filter(|d| d.velocity > 0.0).count(), 1);
    }

    #[test]
    fn test_zero_breath_stores_empty_slot() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 90), 0);
        eng.tick(0);
        // Breath drops to zero mid-note: no data at this tick
        eng.ingest(&cc(7, 0), 1_000);
        eng.tick(33_000);
        let series = eng.smoothed_series();
        assert_eq!(series.iter().filter(|d| d.velocity > 0.0).count(), 1);
    }

    #[test]
    fn test_stats_update_on_push_while_active() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 60), 0);
        eng.tick(0);
        eng.ingest(&cc(7, 70), 1);
        eng.tick(1);
        eng.ingest(&cc(7, 80), 2);
        eng.tick(2);
        let st = eng.current_stats();
        assert_eq!(st.mean, 70.0);
        assert_eq!(st.min, 60.0);
        assert_eq!(st.max, 80.0);
        assert!((st.std_dev - 8.1650).abs() < 1e-3);
    }

    #[test]
    fn test_stats_exclude_previous_note() {
        let mut eng = TrainerEngine::with_history_len(20);
        eng.ingest(&note_on(60, 40), 0);
        for t in 0..3 {
            eng.tick(t);
        }
        // Legato switch to a new note
        eng.ingest(&note_on(62, 100), 100);
        eng.ingest(&note_off(60), 101);
        eng.tick(102);
        let st = eng.current_stats();
        assert_eq!(st.mean, 100.0, "stats follow the new note only");
        assert_eq!(st.min, 100.0);
    }

    #[test]
    fn test_stats_frozen_after_release() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 90), 0);
        eng.tick(0);
        let before = eng.current_stats();
        eng.ingest(&note_off(60), 1);
        eng.tick(2);
        eng.tick(3);
        assert_eq!(eng.current_stats(), before, "stats persist through silence");
    }

    #[test]
    fn test_cc_selection_switches_velocity_source() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 50), 0);
        eng.select_controller(2);
        eng.ingest(&cc(2, 110), 1);
        eng.tick(2);
        assert_eq!(eng.current_stats().max, 110.0);
        // CC7 no longer drives intensity
        eng.ingest(&cc(7, 10), 3);
        eng.tick(4);
        assert_eq!(eng.current_stats().min, 50.0);
    }

    #[test]
    fn test_smoothed_series_idempotent() {
        let mut eng = TrainerEngine::with_history_len(30);
        eng.ingest(&note_on(60, 80), 0);
        for t in 0..8 {
            eng.ingest(&cc(7, 75 + (t % 3) as u8 * 5), t);
            eng.tick(t);
        }
        let a = eng.smoothed_series();
        let b = eng.smoothed_series();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.select_controller(2);
        eng.ingest(&note_on(60, 90), 0);
        eng.tick(0);
        eng.clear();
        assert!(eng.smoothed_series().iter().all(|d| d.velocity == 0.0));
        assert_eq!(eng.current_stats(), Stats::default());
        let snap = eng.snapshot(1);
        assert_eq!(snap.note, None);
        assert!(!snap.note_active);
        assert!(snap.colors.is_empty());
        // Color cycle restarts from the first palette entry
        assert_eq!(eng.note_color(72), NOTE_PALETTE[0]);
        // The CC choice is a user preference and survives
        assert_eq!(eng.selected_controller(), 2);
    }

    #[test]
    fn test_note_on_assigns_color() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(60, 90), 0);
        eng.ingest(&note_on(62, 90), 1);
        assert_eq!(eng.note_color(60), NOTE_PALETTE[0]);
        assert_eq!(eng.note_color(62), NOTE_PALETTE[1]);
    }

    #[test]
    fn test_snapshot_contents() {
        let mut eng = TrainerEngine::with_history_len(10);
        eng.ingest(&note_on(69, 100), 1_000_000);
        eng.tick(1_000_000);
        let snap = eng.snapshot(2_000_000);
        assert_eq!(snap.note, Some(69));
        assert_eq!(snap.velocity, 100);
        assert!(snap.note_active);
        assert!((snap.time_held_s - 1.0).abs() < 1e-6);
        assert_eq!(snap.series.len(), 10);
        assert_eq!(snap.colors, vec![(69, NOTE_PALETTE[0])]);
        assert_eq!(snap.consistency, 100.0);
    }
}
