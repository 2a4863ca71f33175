use crate::types::DEFAULT_CONTROLLER;
use log::debug;
use std::collections::BTreeMap;

/// Tracks the currently sounding note and the intensity value that drives
/// the history, sourced either from note-on velocity or from a selected
/// continuous controller (breath pressure on a wind controller).
///
/// All inputs arrive pre-validated in 0–127 from the MIDI classifier;
/// nothing here can fail.
pub struct PlayerState {
    /// Most recent note-on, kept after release so the display can keep
    /// showing the last note until overwritten.
    pub current_note: Option<u8>,
    /// Current intensity, 0–127. Updated by note-on velocity and by the
    /// selected controller's value changes.
    pub velocity: u8,
    /// True between a note-on and the matching note-off.
    pub note_active: bool,
    /// Session timestamp (µs) of the current note's onset.
    pub note_started_us: u64,
    /// Last seen value of every observed controller number.
    cc_values: BTreeMap<u8, u8>,
    /// Which controller feeds `velocity`. Defaults to CC7 (Volume).
    selected_cc: u8,
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            current_note: None,
            velocity: 0,
            note_active: false,
            note_started_us: 0,
            cc_values: BTreeMap::new(),
            selected_cc: DEFAULT_CONTROLLER,
        }
    }

    pub fn on_note_on(&mut self, note: u8, velocity: u8, now_us: u64) {
        self.current_note = Some(note);
        self.velocity = velocity;
        self.note_active = true;
        self.note_started_us = now_us;
    }

    /// A release only deactivates if it matches the sounding note — a stale
    /// note-off from a legato overlap must not cut the new note short.
    pub fn on_note_off(&mut self, note: u8) {
        if self.current_note == Some(note) {
            self.note_active = false;
        }
    }

    pub fn on_control_change(&mut self, controller: u8, value: u8) {
        self.cc_values.insert(controller, value);
        if controller == self.selected_cc {
            self.velocity = value;
        }
    }

    /// Change which controller drives intensity. Takes effect on the next
    /// control change of that number; no retroactive recompute.
    pub fn select_controller(&mut self, controller: u8) {
        if controller != self.selected_cc {
            debug!("velocity source: CC{} -> CC{}", self.selected_cc, controller);
            self.selected_cc = controller;
        }
    }

    pub fn selected_controller(&self) -> u8 {
        self.selected_cc
    }

    pub fn cc_values(&self) -> &BTreeMap<u8, u8> {
        &self.cc_values
    }

    /// Seconds the current note has been held. Zero when silent.
    pub fn time_held_s(&self, now_us: u64) -> f32 {
        if self.note_active {
            now_us.saturating_sub(self.note_started_us) as f32 / 1_000_000.0
        } else {
            0.0
        }
    }

    /// Full reset, including the controller map. The selected controller
    /// is a user preference and survives.
    pub fn reset(&mut self) {
        self.current_note = None;
        self.velocity = 0;
        self.note_active = false;
        self.note_started_us = 0;
        self.cc_values.clear();
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}
