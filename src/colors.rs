use crate::types::{Rgb, NOTE_PALETTE};
use std::collections::BTreeMap;

/// Assigns each distinct note a color the first time it is seen, cycling
/// round-robin through the fixed palette. Lookups are stable for the life
/// of the table; `clear` restarts the cycle.
pub struct NoteColorTable {
    assigned: BTreeMap<u8, Rgb>,
    /// Assignment order, for legend rendering.
    order: Vec<u8>,
    /// Explicit round-robin cursor; wraps at the palette length.
    next_index: usize,
}

impl NoteColorTable {
    pub fn new() -> Self {
        Self {
            assigned: BTreeMap::new(),
            order: Vec::new(),
            next_index: 0,
        }
    }

    /// Allocate-or-lookup: returns the note's color, assigning the next
    /// palette entry on first sight.
    pub fn color_for(&mut self, note: u8) -> Rgb {
        if let Some(&color) = self.assigned.get(&note) {
            return color;
        }
        let color = NOTE_PALETTE[self.next_index % NOTE_PALETTE.len()];
        self.next_index += 1;
        self.assigned.insert(note, color);
        self.order.push(note);
        color
    }

    /// Lookup without allocation, for read-only consumers.
    pub fn get(&self, note: u8) -> Option<Rgb> {
        self.assigned.get(&note).copied()
    }

    /// Notes with their colors, in first-seen order.
    pub fn legend(&self) -> Vec<(u8, Rgb)> {
        self.order
            .iter()
            .map(|&n| (n, self.assigned[&n]))
            .collect()
    }

    pub fn clear(&mut self) {
        self.assigned.clear();
        self.order.clear();
        self.next_index = 0;
    }
}

impl Default for NoteColorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_twelve_notes_distinct() {
        let mut table = NoteColorTable::new();
        let colors: Vec<Rgb> = (60..72).map(|n| table.color_for(n)).collect();
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j], "notes {} and {}", 60 + i, 60 + j);
            }
        }
    }

    #[test]
    fn test_thirteenth_note_wraps_to_first_color() {
        let mut table = NoteColorTable::new();
        for n in 60..72 {
            table.color_for(n);
        }
        assert_eq!(table.color_for(72), NOTE_PALETTE[0]);
    }

    #[test]
    fn test_lookup_is_stable() {
        let mut table = NoteColorTable::new();
        let first = table.color_for(64);
        table.color_for(65);
        table.color_for(66);
        assert_eq!(table.color_for(64), first);
        assert_eq!(table.get(64), Some(first));
    }

    #[test]
    fn test_get_does_not_allocate() {
        let table = NoteColorTable::new();
        assert_eq!(table.get(60), None);
    }

    #[test]
    fn test_clear_restarts_cycle() {
        let mut table = NoteColorTable::new();
        table.color_for(60);
        table.color_for(62);
        table.clear();
        assert!(table.legend().is_empty());
        // After clear the cycle starts over from palette index 0
        assert_eq!(table.color_for(99), NOTE_PALETTE[0]);
    }

    #[test]
    fn test_legend_in_first_seen_order() {
        let mut table = NoteColorTable::new();
        table.color_for(72);
        table.color_for(60);
        table.color_for(67);
        let legend: Vec<u8> = table.legend().iter().map(|(n, _)| *n).collect();
        assert_eq!(legend, vec![72, 60, 67]);
    }
}
