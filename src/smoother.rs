//! Gap bridging and jitter smoothing for the display series.
//!
//! Legato playing produces brief true silences between notes (tongue stops)
//! that should not read as the signal collapsing to zero between two
//! otherwise-similar intensity values. Short runs of empty slots between two
//! readings are bridged by interpolation; long silences (the player actually
//! stopped) are left empty and show as a real phrase boundary.

use crate::types::{DisplaySample, Sample};

/// Longest run of empty slots that still counts as a note transition.
/// ~600ms at the 30Hz sampling cadence, enough for a tongue stop.
pub const GAP_THRESHOLD: usize = 20;

/// Bridged values never drop below this fraction of the quieter anchor, so
/// a bridged transition never reads as near-silence.
pub const BRIDGE_FLOOR: f32 = 0.7;

/// Derive the display series from a history snapshot.
///
/// Pure and idempotent: the raw slots are never mutated and identical input
/// produces identical output. Three passes, all O(N):
///
/// 1. Copy occupied slots through; empty slots start silent.
/// 2. For each pair of consecutive occupied slots ("anchors") separated by
///    a gap of 1..=GAP_THRESHOLD empties, linearly interpolate across the
///    gap, floored at `BRIDGE_FLOOR ×` the quieter anchor. Bridged slots
///    take the right-hand anchor's note (the note being entered). Gaps at
///    either edge of the buffer have no anchor on one side and stay silent.
/// 3. 3-point centered moving average over slots that held a reading before
///    bridging, damping controller jitter. The two edge positions have no
///    neighbor on one side and are left unsmoothed.
pub fn smooth(slots: &[Option<Sample>]) -> Vec<DisplaySample> {
    let mut out: Vec<DisplaySample> = slots
        .iter()
        .map(|slot| match slot {
            Some(s) => DisplaySample {
                velocity: s.velocity as f32,
                note: Some(s.note),
            },
            None => DisplaySample::silent(),
        })
        .collect();

    let anchors: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.map(|_| i))
        .collect();

    for pair in anchors.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let gap = end - start - 1;
        if gap == 0 || gap > GAP_THRESHOLD {
            continue;
        }

        let start_vel = out[start].velocity;
        let end_vel = out[end].velocity;
        let floor = BRIDGE_FLOOR * start_vel.min(end_vel);
        // Prefer the note being transitioned into; fall back to the note
        // being left. Occupied slots always carry a note, so the right-hand
        // anchor wins in practice.
        let bridge_note = slots[end]
            .map(|s| s.note)
            .or_else(|| slots[start].map(|s| s.note));

        for j in 1..=gap {
            let alpha = j as f32 / (gap + 1) as f32;
            let interp = start_vel * (1.0 - alpha) + end_vel * alpha;
            out[start + j] = DisplaySample {
                velocity: interp.max(floor),
                note: bridge_note,
            };
        }
    }

    // Moving average reads the bridged values but is applied only where the
    // raw buffer held a reading.
    let bridged: Vec<f32> = out.iter().map(|d| d.velocity).collect();
    for i in 1..bridged.len().saturating_sub(1) {
        if slots[i].is_some() {
            out[i].velocity = (bridged[i - 1] + bridged[i] + bridged[i + 1]) / 3.0;
        }
    }

    out
}
