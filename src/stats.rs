//! Per-note windowed statistics.
//!
//! Recomputed from scratch on every push while a note is sounding. At a few
//! hundred slots a full O(N) pass is cheap, and recomputing avoids the
//! drift/eviction bookkeeping an incremental variant would need.

use crate::types::{Sample, Stats};

/// Mean, population standard deviation, min, and max over the occupied
/// history slots belonging to `note`. Empty subset → all zeros ("no data
/// yet" for the consumer).
pub fn note_stats(slots: &[Option<Sample>], note: u8) -> Stats {
    let mut count = 0u32;
    let mut sum = 0.0f64;
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for sample in slots.iter().flatten() {
        if sample.note != note {
            continue;
        }
        let v = sample.velocity as f32;
        count += 1;
        sum += v as f64;
        min = min.min(v);
        max = max.max(v);
    }

    if count == 0 {
        return Stats::default();
    }

    let mean = (sum / count as f64) as f32;
    let var: f64 = slots
        .iter()
        .flatten()
        .filter(|s| s.note == note)
        .map(|s| {
            let d = s.velocity as f64 - mean as f64;
            d * d
        })
        .sum::<f64>()
        / count as f64;

    Stats {
        mean,
        std_dev: var.sqrt() as f32,
        min,
        max,
    }
}
