use crate::types::{CompactSnapshot, Snapshot};
use crossbeam_channel::Receiver;
use log::{error, info};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Streams snapshots as line-delimited compact JSON on stdout for an
/// external renderer, throttled to a target frame rate. When snapshots
/// arrive faster than the target, only the latest pending one is emitted.
pub struct JsonStream {
    rx: Receiver<Snapshot>,
    target_fps: u32,
}

impl JsonStream {
    pub fn new(rx: Receiver<Snapshot>, target_fps: u32) -> Self {
        Self {
            rx,
            target_fps: target_fps.max(1),
        }
    }

    /// Run until the snapshot channel closes. Blocks the calling thread.
    pub fn run(&self) {
        info!("JSON stream on stdout at {} fps", self.target_fps);
        let min_gap = Duration::from_micros(1_000_000 / self.target_fps as u64);
        let mut last_emit: Option<Instant> = None;
        let stdout = io::stdout();

        for snap in self.rx.iter() {
            // Coalesce to the newest pending snapshot
            let snap = self.rx.try_iter().last().unwrap_or(snap);
            if last_emit.is_some_and(|t| t.elapsed() < min_gap) {
                continue;
            }

            let compact = CompactSnapshot::from(&snap);
            match serde_json::to_string(&compact) {
                Ok(line) => {
                    let mut out = stdout.lock();
                    if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                        // Downstream pipe closed; no point streaming on.
                        info!("stdout closed, stopping JSON stream");
                        return;
                    }
                    last_emit = Some(Instant::now());
                }
                Err(e) => error!("snapshot serialization failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DisplaySample, Stats};

    #[test]
    fn test_compact_json_shape() {
        let snap = Snapshot {
            timestamp_us: 123,
            note: Some(60),
            velocity: 88,
            controller: 2,
            note_active: true,
            time_held_s: 0.5,
            stats: Stats {
                mean: 88.0,
                std_dev: 2.0,
                min: 84.0,
                max: 92.0,
            },
            consistency: 90.0,
            series: vec![
                DisplaySample {
                    velocity: 88.0,
                    note: Some(60),
                },
                DisplaySample::silent(),
            ],
            colors: vec![],
        };
        let json = serde_json::to_string(&CompactSnapshot::from(&snap)).unwrap();
        assert!(json.contains("\"t\":123"));
        assert!(json.contains("\"n\":60"));
        assert!(json.contains("\"cc\":2"));
        assert!(json.contains("\"sv\":[88.0,0.0]"));
        assert!(json.contains("\"sn\":[60,-1]"));

        // Round-trip
        let decoded: CompactSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.t, 123);
        assert_eq!(decoded.sn, vec![60, -1]);
    }
}
