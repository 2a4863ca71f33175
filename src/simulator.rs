use crate::types::{RawMessage, SessionClock};
use crossbeam_channel::Sender;
use log::info;
use std::f64::consts::PI;
use std::thread;
use std::time::Duration;

/// Generates a scripted long-tone etude as raw MIDI messages so the full
/// pipeline runs without a wind controller attached.
///
/// Each phrase is a note-on followed by a stream of CC7 breath values with
/// a slow sine wobble plus small deterministic jitter, then a note-off and
/// a rest. Short rests imitate tongue stops between legato notes (bridged
/// by the smoother); the long rest at the end of the etude is a real phrase
/// boundary and should show as silence.
pub struct Simulator {
    clock: SessionClock,
    tx: Sender<RawMessage>,
    poll_hz: u32,
    /// Monotonic message counter, also the jitter/wobble phase source.
    emitted: u64,
}

/// One held note of the etude.
#[derive(Debug, Clone, Copy)]
pub struct Phrase {
    pub note: u8,
    /// Breath target the wobble oscillates around.
    pub breath: u8,
    pub hold_ms: u64,
    /// Silence after the note-off.
    pub rest_ms: u64,
}

/// A small ascending etude: three legato notes with tongue-stop rests,
/// then a held top note and a full phrase break.
pub fn etude() -> Vec<Phrase> {
    vec![
        Phrase {
            note: 60, // C4
            breath: 80,
            hold_ms: 2500,
            rest_ms: 150,
        },
        Phrase {
            note: 62, // D4
            breath: 85,
            hold_ms: 2000,
            rest_ms: 120,
        },
        Phrase {
            note: 64, // E4
            breath: 90,
            hold_ms: 2000,
            rest_ms: 150,
        },
        Phrase {
            note: 67, // G4
            breath: 95,
            hold_ms: 4000,
            rest_ms: 2500,
        },
    ]
}

impl Simulator {
    pub fn new(clock: SessionClock, tx: Sender<RawMessage>, poll_hz: u32) -> Self {
        Self {
            clock,
            tx,
            poll_hz: poll_hz.max(1),
            emitted: 0,
        }
    }

    /// Loop the etude until the channel closes. Blocks the calling thread.
    pub fn run(&mut self) {
        info!("simulator starting long-tone etude at {}Hz", self.poll_hz);
        let phrases = etude();
        loop {
            for phrase in &phrases {
                if !self.play_phrase(phrase) {
                    info!("simulator stopping (channel closed)");
                    return;
                }
            }
        }
    }

    /// Play one phrase. Returns false once the receiver is gone.
    pub fn play_phrase(&mut self, phrase: &Phrase) -> bool {
        let interval = Duration::from_micros(1_000_000 / self.poll_hz as u64);
        let steps = (phrase.hold_ms * self.poll_hz as u64 / 1000).max(1);

        if !self.send(&[0x90, phrase.note, phrase.breath]) {
            return false;
        }

        for step in 0..steps {
            thread::sleep(interval);
            let value = self.breath_value(phrase.breath, step, steps);
            if !self.send(&[0xB0, 7, value]) {
                return false;
            }
        }

        if !self.send(&[0x80, phrase.note, 0]) {
            return false;
        }
        thread::sleep(Duration::from_millis(phrase.rest_ms));
        true
    }

    /// Breath pressure with a slow wobble and ±2 jitter, shaped so the
    /// attack swells in over the first few steps.
    fn breath_value(&self, target: u8, step: u64, steps: u64) -> u8 {
        let t = step as f64 / self.poll_hz as f64;
        let wobble = 4.0 * (2.0 * PI * 0.4 * t).sin();
        let jitter = ((self.emitted.wrapping_mul(7919) % 5) as f64) - 2.0;
        let swell = if steps >= 8 && step < 8 {
            (step + 1) as f64 / 8.0
        } else {
            1.0
        };
        let v = (target as f64 + wobble + jitter) * swell;
        (v.round() as i64).clamp(1, 127) as u8
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        self.emitted += 1;
        self.tx
            .send(RawMessage::new(self.clock.now_us(), bytes))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi_event::MidiEvent;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_phrase_emits_valid_midi() {
        let (tx, rx) = unbounded();
        let mut sim = Simulator::new(SessionClock::new(), tx, 1000);
        let phrase = Phrase {
            note: 60,
            breath: 80,
            hold_ms: 20,
            rest_ms: 0,
        };
        assert!(sim.play_phrase(&phrase));

        let msgs: Vec<RawMessage> = rx.try_iter().collect();
        assert!(msgs.len() >= 3, "note on, CCs, note off");

        assert_eq!(
            MidiEvent::parse(msgs[0].bytes()),
            MidiEvent::NoteOn {
                note: 60,
                velocity: 80,
                channel: 0
            }
        );
        assert_eq!(
            MidiEvent::parse(msgs.last().unwrap().bytes()),
            MidiEvent::NoteOff {
                note: 60,
                channel: 0
            }
        );
        for m in &msgs[1..msgs.len() - 1] {
            match MidiEvent::parse(m.bytes()) {
                MidiEvent::ControlChange {
                    controller, value, ..
                } => {
                    assert_eq!(controller, 7);
                    assert!((1..=127).contains(&value));
                }
                other => panic!("unexpected event in hold: {:?}", other),
            }
        }
    }

    #[test]
    fn test_breath_values_stay_near_target() {
        let (tx, _rx) = unbounded();
        let sim = Simulator::new(SessionClock::new(), tx, 100);
        for step in 8..500 {
            let v = sim.breath_value(90, step, 500);
            assert!((80..=100).contains(&v), "step {}: {}", step, v);
        }
    }

    #[test]
    fn test_stops_when_channel_closed() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sim = Simulator::new(SessionClock::new(), tx, 1000);
        let phrase = Phrase {
            note: 60,
            breath: 80,
            hold_ms: 10,
            rest_ms: 0,
        };
        assert!(!sim.play_phrase(&phrase));
    }
}
