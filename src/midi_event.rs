use crate::types::{cc_name, note_name};
use std::fmt;

/// A classified MIDI channel message.
///
/// Decoding is total: anything that isn't a note on/off or control change —
/// pitch bend, aftertouch, system messages, truncated data — classifies as
/// `Other` and is logged rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8, channel: u8 },
    NoteOff { note: u8, channel: u8 },
    ControlChange { controller: u8, value: u8, channel: u8 },
    Other { status: u8, data1: u8, data2: u8 },
}

impl MidiEvent {
    /// Classify 1–3 raw status/data bytes.
    ///
    /// A note-on with velocity 0 is a note-off (running-status convention
    /// used by most wind controllers).
    pub fn parse(bytes: &[u8]) -> Self {
        let status = bytes.first().copied().unwrap_or(0);
        let data1 = bytes.get(1).copied().unwrap_or(0);
        let data2 = bytes.get(2).copied().unwrap_or(0);
        let channel = status & 0x0F;

        match status & 0xF0 {
            0x90 if bytes.len() >= 3 && data2 > 0 => MidiEvent::NoteOn {
                note: data1,
                velocity: data2,
                channel,
            },
            0x90 if bytes.len() >= 3 => MidiEvent::NoteOff {
                note: data1,
                channel,
            },
            0x80 if bytes.len() >= 2 => MidiEvent::NoteOff {
                note: data1,
                channel,
            },
            0xB0 if bytes.len() >= 3 => MidiEvent::ControlChange {
                controller: data1,
                value: data2,
                channel,
            },
            _ => MidiEvent::Other {
                status,
                data1,
                data2,
            },
        }
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiEvent::NoteOn {
                note,
                velocity,
                channel,
            } => write!(
                f,
                "Note ON: {} (#{}) vel={} ch={}",
                note_name(note),
                note,
                velocity,
                channel
            ),
            MidiEvent::NoteOff { note, channel } => write!(
                f,
                "Note OFF: {} (#{}) ch={}",
                note_name(note),
                note,
                channel
            ),
            MidiEvent::ControlChange {
                controller,
                value,
                channel,
            } => match cc_name(controller) {
                Some(name) => write!(
                    f,
                    "CC: {} ({}) = {} ch={}",
                    name, controller, value, channel
                ),
                None => write!(f, "CC: CC{} = {} ch={}", controller, value, channel),
            },
            MidiEvent::Other {
                status,
                data1,
                data2,
            } => write!(
                f,
                "MIDI: status={:02X} data={},{} ch={}",
                status,
                data1,
                data2,
                status & 0x0F
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        assert_eq!(
            MidiEvent::parse(&[0x90, 60, 100]),
            MidiEvent::NoteOn {
                note: 60,
                velocity: 100,
                channel: 0
            }
        );
        // Channel in the low nibble
        assert_eq!(
            MidiEvent::parse(&[0x95, 72, 1]),
            MidiEvent::NoteOn {
                note: 72,
                velocity: 1,
                channel: 5
            }
        );
    }

    #[test]
    fn test_note_off_both_encodings() {
        assert_eq!(
            MidiEvent::parse(&[0x80, 60, 64]),
            MidiEvent::NoteOff {
                note: 60,
                channel: 0
            }
        );
        // Note-on with velocity 0 is a note-off, not an error
        assert_eq!(
            MidiEvent::parse(&[0x90, 60, 0]),
            MidiEvent::NoteOff {
                note: 60,
                channel: 0
            }
        );
    }

    #[test]
    fn test_control_change() {
        assert_eq!(
            MidiEvent::parse(&[0xB0, 2, 85]),
            MidiEvent::ControlChange {
                controller: 2,
                value: 85,
                channel: 0
            }
        );
    }

    #[test]
    fn test_unsupported_degrades_to_other() {
        // Pitch bend
        assert!(matches!(
            MidiEvent::parse(&[0xE0, 0, 64]),
            MidiEvent::Other { status: 0xE0, .. }
        ));
        // Channel aftertouch
        assert!(matches!(
            MidiEvent::parse(&[0xD0, 90]),
            MidiEvent::Other { status: 0xD0, .. }
        ));
        // Realtime clock
        assert!(matches!(
            MidiEvent::parse(&[0xF8]),
            MidiEvent::Other { status: 0xF8, .. }
        ));
        // Empty message
        assert!(matches!(MidiEvent::parse(&[]), MidiEvent::Other { .. }));
    }

    #[test]
    fn test_truncated_note_on_is_other() {
        // A bare note-on status with no data bytes can't be a note event
        assert!(matches!(
            MidiEvent::parse(&[0x90, 60]),
            MidiEvent::Other { .. }
        ));
    }

    #[test]
    fn test_display_formatting() {
        let on = MidiEvent::parse(&[0x90, 60, 100]);
        assert_eq!(format!("{}", on), "Note ON: C4 (#60) vel=100 ch=0");
        let cc = MidiEvent::parse(&[0xB0, 2, 85]);
        assert_eq!(format!("{}", cc), "CC: Breath (2) = 85 ch=0");
    }
}
