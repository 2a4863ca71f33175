use crate::types::{note_name, DisplaySample, Rgb, Snapshot};
use crossbeam_channel::Receiver;
use std::io::{self, Write};

/// Width of the smoothed-series sparkline in terminal columns.
const SPARK_WIDTH: usize = 60;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders a live ANSI dashboard of the practice session. The runner
/// already paces snapshots at the render cadence, so every received
/// snapshot is drawn.
pub struct ConsoleDisplay {
    rx: Receiver<Snapshot>,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<Snapshot>) -> Self {
        Self { rx }
    }

    pub fn run(&self) {
        let mut stdout = io::stdout();

        for snap in self.rx.iter() {
            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");

            println!("╔══════════════════════════════════════════════════════════════╗");
            println!("║  BREATH TRAINER — Long Tone Monitor                          ║");
            println!("╚══════════════════════════════════════════════════════════════╝");

            match snap.note {
                Some(note) => {
                    let color = snap
                        .colors
                        .iter()
                        .find(|(n, _)| *n == note)
                        .map(|(_, c)| *c);
                    let name = note_name(note);
                    let state = if snap.note_active { "" } else { " (released)" };
                    match color {
                        Some(c) => println!(
                            "  Note: {}{} (#{}){}\x1b[0m",
                            ansi_fg(c),
                            name,
                            note,
                            state
                        ),
                        None => println!("  Note: {} (#{}){}", name, note, state),
                    }
                }
                None => println!("  Note: ---"),
            }

            let vbar = make_bar(snap.velocity as f32 / 127.0, 30);
            println!(
                "  Velocity: {} {:>3} (CC{})",
                vbar, snap.velocity, snap.controller
            );
            println!("  Time: {:.2}s", snap.time_held_s);
            println!();
            println!("  Statistics ({})", snap.stats);
            println!("  Consistency Score: {:.1}%", snap.consistency);
            println!();
            println!("  {}", sparkline(&snap.series));
            println!();

            if !snap.colors.is_empty() {
                let legend: Vec<String> = snap
                    .colors
                    .iter()
                    .map(|(n, c)| format!("{}■\x1b[0m {}", ansi_fg(*c), note_name(*n)))
                    .collect();
                println!("  Notes: {}", legend.join("  "));
            }
            println!();
            println!("  [c + Enter] clear history   [1-9 + Enter] select CC   [Ctrl+C] quit");

            let _ = stdout.flush();
        }
    }
}

fn ansi_fg(c: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", c.0, c.1, c.2)
}

fn make_bar(val: f32, width: usize) -> String {
    let filled = (val.clamp(0.0, 1.0) * width as f32).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Compress the series into SPARK_WIDTH buckets, drawing each bucket's peak
/// in the color of the note that produced it.
fn sparkline(series: &[DisplaySample]) -> String {
    if series.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let buckets = SPARK_WIDTH.min(series.len());
    for b in 0..buckets {
        let start = b * series.len() / buckets;
        let end = ((b + 1) * series.len() / buckets).max(start + 1);
        let peak = series[start..end]
            .iter()
            .max_by(|a, c| a.velocity.total_cmp(&c.velocity))
            .copied()
            .unwrap_or(DisplaySample::silent());
        out.push(spark_char(peak.velocity));
    }
    out
}

fn spark_char(velocity: f32) -> char {
    if velocity <= 0.0 {
        return ' ';
    }
    let level = (velocity / 127.0 * SPARK_LEVELS.len() as f32).ceil() as usize;
    SPARK_LEVELS[level.clamp(1, SPARK_LEVELS.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_bar_bounds() {
        assert_eq!(make_bar(0.0, 4), "[░░░░]");
        assert_eq!(make_bar(1.0, 4), "[████]");
        assert_eq!(make_bar(0.5, 4), "[██░░]");
        // Out-of-range input is clamped
        assert_eq!(make_bar(2.0, 4), "[████]");
    }

    #[test]
    fn test_spark_char_levels() {
        assert_eq!(spark_char(0.0), ' ');
        assert_eq!(spark_char(1.0), SPARK_LEVELS[0]);
        assert_eq!(spark_char(127.0), SPARK_LEVELS[7]);
        assert_eq!(spark_char(64.0), SPARK_LEVELS[4]);
    }

    #[test]
    fn test_sparkline_width() {
        let series = vec![
            DisplaySample {
                velocity: 90.0,
                note: Some(60)
            };
            300
        ];
        assert_eq!(sparkline(&series).chars().count(), SPARK_WIDTH);
        // Short series: one column per sample
        assert_eq!(sparkline(&series[..10]).chars().count(), 10);
        assert_eq!(sparkline(&[]), "");
    }
}
