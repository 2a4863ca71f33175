pub mod colors;
pub mod console_display;
pub mod engine;
pub mod history;
pub mod json_stream;
pub mod midi_event;
pub mod player_state;
pub mod runner;
pub mod simulator;
pub mod smoother;
pub mod stats;
pub mod types;

#[cfg(feature = "midi")]
pub mod midi_input;
