use breath_trainer::console_display;
use breath_trainer::engine::TrainerEngine;
use breath_trainer::json_stream;
#[cfg(feature = "midi")]
use breath_trainer::midi_input;
use breath_trainer::runner;
use breath_trainer::simulator;
use breath_trainer::types::*;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info};
use std::io::BufRead;
use std::thread;

#[derive(Parser)]
#[command(name = "breath-trainer")]
#[command(about = "Long-tone consistency trainer for breath-controlled MIDI wind instruments")]
struct Cli {
    /// Run against the built-in long-tone etude (no hardware required)
    #[arg(long)]
    simulate: bool,

    /// MIDI input port: index or name substring (e.g. "EWI")
    #[arg(long, default_value = "0")]
    port: String,

    /// List available MIDI input ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Controller that drives the displayed intensity (2 = Breath, 7 = Volume)
    #[arg(long, default_value_t = DEFAULT_CONTROLLER)]
    cc: u8,

    /// Rolling history length in samples
    #[arg(long, default_value_t = DEFAULT_HISTORY_LEN)]
    history: usize,

    /// Sampling cadence (Hz): history pushes per second
    #[arg(long, default_value_t = 30)]
    tick_hz: u32,

    /// Render cadence (Hz): snapshots per second to consumers
    #[arg(long, default_value_t = 30)]
    display_hz: u32,

    /// Simulator breath-CC emission rate (Hz)
    #[arg(long, default_value_t = 100)]
    sim_rate: u32,

    /// Stream compact JSON snapshots on stdout instead of the console UI
    #[arg(long)]
    json: bool,

    /// JSON stream frame rate (Hz)
    #[arg(long, default_value_t = 30)]
    json_fps: u32,

    /// Force the console UI on alongside --json
    #[arg(long)]
    console: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        #[cfg(feature = "midi")]
        {
            match midi_input::list_ports() {
                Ok(names) if names.is_empty() => println!("No MIDI input ports found."),
                Ok(names) => {
                    println!("Available MIDI input ports:");
                    for (i, name) in names.iter().enumerate() {
                        println!("  {}: {}", i, name);
                    }
                }
                Err(e) => error!("port scan failed: {}", e),
            }
        }
        #[cfg(not(feature = "midi"))]
        error!("built without the 'midi' feature; no ports to list");
        return;
    }

    let clock = SessionClock::new();
    let console_enabled = cli.console || !cli.json;

    info!("═══════════════════════════════════════════════");
    info!("  BREATH TRAINER v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Mode: {}",
        if cli.simulate { "SIMULATOR" } else { "MIDI" }
    );
    info!("  Velocity source: CC{}", cli.cc);
    info!(
        "  History: {} samples at {}Hz ({:.1}s window)",
        cli.history,
        cli.tick_hz,
        cli.history as f32 / cli.tick_hz.max(1) as f32
    );
    info!("═══════════════════════════════════════════════");

    // Channels: input → runner, keyboard → runner
    let (raw_tx, raw_rx) = bounded::<RawMessage>(4096);
    let (cmd_tx, cmd_rx) = bounded::<Command>(64);

    // Channels: runner → consumers
    let mut snapshot_txs: Vec<crossbeam_channel::Sender<Snapshot>> = Vec::new();
    let mut handles = Vec::new();

    // ─── Console dashboard ──────────────────────────────────────────
    if console_enabled {
        let (tx, rx) = bounded::<Snapshot>(256);
        snapshot_txs.push(tx);
        handles.push(
            thread::Builder::new()
                .name("display".into())
                .spawn(move || {
                    console_display::ConsoleDisplay::new(rx).run();
                })
                .unwrap(),
        );
    }

    // ─── JSON stream ────────────────────────────────────────────────
    if cli.json {
        let (tx, rx) = bounded::<Snapshot>(256);
        snapshot_txs.push(tx);
        let fps = cli.json_fps;
        handles.push(
            thread::Builder::new()
                .name("json".into())
                .spawn(move || {
                    json_stream::JsonStream::new(rx, fps).run();
                })
                .unwrap(),
        );
    }

    // ─── Runner (owns the engine) ───────────────────────────────────
    let engine = TrainerEngine::with_history_len(cli.history).with_controller(cli.cc);
    let runner_clock = clock.clone();
    let tick_hz = cli.tick_hz;
    let display_hz = cli.display_hz;
    handles.push(
        thread::Builder::new()
            .name("runner".into())
            .spawn(move || {
                runner::Runner::new(raw_rx, cmd_rx, snapshot_txs, engine, runner_clock)
                    .with_tick_hz(tick_hz)
                    .with_snapshot_hz(display_hz)
                    .run();
            })
            .unwrap(),
    );

    // ─── Keyboard commands on stdin ─────────────────────────────────
    // Console UIs get 'c' to clear and 1-9 to pick the velocity CC,
    // matching the original keyboard shortcuts.
    if console_enabled {
        let key_tx = cmd_tx.clone();
        handles.push(
            thread::Builder::new()
                .name("stdin".into())
                .spawn(move || {
                    let stdin = std::io::stdin();
                    for line in stdin.lock().lines() {
                        let line = match line {
                            Ok(l) => l,
                            Err(_) => break,
                        };
                        let cmd = match line.trim() {
                            "c" | "C" | "clear" => Some(Command::Clear),
                            t => t
                                .parse::<u8>()
                                .ok()
                                .filter(|n| (1..=9).contains(n))
                                .map(Command::SelectController),
                        };
                        if let Some(cmd) = cmd {
                            if key_tx.send(cmd).is_err() {
                                break;
                            }
                        }
                    }
                })
                .unwrap(),
        );
    }
    drop(cmd_tx);

    // ─── Input source ───────────────────────────────────────────────
    #[cfg(feature = "midi")]
    let mut _midi_conn = None;

    if cli.simulate {
        info!("Starting simulator etude...");
        let sim_clock = clock.clone();
        let sim_tx = raw_tx.clone();
        let rate = cli.sim_rate;
        handles.push(
            thread::Builder::new()
                .name("simulator".into())
                .spawn(move || {
                    simulator::Simulator::new(sim_clock, sim_tx, rate).run();
                })
                .unwrap(),
        );
    } else {
        #[cfg(feature = "midi")]
        {
            let reader =
                midi_input::MidiReader::new(cli.port.clone(), raw_tx.clone(), clock.clone());
            match reader.connect() {
                Ok(conn) => _midi_conn = Some(conn),
                Err(e) => {
                    error!("MIDI connect failed: {}", e);
                    error!("Run with --list-ports to see devices, or --simulate for the etude.");
                    std::process::exit(1);
                }
            }
        }
        #[cfg(not(feature = "midi"))]
        {
            log::warn!("Built without the 'midi' feature. Falling back to simulator.");
            let sim_clock = clock.clone();
            let sim_tx = raw_tx.clone();
            let rate = cli.sim_rate;
            handles.push(
                thread::Builder::new()
                    .name("simulator".into())
                    .spawn(move || {
                        simulator::Simulator::new(sim_clock, sim_tx, rate).run();
                    })
                    .unwrap(),
            );
        }
    }
    drop(raw_tx);

    info!("Running. Press Ctrl+C to stop.");
    for h in handles {
        let _ = h.join();
    }
}
