use crate::engine::TrainerEngine;
use crate::types::{Command, RawMessage, SessionClock, Snapshot};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};
use std::time::Duration;

/// Drives the engine from two channels on one thread: raw MIDI messages in,
/// snapshots out to every registered consumer.
///
/// Two independent cadences run off the session clock:
///   - the sampling cadence (`tick_hz`) advances the rolling history;
///   - the render cadence (`snapshot_hz`) derives and publishes snapshots.
///
/// The history is mutated only here; consumers receive owned `Snapshot`s,
/// so no shared mutable state crosses thread boundaries. The only blocking
/// call is a channel read bounded by the nearest cadence deadline.
pub struct Runner {
    raw_rx: Receiver<RawMessage>,
    cmd_rx: Receiver<Command>,
    snapshot_txs: Vec<Sender<Snapshot>>,
    engine: TrainerEngine,
    clock: SessionClock,
    tick_us: u64,
    snapshot_us: u64,
}

impl Runner {
    pub fn new(
        raw_rx: Receiver<RawMessage>,
        cmd_rx: Receiver<Command>,
        snapshot_txs: Vec<Sender<Snapshot>>,
        engine: TrainerEngine,
        clock: SessionClock,
    ) -> Self {
        Self {
            raw_rx,
            cmd_rx,
            snapshot_txs,
            engine,
            clock,
            tick_us: 1_000_000 / 30,
            snapshot_us: 1_000_000 / 30,
        }
    }

    /// Sampling cadence. History duration = history length / tick rate.
    pub fn with_tick_hz(mut self, hz: u32) -> Self {
        self.tick_us = 1_000_000 / hz.max(1) as u64;
        self
    }

    /// Render cadence, independent of the sampling cadence.
    pub fn with_snapshot_hz(mut self, hz: u32) -> Self {
        self.snapshot_us = 1_000_000 / hz.max(1) as u64;
        self
    }

    /// Run until the raw-message channel closes. Blocks the calling thread.
    pub fn run(&mut self) {
        info!(
            "runner started (tick {}ms, snapshot {}ms, history {})",
            self.tick_us / 1000,
            self.snapshot_us / 1000,
            self.engine.history_len()
        );

        let mut next_tick = self.clock.now_us();
        let mut next_snapshot = next_tick;
        let mut ingested: u64 = 0;

        loop {
            while let Ok(cmd) = self.cmd_rx.try_recv() {
                self.apply(cmd);
            }

            let now = self.clock.now_us();
            if now >= next_tick {
                self.engine.tick(now);
                next_tick += self.tick_us;
                if next_tick <= now {
                    // Fell behind (scheduling hiccup): resync rather than
                    // bursting catch-up ticks.
                    next_tick = now + self.tick_us;
                }
            }
            if now >= next_snapshot {
                self.publish(now);
                next_snapshot += self.snapshot_us;
                if next_snapshot <= now {
                    next_snapshot = now + self.snapshot_us;
                }
            }

            // Bounded poll until the nearest deadline.
            let deadline = next_tick.min(next_snapshot);
            let wait = deadline.saturating_sub(self.clock.now_us());
            match self.raw_rx.recv_timeout(Duration::from_micros(wait)) {
                Ok(msg) => {
                    self.engine.ingest(msg.bytes(), msg.timestamp_us);
                    ingested += 1;
                    if ingested % 1000 == 0 {
                        debug!("runner: {} messages ingested", ingested);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Input is gone; leave consumers one final view of the session.
        self.publish(self.clock.now_us());
        info!("runner shutting down after {} messages", ingested);
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Clear => self.engine.clear(),
            Command::SelectController(cc) => {
                info!("velocity source set to CC{}", cc);
                self.engine.select_controller(cc);
            }
        }
    }

    fn publish(&mut self, now_us: u64) {
        let snapshot = self.engine.snapshot(now_us);
        for tx in &self.snapshot_txs {
            let _ = tx.send(snapshot.clone());
        }
    }
}
