//! Scripted-game simulator
//!
//! Simulates:
//! - A host tick loop with an irregular cadence (seeded jitter)
//! - Whole moves of exact simulated duration
//! - Flag-fall observation through the real notifier path

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tempo_core::{ClockResult, Side, TimerConfig};
use tempo_engine::TimerEngine;

/// Tick cadence model: a nominal quantum plus bounded random jitter.
#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    /// Nominal interval between ticks.
    pub quantum: Duration,
    /// Maximum jitter added to or removed from each quantum, in milliseconds.
    pub jitter_ms: u64,
}

impl Cadence {
    /// Steady 50ms ticks, no jitter.
    pub fn steady() -> Self {
        Cadence {
            quantum: Duration::from_millis(50),
            jitter_ms: 0,
        }
    }

    /// 50ms nominal with up to ±40ms of jitter per tick.
    pub fn unstable() -> Self {
        Cadence {
            quantum: Duration::from_millis(50),
            jitter_ms: 40,
        }
    }
}

/// A `TimerEngine` driven through simulated time.
///
/// Simulated `Instant`s are derived from one origin by pure arithmetic, so
/// every run with the same seed is exactly reproducible and no test sleeps.
pub struct ScriptedGame {
    engine: TimerEngine,
    origin: Instant,
    elapsed: Duration,
    cadence: Cadence,
    rng: StdRng,
    expiries: Arc<Mutex<Vec<Side>>>,
    expiry_count: Arc<AtomicU32>,
}

impl ScriptedGame {
    pub fn new(config: TimerConfig, seed: u64) -> ClockResult<Self> {
        Self::with_cadence(config, seed, Cadence::steady())
    }

    pub fn with_cadence(config: TimerConfig, seed: u64, cadence: Cadence) -> ClockResult<Self> {
        let mut engine = TimerEngine::new(config)?;
        let expiries = Arc::new(Mutex::new(Vec::new()));
        let expiry_count = Arc::new(AtomicU32::new(0));
        let sink = expiries.clone();
        let counter = expiry_count.clone();
        engine.on_timeout(move |side| {
            sink.lock().unwrap().push(side);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        Ok(ScriptedGame {
            engine,
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            cadence,
            rng: StdRng::seed_from_u64(seed),
            expiries,
            expiry_count,
        })
    }

    /// Current simulated timestamp.
    pub fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimerEngine {
        &mut self.engine
    }

    pub fn start(&mut self) -> ClockResult<()> {
        let now = self.now();
        self.engine.start(now)
    }

    pub fn pause(&mut self) -> ClockResult<()> {
        let now = self.now();
        self.engine.pause(now)
    }

    pub fn resume(&mut self) -> ClockResult<()> {
        let now = self.now();
        self.engine.resume(now)
    }

    /// Advance simulated time by exactly `duration`, ticking the engine at
    /// the jittered cadence along the way. The final tick always lands on
    /// the exact end timestamp, so total elapsed time is deterministic no
    /// matter what the jitter did in between.
    pub fn run_for(&mut self, duration: Duration) {
        let target = self.elapsed + duration;
        loop {
            let step = self.next_step();
            if self.elapsed + step >= target {
                self.elapsed = target;
                let now = self.now();
                self.engine.tick(now);
                return;
            }
            self.elapsed += step;
            let now = self.now();
            self.engine.tick(now);
        }
    }

    /// Let simulated wall time pass without ticking the engine, as a host
    /// whose tick loop is stopped (e.g. while paused) would.
    pub fn idle_for(&mut self, duration: Duration) {
        self.elapsed += duration;
    }

    /// Run the active side's move for exactly `duration`, then switch.
    pub fn play_move(&mut self, duration: Duration) -> ClockResult<()> {
        self.run_for(duration);
        let now = self.now();
        self.engine.switch_turn(now)
    }

    /// Sides reported expired so far, in order.
    pub fn expiries(&self) -> Vec<Side> {
        self.expiries.lock().unwrap().clone()
    }

    pub fn expiry_count(&self) -> u32 {
        self.expiry_count.load(Ordering::SeqCst)
    }

    fn next_step(&mut self) -> Duration {
        let base = self.cadence.quantum.as_millis() as i64;
        let jitter = if self.cadence.jitter_ms > 0 {
            let j = self.cadence.jitter_ms as i64;
            self.rng.gen_range(-j..=j)
        } else {
            0
        };
        Duration::from_millis((base + jitter).max(1) as u64)
    }
}
