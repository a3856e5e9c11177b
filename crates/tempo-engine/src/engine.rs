//! The timer engine: per-side countdown and turn-switch state machine
//!
//! The engine owns both sides' remaining time and advances the active side's
//! clock from monotonic timestamps supplied by the host (`tick(now)`), rather
//! than by counting fixed decrements per scheduling signal, so an irregular
//! tick cadence cannot accumulate drift. Turn switches apply the per-mode
//! adjustment (Bronstein refund, Fischer increment, stage bonuses) to the
//! side that just moved.
//!
//! The engine is single-threaded by contract: it performs no internal
//! locking and expects the host to serialize all calls (see
//! [`crate::current::SharedEngine`] for the mutex-wrapped handle).

use std::time::{Duration, Instant};

use tracing::debug;

use tempo_core::{ClockError, ClockResult, PerSide, Side, TimerConfig, TimerMode};

use crate::notifier::{TimeoutHandler, TimeoutNotifier};

/// Engine lifecycle phase.
///
/// `Idle → Running ⇄ Paused → Expired(side)`; `Expired` is terminal and only
/// `initialize`/`reset` leave it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    /// Initialized, not yet started.
    Idle,
    /// The active side's clock is counting down.
    Running,
    /// Counting suspended; elapsed time up to the pause is already settled.
    Paused,
    /// The given side's flag fell. Terminal.
    Expired(Side),
}

impl EnginePhase {
    fn name(self) -> &'static str {
        match self {
            EnginePhase::Idle => "idle",
            EnginePhase::Running => "running",
            EnginePhase::Paused => "paused",
            EnginePhase::Expired(_) => "expired",
        }
    }
}

/// Real-time dual chess clock.
pub struct TimerEngine {
    config: TimerConfig,
    phase: EnginePhase,
    remaining: PerSide<Duration>,
    active: Side,
    /// Whether the very first `start` has happened for this lifetime.
    started: bool,
    moves_completed: PerSide<u32>,
    /// Next unapplied stage, per side (MultiStage).
    stage_index: PerSide<usize>,
    /// SimpleDelay: grace left for the move in progress.
    /// BronsteinDelay: amount refundable when the move completes, capped at
    /// the configured delay.
    pending_delay: PerSide<Duration>,
    /// Last timestamp a delta was computed from. None while not running.
    last_tick: Option<Instant>,
    notifier: TimeoutNotifier,
}

impl TimerEngine {
    /// Build an engine in `Idle` from a validated config.
    pub fn new(config: TimerConfig) -> ClockResult<Self> {
        config.validate()?;
        let mut engine = TimerEngine {
            phase: EnginePhase::Idle,
            remaining: PerSide::splat(Duration::ZERO),
            active: Side::White,
            started: false,
            moves_completed: PerSide::splat(0),
            stage_index: PerSide::splat(0),
            pending_delay: PerSide::splat(Duration::ZERO),
            last_tick: None,
            notifier: TimeoutNotifier::new(),
            config,
        };
        let config = engine.config.clone();
        engine.apply_config(config);
        Ok(engine)
    }

    /// Replace all state with a fresh game under `config`.
    ///
    /// Keeps the registered timeout handler but re-arms its per-side latch.
    pub fn initialize(&mut self, config: TimerConfig) -> ClockResult<()> {
        config.validate()?;
        self.apply_config(config);
        debug!(mode = %self.config.mode, "engine initialized");
        Ok(())
    }

    /// Re-initialize with the last-used config, returning to `Idle`.
    pub fn reset(&mut self) {
        let config = self.config.clone();
        self.apply_config(config);
        debug!("engine reset");
    }

    fn apply_config(&mut self, config: TimerConfig) {
        self.remaining = PerSide::new(
            config.base_for(Side::White),
            config.base_for(Side::Black),
        );
        self.pending_delay = if config.mode == TimerMode::SimpleDelay {
            PerSide::splat(config.delay)
        } else {
            PerSide::splat(Duration::ZERO)
        };
        self.phase = EnginePhase::Idle;
        self.active = Side::White;
        self.started = false;
        self.moves_completed = PerSide::splat(0);
        self.stage_index = PerSide::splat(0);
        self.last_tick = None;
        self.notifier.clear_latch();
        self.config = config;
    }

    /// Start the clock from `Idle` (white to move first).
    pub fn start(&mut self, now: Instant) -> ClockResult<()> {
        self.run_from("start", now)
    }

    /// Resume a paused game.
    pub fn resume(&mut self, now: Instant) -> ClockResult<()> {
        self.run_from("resume", now)
    }

    fn run_from(&mut self, op: &'static str, now: Instant) -> ClockResult<()> {
        match self.phase {
            EnginePhase::Idle | EnginePhase::Paused => {
                self.phase = EnginePhase::Running;
                self.started = true;
                self.last_tick = Some(now);
                debug!(active = %self.active, "clock running");
                Ok(())
            }
            phase => Err(ClockError::InvalidTransition {
                op,
                state: phase.name(),
            }),
        }
    }

    /// Suspend counting, settling elapsed time since the last tick first.
    pub fn pause(&mut self, now: Instant) -> ClockResult<()> {
        if self.phase != EnginePhase::Running {
            return Err(ClockError::InvalidTransition {
                op: "pause",
                state: self.phase.name(),
            });
        }
        self.advance(now);
        // The flush itself may have dropped the flag; Expired stands.
        if self.phase == EnginePhase::Running {
            self.phase = EnginePhase::Paused;
            self.last_tick = None;
            debug!(active = %self.active, "clock paused");
        }
        Ok(())
    }

    /// Advance the active side's clock to `now`.
    ///
    /// Called on every scheduling quantum while running; silently ignored in
    /// any other phase so a periodic driver can race a user-initiated pause
    /// by one quantum without erroring.
    pub fn tick(&mut self, now: Instant) {
        if self.phase == EnginePhase::Running {
            self.advance(now);
        }
    }

    /// Complete the active side's move and hand the clock to the opponent.
    ///
    /// Settles the mover's elapsed time first; if that very settlement
    /// expires the mover, the expiry stands and the switch is rejected.
    pub fn switch_turn(&mut self, now: Instant) -> ClockResult<()> {
        if self.phase != EnginePhase::Running {
            return Err(ClockError::InvalidTransition {
                op: "switch_turn",
                state: self.phase.name(),
            });
        }
        self.advance(now);
        if self.phase != EnginePhase::Running {
            return Err(ClockError::InvalidTransition {
                op: "switch_turn",
                state: self.phase.name(),
            });
        }

        let mover = self.active;
        self.moves_completed[mover] += 1;

        match self.config.mode {
            TimerMode::SuddenDeath | TimerMode::SimpleDelay => {}
            TimerMode::BronsteinDelay => {
                // Refund what the move actually consumed, capped at the
                // configured delay; pending_delay accrued exactly that.
                let refund = self.pending_delay.copied(mover);
                self.remaining[mover] += refund;
                self.pending_delay.set(mover, Duration::ZERO);
            }
            TimerMode::FischerIncrement => {
                self.remaining[mover] += self.config.increment;
            }
            TimerMode::MultiStage => {
                self.remaining[mover] += self.config.increment;
                let idx = self.stage_index.copied(mover);
                if let Some(stage) = self.config.stages.get(idx) {
                    if self.moves_completed.copied(mover) == stage.after_moves {
                        self.remaining[mover] += stage.add;
                        self.stage_index.set(mover, idx + 1);
                        debug!(
                            side = %mover,
                            moves = stage.after_moves,
                            "stage bonus applied"
                        );
                    }
                }
            }
        }

        let next = mover.opponent();
        if self.config.mode == TimerMode::SimpleDelay {
            self.pending_delay.set(next, self.config.delay);
        }
        self.active = next;
        self.last_tick = Some(now);
        debug!(mover = %mover, next = %next, "turn switched");
        Ok(())
    }

    /// Overwrite one side's remaining time.
    ///
    /// Permitted in any phase; never touches the active side, the
    /// running/paused state, or the move counters, so it is safe during
    /// setup before the first turn switch.
    pub fn set_time(&mut self, side: Side, remaining: Duration) {
        self.remaining.set(side, remaining);
    }

    /// Register the timeout handler. Last registration wins.
    pub fn on_timeout<F>(&mut self, handler: F)
    where
        F: FnMut(Side) + Send + 'static,
    {
        self.notifier
            .set_handler(Box::new(handler) as TimeoutHandler);
    }

    // --- read accessors ---

    #[inline]
    pub fn remaining(&self, side: Side) -> Duration {
        self.remaining.copied(side)
    }

    #[inline]
    pub fn remaining_millis(&self, side: Side) -> u64 {
        self.remaining.copied(side).as_millis() as u64
    }

    /// The side whose clock is eligible to decrement; `None` before the
    /// first start of this lifetime.
    #[inline]
    pub fn active_side(&self) -> Option<Side> {
        self.started.then_some(self.active)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == EnginePhase::Running
    }

    #[inline]
    pub fn moves_completed(&self, side: Side) -> u32 {
        self.moves_completed.copied(side)
    }

    #[inline]
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    #[inline]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Deduct `now - last_tick` from the active side, honoring delay modes,
    /// and transition to `Expired` when the clock hits zero.
    fn advance(&mut self, now: Instant) {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return;
        };
        // Monotonic source; saturate anyway so a misbehaving host cannot
        // panic the hot path.
        let elapsed = now.saturating_duration_since(last);
        self.last_tick = Some(now);

        let side = self.active;
        let charge = match self.config.mode {
            TimerMode::SimpleDelay => {
                // The grace window absorbs elapsed time first; only the
                // overflow is charged.
                let grace = self.pending_delay.copied(side);
                if elapsed <= grace {
                    self.pending_delay.set(side, grace - elapsed);
                    Duration::ZERO
                } else {
                    self.pending_delay.set(side, Duration::ZERO);
                    elapsed - grace
                }
            }
            TimerMode::BronsteinDelay => {
                // Clock runs during the move; track how much of it will be
                // refundable at the switch.
                let accrued = (self.pending_delay.copied(side) + elapsed).min(self.config.delay);
                self.pending_delay.set(side, accrued);
                elapsed
            }
            _ => elapsed,
        };

        let left = self.remaining.copied(side).saturating_sub(charge);
        self.remaining.set(side, left);

        if left.is_zero() {
            self.phase = EnginePhase::Expired(side);
            self.last_tick = None;
            debug!(side = %side, "flag fell");
            self.notifier.fire(side);
        }
    }
}
