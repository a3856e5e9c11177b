//! Time controls, custom overrides, and the config builder

use std::fmt;
use std::time::Duration;

use crate::{ClockError, ClockResult, Side};

/// Smallest accepted base allotment, in minutes.
pub const MIN_BASE_MINUTES: u64 = 1;
/// Largest accepted base allotment, in minutes (24 hours).
pub const MAX_BASE_MINUTES: u64 = 1440;
/// Largest accepted delay/increment, in seconds (10 minutes).
pub const MAX_ADJUST_SECONDS: u64 = 600;

/// Default grace period for US simple delay.
pub const DEFAULT_SIMPLE_DELAY: Duration = Duration::from_secs(5);
/// Default refundable delay for Bronstein.
pub const DEFAULT_BRONSTEIN_DELAY: Duration = Duration::from_secs(3);
/// Default per-move bonus for Fischer increment.
pub const DEFAULT_FISCHER_INCREMENT: Duration = Duration::from_secs(5);

/// Base allotment, in minutes, at which the multi-stage builder switches
/// from the rapid template to the classical tournament template.
pub const MULTI_STAGE_CLASSICAL_THRESHOLD: u64 = 60;

/// The five timing disciplines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerMode {
    /// Plain countdown, no adjustments.
    SuddenDeath,
    /// US delay: a grace window each move during which the clock holds still.
    SimpleDelay,
    /// The clock runs during the move; up to `delay` is refunded at move end.
    BronsteinDelay,
    /// A fixed bonus is added to the mover's clock on move completion.
    FischerIncrement,
    /// Tournament control: per-move increment plus bonus time at a move count.
    MultiStage,
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerMode::SuddenDeath => write!(f, "sudden death"),
            TimerMode::SimpleDelay => write!(f, "simple delay"),
            TimerMode::BronsteinDelay => write!(f, "bronstein delay"),
            TimerMode::FischerIncrement => write!(f, "fischer increment"),
            TimerMode::MultiStage => write!(f, "multi-stage"),
        }
    }
}

/// Bonus time granted once a side completes a given number of moves.
///
/// Stages apply independently per side, keyed by that side's own
/// completed-move count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageBonus {
    /// The side's completed-move count that triggers this stage.
    pub after_moves: u32,
    /// Time added to the side's clock when the stage triggers.
    pub add: Duration,
}

/// Immutable description of a time control.
///
/// Exactly one of `delay` / `increment` / `stages` is semantically active per
/// mode; the others stay zero/empty and are ignored by the engine.
/// [`TimerConfig::validate`] rejects configs that break this invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    pub mode: TimerMode,
    /// Default allotment per side.
    pub base: Duration,
    /// Optional per-side overrides; win over `base` for that side only.
    pub white_base: Option<Duration>,
    pub black_base: Option<Duration>,
    /// Grace period (SimpleDelay) or refundable amount (BronsteinDelay).
    pub delay: Duration,
    /// Per-move bonus (FischerIncrement, MultiStage).
    pub increment: Duration,
    /// Ordered stage bonuses (MultiStage only).
    pub stages: Vec<StageBonus>,
}

impl TimerConfig {
    /// Resolve the starting allotment for one side, honoring per-side
    /// overrides. A single-side override leaves the other side on `base`.
    #[inline]
    pub fn base_for(&self, side: Side) -> Duration {
        match side {
            Side::White => self.white_base.unwrap_or(self.base),
            Side::Black => self.black_base.unwrap_or(self.base),
        }
    }

    /// Check mode/field consistency.
    ///
    /// A stage list on a non-multi-stage config (or similar cross-mode
    /// contamination) is a configuration bug and fails here, at build or
    /// initialize time, rather than surfacing mid-game.
    pub fn validate(&self) -> ClockResult<()> {
        let max = Duration::from_secs(MAX_BASE_MINUTES * 60);
        for side in Side::BOTH {
            let base = self.base_for(side);
            if base.is_zero() || base > max {
                return Err(ClockError::InvalidDuration {
                    minutes: base.as_secs() / 60,
                    max: MAX_BASE_MINUTES,
                });
            }
        }

        let mismatch = |what: &str| {
            Err(ClockError::ConfigMismatch(format!(
                "{} not applicable to {} control",
                what, self.mode
            )))
        };

        match self.mode {
            TimerMode::SuddenDeath => {
                if !self.delay.is_zero() {
                    return mismatch("delay");
                }
                if !self.increment.is_zero() {
                    return mismatch("increment");
                }
                if !self.stages.is_empty() {
                    return mismatch("stages");
                }
            }
            TimerMode::SimpleDelay | TimerMode::BronsteinDelay => {
                if !self.increment.is_zero() {
                    return mismatch("increment");
                }
                if !self.stages.is_empty() {
                    return mismatch("stages");
                }
            }
            TimerMode::FischerIncrement => {
                if !self.delay.is_zero() {
                    return mismatch("delay");
                }
                if !self.stages.is_empty() {
                    return mismatch("stages");
                }
            }
            TimerMode::MultiStage => {
                if !self.delay.is_zero() {
                    return mismatch("delay");
                }
                if self.stages.is_empty() {
                    return Err(ClockError::ConfigMismatch(
                        "multi-stage control requires at least one stage".into(),
                    ));
                }
                let mut prev = 0u32;
                for stage in &self.stages {
                    if stage.after_moves == 0 || stage.after_moves <= prev {
                        return Err(ClockError::ConfigMismatch(format!(
                            "stage move counts must be positive and strictly increasing \
                             (got {} after {})",
                            stage.after_moves, prev
                        )));
                    }
                    prev = stage.after_moves;
                }
            }
        }
        Ok(())
    }
}

/// User-supplied adjustments to a mode's defaults.
///
/// Stored by the host keyed per mode; every field is optional. Values are
/// clamped when stored *and* when read back into a config, so repeated edits
/// cannot drift outside range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeOverride {
    /// Overrides the base allotment for both sides.
    pub duration_minutes: Option<u64>,
    /// Per-side overrides; win over `duration_minutes`.
    pub white_minutes: Option<u64>,
    pub black_minutes: Option<u64>,
    /// Fischer / multi-stage per-move bonus.
    pub increment_seconds: Option<u64>,
    /// Simple-delay grace / Bronstein refund cap.
    pub delay_seconds: Option<u64>,
}

#[inline]
fn clamp_minutes(minutes: u64) -> u64 {
    minutes.clamp(MIN_BASE_MINUTES, MAX_BASE_MINUTES)
}

#[inline]
fn clamp_seconds(seconds: u64) -> u64 {
    seconds.min(MAX_ADJUST_SECONDS)
}

impl ModeOverride {
    /// Clamp every present field into its documented range.
    ///
    /// Idempotent: clamping a clamped override is a no-op.
    pub fn clamped(self) -> Self {
        ModeOverride {
            duration_minutes: self.duration_minutes.map(clamp_minutes),
            white_minutes: self.white_minutes.map(clamp_minutes),
            black_minutes: self.black_minutes.map(clamp_minutes),
            increment_seconds: self.increment_seconds.map(clamp_seconds),
            delay_seconds: self.delay_seconds.map(clamp_seconds),
        }
    }
}

/// Build a validated [`TimerConfig`] from a mode, a base allotment in
/// minutes, and optional user overrides.
///
/// Pure and deterministic. Fails with [`ClockError::InvalidDuration`] when
/// `base_minutes` is zero or above 24 hours. Override fields irrelevant to
/// the mode are ignored per the config invariant.
///
/// Multi-stage picks its template from the effective base: 60 minutes and up
/// gets the classical tournament format (90 min + 30s increment, +30 min at
/// move 40); anything shorter gets the rapid format (10s increment, half the
/// base added at move 30).
pub fn build_config(
    mode: TimerMode,
    base_minutes: u64,
    overrides: Option<&ModeOverride>,
) -> ClockResult<TimerConfig> {
    if base_minutes < MIN_BASE_MINUTES || base_minutes > MAX_BASE_MINUTES {
        return Err(ClockError::InvalidDuration {
            minutes: base_minutes,
            max: MAX_BASE_MINUTES,
        });
    }

    // Re-clamp on read-back; the host clamps on store but hand-built
    // overrides reach this path too.
    let ov = overrides.copied().unwrap_or_default().clamped();

    let effective_minutes = ov.duration_minutes.unwrap_or(base_minutes);
    let minutes = |m: u64| Duration::from_secs(m * 60);
    let seconds = Duration::from_secs;

    let white_base = ov.white_minutes.map(minutes);
    let black_base = ov.black_minutes.map(minutes);

    let config = match mode {
        TimerMode::SuddenDeath => TimerConfig {
            mode,
            base: minutes(effective_minutes),
            white_base,
            black_base,
            delay: Duration::ZERO,
            increment: Duration::ZERO,
            stages: Vec::new(),
        },
        TimerMode::SimpleDelay | TimerMode::BronsteinDelay => {
            let default = if mode == TimerMode::SimpleDelay {
                DEFAULT_SIMPLE_DELAY
            } else {
                DEFAULT_BRONSTEIN_DELAY
            };
            TimerConfig {
                mode,
                base: minutes(effective_minutes),
                white_base,
                black_base,
                delay: ov.delay_seconds.map(seconds).unwrap_or(default),
                increment: Duration::ZERO,
                stages: Vec::new(),
            }
        }
        TimerMode::FischerIncrement => TimerConfig {
            mode,
            base: minutes(effective_minutes),
            white_base,
            black_base,
            delay: Duration::ZERO,
            increment: ov
                .increment_seconds
                .map(seconds)
                .unwrap_or(DEFAULT_FISCHER_INCREMENT),
            stages: Vec::new(),
        },
        TimerMode::MultiStage => {
            let classical = effective_minutes >= MULTI_STAGE_CLASSICAL_THRESHOLD;
            let (base, increment, stage) = if classical {
                (
                    minutes(90),
                    seconds(30),
                    StageBonus {
                        after_moves: 40,
                        add: minutes(30),
                    },
                )
            } else {
                (
                    minutes(effective_minutes),
                    seconds(10),
                    StageBonus {
                        after_moves: 30,
                        // Half the base; computed in seconds so odd minute
                        // counts don't truncate to the minute.
                        add: Duration::from_secs(effective_minutes * 60 / 2),
                    },
                )
            };
            TimerConfig {
                mode,
                base,
                white_base,
                black_base,
                delay: Duration::ZERO,
                increment: ov.increment_seconds.map(seconds).unwrap_or(increment),
                stages: vec![stage],
            }
        }
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_out_of_range_base() {
        assert!(matches!(
            build_config(TimerMode::SuddenDeath, 0, None),
            Err(ClockError::InvalidDuration { .. })
        ));
        assert!(matches!(
            build_config(TimerMode::SuddenDeath, MAX_BASE_MINUTES + 1, None),
            Err(ClockError::InvalidDuration { .. })
        ));
        assert!(build_config(TimerMode::SuddenDeath, MAX_BASE_MINUTES, None).is_ok());
    }

    #[test]
    fn test_mode_defaults() {
        let sd = build_config(TimerMode::SimpleDelay, 15, None).unwrap();
        assert_eq!(sd.delay, DEFAULT_SIMPLE_DELAY);
        assert_eq!(sd.increment, Duration::ZERO);

        let br = build_config(TimerMode::BronsteinDelay, 15, None).unwrap();
        assert_eq!(br.delay, DEFAULT_BRONSTEIN_DELAY);

        let fi = build_config(TimerMode::FischerIncrement, 15, None).unwrap();
        assert_eq!(fi.increment, DEFAULT_FISCHER_INCREMENT);
        assert_eq!(fi.delay, Duration::ZERO);

        let plain = build_config(TimerMode::SuddenDeath, 15, None).unwrap();
        assert_eq!(plain.delay, Duration::ZERO);
        assert_eq!(plain.increment, Duration::ZERO);
        assert!(plain.stages.is_empty());
    }

    #[test]
    fn test_multi_stage_classical_template() {
        let cfg = build_config(TimerMode::MultiStage, 90, None).unwrap();
        assert_eq!(cfg.base, Duration::from_secs(90 * 60));
        assert_eq!(cfg.increment, Duration::from_secs(30));
        assert_eq!(
            cfg.stages,
            vec![StageBonus {
                after_moves: 40,
                add: Duration::from_secs(30 * 60),
            }]
        );

        // Exactly at the threshold still selects classical, and the base is
        // pinned to 90 minutes regardless of the requested base.
        let cfg = build_config(TimerMode::MultiStage, 60, None).unwrap();
        assert_eq!(cfg.base, Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_multi_stage_rapid_template() {
        let cfg = build_config(TimerMode::MultiStage, 15, None).unwrap();
        assert_eq!(cfg.base, Duration::from_secs(15 * 60));
        assert_eq!(cfg.increment, Duration::from_secs(10));
        // Half of 15 minutes is 7.5 minutes, exact in seconds.
        assert_eq!(
            cfg.stages,
            vec![StageBonus {
                after_moves: 30,
                add: Duration::from_secs(450),
            }]
        );
    }

    #[test]
    fn test_override_precedence() {
        let ov = ModeOverride {
            duration_minutes: Some(20),
            white_minutes: Some(10),
            ..Default::default()
        };
        let cfg = build_config(TimerMode::SuddenDeath, 15, Some(&ov)).unwrap();
        assert_eq!(cfg.base, Duration::from_secs(20 * 60));
        assert_eq!(cfg.base_for(Side::White), Duration::from_secs(10 * 60));
        // The un-overridden side falls back to the base, not to the other
        // side's override.
        assert_eq!(cfg.base_for(Side::Black), Duration::from_secs(20 * 60));
    }

    #[test]
    fn test_irrelevant_override_fields_ignored() {
        let ov = ModeOverride {
            delay_seconds: Some(30),
            increment_seconds: Some(30),
            ..Default::default()
        };
        let cfg = build_config(TimerMode::SuddenDeath, 15, Some(&ov)).unwrap();
        assert_eq!(cfg.delay, Duration::ZERO);
        assert_eq!(cfg.increment, Duration::ZERO);

        let cfg = build_config(TimerMode::FischerIncrement, 15, Some(&ov)).unwrap();
        assert_eq!(cfg.delay, Duration::ZERO);
        assert_eq!(cfg.increment, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_cross_mode_fields() {
        let mut cfg = build_config(TimerMode::SuddenDeath, 15, None).unwrap();
        cfg.stages.push(StageBonus {
            after_moves: 40,
            add: Duration::from_secs(60),
        });
        assert!(matches!(cfg.validate(), Err(ClockError::ConfigMismatch(_))));

        let mut cfg = build_config(TimerMode::MultiStage, 15, None).unwrap();
        cfg.stages.clear();
        assert!(matches!(cfg.validate(), Err(ClockError::ConfigMismatch(_))));

        let mut cfg = build_config(TimerMode::MultiStage, 15, None).unwrap();
        cfg.stages.push(StageBonus {
            after_moves: 10, // not increasing
            add: Duration::from_secs(60),
        });
        assert!(matches!(cfg.validate(), Err(ClockError::ConfigMismatch(_))));
    }

    proptest! {
        #[test]
        fn prop_clamping_is_idempotent(
            duration in proptest::option::of(0u64..10_000),
            white in proptest::option::of(0u64..10_000),
            black in proptest::option::of(0u64..10_000),
            inc in proptest::option::of(0u64..10_000),
            delay in proptest::option::of(0u64..10_000),
        ) {
            let ov = ModeOverride {
                duration_minutes: duration,
                white_minutes: white,
                black_minutes: black,
                increment_seconds: inc,
                delay_seconds: delay,
            };
            let once = ov.clamped();
            prop_assert_eq!(once, once.clamped());

            for m in [once.duration_minutes, once.white_minutes, once.black_minutes].into_iter().flatten() {
                prop_assert!((MIN_BASE_MINUTES..=MAX_BASE_MINUTES).contains(&m));
            }
            for s in [once.increment_seconds, once.delay_seconds].into_iter().flatten() {
                prop_assert!(s <= MAX_ADJUST_SECONDS);
            }
        }

        #[test]
        fn prop_built_configs_validate(
            minutes in 1u64..=1440,
            mode_ix in 0usize..5,
        ) {
            let mode = [
                TimerMode::SuddenDeath,
                TimerMode::SimpleDelay,
                TimerMode::BronsteinDelay,
                TimerMode::FischerIncrement,
                TimerMode::MultiStage,
            ][mode_ix];
            let cfg = build_config(mode, minutes, None).unwrap();
            prop_assert!(cfg.validate().is_ok());
        }
    }
}
