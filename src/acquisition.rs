//! Acquisition state machine.
//!
//! This module provides [`AcquisitionMachine`], which owns the analog front
//! end and the state that the hardware would otherwise keep implicitly in
//! registers: whether the rail is up and whether a conversion is in flight.
//!
//! # Cycle
//!
//! ```text
//!            tick                      rail already up
//!  Idle ───────────▶ check rail ──────────────────────────┐
//!                        │ rail off                       │
//!                        ▼                                ▼
//!                  PowerWarmup ── poll until enabled ──▶ configure + start
//!                                                         │
//!                                                         ▼
//!  Idle ◀──────────── take_sample (slow path) ◀──────── Armed
//! ```
//!
//! The rail is enabled at most once in steady state: every tick checks the
//! hardware first and only issues an enable request when the rail is off.
//! Configuration and start run on every accepted tick.
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::acquisition::{AcquisitionMachine, AcquisitionState, TickOutcome};
//! use supply_monitor::hal::MockAnalog;
//!
//! let analog = MockAnalog::new().with_ready_after(3).with_samples(&[512]);
//! let mut machine = AcquisitionMachine::new(analog);
//!
//! let outcome = machine.on_tick().unwrap();
//! assert_eq!(outcome, TickOutcome::Armed { powered_up: true });
//! assert_eq!(machine.state(), AcquisitionState::Armed);
//!
//! // Interrupt fires, deferred handler reads the sample
//! machine.latch_completion();
//! assert_eq!(machine.take_sample().unwrap(), Some(512));
//! assert_eq!(machine.state(), AcquisitionState::Idle);
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

use crate::config::{MonitorConfig, OverlapPolicy, RailWait};
use crate::traits::{AnalogFrontEnd, ConversionRequest, RailParams};

/// Power state of the analog rail as last observed by the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RailState {
    /// Rail off (initial state, or after a failed power-up).
    #[default]
    Disabled,
    /// Enable requested, not yet reported stable.
    Enabling,
    /// Rail reported enabled; conversions may be armed.
    Stable,
}

/// Position of the machine within one acquisition cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AcquisitionState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// Rail enable requested, waiting for it to stabilize.
    PowerWarmup,
    /// Conversion started, waiting for the completion interrupt.
    Armed,
}

/// Result of handling one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A conversion was started.
    Armed {
        /// True if the rail had to be powered up this tick.
        powered_up: bool,
    },
    /// The previous conversion was still armed and the tick was dropped.
    Overlapped,
}

/// Errors surfaced by the acquisition machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcquisitionError<E> {
    /// The analog front end reported an error.
    Hardware(E),
    /// The rail never reported enabled within the configured poll budget.
    RailNeverStabilized {
        /// Status polls issued before giving up.
        polls: u32,
    },
}

impl<E: core::fmt::Debug> core::fmt::Display for AcquisitionError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "analog hardware error: {:?}", e),
            Self::RailNeverStabilized { polls } => {
                write!(f, "analog rail not stable after {} polls", polls)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for AcquisitionError<E> {}

/// Counters kept across cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionStats {
    /// Conversions started.
    pub cycles: u32,
    /// Samples read by the slow path.
    pub samples: u32,
    /// Rail power-ups completed.
    pub power_ups: u32,
    /// Ticks that arrived while a conversion was still armed.
    pub overlaps: u32,
    /// Slow-path calls with no matching armed, latched conversion.
    pub stray_completions: u32,
}

/// Acquisition state machine.
///
/// Owns the analog front end. The runtime calls [`on_tick`](Self::on_tick)
/// once per period, [`latch_completion`](Self::latch_completion) from the
/// interrupt fast path, and [`take_sample`](Self::take_sample) from the
/// deferred slow path.
///
/// # Type Parameter
///
/// - `A`: The analog front end implementation ([`AnalogFrontEnd`] trait)
pub struct AcquisitionMachine<A: AnalogFrontEnd> {
    analog: A,
    rail_params: RailParams,
    request: ConversionRequest,
    rail_wait: RailWait,
    overlap: OverlapPolicy,
    state: AcquisitionState,
    rail: RailState,
    // Written by the fast path; load/store only so targets without CAS work.
    completion: AtomicBool,
    consecutive_overlaps: u32,
    stats: AcquisitionStats,
}

impl<A: AnalogFrontEnd> AcquisitionMachine<A> {
    /// Create a machine with the default configuration
    pub fn new(analog: A) -> Self {
        Self::with_config(analog, &MonitorConfig::default())
    }

    /// Create a machine from a monitor configuration
    pub fn with_config(analog: A, config: &MonitorConfig) -> Self {
        Self {
            analog,
            rail_params: config.rail,
            request: config.conversion.request(),
            rail_wait: config.acquisition.rail_wait,
            overlap: config.acquisition.overlap,
            state: AcquisitionState::Idle,
            rail: RailState::Disabled,
            completion: AtomicBool::new(false),
            consecutive_overlaps: 0,
            stats: AcquisitionStats::default(),
        }
    }

    /// Handle one periodic tick.
    ///
    /// Powers the rail if needed, then configures and starts a conversion.
    /// On error the machine returns to [`AcquisitionState::Idle`] so the next
    /// tick starts over.
    pub fn on_tick(&mut self) -> Result<TickOutcome, AcquisitionError<A::Error>> {
        if self.state == AcquisitionState::Armed {
            self.stats.overlaps = self.stats.overlaps.wrapping_add(1);
            self.consecutive_overlaps = self.consecutive_overlaps.saturating_add(1);
            let rearm = match self.overlap {
                OverlapPolicy::Ignore => false,
                OverlapPolicy::Rearm => true,
                OverlapPolicy::RearmAfter(limit) => self.consecutive_overlaps >= limit,
            };
            if !rearm {
                warn!(
                    "tick while conversion still armed, dropping ({} in a row)",
                    self.consecutive_overlaps
                );
                return Ok(TickOutcome::Overlapped);
            }
            warn!(
                "tick while conversion still armed, re-arming ({} in a row)",
                self.consecutive_overlaps
            );
        }

        match self.run_cycle() {
            Ok(powered_up) => Ok(TickOutcome::Armed { powered_up }),
            Err(e) => {
                self.state = AcquisitionState::Idle;
                if self.rail == RailState::Enabling {
                    self.rail = RailState::Disabled;
                }
                Err(e)
            }
        }
    }

    fn run_cycle(&mut self) -> Result<bool, AcquisitionError<A::Error>> {
        let powered_up = self.ensure_rail()?;

        self.analog
            .configure_adc(self.request)
            .map_err(AcquisitionError::Hardware)?;

        // Clear before starting so a fast completion is not lost.
        self.completion.store(false, Ordering::Release);
        self.analog
            .start_conversion()
            .map_err(AcquisitionError::Hardware)?;

        self.state = AcquisitionState::Armed;
        self.consecutive_overlaps = 0;
        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        debug!("conversion armed (cycle {})", self.stats.cycles);
        Ok(powered_up)
    }

    /// Returns true if the rail had to be powered up.
    fn ensure_rail(&mut self) -> Result<bool, AcquisitionError<A::Error>> {
        if self
            .analog
            .is_rail_enabled()
            .map_err(AcquisitionError::Hardware)?
        {
            self.rail = RailState::Stable;
            return Ok(false);
        }

        if self.rail == RailState::Stable {
            warn!("analog rail dropped out, re-enabling");
            self.rail = RailState::Disabled;
        }

        self.analog
            .enable_analog_rail(self.rail_params)
            .map_err(AcquisitionError::Hardware)?;
        self.rail = RailState::Enabling;
        self.state = AcquisitionState::PowerWarmup;

        let polls = self.wait_for_rail()?;
        self.rail = RailState::Stable;
        self.stats.power_ups = self.stats.power_ups.wrapping_add(1);
        info!("analog rail stable after {} polls", polls);
        Ok(true)
    }

    fn wait_for_rail(&mut self) -> Result<u32, AcquisitionError<A::Error>> {
        let mut polls: u32 = 0;
        loop {
            polls = polls.saturating_add(1);
            if self
                .analog
                .is_rail_enabled()
                .map_err(AcquisitionError::Hardware)?
            {
                return Ok(polls);
            }
            if let RailWait::Polls(limit) = self.rail_wait {
                if polls >= limit {
                    error!("analog rail not stable after {} polls", polls);
                    return Err(AcquisitionError::RailNeverStabilized { polls });
                }
            }
            core::hint::spin_loop();
        }
    }

    /// Record that the completion interrupt fired. Interrupt-safe.
    #[inline]
    pub fn latch_completion(&self) {
        self.completion.store(true, Ordering::Release);
    }

    /// Returns true if a completion has been latched and not yet consumed.
    #[inline]
    pub fn completion_pending(&self) -> bool {
        self.completion.load(Ordering::Acquire)
    }

    /// Read the sample for the armed conversion.
    ///
    /// Returns `Ok(None)` without touching the hardware unless the machine is
    /// armed and a completion has been latched. A successful call ends the
    /// cycle; so does a failed read.
    pub fn take_sample(&mut self) -> Result<Option<u16>, AcquisitionError<A::Error>> {
        if self.state != AcquisitionState::Armed || !self.completion_pending() {
            self.stats.stray_completions = self.stats.stray_completions.wrapping_add(1);
            warn!(
                "completion without armed conversion (state {:?}), ignoring",
                self.state
            );
            return Ok(None);
        }

        self.completion.store(false, Ordering::Release);
        self.state = AcquisitionState::Idle;

        let raw = self
            .analog
            .read_raw_sample()
            .map_err(AcquisitionError::Hardware)?;
        self.stats.samples = self.stats.samples.wrapping_add(1);
        Ok(Some(raw))
    }

    /// Current cycle state
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Last observed rail state
    pub fn rail_state(&self) -> RailState {
        self.rail
    }

    /// Check if a conversion is in flight
    pub fn is_armed(&self) -> bool {
        self.state == AcquisitionState::Armed
    }

    /// Counters since construction
    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    /// Shared access to the analog front end
    pub fn analog(&self) -> &A {
        &self.analog
    }

    /// Exclusive access to the analog front end
    pub fn analog_mut(&mut self) -> &mut A {
        &mut self.analog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AcquisitionConfig;
    use crate::hal::MockAnalog;

    fn machine_with(
        analog: MockAnalog,
        acquisition: AcquisitionConfig,
    ) -> AcquisitionMachine<MockAnalog> {
        let config = MonitorConfig::default().with_acquisition(acquisition);
        AcquisitionMachine::with_config(analog, &config)
    }

    #[test]
    fn initial_state() {
        let machine = AcquisitionMachine::new(MockAnalog::new());
        assert_eq!(machine.state(), AcquisitionState::Idle);
        assert_eq!(machine.rail_state(), RailState::Disabled);
        assert!(!machine.completion_pending());
        assert_eq!(machine.stats(), AcquisitionStats::default());
    }

    #[test]
    fn first_tick_powers_rail_and_arms() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_ready_after(5));

        let outcome = machine.on_tick().unwrap();

        assert_eq!(outcome, TickOutcome::Armed { powered_up: true });
        assert_eq!(machine.state(), AcquisitionState::Armed);
        assert_eq!(machine.rail_state(), RailState::Stable);
        assert_eq!(machine.analog().enable_calls, 1);
        assert_eq!(machine.analog().enabled_with, Some(RailParams::default()));
        assert_eq!(machine.analog().start_calls, 1);
        assert_eq!(machine.analog().starts_while_rail_off, 0);
        assert_eq!(machine.stats().power_ups, 1);
        assert_eq!(machine.stats().cycles, 1);
    }

    #[test]
    fn configures_supply_single_shot() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.on_tick().unwrap();
        assert_eq!(
            machine.analog().last_request,
            Some(ConversionRequest::supply_voltage())
        );
    }

    #[test]
    fn stable_rail_is_not_re_enabled() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_ready_after(2));

        for _ in 0..5 {
            machine.on_tick().unwrap();
            machine.latch_completion();
            machine.take_sample().unwrap();
        }

        assert_eq!(machine.analog().enable_calls, 1);
        assert_eq!(machine.analog().configure_calls, 5);
        assert_eq!(machine.analog().start_calls, 5);
        assert_eq!(machine.stats().power_ups, 1);
    }

    #[test]
    fn later_ticks_report_no_power_up() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.on_tick().unwrap();
        machine.latch_completion();
        machine.take_sample().unwrap();

        let outcome = machine.on_tick().unwrap();
        assert_eq!(outcome, TickOutcome::Armed { powered_up: false });
    }

    #[test]
    fn rail_already_on_skips_enable() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_rail_on());
        let outcome = machine.on_tick().unwrap();
        assert_eq!(outcome, TickOutcome::Armed { powered_up: false });
        assert_eq!(machine.analog().enable_calls, 0);
        assert_eq!(machine.rail_state(), RailState::Stable);
    }

    #[test]
    fn rail_timeout_returns_error_and_resets() {
        let analog = MockAnalog::new().with_ready_after(1_000);
        let mut machine = machine_with(
            analog,
            AcquisitionConfig::default().with_rail_wait(RailWait::Polls(10)),
        );

        let err = machine.on_tick().unwrap_err();

        assert_eq!(err, AcquisitionError::RailNeverStabilized { polls: 10 });
        assert_eq!(machine.state(), AcquisitionState::Idle);
        assert_eq!(machine.rail_state(), RailState::Disabled);
        assert_eq!(machine.analog().start_calls, 0);
        assert_eq!(machine.analog().configure_calls, 0);
    }

    #[test]
    fn unbounded_wait_eventually_arms() {
        let analog = MockAnalog::new().with_ready_after(50_000);
        let mut machine = machine_with(
            analog,
            AcquisitionConfig::default().with_rail_wait(RailWait::Unbounded),
        );

        assert!(machine.on_tick().is_ok());
        assert!(machine.is_armed());
    }

    #[test]
    fn overlapping_tick_dropped_by_default() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.on_tick().unwrap();

        let outcome = machine.on_tick().unwrap();

        assert_eq!(outcome, TickOutcome::Overlapped);
        assert_eq!(machine.state(), AcquisitionState::Armed);
        assert_eq!(machine.analog().start_calls, 1);
        assert_eq!(machine.stats().overlaps, 1);
    }

    #[test]
    fn overlapping_tick_keeps_latched_completion() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_samples(&[100]));
        machine.on_tick().unwrap();
        machine.latch_completion();

        machine.on_tick().unwrap();

        assert!(machine.completion_pending());
        assert_eq!(machine.take_sample().unwrap(), Some(100));
    }

    #[test]
    fn overlapping_tick_rearms_with_rearm_policy() {
        let mut machine = machine_with(
            MockAnalog::new(),
            AcquisitionConfig::default().with_overlap(OverlapPolicy::Rearm),
        );
        machine.on_tick().unwrap();
        machine.latch_completion();

        let outcome = machine.on_tick().unwrap();

        assert_eq!(outcome, TickOutcome::Armed { powered_up: false });
        assert_eq!(machine.analog().start_calls, 2);
        assert!(!machine.completion_pending());
        assert_eq!(machine.stats().overlaps, 1);
    }

    #[test]
    fn take_sample_requires_latched_completion() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_samples(&[7]));
        machine.on_tick().unwrap();

        assert_eq!(machine.take_sample().unwrap(), None);
        assert_eq!(machine.analog().read_calls, 0);
        assert!(machine.is_armed());

        machine.latch_completion();
        assert_eq!(machine.take_sample().unwrap(), Some(7));
        assert_eq!(machine.analog().read_calls, 1);
    }

    #[test]
    fn take_sample_when_idle_is_stray() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.latch_completion();

        assert_eq!(machine.take_sample().unwrap(), None);
        assert_eq!(machine.analog().read_calls, 0);
        assert_eq!(machine.stats().stray_completions, 1);
    }

    #[test]
    fn sample_consumed_exactly_once() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_samples(&[1, 2]));
        machine.on_tick().unwrap();
        machine.latch_completion();

        assert_eq!(machine.take_sample().unwrap(), Some(1));
        machine.latch_completion();
        assert_eq!(machine.take_sample().unwrap(), None);
        assert_eq!(machine.analog().read_calls, 1);
        assert_eq!(machine.stats().samples, 1);
    }

    #[test]
    fn rail_dropout_is_re_enabled() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.on_tick().unwrap();
        machine.latch_completion();
        machine.take_sample().unwrap();

        machine.analog_mut().drop_rail();
        let outcome = machine.on_tick().unwrap();

        assert_eq!(outcome, TickOutcome::Armed { powered_up: true });
        assert_eq!(machine.analog().enable_calls, 2);
        assert_eq!(machine.analog().starts_while_rail_off, 0);
    }

    #[test]
    fn failed_re_enable_after_dropout_reports_rail_off() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().with_rail_on().fail_enable());
        machine.on_tick().unwrap();
        machine.latch_completion();
        machine.take_sample().unwrap();
        assert_eq!(machine.rail_state(), RailState::Stable);

        machine.analog_mut().drop_rail();
        let err = machine.on_tick().unwrap_err();

        assert_eq!(err, AcquisitionError::Hardware(()));
        assert_eq!(machine.rail_state(), RailState::Disabled);
        assert_eq!(machine.state(), AcquisitionState::Idle);
    }

    #[test]
    fn stalled_conversion_rearmed_after_limit() {
        let mut machine = machine_with(
            MockAnalog::new(),
            AcquisitionConfig::default().with_overlap(OverlapPolicy::RearmAfter(3)),
        );
        machine.on_tick().unwrap();

        // Completion interrupt never arrives
        assert_eq!(machine.on_tick().unwrap(), TickOutcome::Overlapped);
        assert_eq!(machine.on_tick().unwrap(), TickOutcome::Overlapped);
        assert_eq!(
            machine.on_tick().unwrap(),
            TickOutcome::Armed { powered_up: false }
        );
        assert_eq!(machine.analog().start_calls, 2);
        assert_eq!(machine.stats().overlaps, 3);

        // The run of overlaps starts over once re-armed
        assert_eq!(machine.on_tick().unwrap(), TickOutcome::Overlapped);
    }

    #[test]
    fn ignore_policy_never_rearms() {
        let mut machine = machine_with(
            MockAnalog::new(),
            AcquisitionConfig::default().with_overlap(OverlapPolicy::Ignore),
        );
        machine.on_tick().unwrap();

        for _ in 0..20 {
            assert_eq!(machine.on_tick().unwrap(), TickOutcome::Overlapped);
        }
        assert_eq!(machine.analog().start_calls, 1);
    }

    #[test]
    fn counters_wrap_instead_of_overflowing() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new());
        machine.stats = AcquisitionStats {
            cycles: u32::MAX,
            samples: u32::MAX,
            power_ups: u32::MAX,
            overlaps: u32::MAX,
            stray_completions: u32::MAX,
        };

        machine.take_sample().unwrap();
        machine.on_tick().unwrap();
        machine.on_tick().unwrap();
        machine.latch_completion();
        machine.take_sample().unwrap();

        assert_eq!(
            machine.stats(),
            AcquisitionStats {
                cycles: 0,
                samples: 0,
                power_ups: 0,
                overlaps: 0,
                stray_completions: 0,
            }
        );
    }

    #[test]
    fn hardware_error_on_start_returns_to_idle() {
        let mut machine = AcquisitionMachine::new(MockAnalog::new().fail_start());

        let err = machine.on_tick().unwrap_err();

        assert_eq!(err, AcquisitionError::Hardware(()));
        assert_eq!(machine.state(), AcquisitionState::Idle);
        assert_eq!(machine.rail_state(), RailState::Stable);
        assert_eq!(machine.stats().cycles, 0);
    }

    #[test]
    fn error_display() {
        let err: AcquisitionError<()> = AcquisitionError::RailNeverStabilized { polls: 3 };
        assert_eq!(format!("{}", err), "analog rail not stable after 3 polls");

        let err: AcquisitionError<&str> = AcquisitionError::Hardware("bus");
        assert_eq!(format!("{}", err), "analog hardware error: \"bus\"");
    }
}
