//! The alarm state machine.
//!
//! The engine never blocks. The main loop calls [`AlarmEngine::check`] and
//! [`AlarmEngine::ring_tick`] every tick and feeds it snooze and dismiss
//! requests as the inputs produce them.

use crate::settings::{ClockSettings, Period};

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use log::{debug, info};
use std::time::Duration;

/// The ramp stops adding steps once the volume is above this level.
pub const VOLUME_CEILING: u8 = 90;

const RAMP_EVERY: u32 = 10;
const VOLUME_STEP: u8 = 5;
const WINDOW_START: Duration = Duration::from_millis(2_000);
const WINDOW_STEP: Duration = Duration::from_millis(250);
const WINDOW_FLOOR: Duration = Duration::from_millis(500);

/// Offsets and delays the engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTimings {
    /// How far a wave gesture pushes the alarm back.
    pub snooze: TimeDelta,
    /// How far the encoder pushes the alarm back.
    pub micro_snooze: TimeDelta,
    /// How long after a snooze the alarm cannot ring.
    pub cooldown: Duration,
}

impl Default for AlarmTimings {
    fn default() -> Self {
        Self {
            snooze: TimeDelta::minutes(5),
            micro_snooze: TimeDelta::minutes(1),
            cooldown: Duration::from_secs(10),
        }
    }
}

/// Externally visible alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmStatus {
    /// Waiting for the fire time, not snoozed.
    Idle,
    /// Ringing until snoozed or dismissed.
    Ringing,
    /// Snoozed, waiting for the advanced fire time.
    Snoozed,
    /// Just snoozed; cannot ring until the cooldown ends.
    Cooldown,
}

/// A state change made by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    /// The fire time was reached.
    StartedRinging,
    /// Ringing stopped and the fire time moved back.
    Snoozed,
    /// The cooldown ran out.
    CooldownElapsed,
    /// The alarm was acknowledged and disarmed.
    Dismissed,
}

// =============================================================================
// Ring Urgency
// =============================================================================

/// The rising-urgency curve while ringing.
///
/// Every tenth ring iteration the volume rises by a step while it is at or
/// below [`VOLUME_CEILING`], and the time between iterations shrinks from 2 s
/// toward a 0.5 s floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingUrgency {
    iterations: u32,
    volume_boost: u8,
    window: Duration,
}

impl RingUrgency {
    fn new() -> Self {
        Self {
            iterations: 0,
            volume_boost: 0,
            window: WINDOW_START,
        }
    }

    fn advance(&mut self, base_volume: u8) {
        self.iterations += 1;
        if self.iterations % RAMP_EVERY == 0 {
            if base_volume.saturating_add(self.volume_boost) <= VOLUME_CEILING {
                self.volume_boost += VOLUME_STEP;
            }
            self.window = self.window.saturating_sub(WINDOW_STEP).max(WINDOW_FLOOR);
        }
    }

    /// Ring iterations so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Volume for `base_volume` with the current boost.
    pub fn volume(&self, base_volume: u8) -> u8 {
        base_volume.saturating_add(self.volume_boost)
    }

    /// Time until the next ring iteration.
    pub fn window(&self) -> Duration {
        self.window
    }
}

// =============================================================================
// Alarm Engine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Ringing {
        urgency: RingUrgency,
        next_iteration: Option<Duration>,
        due: NaiveDateTime,
    },
    Cooldown {
        until: Duration,
    },
}

/// Tracks ringing, snooze and cooldown for the single alarm.
///
/// A pending snooze is kept as a full date and time, so a snooze that
/// crosses midnight or noon still waits for the right moment.
#[derive(Debug, Clone)]
pub struct AlarmEngine {
    timings: AlarmTimings,
    phase: Phase,
    snoozed_until: Option<NaiveDateTime>,
    fire_time: NaiveTime,
}

impl AlarmEngine {
    /// Create an idle engine that fires at `fire_time`.
    pub fn new(timings: AlarmTimings, fire_time: NaiveTime) -> Self {
        Self {
            timings,
            phase: Phase::Idle,
            snoozed_until: None,
            fire_time,
        }
    }

    /// Current state.
    pub fn status(&self) -> AlarmStatus {
        match self.phase {
            Phase::Ringing { .. } => AlarmStatus::Ringing,
            Phase::Cooldown { .. } => AlarmStatus::Cooldown,
            Phase::Idle if self.snoozed_until.is_some() => AlarmStatus::Snoozed,
            Phase::Idle => AlarmStatus::Idle,
        }
    }

    /// Whether the alarm is ringing.
    pub fn is_ringing(&self) -> bool {
        matches!(self.phase, Phase::Ringing { .. })
    }

    /// Whether a snooze is pending.
    pub fn is_snoozed(&self) -> bool {
        self.snoozed_until.is_some()
    }

    /// Whether a button press should dismiss rather than navigate.
    pub fn is_active(&self) -> bool {
        self.is_ringing() || self.is_snoozed()
    }

    /// When the alarm next fires, including snooze offsets.
    pub fn fire_time(&self) -> NaiveTime {
        self.fire_time
    }

    /// Urgency of the current ring, if ringing.
    pub fn urgency(&self) -> Option<RingUrgency> {
        match self.phase {
            Phase::Ringing { urgency, .. } => Some(urgency),
            _ => None,
        }
    }

    /// Move the fire time after the alarm time was edited.
    ///
    /// A pending snooze is dropped; the edited time takes over.
    pub fn set_fire_time(&mut self, fire_time: NaiveTime) {
        if self.snoozed_until.take().is_some() {
            debug!("alarm edited, pending snooze dropped");
        }
        self.fire_time = fire_time;
    }

    /// Return to idle with a fresh fire time, dropping any ring or snooze.
    pub fn reset(&mut self, fire_time: NaiveTime) {
        if self.phase != Phase::Idle || self.is_snoozed() {
            debug!("alarm reset to idle");
        }
        self.phase = Phase::Idle;
        self.snoozed_until = None;
        self.fire_time = fire_time;
    }

    /// Re-evaluate the fire condition.
    ///
    /// Starts ringing when the alarm is armed, the period of `now` matches the
    /// configured period and `now` is at or past the fire time. A snoozed
    /// alarm instead rings once `now` reaches the snooze date and time. Does
    /// nothing while ringing. While cooling down only the cooldown deadline
    /// is checked; the fire condition is looked at again on the next call.
    pub fn check(
        &mut self,
        now: NaiveDateTime,
        monotonic: Duration,
        settings: &ClockSettings,
    ) -> Option<AlarmTransition> {
        match self.phase {
            Phase::Ringing { .. } => None,
            Phase::Cooldown { until } => {
                if monotonic >= until {
                    self.phase = Phase::Idle;
                    debug!("snooze cooldown over, alarm at {}", self.fire_time);
                    Some(AlarmTransition::CooldownElapsed)
                } else {
                    None
                }
            }
            Phase::Idle => {
                let ready = match self.snoozed_until {
                    Some(until) => now >= until,
                    None => {
                        Period::of(&now) == settings.period && now.time() >= self.fire_time
                    }
                };
                if !settings.alarm_enabled || !ready {
                    return None;
                }
                info!("alarm ringing at {} (fire time {})", now.time(), self.fire_time);
                let due = self
                    .snoozed_until
                    .take()
                    .unwrap_or_else(|| now.date().and_time(self.fire_time));
                self.phase = Phase::Ringing {
                    urgency: RingUrgency::new(),
                    next_iteration: None,
                    due,
                };
                Some(AlarmTransition::StartedRinging)
            }
        }
    }

    /// Advance the ring schedule.
    ///
    /// Returns the volume to play at when a new ring iteration starts.
    pub fn ring_tick(&mut self, monotonic: Duration, base_volume: u8) -> Option<u8> {
        let Phase::Ringing {
            urgency,
            next_iteration,
            ..
        } = &mut self.phase
        else {
            return None;
        };
        if next_iteration.is_some_and(|next| monotonic < next) {
            return None;
        }
        urgency.advance(base_volume);
        *next_iteration = Some(monotonic + urgency.window());
        debug!(
            "ring iteration {}: volume {}, window {:?}",
            urgency.iterations(),
            urgency.volume(base_volume),
            urgency.window()
        );
        Some(urgency.volume(base_volume))
    }

    fn snooze_by(&mut self, offset: TimeDelta, monotonic: Duration) -> Option<AlarmTransition> {
        let Phase::Ringing { due, .. } = self.phase else {
            return None;
        };
        let until = due + offset;
        self.fire_time = until.time();
        self.snoozed_until = Some(until);
        self.phase = Phase::Cooldown {
            until: monotonic + self.timings.cooldown,
        };
        info!(
            "alarm snoozed until {until}, cooling down for {:?}",
            self.timings.cooldown
        );
        Some(AlarmTransition::Snoozed)
    }

    /// Snooze after a wave gesture. Only acts while ringing.
    pub fn snooze(&mut self, monotonic: Duration) -> Option<AlarmTransition> {
        self.snooze_by(self.timings.snooze, monotonic)
    }

    /// Encoder input while the alarm is active.
    ///
    /// While ringing this is a micro-snooze; once snoozed it dismisses.
    pub fn nudge(
        &mut self,
        monotonic: Duration,
        settings: &mut ClockSettings,
    ) -> Option<AlarmTransition> {
        if self.is_ringing() {
            self.snooze_by(self.timings.micro_snooze, monotonic)
        } else {
            self.dismiss(settings)
        }
    }

    /// Stop a ringing or snoozed alarm and disarm it.
    pub fn dismiss(&mut self, settings: &mut ClockSettings) -> Option<AlarmTransition> {
        if !self.is_active() {
            return None;
        }
        settings.alarm_enabled = false;
        self.reset(settings.fire_time());
        info!("alarm dismissed");
        Some(AlarmTransition::Dismissed)
    }
}
