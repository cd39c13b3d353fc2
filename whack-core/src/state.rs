//! Actor state: phase, gaze and the deadlines that drive decay.
//!
//! All transitions live here as plain methods over `ActorState` so the two
//! actor tasks only have to take the lock, call one method and let go.
//! Deadlines are only meaningful while their phase is active; they are left
//! stale afterwards and every check is gated on the phase.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Coarse state of a gopher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Hidden in the hole.
    Resting,
    /// Peeking out, looking around.
    Alert,
    /// Hit by the hammer, temporarily out.
    Stunned,
}

/// Which way the gopher is looking. Anything but `Closed` implies `Phase::Alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gaze {
    Closed,
    Left,
    Right,
}

impl Gaze {
    /// Uniform pick between `Left` and `Right`.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Gaze::Left
        } else {
            Gaze::Right
        }
    }
}

/// Durations that shape an actor's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Poll interval of both actor tasks
    pub tick: Duration,
    /// How long a strike keeps the actor stunned
    pub stun: Duration,
    /// Shortest possible alert
    pub alert_min: Duration,
    /// Alert lasts `alert_min + U[0, alert_jitter)`
    pub alert_jitter: Duration,
    /// Next gaze roll lands within `U[0, gaze_roll_max)`
    pub gaze_roll_max: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            stun: Duration::from_millis(500),
            alert_min: Duration::from_millis(100),
            alert_jitter: Duration::from_millis(2000),
            gaze_roll_max: Duration::from_millis(500),
        }
    }
}

impl Timing {
    fn alert_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.alert_min + jitter(rng, self.alert_jitter)
    }

    fn gaze_roll_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        jitter(rng, self.gaze_roll_max)
    }
}

/// Millisecond-granular `U[0, max)`; zero when `max` is under a millisecond.
fn jitter<R: Rng + ?Sized>(rng: &mut R, max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.random_range(0..max_ms))
}

/// Outcome of one decay step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decay {
    /// Nothing was due.
    Idle,
    /// Stun wore off, back to resting.
    Recovered,
    /// Alert timed out, back to resting.
    Hid,
    /// Still alert, gaze re-rolled.
    GazeRolled(Gaze),
}

/// What a renderer needs to draw one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub phase: Phase,
    pub gaze: Gaze,
}

impl Default for ActorSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Resting,
            gaze: Gaze::Closed,
        }
    }
}

/// Everything guarded by an actor's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorState {
    phase: Phase,
    gaze: Gaze,
    stunned_until: Instant,
    alert_until: Instant,
    gaze_roll_at: Instant,
}

impl ActorState {
    /// A resting actor with closed eyes. Deadlines start at `now` and stay
    /// unused until a phase arms them.
    pub fn new(now: Instant) -> Self {
        Self {
            phase: Phase::Resting,
            gaze: Gaze::Closed,
            stunned_until: now,
            alert_until: now,
            gaze_roll_at: now,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gaze(&self) -> Gaze {
        self.gaze
    }

    pub fn stunned_until(&self) -> Instant {
        self.stunned_until
    }

    pub fn alert_until(&self) -> Instant {
        self.alert_until
    }

    pub fn gaze_roll_at(&self) -> Instant {
        self.gaze_roll_at
    }

    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            phase: self.phase,
            gaze: self.gaze,
        }
    }

    /// Apply a hammer hit. A resting gopher cannot be hit; returns whether
    /// the state changed.
    pub fn strike(&mut self, now: Instant, timing: &Timing) -> bool {
        if self.phase == Phase::Resting {
            return false;
        }
        self.phase = Phase::Stunned;
        self.gaze = Gaze::Closed;
        self.stunned_until = now + timing.stun;
        true
    }

    /// Apply a poke. Only a resting gopher reacts; returns whether the state
    /// changed.
    pub fn poke<R: Rng + ?Sized>(&mut self, now: Instant, timing: &Timing, rng: &mut R) -> bool {
        if self.phase != Phase::Resting {
            return false;
        }
        self.phase = Phase::Alert;
        self.gaze = Gaze::roll(rng);
        self.gaze_roll_at = now + timing.gaze_roll_delay(rng);
        self.alert_until = now + timing.alert_duration(rng);
        true
    }

    /// Whether [`decay`](Self::decay) would change anything at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.phase {
            Phase::Resting => false,
            Phase::Stunned => now >= self.stunned_until,
            Phase::Alert => now >= self.alert_until || now >= self.gaze_roll_at,
        }
    }

    /// Apply whatever time-driven transition is due at `now`.
    pub fn decay<R: Rng + ?Sized>(&mut self, now: Instant, timing: &Timing, rng: &mut R) -> Decay {
        match self.phase {
            Phase::Stunned if now >= self.stunned_until => {
                self.phase = Phase::Resting;
                Decay::Recovered
            }
            Phase::Alert if now >= self.alert_until => {
                self.phase = Phase::Resting;
                self.gaze = Gaze::Closed;
                Decay::Hid
            }
            Phase::Alert if now >= self.gaze_roll_at => {
                self.gaze = Gaze::roll(rng);
                self.gaze_roll_at = now + timing.gaze_roll_delay(rng);
                Decay::GazeRolled(self.gaze)
            }
            _ => Decay::Idle,
        }
    }

    /// `gaze != Closed` implies `phase == Alert`.
    pub fn is_consistent(&self) -> bool {
        self.gaze == Gaze::Closed || self.phase == Phase::Alert
    }
}
