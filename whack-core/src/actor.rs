//! Actor - one gopher and its pair of tasks
//!
//! ## Tasks
//!
//! - **Event task**: each tick, takes at most one stimulus. A pending strike
//!   wins over a pending poke; the other stays queued for a later tick.
//! - **Decay task**: each tick, times out stuns and alerts and re-rolls the
//!   gaze while alert.
//!
//! Both tasks run on their own tokio interval and share one
//! `RwLock<ActorState>`. The lock is only held for a single in-memory
//! transition, never across an await point. Cancellation is checked at the
//! top of every tick and while waiting for the next one, so an in-flight
//! tick always completes.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace};

use crate::mailbox::{mailbox, MailboxClosed, MailboxReceiver, MailboxSender, Stimulus};
use crate::state::{ActorSnapshot, ActorState, Decay, Gaze, Phase, Timing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    #[error("actor {0} was already started")]
    AlreadyStarted(usize),
    #[error("actor has stopped; {0} was not delivered")]
    Stopped(Stimulus),
}

impl From<MailboxClosed> for ActorError {
    fn from(value: MailboxClosed) -> Self {
        Self::Stopped(value.0)
    }
}

type SharedState = Arc<RwLock<ActorState>>;

// Critical sections are single field assignments, so a poisoned lock still
// holds a consistent state.
fn read(state: &RwLock<ActorState>) -> RwLockReadGuard<'_, ActorState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(state: &RwLock<ActorState>) -> RwLockWriteGuard<'_, ActorState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Consumer ends of both mailboxes, handed to the event task on start.
#[derive(Debug)]
struct Mailboxes {
    strike: MailboxReceiver,
    poke: MailboxReceiver,
}

/// One gopher.
#[derive(Debug)]
pub struct Actor {
    id: usize,
    timing: Timing,
    state: SharedState,
    strike_tx: MailboxSender,
    poke_tx: MailboxSender,
    mailboxes: Mutex<Option<Mailboxes>>,
    cancel: OnceLock<CancellationToken>,
    tracker: TaskTracker,
}

impl Actor {
    pub fn new(id: usize, timing: Timing) -> Self {
        let (strike_tx, strike) = mailbox(Stimulus::Strike);
        let (poke_tx, poke) = mailbox(Stimulus::Poke);
        Self {
            id,
            timing,
            state: Arc::new(RwLock::new(ActorState::new(Instant::now()))),
            strike_tx,
            poke_tx,
            mailboxes: Mutex::new(Some(Mailboxes { strike, poke })),
            cancel: OnceLock::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        read(&self.state).phase()
    }

    pub fn current_gaze(&self) -> Gaze {
        read(&self.state).gaze()
    }

    /// Phase and gaze from one lock acquisition.
    pub fn snapshot(&self) -> ActorSnapshot {
        read(&self.state).snapshot()
    }

    /// Copy of the whole guarded state, deadlines included.
    pub fn inspect(&self) -> ActorState {
        *read(&self.state)
    }

    /// Deliver a hammer hit. Waits while an earlier strike is still pending.
    pub async fn strike(&self) -> Result<(), ActorError> {
        self.strike_tx.send().await?;
        Ok(())
    }

    /// Deliver a poke. Waits while an earlier poke is still pending.
    pub async fn poke(&self) -> Result<(), ActorError> {
        self.poke_tx.send().await?;
        Ok(())
    }

    /// Producer handle for one stimulus kind, for callers that outlive a borrow.
    pub fn sender(&self, kind: Stimulus) -> MailboxSender {
        match kind {
            Stimulus::Strike => self.strike_tx.clone(),
            Stimulus::Poke => self.poke_tx.clone(),
        }
    }

    /// Spawn the event and decay tasks. They stop when `parent` (or this
    /// actor, via [`stop`](Self::stop)) is cancelled.
    pub fn start(&self, parent: &CancellationToken) -> Result<(), ActorError> {
        let mailboxes = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ActorError::AlreadyStarted(self.id))?;

        let cancel = self.cancel.get_or_init(|| parent.child_token()).clone();

        self.tracker.spawn(run_event_task(
            self.id,
            self.state.clone(),
            mailboxes,
            self.timing,
            cancel.clone(),
        ));
        self.tracker.spawn(run_decay_task(
            self.id,
            self.state.clone(),
            self.timing,
            cancel,
        ));
        self.tracker.close();

        info!(
            actor = self.id,
            tick_ms = u64::try_from(self.timing.tick.as_millis()).unwrap_or(u64::MAX),
            "actor started"
        );
        Ok(())
    }

    /// Ask both tasks to stop at their next tick boundary.
    pub fn stop(&self) {
        if let Some(cancel) = self.cancel.get() {
            cancel.cancel();
        }
    }

    pub fn is_started(&self) -> bool {
        self.cancel.get().is_some()
    }

    /// Resolve once both tasks have exited. Returns immediately for an actor
    /// that was never started.
    pub async fn await_termination(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Interval whose first tick is one period out, delaying after a stall
/// rather than bursting.
fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Wait for the next tick. Returns false once cancelled.
async fn next_tick(ticker: &mut Interval, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = ticker.tick() => true,
    }
}

async fn run_event_task(
    id: usize,
    state: SharedState,
    mut mailboxes: Mailboxes,
    timing: Timing,
    cancel: CancellationToken,
) {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let mut ticker = ticker(timing.tick);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let now = Instant::now();
        if mailboxes.strike.try_receive() {
            let stunned = write(&state).strike(now, &timing);
            if stunned {
                info!(actor = id, "ouch! gopher stunned");
            } else {
                trace!(actor = id, "strike on a resting gopher ignored");
            }
        } else if mailboxes.poke.try_receive() {
            let raised = write(&state).poke(now, &timing, &mut rng);
            if raised {
                debug!(actor = id, "gopher peeks out");
            } else {
                trace!(actor = id, "poke ignored; gopher already up");
            }
        }

        if !next_tick(&mut ticker, &cancel).await {
            break;
        }
    }

    debug!(actor = id, "event task stopped");
}

async fn run_decay_task(id: usize, state: SharedState, timing: Timing, cancel: CancellationToken) {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let mut ticker = ticker(timing.tick);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let now = Instant::now();
        let due = read(&state).is_due(now);
        if due {
            let outcome = write(&state).decay(now, &timing, &mut rng);
            match outcome {
                Decay::Recovered => debug!(actor = id, "gopher recovered and hid"),
                Decay::Hid => debug!(actor = id, "gopher got bored and hid"),
                Decay::GazeRolled(gaze) => trace!(actor = id, ?gaze, "gopher looks around"),
                // A strike landed between the check and the write.
                Decay::Idle => {}
            }
        }

        if !next_tick(&mut ticker, &cancel).await {
            break;
        }
    }

    debug!(actor = id, "decay task stopped");
}
