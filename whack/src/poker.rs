//! PokerActor - periodically pokes a random gopher.
//!
//! Several pokers run side by side, each on its own cadence. A background
//! interval casts `PokeNow` into the actor; the handler picks a cell
//! uniformly and waits on that gopher's poke mailbox, so a gopher that has
//! not yet consumed its last poke throttles the poker.
//!
//! At most one `PokeNow` is queued or running at a time. Ticks that fire
//! while one is still in flight are dropped, so a slow gopher never builds
//! a backlog in front of `GetStats` or `PokeAt`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use whack_core::Grid;

#[derive(Clone)]
pub struct PokerArguments {
    pub grid: Arc<Grid>,
    pub interval: Duration,
    pub poker_id: String,
}

pub struct PokerState {
    grid: Arc<Grid>,
    poker_id: String,
    rng: StdRng,
    ticker: Option<JoinHandle<()>>,
    /// Set by the interval task when it casts `PokeNow`, cleared once handled.
    in_flight: Arc<AtomicBool>,
    stats: PokerStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PokerStats {
    /// Pokes that landed in a mailbox
    pub delivered: u64,
    /// Pokes rejected by the grid (stopped actors)
    pub failed: u64,
}

#[derive(Debug)]
pub enum PokerMsg {
    /// Internal trigger from the interval task.
    PokeNow,
    /// Poke one specific cell, bypassing the random pick.
    PokeAt { index: usize },
    GetStats { reply: RpcReplyPort<PokerStats> },
}

#[derive(Debug, Default)]
pub struct PokerActor;

#[ractor::async_trait]
impl Actor for PokerActor {
    type Msg = PokerMsg;
    type State = PokerState;
    type Arguments = PokerArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        if args.interval.is_zero() {
            return Err(ActorProcessingErr::from(format!(
                "poker {} needs a non-zero interval",
                args.poker_id
            )));
        }

        let interval = args.interval;
        let in_flight = Arc::new(AtomicBool::new(false));
        let tick_ref = myself.clone();
        let tick_flight = in_flight.clone();
        let ticker = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // first tick is immediate; skip it
            loop {
                ticker.tick().await;
                if tick_flight.swap(true, Ordering::AcqRel) {
                    continue;
                }
                if tick_ref.cast(PokerMsg::PokeNow).is_err() {
                    break;
                }
            }
        });

        tracing::info!(
            poker = %args.poker_id,
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "PokerActor started"
        );

        Ok(PokerState {
            grid: args.grid,
            poker_id: args.poker_id,
            rng: StdRng::from_rng(&mut rand::rng()),
            ticker: Some(ticker),
            in_flight,
            stats: PokerStats::default(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PokerMsg::PokeNow => {
                if !state.grid.is_empty() {
                    let index = state.rng.random_range(0..state.grid.len());
                    self.poke(state, index).await;
                }
                state.in_flight.store(false, Ordering::Release);
            }
            PokerMsg::PokeAt { index } => {
                self.poke(state, index).await;
            }
            PokerMsg::GetStats { reply } => {
                let _ = reply.send(state.stats);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        tracing::info!(
            poker = %state.poker_id,
            delivered = state.stats.delivered,
            failed = state.stats.failed,
            "PokerActor stopped"
        );
        Ok(())
    }
}

/// Stop every poker and wait for each to finish its current message, so no
/// poke is still in flight when the grid shuts down.
pub async fn stop_pokers(
    pokers: Vec<(ActorRef<PokerMsg>, JoinHandle<()>)>,
) -> Result<(), tokio::task::JoinError> {
    for (poker, _) in &pokers {
        poker.stop(None);
    }
    for (_, handle) in pokers {
        handle.await?;
    }
    Ok(())
}

impl PokerActor {
    async fn poke(&self, state: &mut PokerState, index: usize) {
        tracing::info!(poker = %state.poker_id, index, "poke");
        match state.grid.poke(index).await {
            Ok(()) => state.stats.delivered += 1,
            Err(e) => {
                state.stats.failed += 1;
                tracing::warn!(poker = %state.poker_id, index, error = %e, "poke failed");
            }
        }
    }
}
