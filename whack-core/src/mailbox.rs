//! Single-slot stimulus mailboxes.
//!
//! A mailbox holds at most one pending signal. `send` waits for the slot to
//! free up, so a burst of identical stimuli collapses into "at least one
//! pending" and producers are throttled to the actor's tick rate.
//! `try_receive` never waits.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The two things that can happen to a gopher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stimulus {
    /// Hammer hit.
    Strike,
    /// Provocation that makes a resting gopher peek out.
    Poke,
}

impl std::fmt::Display for Stimulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stimulus::Strike => write!(f, "strike"),
            Stimulus::Poke => write!(f, "poke"),
        }
    }
}

/// The consuming side of a mailbox is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} mailbox is closed")]
pub struct MailboxClosed(pub Stimulus);

/// Producer handle. Cheap to clone; every clone feeds the same slot.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    kind: Stimulus,
    tx: mpsc::Sender<()>,
}

/// Consumer handle, owned by the actor's event task.
#[derive(Debug)]
pub struct MailboxReceiver {
    rx: mpsc::Receiver<()>,
}

/// Create a mailbox for one stimulus kind.
pub fn mailbox(kind: Stimulus) -> (MailboxSender, MailboxReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (MailboxSender { kind, tx }, MailboxReceiver { rx })
}

impl MailboxSender {
    /// Deposit a signal, waiting while the slot is taken.
    pub async fn send(&self) -> Result<(), MailboxClosed> {
        self.tx.send(()).await.map_err(|_| MailboxClosed(self.kind))
    }

    /// Whether a signal is sitting in the slot, not yet consumed.
    pub fn is_pending(&self) -> bool {
        !self.tx.is_closed() && self.tx.capacity() == 0
    }
}

impl MailboxReceiver {
    /// Take the pending signal if there is one.
    pub fn try_receive(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_try_receive_on_empty_mailbox_returns_false() {
        let (_tx, mut rx) = mailbox(Stimulus::Poke);
        assert!(!rx.try_receive());
    }

    #[tokio::test]
    async fn test_single_signal_is_consumed_once() {
        let (tx, mut rx) = mailbox(Stimulus::Strike);
        tx.send().await.unwrap();
        assert!(tx.is_pending());

        assert!(rx.try_receive());
        assert!(!rx.try_receive());
        assert!(!tx.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_send_waits_for_the_slot() {
        let (tx, mut rx) = mailbox(Stimulus::Poke);
        tx.send().await.unwrap();

        let blocked = timeout(Duration::from_millis(100), tx.send()).await;
        assert!(blocked.is_err(), "second send should wait while the slot is full");

        let producer = tx.clone();
        let pending = tokio::spawn(async move { producer.send().await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        assert!(rx.try_receive());
        pending.await.unwrap().unwrap();
        assert!(rx.try_receive());
        assert!(!rx.try_receive());
    }

    #[tokio::test]
    async fn test_send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mailbox(Stimulus::Strike);
        drop(rx);
        assert_eq!(tx.send().await, Err(MailboxClosed(Stimulus::Strike)));
        assert!(!tx.is_pending());
    }

    #[test]
    fn test_stimulus_display() {
        assert_eq!(Stimulus::Strike.to_string(), "strike");
        assert_eq!(Stimulus::Poke.to_string(), "poke");
    }
}
