//! Whack core - a grid of independently animated gophers
//!
//! Every gopher is an [`Actor`] running two tokio tasks over one locked
//! [`ActorState`]:
//! - the event task drains the strike and poke mailboxes,
//! - the decay task times out stuns and alerts and rolls the gaze.
//!
//! The [`Grid`] owns the actors, maps board coordinates to actors and
//! shuts them all down together.

pub mod actor;
pub mod grid;
pub mod mailbox;
pub mod state;

pub use actor::{Actor, ActorError};
pub use grid::{Grid, GridError, GridSnapshot, Layout, LayoutError, Point};
pub use mailbox::{mailbox, MailboxClosed, MailboxReceiver, MailboxSender, Stimulus};
pub use state::{ActorSnapshot, ActorState, Decay, Gaze, Phase, Timing};
