//! Whack - headless whack-a-gopher
//!
//! Wires a [`whack_core::Grid`] to its collaborators:
//! - poker actors that poke random gophers on fixed cadences,
//! - a stdin hammer that strikes the gopher under a coordinate,
//! - a text/JSON renderer that samples the board every frame.

pub mod config;
pub mod hammer;
pub mod poker;
pub mod render;
