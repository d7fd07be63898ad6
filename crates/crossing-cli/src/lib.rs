//! Command-line runner for the crossing simulation
//!
//! Reads a train description file, runs the simulation and writes the event
//! log (and optionally a JSON run report) to disk.

pub mod cli;

pub use cli::{execute, Cli};
