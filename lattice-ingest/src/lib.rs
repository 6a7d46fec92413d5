//! LATTICE Ingest - Consume Loop and Service Wiring
//!
//! Pulls one payload at a time from a [`source::RecordSource`], drives
//! decode and two-phase persistence, and checks the shutdown flag between
//! iterations. At-least-once with idempotent writes: a dropped message is
//! repaired by the next occurrence of the same data, never by an explicit
//! retry.

pub mod config;
pub mod pipeline;
pub mod signal;
pub mod source;

pub use config::IngestConfig;
pub use pipeline::{IngestLoop, IngestOptions};
pub use signal::spawn_signal_listener;
pub use source::{channel, ChannelSource, Delivery, RecordSource, ReplaySource};
