//! Test harness for whole-activation scenarios.
//!
//! Provides shared protocol fixtures and [`FakeEngine`], an in-process stand-in
//! for the MPC engine that plays both of its roles at once: the TCP server the
//! feeder pushes shares to, and the FIFO reader that consumes streamed tuples.
//! Tests wire real streamers and a real feeder against it and assert on what
//! the "engine" observed.

pub mod engine;
pub mod fixtures;

pub use engine::{EngineObservation, FakeEngine};
pub use fixtures::{gf2n_protocol, gfp_protocol, streamer_config};
