//! Orchestration for one lookout invocation. The binary in `main.rs` is a
//! thin clap wrapper around [`runner::Runner`].

pub mod runner;
