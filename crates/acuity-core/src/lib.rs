//! Adaptive staircase visual-acuity test engine.
//!
//! # Overview
//!
//! One eye at a time, the engine shows a Landolt C in one of four
//! orientations and adjusts difficulty along a fixed ladder from the
//! user's answers. Each answer is one row of an explicit transition table
//! ([`staircase::Step`]); the table is a pure function and the engine keeps
//! prior states on a snapshot stack so any applied answer can be undone.
//!
//! ```text
//! answer -> staircase::advance -> TestState --(finished)--> SessionDriver::advance -> ResultStore
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |---|---|
//! | [`optotype`] | `Direction`, `Eye`, `DistanceCategory` |
//! | [`staircase`] | Ladder, `TestState`, transition table, hashing |
//! | [`engine`] | Stateful engine with undo and pause |
//! | [`session`] | Right eye then left eye |
//! | [`calibration`] | Level to rendered size |
//! | [`direction`] | Injected target-direction sources |
//! | [`input`] | Key and transcript mapping |
//! | [`narration`] | Narration cues and narrators |
//! | [`store`] | Append-only JSONL result store |
//! | [`simulation`] | Deterministic headless sessions |
//! | [`trend`] | Per-eye trends and check-up reminder |
//! | [`config`] | TOML configuration |
//! | [`logging`] | `tracing` subscriber setup |

pub mod calibration;
pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod narration;
pub mod optotype;
pub mod session;
pub mod simulation;
pub mod snapshots;
pub mod staircase;
pub mod store;
pub mod trend;
