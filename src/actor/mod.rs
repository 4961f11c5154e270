//! Actor Model: Message-passing concurrency for asynchronous diffs.
//!
//! Diffs requested with `synchronous = false` are computed by a pool of
//! worker threads connected with crossbeam channels:
//! - **Owner** (the UI thread): stages updates, applies finished scripts
//! - **Diff Workers**: run the diffing engine, report outcomes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      DiffJob       ┌──────────────┐
//! │              │ ─────────────────▶ │ Diff Worker  │ ×N
//! │    Owner     │                    └──────────────┘
//! │ (UI thread)  │    DiffOutcome            │
//! │              │ ◀─────────────────────────┘
//! └──────────────┘
//!        │ resequence by ticket, apply in order
//!        ▼
//!  ┌──────────────┐
//!  │  Host View   │
//!  └──────────────┘
//! ```

mod messages;
mod worker;

pub use messages::{DiffJob, DiffOutcome, Ticket, WorkerCommand};
pub use worker::DiffWorkerPool;
