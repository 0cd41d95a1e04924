// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Evergreen keeps a repository's activity graph green.
//!
//! Once per calendar day it produces a randomized number of commits, pushes
//! them, and tracks totals, streak, and history in a local state file. The
//! [`tracker`] module holds the daily routine itself. Everything else is
//! configuration, persistence, and the repository seam it runs against.

pub mod config;
pub mod facts;
pub mod journal;
pub mod path;
pub mod repo;
pub mod state;
pub mod tracker;

pub use config::{CommitRange, Config};
pub use journal::Journal;
pub use repo::{GitBin, Publisher};
pub use state::{HistoryEntry, LoadOutcome, TrackerState};
pub use tracker::{choose_commit_count, RunReport, Tracker};
