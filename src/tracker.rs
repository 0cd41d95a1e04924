// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Daily commit routine.
//!
//! One invocation of [`Tracker::run_daily`] is one calendar day's worth of
//! activity. The routine decides whether today already happened, how many
//! commits today should produce, and keeps the tracker state durable at
//! every step.
//!
//! # Per-Day State Machine
//!
//! ```text
//! NOT_STARTED --(already committed today)--> ALREADY_DONE (terminal)
//! NOT_STARTED --(fresh day)----------------> IN_PROGRESS
//! IN_PROGRESS --(loop units)---------------> IN_PROGRESS
//! IN_PROGRESS --(loop done, >=1 success)---> FLUSHED ----> RECORDED (terminal)
//! IN_PROGRESS --(loop done, 0 success)-----> RECORDED (terminal, skip flush)
//! ```
//!
//! # Crash Checkpoints
//!
//! State is saved in full before every external action. The checkpoint
//! carries `last_commit_date = today`, so a crash anywhere inside the unit
//! loop leaves state that reads as "already committed today" and the next
//! invocation becomes a no-op instead of repeating work. Checkpoints are
//! not transactions. There is no rollback, only valid snapshots.
//!
//! # Single Daily Writer
//!
//! An advisory file lock next to the state file guards against two runs
//! mutating the same state file at once. The scheduler is still expected to
//! invoke evergreen once per day. The lock is a backstop, not a
//! coordination mechanism.

use crate::{
    config::{CommitRange, Config},
    facts,
    journal::{Journal, JournalError, UnitLine},
    repo::Publisher,
    state::{HistoryEntry, LoadOutcome, StateError, TrackerState},
};

use chrono::{Local, NaiveDate};
use fs2::FileExt;
use indicatif::ProgressBar;
use rand::Rng;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// The daily commit routine over some publisher.
#[derive(Debug)]
pub struct Tracker<P>
where
    P: Publisher,
{
    config: Config,
    publisher: P,
    state_file: PathBuf,
    journal: Journal,
}

impl<P> Tracker<P>
where
    P: Publisher,
{
    /// Construct new tracker.
    pub fn new(
        config: Config,
        publisher: P,
        state_file: impl Into<PathBuf>,
        journal: Journal,
    ) -> Self {
        Self {
            config,
            publisher,
            state_file: state_file.into(),
            journal,
        }
    }

    /// Path of the state file this tracker persists to.
    pub fn state_file(&self) -> &Path {
        self.state_file.as_path()
    }

    /// Perform one day's worth of commits dated `today`.
    ///
    /// Idempotent within a calendar day: a second call with the same `today`
    /// performs no work and reports existing totals. Individual unit
    /// failures and a failed push are reported, never fatal. Failing to
    /// persist state or journal is fatal.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Locked`] if another run holds the lock.
    /// - Return [`TrackerError::State`] if a checkpoint or final save fails.
    /// - Return [`TrackerError::Journal`] if a journal line cannot be
    ///   written.
    #[instrument(skip(self, rng, bar), level = "debug")]
    pub fn run_daily(
        &self,
        today: NaiveDate,
        rng: &mut impl Rng,
        bar: ProgressBar,
    ) -> Result<RunReport> {
        let _lock = RunLock::acquire(self.state_file.with_extension("lock"))?;

        let (mut state, outcome) = TrackerState::load(self.state_file.as_path(), today);
        if outcome == LoadOutcome::FirstRun {
            info!("no tracker state yet, starting fresh on {today}");
        }

        if state.already_committed_today(today) {
            info!("already committed today ({today})");
            return Ok(RunReport::AlreadyDone {
                total_commits: state.total_commits,
                current_streak: state.current_streak,
            });
        }

        let attempted = choose_commit_count(state.last_commit_count, self.config.commit_range, rng);
        let streak = state.next_streak(today);
        let fact = facts::daily_fact(rng).to_string();
        debug!("scheduling {attempted} commit units for {today}, streak day {streak}");

        // The attempted count is what next day's exclusion keys off, even
        // when some units end up failing. Failed units still "used up"
        // today's visible count.
        state.last_commit_date = Some(today);
        state.last_commit_count = attempted;

        bar.set_length(u64::from(attempted));
        let mut successful = 0u32;
        for position in 1..=attempted {
            let message = self.config.commit_message(state.total_commits + 1, today);

            // Checkpoint before touching the repository. From here on a
            // crash leaves state that reads as "already committed today".
            state.save(self.state_file.as_path())?;
            self.journal.append(&UnitLine {
                timestamp: Local::now(),
                message: message.as_str(),
                streak,
                position,
                total: attempted,
                fact: fact.as_str(),
            })?;

            match self.perform_unit(message.as_str()) {
                Ok(()) => {
                    state.total_commits += 1;
                    successful += 1;
                }
                Err(error) => {
                    warn!("commit unit {position}/{attempted} failed: {error}");
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        let pushed = if successful > 0 {
            match self.publisher.push() {
                Ok(output) => {
                    debug!("pushed {successful} commits: {output}");
                    true
                }
                Err(error) => {
                    warn!("push failed, commits remain local: {error}");
                    false
                }
            }
        } else {
            false
        };

        state.current_streak = streak;
        state.record_day(
            HistoryEntry {
                date: today,
                commit_count: successful,
                streak_day: streak,
                fact: fact.clone(),
                timestamp: Local::now(),
            },
            self.config.max_history_days,
        );
        state.save(self.state_file.as_path())?;

        Ok(RunReport::Completed {
            attempted,
            successful,
            pushed,
            total_commits: state.total_commits,
            current_streak: streak,
            fact,
        })
    }

    fn perform_unit(&self, message: &str) -> crate::repo::Result<()> {
        self.publisher.stage_all()?;
        self.publisher.commit(message)?;
        Ok(())
    }
}

/// Pick today's commit count from `range`, excluding yesterday's count.
///
/// Uniform over the range minus `last`, so the visible daily count never
/// repeats two days in a row. When `last` sits outside the range, or the
/// range only holds one value, the exclusion is a no-op.
pub fn choose_commit_count(last: u32, range: CommitRange, rng: &mut impl Rng) -> u32 {
    if range.contains(last) && range.span() > 1 {
        // Draw from the range shrunk by one, then shift picks at or above
        // `last` up by one. Keeps the draw uniform without rejection loops.
        let pick = rng.gen_range(range.min..range.max);
        if pick >= last {
            pick + 1
        } else {
            pick
        }
    } else {
        rng.gen_range(range.min..=range.max)
    }
}

/// Outcome summary of one daily run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// A run already performed work today. Nothing was done.
    AlreadyDone {
        total_commits: u64,
        current_streak: u32,
    },

    /// The unit loop ran to completion.
    Completed {
        /// Units scheduled this run.
        attempted: u32,

        /// Units whose stage and commit both landed.
        successful: u32,

        /// Whether the batched push made the commits visible remotely.
        pushed: bool,

        /// Running total after this run.
        total_commits: u64,

        /// Streak value this run recorded.
        current_streak: u32,

        /// The fact picked for this run.
        fact: String,
    },
}

impl Display for RunReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::AlreadyDone {
                total_commits,
                current_streak,
            } => write!(
                fmt,
                "already committed today, nothing to do | total commits: {total_commits} | streak: {current_streak} days"
            ),
            Self::Completed {
                attempted,
                successful,
                pushed,
                total_commits,
                current_streak,
                ..
            } => {
                let publish = match (successful, pushed) {
                    (0, _) => "nothing to push",
                    (_, true) => "pushed to remote",
                    (_, false) => "push failed, commits remain local",
                };
                write!(
                    fmt,
                    "committed {successful}/{attempted} units, {publish} | total commits: {total_commits} | streak: {current_streak} days"
                )
            }
        }
    }
}

/// Advisory lock guarding the single-daily-writer precondition.
///
/// Held from before state load until final save. Released on drop.
struct RunLock {
    _file: File,
}

impl RunLock {
    fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                mkdirp::mkdirp(parent).map_err(TrackerError::Syscall)?;
            }
        }

        let file = File::create(path.as_path()).map_err(TrackerError::Syscall)?;
        file.try_lock_exclusive()
            .map_err(|_| TrackerError::Locked { path })?;

        Ok(Self { _file: file })
    }
}

/// All possible error types for the daily commit routine.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// State checkpoint or final save fails.
    #[error(transparent)]
    State(#[from] StateError),

    /// Journal line cannot be written.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Lock file cannot be created.
    #[error(transparent)]
    Syscall(std::io::Error),

    /// Another run holds the advisory lock.
    #[error("another evergreen run holds the lock at {path:?}")]
    Locked { path: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
