// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tracker state persistence.
//!
//! The tracker keeps all durable bookkeeping in a single JSON document:
//! running totals, the current streak, and a bounded history of daily
//! outcomes. The document is rewritten in full on every save so that any
//! save doubles as a crash checkpoint. A crash after any save leaves a
//! valid, re-loadable snapshot behind.
//!
//! # Corruption Recovery
//!
//! A missing state file means first run. An unreadable or malformed state
//! file is treated the same way, but the fallback is reported as a distinct
//! [`LoadOutcome`] so callers and tests can tell the difference. Loading
//! never fails. Saving can, and a failed save is fatal to the run, because
//! continuing would desynchronize durable state from what actually happened.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use tracing::{debug, warn};

/// Durable bookkeeping for the daily commit routine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackerState {
    /// Running total of commits ever produced. Monotonic. Never recomputed
    /// from history, which is bounded and forgets old entries.
    pub total_commits: u64,

    /// Count of consecutive calendar days with at least one recorded entry.
    pub current_streak: u32,

    /// Date of the first-ever run. Immutable after creation.
    pub start_date: NaiveDate,

    /// Date of the most recent run that performed work.
    pub last_commit_date: Option<NaiveDate>,

    /// Commit count attempted on `last_commit_date`. Biases the next day's
    /// count away from repetition.
    #[serde(default)]
    pub last_commit_count: u32,

    /// Daily outcome snapshots, date ascending, bounded by the retention
    /// limit at save time.
    pub history: Vec<HistoryEntry>,
}

impl TrackerState {
    /// Construct fresh state for a first run on `today`.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            total_commits: 0,
            current_streak: 0,
            start_date: today,
            last_commit_date: None,
            last_commit_count: 0,
            history: Vec::new(),
        }
    }

    /// Load tracker state from `path`.
    ///
    /// Never fails. A missing file yields fresh state as
    /// [`LoadOutcome::FirstRun`]. An unreadable or malformed file yields
    /// fresh state as [`LoadOutcome::RecoveredFromCorruption`].
    pub fn load(path: impl AsRef<Path>, today: NaiveDate) -> (Self, LoadOutcome) {
        let data = match fs::read_to_string(path.as_ref()) {
            Ok(data) => data,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no state file at {:?}, first run", path.as_ref().display());
                return (Self::fresh(today), LoadOutcome::FirstRun);
            }
            Err(error) => {
                warn!(
                    "cannot read state file at {:?}, starting over: {error}",
                    path.as_ref().display()
                );
                return (Self::fresh(today), LoadOutcome::RecoveredFromCorruption);
            }
        };

        match serde_json::from_str(data.as_str()) {
            Ok(state) => (state, LoadOutcome::Loaded),
            Err(error) => {
                warn!(
                    "state file at {:?} is malformed, starting over: {error}",
                    path.as_ref().display()
                );
                (Self::fresh(today), LoadOutcome::RecoveredFromCorruption)
            }
        }
    }

    /// Save tracker state to `path` as a full self-consistent snapshot.
    ///
    /// Writes human-readable indented JSON. Creates missing parent
    /// directories.
    ///
    /// # Errors
    ///
    /// - Return [`StateError::Serialize`] if JSON serialization fails.
    /// - Return [`StateError::Syscall`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                mkdirp::mkdirp(parent)?;
            }
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), data)?;

        Ok(())
    }

    /// Check if a run already performed work on `today`.
    ///
    /// Sole idempotency guard against double-running within one calendar
    /// day. Concurrent processes are the advisory lock's problem, not ours.
    pub fn already_committed_today(&self, today: NaiveDate) -> bool {
        self.last_commit_date == Some(today)
    }

    /// Compute the streak value a run on `today` would record.
    ///
    /// The streak continues only when the last history entry sits exactly
    /// one calendar day behind `today`. Any other gap, and an empty history,
    /// restarts the streak at one.
    pub fn next_streak(&self, today: NaiveDate) -> u32 {
        match self.history.last() {
            Some(entry) if (today - entry.date).num_days() == 1 => self.current_streak + 1,
            _ => 1,
        }
    }

    /// Append one daily outcome and evict the oldest entries beyond `limit`.
    pub fn record_day(&mut self, entry: HistoryEntry, limit: usize) {
        debug_assert!(self.history.iter().all(|past| past.date != entry.date));
        self.history.push(entry);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

/// One day's outcome, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    /// Calendar day the run happened on.
    pub date: NaiveDate,

    /// Number of commits that actually landed that day.
    pub commit_count: u32,

    /// Streak value the day was recorded with.
    pub streak_day: u32,

    /// The daily fact picked for that run.
    pub fact: String,

    /// Wall-clock moment the entry was recorded.
    pub timestamp: DateTime<Local>,
}

/// How loading the state file went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No state file existed yet.
    FirstRun,

    /// State file existed and parsed cleanly.
    Loaded,

    /// State file existed but was unreadable or malformed. Fresh state was
    /// substituted.
    RecoveredFromCorruption,
}

/// All possible error types for state persistence.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Tracker state cannot be serialized.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// State file cannot be written.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = StateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(date: NaiveDate, commit_count: u32, streak_day: u32) -> HistoryEntry {
        HistoryEntry {
            date,
            commit_count,
            streak_day,
            fact: "Wombat poop is cube-shaped".into(),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn load_missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let today = day(2024, 1, 1);

        let (state, outcome) = TrackerState::load(dir.path().join("nope.json"), today);

        assert_eq!(outcome, LoadOutcome::FirstRun);
        assert_eq!(state, TrackerState::fresh(today));
    }

    #[test]
    fn load_malformed_file_recovers_with_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily_data.json");
        fs::write(&path, "{ this is not json").unwrap();
        let today = day(2024, 1, 1);

        let (state, outcome) = TrackerState::load(&path, today);

        assert_eq!(outcome, LoadOutcome::RecoveredFromCorruption);
        assert_eq!(state, TrackerState::fresh(today));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("daily_data.json");
        let today = day(2024, 1, 2);

        let mut state = TrackerState::fresh(day(2024, 1, 1));
        state.total_commits = 4;
        state.current_streak = 2;
        state.last_commit_date = Some(today);
        state.last_commit_count = 3;
        state.record_day(entry(today, 3, 2), 30);
        state.save(&path).unwrap();

        let (loaded, outcome) = TrackerState::load(&path, today);
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(loaded, state);
    }

    #[test]
    fn save_to_occupied_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily_data.json");
        fs::create_dir(&path).unwrap();

        let result = TrackerState::fresh(day(2024, 1, 1)).save(&path);

        assert!(matches!(result, Err(StateError::Syscall(_))));
    }

    #[test_case(day(2024, 1, 2), 5, 6; "gap of one continues streak")]
    #[test_case(day(2024, 1, 3), 5, 1; "gap of two restarts streak")]
    #[test_case(day(2024, 1, 1), 5, 1; "same day restarts streak")]
    #[test]
    fn next_streak_from_history(today: NaiveDate, streak: u32, expect: u32) {
        use pretty_assertions::assert_eq;

        let mut state = TrackerState::fresh(day(2023, 12, 1));
        state.current_streak = streak;
        state.history.push(entry(day(2024, 1, 1), 2, streak));

        assert_eq!(state.next_streak(today), expect);
    }

    #[test]
    fn next_streak_with_empty_history_is_one() {
        let state = TrackerState::fresh(day(2024, 1, 1));
        assert_eq!(state.next_streak(day(2024, 1, 1)), 1);
    }

    #[test]
    fn record_day_evicts_oldest_beyond_limit() {
        let mut state = TrackerState::fresh(day(2024, 1, 1));
        for offset in 0..30 {
            let date = day(2024, 1, 1) + chrono::Days::new(offset);
            state.record_day(entry(date, 1, offset as u32 + 1), 30);
        }
        assert_eq!(state.history.len(), 30);
        let oldest = state.history.first().unwrap().date;

        state.record_day(entry(day(2024, 1, 31), 1, 31), 30);

        assert_eq!(state.history.len(), 30);
        assert!(state.history.iter().all(|past| past.date != oldest));
        assert_eq!(state.history.last().unwrap().date, day(2024, 1, 31));
    }
}
