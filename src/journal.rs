// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Append-only run journal.
//!
//! Every action unit of a daily run appends exactly one line here before
//! the unit touches the repository. The journal is write-only from
//! evergreen's perspective. Nothing ever reads it back, so its format only
//! needs to please humans scrolling through it.

use chrono::{DateTime, Local};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

/// Append-only journal at a fixed path.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Construct journal handle for `path`. Nothing is opened until the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this journal appends to.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Append one line for one action unit.
    ///
    /// Creates the file and missing parent directories on first use.
    ///
    /// # Errors
    ///
    /// - Return [`JournalError`] if the line cannot be written. Journal
    ///   write failure is fatal to a run, same as state write failure.
    pub fn append(&self, line: &UnitLine<'_>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                mkdirp::mkdirp(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())?;
        writeln!(file, "{line}")?;

        Ok(())
    }
}

/// One action unit's journal line.
#[derive(Debug, Clone, Copy)]
pub struct UnitLine<'a> {
    /// Wall-clock moment the unit started.
    pub timestamp: DateTime<Local>,

    /// Commit message the unit will carry.
    pub message: &'a str,

    /// Streak value computed for this run.
    pub streak: u32,

    /// Position of this unit within the run, starting at one.
    pub position: u32,

    /// Number of units this run attempts in total.
    pub total: u32,

    /// The run's daily fact.
    pub fact: &'a str,
}

impl Display for UnitLine<'_> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "[{}] {} | streak: {} | unit: {}/{} | fact: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message,
            self.streak,
            self.position,
            self.total,
            self.fact,
        )
    }
}

/// Journal line cannot be written.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct JournalError(#[from] std::io::Error);

/// Friendly result alias :3
type Result<T, E = JournalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_creates_file_and_accumulates_lines() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("logs").join("commit_log.txt"));
        let timestamp = Local.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();

        for position in 1..=2 {
            journal
                .append(&UnitLine {
                    timestamp,
                    message: "Daily commit #5 - January 01, 2024",
                    streak: 3,
                    position,
                    total: 2,
                    fact: "Sharks have been around longer than trees",
                })
                .unwrap();
        }

        let contents = std::fs::read_to_string(journal.path()).unwrap();
        let expect = "\
[2024-01-01 09:30:00] Daily commit #5 - January 01, 2024 | streak: 3 | unit: 1/2 | fact: Sharks have been around longer than trees
[2024-01-01 09:30:00] Daily commit #5 - January 01, 2024 | streak: 3 | unit: 2/2 | fact: Sharks have been around longer than trees
";
        assert_eq!(contents, expect);
    }
}
