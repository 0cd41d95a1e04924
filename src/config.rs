// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the configuration file that evergreen uses to
//! simplify the process of serialization and deserialization. File I/O is
//! left to the caller to figure out.
//!
//! Every field is optional. Absent fields fall back to built-in defaults, so
//! an empty configuration file is a valid configuration file. None of these
//! settings alter how the daily run makes its decisions. They only change
//! labels, paths, and limits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Configuration file layout.
///
/// Controls the cosmetic and filesystem-facing knobs of the daily run: how
/// many commits a day may produce, what the commit messages look like, where
/// tracker state and the run journal live, and how much history is retained.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Commit message template with `{number}` and `{date}` placeholders.
    pub message_format: String,

    /// Override path of the tracker state file.
    ///
    /// Relative paths are resolved against the target repository's work tree
    /// so that the state file itself is tracked and committed.
    pub state_file: PathBuf,

    /// Override path of the append-only run journal.
    ///
    /// Relative paths are resolved against the target repository's work tree.
    pub journal_file: PathBuf,

    /// Maximum number of days retained in tracker history.
    pub max_history_days: usize,

    /// Commit author name override. Falls back to git configuration.
    pub git_user_name: Option<String>,

    /// Commit author email override. Falls back to git configuration.
    pub git_user_email: Option<String>,

    /// Print the daily fact and per-unit detail in the run summary.
    pub verbose: bool,

    /// Inclusive range of commits to produce per day.
    pub commit_range: CommitRange,
}

impl Config {
    /// Render commit message for a given running total and date.
    ///
    /// Replaces the `{number}` and `{date}` placeholders of
    /// [`message_format`](Self::message_format). Unknown placeholders are
    /// left as-is.
    pub fn commit_message(&self, number: u64, date: NaiveDate) -> String {
        self.message_format
            .replace("{number}", number.to_string().as_str())
            .replace("{date}", date.format("%B %d, %Y").to_string().as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commit_range: CommitRange::default(),
            message_format: "Daily commit #{number} - {date}".into(),
            state_file: "daily_data.json".into(),
            journal_file: "commit_log.txt".into(),
            max_history_days: 30,
            git_user_name: None,
            git_user_email: None,
            verbose: true,
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on path override fields.
        config.state_file = expand_path(&config.state_file)?;
        config.journal_file = expand_path(&config.journal_file)?;

        // INVARIANT: Commit range must be non-empty and start at one or more.
        if config.commit_range.min < 1 || config.commit_range.min > config.commit_range.max {
            return Err(ConfigError::InvalidCommitRange {
                min: config.commit_range.min,
                max: config.commit_range.max,
            });
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand_path(path: &PathBuf) -> Result<PathBuf, ConfigError> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Inclusive range of commits a single daily run may produce.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct CommitRange {
    pub min: u32,
    pub max: u32,
}

impl CommitRange {
    /// Check if count sits inside the range.
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && count <= self.max
    }

    /// Number of distinct counts the range covers.
    pub fn span(&self) -> u32 {
        self.max - self.min + 1
    }
}

impl Default for CommitRange {
    fn default() -> Self {
        Self { min: 1, max: 7 }
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Commit range is empty or starts below one.
    #[error("commit range {min}..={max} is not a valid daily commit range")]
    InvalidCommitRange { min: u32, max: u32 },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("BLAH", "/home/blah/blah")])]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = r#"
            commit_range = { min = 2, max = 5 }
            message_format = "chore: tick #{number} on {date}"
            state_file = "$BLAH/daily_data.json"
            journal_file = "$BLAH/commit_log.txt"
            max_history_days = 10
            git_user_name = "John Doe"
            git_user_email = "john@doe.com"
            verbose = false
        "#
        .parse()?;

        let expect = Config {
            commit_range: CommitRange { min: 2, max: 5 },
            message_format: "chore: tick #{number} on {date}".into(),
            state_file: "/home/blah/blah/daily_data.json".into(),
            journal_file: "/home/blah/blah/commit_log.txt".into(),
            max_history_days: 10,
            git_user_name: Some("John Doe".into()),
            git_user_email: Some("john@doe.com".into()),
            verbose: false,
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_empty_config_uses_defaults() -> anyhow::Result<()> {
        let result: Config = "".parse()?;
        assert_eq!(result, Config::default());
        Ok(())
    }

    #[test]
    fn deserialize_rejects_bogus_commit_range() {
        let result = "commit_range = { min = 5, max = 2 }".parse::<Config>();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCommitRange { min: 5, max: 2 })
        ));

        let result = "commit_range = { min = 0, max = 7 }".parse::<Config>();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCommitRange { min: 0, max: 7 })
        ));
    }

    #[test]
    fn serialize_config() {
        let result = Config {
            commit_range: CommitRange { min: 1, max: 3 },
            message_format: "Daily commit #{number} - {date}".into(),
            state_file: "daily_data.json".into(),
            journal_file: "commit_log.txt".into(),
            max_history_days: 30,
            git_user_name: Some("John Doe".into()),
            git_user_email: None,
            verbose: true,
        }
        .to_string();

        let expect = indoc! {r#"
            message_format = "Daily commit #{number} - {date}"
            state_file = "daily_data.json"
            journal_file = "commit_log.txt"
            max_history_days = 30
            git_user_name = "John Doe"
            verbose = true

            [commit_range]
            min = 1
            max = 3
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn commit_message_fills_placeholders() {
        let config = Config::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            config.commit_message(42, date),
            "Daily commit #42 - January 01, 2024"
        );
    }
}
