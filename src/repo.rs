// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository publishing capability.
//!
//! The daily run treats its repository interaction as three opaque verbs:
//! stage everything, commit the staged changes, and push the day's commits
//! to the remote. The [`Publisher`] trait is that seam. The production
//! implementation shells out to the Git binary, which keeps evergreen's
//! commits indistinguishable from ones made by hand, hooks and all.
//!
//! Repository discovery goes through libgit2 so that a run started from any
//! subdirectory of the work tree finds the right repository, the same way
//! Git itself would.

use git2::Repository;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::debug;

/// External action capability for one daily run.
///
/// Each verb is a blocking synchronous call. Success returns the combined
/// command output for reporting. Failure of any single verb is the caller's
/// policy decision, not ours.
pub trait Publisher {
    /// Stage every change in the work tree.
    fn stage_all(&self) -> Result<String>;

    /// Commit staged changes with the given message.
    fn commit(&self, message: &str) -> Result<String>;

    /// Push accumulated commits to the remote.
    fn push(&self) -> Result<String>;
}

/// Publisher backed by the Git binary on `$PATH`.
#[derive(Debug)]
pub struct GitBin {
    work_tree: PathBuf,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl GitBin {
    /// Discover the repository containing `path` and bind to its work tree.
    ///
    /// # Errors
    ///
    /// - Return [`PublishError::Git2`] if no repository contains `path`.
    /// - Return [`PublishError::BareRepository`] if the repository has no
    ///   work tree to commit from.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repository = Repository::discover(path.as_ref())?;
        let work_tree = repository
            .workdir()
            .ok_or(PublishError::BareRepository)?
            .to_path_buf();

        Ok(Self {
            work_tree,
            user_name: None,
            user_email: None,
        })
    }

    /// Override commit author identity instead of relying on git config.
    pub fn with_identity(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.user_name = name;
        self.user_email = email;
        self
    }

    /// Absolute path of the work tree this publisher commits from.
    pub fn work_tree(&self) -> &Path {
        self.work_tree.as_path()
    }

    fn expand_bin_args(&self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Vec<OsString> {
        let mut bin_args: Vec<OsString> =
            vec!["-C".into(), self.work_tree.as_os_str().to_os_string()];
        if let Some(name) = &self.user_name {
            bin_args.push("-c".into());
            bin_args.push(format!("user.name={name}").into());
        }
        if let Some(email) = &self.user_email {
            bin_args.push("-c".into());
            bin_args.push(format!("user.email={email}").into());
        }
        bin_args.extend(args.into_iter().map(Into::into));

        bin_args
    }
}

impl Publisher for GitBin {
    fn stage_all(&self) -> Result<String> {
        debug!("stage all changes in {:?}", self.work_tree.display());
        syscall_non_interactive("git", self.expand_bin_args(["add", "--all"]))
    }

    fn commit(&self, message: &str) -> Result<String> {
        debug!("commit staged changes in {:?}", self.work_tree.display());
        syscall_non_interactive("git", self.expand_bin_args(["commit", "-m", message]))
    }

    fn push(&self) -> Result<String> {
        debug!("push commits from {:?}", self.work_tree.display());
        syscall_non_interactive("git", self.expand_bin_args(["push"]))
    }
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice());
    let stderr = String::from_utf8_lossy(output.stderr.as_slice());

    // INVARIANT: Chomp trailing newlines, and keep the two streams apart.
    let stdout = stdout.trim_end_matches(['\r', '\n']);
    let stderr = stderr.trim_end_matches(['\r', '\n']);
    let message = match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout.to_string(),
        (true, _) => stderr.to_string(),
    };

    if !output.status.success() {
        return Err(PublishError::Syscall(std::io::Error::other(format!(
            "command {:?} failed:\n{message}",
            cmd.as_ref()
        ))));
    }

    Ok(message)
}

/// All possible error types for repository publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// External command invocation fails.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),

    /// Discovered repository is bare and has no work tree.
    #[error("repository is bare, nowhere to commit from")]
    BareRepository,
}

/// Friendly result alias :3
pub type Result<T, E = PublishError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn expand_bin_args_prefixes_work_tree_and_identity() {
        let publisher = GitBin {
            work_tree: "/tmp/repo".into(),
            user_name: Some("John Doe".into()),
            user_email: Some("john@doe.com".into()),
        };

        let args = publisher.expand_bin_args(["commit", "-m", "hello"]);

        let expect: Vec<OsString> = vec![
            "-C".into(),
            "/tmp/repo".into(),
            "-c".into(),
            "user.name=John Doe".into(),
            "-c".into(),
            "user.email=john@doe.com".into(),
            "commit".into(),
            "-m".into(),
            "hello".into(),
        ];
        assert_eq!(args, expect);
    }

    #[test]
    fn syscall_output_keeps_stdout_and_stderr_apart() {
        let message = syscall_non_interactive("sh", ["-c", "echo out; echo err >&2"]).unwrap();
        assert_eq!(message, "out\nerr");
    }

    #[test]
    fn syscall_failure_carries_command_output() {
        let result = syscall_non_interactive("sh", ["-c", "echo bad >&2; exit 3"]);
        let Err(PublishError::Syscall(error)) = result else {
            panic!("expected syscall failure, got {result:?}");
        };
        assert!(error.to_string().contains("bad"));
    }

    #[test]
    fn discover_fails_outside_any_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitBin::discover(dir.path());
        assert!(matches!(result, Err(PublishError::Git2(_))));
    }
}
