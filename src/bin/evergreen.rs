// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use evergreen::{
    config::Config,
    journal::Journal,
    path::default_config_file,
    repo::GitBin,
    state::{LoadOutcome, TrackerState},
    tracker::Tracker,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{env, fs, path::{Path, PathBuf}, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  evergreen [options] [<evergreen-command>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command.unwrap_or_default() {
            Command::Run(opts) => run_daily(opts),
            Command::Status(opts) => run_status(opts),
            Command::InitConfig(opts) => run_init_config(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Perform today's commits. The default command.
    #[command(override_usage = "evergreen run [options]")]
    Run(RunOptions),

    /// Show totals, streak, and recent history without committing anything.
    #[command(override_usage = "evergreen status [options]")]
    Status(StatusOptions),

    /// Write a default configuration file to edit.
    #[command(override_usage = "evergreen init-config [options]")]
    InitConfig(InitConfigOptions),
}

impl Default for Command {
    fn default() -> Self {
        Self::Run(RunOptions::default())
    }
}

#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
struct RunOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path inside the target repository. Defaults to the current directory.
    #[arg(short, long, value_name = "path")]
    pub repo: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
struct StatusOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path inside the target repository. Defaults to the current directory.
    #[arg(short, long, value_name = "path")]
    pub repo: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
struct InitConfigOptions {
    /// Overwrite an existing configuration file.
    #[arg(short, long)]
    pub force: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_daily(opts: RunOptions) -> Result<()> {
    let config = load_config(opts.config)?;
    let publisher = discover_publisher(opts.repo, &config)?;
    let work_tree = publisher.work_tree().to_path_buf();

    let state_file = resolve(config.state_file.clone(), work_tree.as_path());
    let journal_file = resolve(config.journal_file.clone(), work_tree.as_path());
    let journal = Journal::new(journal_file.as_path());
    let verbose = config.verbose;

    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<30}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.set_message("daily commits");

    let tracker = Tracker::new(config, publisher, state_file, journal);
    let today = Local::now().date_naive();
    let report = tracker.run_daily(today, &mut rand::thread_rng(), bar)?;

    info!("{report}");
    if verbose {
        if let evergreen::tracker::RunReport::Completed { fact, .. } = &report {
            info!("today's fact: {fact}");
            info!("journal appended at {:?}", journal_file.display());
        }
    }

    Ok(())
}

fn run_status(opts: StatusOptions) -> Result<()> {
    let config = load_config(opts.config)?;
    let publisher = discover_publisher(opts.repo, &config)?;
    let state_file = resolve(config.state_file.clone(), publisher.work_tree());

    let today = Local::now().date_naive();
    let (state, outcome) = TrackerState::load(state_file.as_path(), today);
    if outcome != LoadOutcome::Loaded {
        warn!("no usable tracker state at {:?}", state_file.display());
    }

    println!("total commits:  {}", state.total_commits);
    println!("current streak: {} days", state.current_streak);
    println!("tracking since: {}", state.start_date);
    match state.last_commit_date {
        Some(date) => println!("last commit:    {date}"),
        None => println!("last commit:    never"),
    }

    if !state.history.is_empty() {
        println!("\nrecent history:");
        for entry in state.history.iter().rev().take(7) {
            println!(
                "  {}  {} commits  (streak day {})",
                entry.date, entry.commit_count, entry.streak_day
            );
        }
    }

    Ok(())
}

fn run_init_config(opts: InitConfigOptions) -> Result<()> {
    let path = default_config_file()?;
    if path.exists() && !opts.force {
        anyhow::bail!(
            "configuration file already exists at {:?}, pass --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        mkdirp::mkdirp(parent)?;
    }
    fs::write(path.as_path(), Config::default().to_string())
        .with_context(|| format!("cannot write configuration file to {:?}", path.display()))?;
    info!("wrote default configuration to {:?}", path.display());

    Ok(())
}

fn load_config(override_path: Option<PathBuf>) -> Result<Config> {
    let path = match override_path {
        Some(path) => path,
        None => default_config_file()?,
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let data = fs::read_to_string(path.as_path())
        .with_context(|| format!("cannot read configuration file at {:?}", path.display()))?;
    let config = data
        .parse()
        .with_context(|| format!("cannot parse configuration file at {:?}", path.display()))?;

    Ok(config)
}

fn discover_publisher(repo: Option<PathBuf>, config: &Config) -> Result<GitBin> {
    let start = match repo {
        Some(path) => path,
        None => env::current_dir()?,
    };

    let publisher = GitBin::discover(start.as_path())
        .with_context(|| format!("no git repository found around {:?}", start.display()))?
        .with_identity(config.git_user_name.clone(), config.git_user_email.clone());

    Ok(publisher)
}

fn resolve(path: PathBuf, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
