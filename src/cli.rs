//! Command-line interface.
//!
//! Every `run` flag falls back to an environment variable of the same name,
//! which may in turn come from a `.env` file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::{IssueKind, RawConfig, RunConfig, env_template};
use crate::github::OctocrabClient;
use crate::lifecycle::{Orchestrator, RunReport};
use crate::types::Identities;

/// Opens, reviews and merges automated pull requests with two GitHub accounts
#[derive(Parser, Debug)]
#[command(name = "pull-merge-bot", version)]
#[command(about = "Automated pull request lifecycle bot", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one branch, commit, pull request, review and merge cycle
    Run(RunArgs),
    /// Print the effective configuration with tokens masked
    Config(ConfigArgs),
    /// Print a .env template
    Setup,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Token of the proposer account (opens and comments on the PR)
    #[arg(long, env = "TOKEN_A", hide_env_values = true)]
    pub token_a: Option<String>,

    /// Token of the approver account (approves and merges the PR)
    #[arg(long, env = "TOKEN_B", hide_env_values = true)]
    pub token_b: Option<String>,

    #[arg(long, env = "REPO_OWNER")]
    pub repo_owner: Option<String>,

    #[arg(long, env = "REPO_NAME")]
    pub repo_name: Option<String>,

    /// Proposer's username, shown in generated text
    #[arg(long, env = "FORK_OWNER")]
    pub fork_owner: Option<String>,

    /// Working branch [default: jonny]
    #[arg(long, env = "BRANCH_NAME")]
    pub branch_name: Option<String>,

    /// Open an issue (subject to --random-chance)
    #[arg(long, env = "CREATE_ISSUE")]
    pub create_issue: bool,

    #[arg(long, env = "ISSUE_TYPE", value_enum)]
    pub issue_type: Option<IssueKind>,

    #[arg(long, env = "ISSUE_TITLE")]
    pub issue_title: Option<String>,

    #[arg(long, env = "ISSUE_BODY")]
    pub issue_body: Option<String>,

    /// Review and approve the PR before merging (subject to --random-chance)
    #[arg(long, env = "ENABLE_CODE_REVIEW")]
    pub enable_code_review: bool,

    /// Chance, in percent, that each optional action happens [default: 30]
    #[arg(long, env = "RANDOM_CHANCE_PERCENTAGE")]
    pub random_chance: Option<u32>,

    /// File rewritten on every run [default: README.md]
    #[arg(long)]
    pub file_path: Option<String>,

    /// Mergeability rechecks before giving up [default: 20]
    #[arg(long)]
    pub max_rechecks: Option<u32>,
}

impl From<ConfigArgs> for RawConfig {
    fn from(args: ConfigArgs) -> Self {
        RawConfig {
            token_a: args.token_a,
            token_b: args.token_b,
            repo_owner: args.repo_owner,
            repo_name: args.repo_name,
            fork_owner: args.fork_owner,
            branch_name: args.branch_name,
            create_issue: args.create_issue,
            issue_kind: args.issue_type,
            issue_title: args.issue_title,
            issue_body: args.issue_body,
            enable_code_review: args.enable_code_review,
            random_chance: args.random_chance,
            file_path: args.file_path,
            max_rechecks: args.max_rechecks,
        }
    }
}

impl Cli {
    /// Parses the command line, loading the `.env` file first so its values
    /// can fill in missing flags.
    pub fn load() -> Result<Self> {
        let cli = Cli::parse();
        match &cli.env_file {
            Some(path) => {
                load_env_file(path)?;
                Ok(Cli::parse())
            }
            None => {
                if dotenvy::dotenv().is_err() {
                    // No ./.env; flags and the real environment are enough.
                    return Ok(cli);
                }
                Ok(Cli::parse())
            }
        }
    }
}

fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Runs the parsed command.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Run(args) => {
            let config = RunConfig::from_raw(args.config.into())?;
            let report = run(config).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", summarize(&report));
            }
            Ok(if report.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Config(args) => {
            let config = RunConfig::from_raw(args.into())?;
            print!("{}", describe(&config));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Setup => {
            print!("{}", env_template());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(config: RunConfig) -> Result<RunReport> {
    let proposer = OctocrabClient::from_token(config.proposer_token.expose(), config.repo.clone())
        .context("failed to build proposer client")?;
    let approver = OctocrabClient::from_token(config.approver_token.expose(), config.repo.clone())
        .context("failed to build approver client")?;
    info!(repo = %config.repo, "clients ready");

    let orchestrator = Orchestrator::new(config, Identities::new(proposer, approver));
    Ok(orchestrator.run().await)
}

/// Human-readable effective configuration. Tokens are masked.
pub fn describe(config: &RunConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository:        {}", config.repo);
    let _ = writeln!(out, "Proposer token:    {}", config.proposer_token.masked());
    let _ = writeln!(out, "Approver token:    {}", config.approver_token.masked());
    let _ = writeln!(out, "Fork owner:        {}", config.fork_owner);
    let _ = writeln!(out, "Branch:            {}", config.branch);
    let _ = writeln!(out, "File:              {}", config.file_path);
    let _ = writeln!(out, "Create issue:      {}", config.create_issue);
    if config.create_issue {
        let _ = writeln!(out, "Issue type:        {}", config.issue.kind);
        let _ = writeln!(out, "Issue title:       {}", config.issue.title);
    }
    let _ = writeln!(out, "Code review:       {}", config.enable_code_review);
    let _ = writeln!(out, "Random chance:     {}", config.probability);
    let _ = writeln!(out, "Max rechecks:      {}", config.poll.max_rechecks);
    out
}

/// One-paragraph summary of a run for the terminal.
pub fn summarize(report: &RunReport) -> String {
    let mut out = String::new();
    for record in &report.phases {
        let _ = writeln!(
            out,
            "{:<14} {:<10} {}",
            format!("{:?}", record.phase),
            format!("{:?}", record.status),
            record.detail
        );
    }
    if report.success {
        let _ = writeln!(out, "Run succeeded for {} on {}.", report.repository, report.branch);
    } else {
        let _ = writeln!(
            out,
            "Run failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
        if let Some(hint) = &report.remediation {
            let _ = writeln!(out, "Hint: {hint}");
        }
    }
    out
}
