//! CLI 명령 파싱 모듈.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bbpilot")]
#[command(about = "Bitbucket PR comment automation for Cloud and Server")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show effective merged config as JSON
    Config,
    /// Ensure an open PR exists for the current branch
    Pr {
        /// Create the PR without asking
        #[arg(long)]
        yes: bool,
    },
    /// Fetch the PR diff and summarize changed files
    Diff {
        /// Target PR id (defaults to the current branch's PR)
        #[arg(long)]
        pr: Option<u64>,
    },
    /// Post a single deduplicated comment
    Comment {
        /// Comment body
        #[arg(long)]
        message: String,
        /// File to anchor the comment to
        #[arg(long)]
        path: Option<String>,
        /// Destination-side line to anchor to (requires --path)
        #[arg(long, requires = "path")]
        line: Option<u32>,
        /// Target PR id (defaults to the current branch's PR)
        #[arg(long)]
        pr: Option<u64>,
        /// Create a missing PR without asking
        #[arg(long)]
        yes: bool,
    },
    /// Post a batch of comments parsed from a review file
    Review {
        /// Review file with `path:line: feedback` entries
        #[arg(long)]
        file: PathBuf,
        /// Target PR id (defaults to the current branch's PR)
        #[arg(long)]
        pr: Option<u64>,
        /// Create a missing PR without asking
        #[arg(long)]
        yes: bool,
    },
    /// Print the Jira story text for an issue key
    Story { key: String },
    /// Store the Bitbucket Basic credential
    Login,
    /// Clear the stored credential
    Logout,
}

pub enum CliAction {
    InspectConfig,
    EnsurePr {
        yes: bool,
    },
    ShowDiff {
        pr: Option<u64>,
    },
    Comment {
        message: String,
        path: Option<String>,
        line: Option<u32>,
        pr: Option<u64>,
        yes: bool,
    },
    Review {
        file: PathBuf,
        pr: Option<u64>,
        yes: bool,
    },
    Story {
        key: String,
    },
    Login,
    Logout,
}

impl Cli {
    pub fn parse_action() -> CliAction {
        match Cli::parse().command {
            Commands::Config => CliAction::InspectConfig,
            Commands::Pr { yes } => CliAction::EnsurePr { yes },
            Commands::Diff { pr } => CliAction::ShowDiff { pr },
            Commands::Comment {
                message,
                path,
                line,
                pr,
                yes,
            } => CliAction::Comment {
                message,
                path,
                line,
                pr,
                yes,
            },
            Commands::Review { file, pr, yes } => CliAction::Review { file, pr, yes },
            Commands::Story { key } => CliAction::Story { key },
            Commands::Login => CliAction::Login,
            Commands::Logout => CliAction::Logout,
        }
    }
}
