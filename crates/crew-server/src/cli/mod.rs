use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `crewd` binary.
#[derive(Debug, Parser)]
#[command(name = "crewd", version, about = "Crew - collaborative project server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to layer over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP and notification server.
    Serve,
    /// Create or upgrade the database schema, then exit.
    Migrate,
    /// Identity token tooling.
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
    /// Print a fresh hex secret key for `auth.secret_key`.
    Keygen,
}

#[derive(Clone, Debug, Subcommand)]
pub enum TokenCommands {
    /// Mint a token signed with the configured key.
    Issue(IssueArgs),
}

#[derive(Clone, Debug, Args)]
pub struct IssueArgs {
    /// User id the token asserts.
    #[arg(long)]
    pub user: String,
    /// Display name carried in the token.
    #[arg(long)]
    pub name: String,
    /// Lifetime in seconds (defaults to `auth.token_ttl_secs`).
    #[arg(long)]
    pub ttl_secs: Option<i64>,
}
