use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "attest", version, about = "Inspect and verify notarized artifacts against the ledger")]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Plain)]
    pub output: OutputMode,

    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = ".attest/config.json")]
    pub config: PathBuf,

    /// Log filter directive, e.g. `info` or `attest_core=debug`.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the notarization history of an artifact, reconciled with the platform.
    Inspect(InspectArgs),

    /// Verify the latest notarization of an artifact.
    Verify(VerifyArgs),
}

/// Which artifact to look up.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Local file to fingerprint with SHA-256.
    pub file: Option<PathBuf>,

    /// Artifact fingerprint; used instead of a file.
    #[arg(long)]
    pub hash: Option<String>,

    /// Restrict to entries written by this signer.
    #[arg(long)]
    pub signer_id: Option<String>,
}

/// Inline ledger endpoint. An API key switches the invocation to a ledger-scoped principal.
#[derive(Args, Debug, Clone, Default)]
pub struct LedgerArgs {
    #[arg(long)]
    pub lc_host: Option<String>,

    #[arg(long)]
    pub lc_port: Option<u16>,

    #[arg(long)]
    pub lc_api_key: Option<String>,

    /// Use TLS towards the ledger gateway.
    #[arg(long)]
    pub lc_tls: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Oldest N entries.
    #[arg(long, default_value_t = 0)]
    pub first: u64,

    /// Newest N entries.
    #[arg(long, default_value_t = 0)]
    pub last: u64,

    /// Range start, YYYY-MM-DD.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, YYYY-MM-DD.
    #[arg(long)]
    pub end: Option<String>,

    #[command(flatten)]
    pub ledger: LedgerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Exit code to use when the artifact is trusted.
    #[arg(long)]
    pub exit_code: Option<i32>,

    #[command(flatten)]
    pub ledger: LedgerArgs,
}
