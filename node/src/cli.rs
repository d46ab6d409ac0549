//! Command-line interface for the ATTEST registry node.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use attest_protocol::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

#[derive(Parser)]
#[command(
    name = "attest-node",
    about = "ATTEST credential registry node",
    version
)]
pub struct AttestNodeCli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the registry node.
    Run(RunArgs),

    /// Generate a fresh identity keypair and print it.
    Init(InitArgs),

    /// Print version and protocol information.
    Version,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Port for the registry HTTP API.
    #[arg(long, env = "ATTEST_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ATTEST_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Directory for the registry database.
    #[arg(long, env = "ATTEST_DATA_DIR", default_value = "./attest-data")]
    pub data_dir: PathBuf,

    /// Registry owner address (atst1...). Required unless --dev.
    #[arg(long, env = "ATTEST_OWNER")]
    pub owner: Option<String>,

    /// Verification policy for issuer de-authorization.
    #[arg(long, env = "ATTEST_POLICY", value_enum, default_value = "trust-at-issuance")]
    pub policy: PolicyArg,

    /// Dev mode: in-memory database, ephemeral owner identity if none
    /// was given.
    #[arg(long)]
    pub dev: bool,

    /// Log output format.
    #[arg(long, env = "ATTEST_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Write the secret key to this file instead of printing it.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    TrustAtIssuance,
    RecheckCurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}
