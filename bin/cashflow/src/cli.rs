use std::path::PathBuf;

use alloy_core::primitives::U256;
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// How the flow split is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SplitFormat {
    Table,
    /// One `name value` pair per line.
    Plain,
}

#[derive(Parser)]
#[command(name = "cashflow")]
#[command(
    author,
    version,
    about = "Deploy the StableCashFlow contract and print its address"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "CASHFLOW_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to a Cashflow.toml configuration file, or to the directory containing it.
    ///
    /// If not provided, ./Cashflow.toml is used when it exists.
    #[arg(long, alias = "conf", env = "CASHFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// The network to deploy to, one of the networks of the configuration.
    #[arg(short, long, env = "CASHFLOW_NETWORK")]
    pub network: Option<String>,

    /// The JSON-RPC endpoint of the selected network.
    #[arg(long, alias = "rpc", env = "CASHFLOW_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Root of the compiled contract artifacts.
    #[arg(long, env = "CASHFLOW_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Hex encoded private key signing the deployment.
    ///
    /// If not provided, the first account managed by the node sends the transaction.
    #[arg(long, env = "CASHFLOW_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Number of blocks, including the inclusion block, to wait for.
    #[arg(long, env = "CASHFLOW_CONFIRMATIONS")]
    pub confirmations: Option<u64>,

    /// Directory where a JSON record of the deployment is written.
    #[arg(long, env = "CASHFLOW_RECORD_DIR")]
    pub record_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute how the contract splits an incoming flow between the two tokens.
    Split(SplitArgs),

    /// Write the resolved configuration to a Cashflow.toml file.
    Init {
        /// Destination of the configuration file.
        #[arg(long, default_value = cashflow_deploy::CONFIG_FILENAME)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Incoming flow rate, in wei per second.
    #[arg(long, value_parser = parse_u256)]
    pub flow_rate: U256,

    /// Reserve of the first token, in wei.
    #[arg(long, value_parser = parse_u256)]
    pub reserve_a: U256,

    /// Reserve of the second token, in wei.
    #[arg(long, value_parser = parse_u256)]
    pub reserve_b: U256,

    /// Output format.
    #[arg(long, default_value_t = SplitFormat::Table)]
    pub format: SplitFormat,
}

/// Parse a decimal or `0x`-prefixed hex integer.
fn parse_u256(value: &str) -> Result<U256, String> {
    value
        .parse()
        .map_err(|e| format!("invalid amount \"{}\": {}", value, e))
}
