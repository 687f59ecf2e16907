//! cashflow deploys the StableCashFlow contract to an EVM network and prints its address.

mod cli;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;

use cashflow_deploy::{
    ArtifactStore, DeployConfig, DeploymentRecord, RpcEnvironment, deploy, flow,
};
use cli::{Cli, Command, SplitArgs, SplitFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout only carries the command output.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Some(Command::Split(args)) => split(args),
        Some(Command::Init { path, force }) => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists, use --force to overwrite it",
                    path.display()
                );
            }
            resolve_config(&cli)?.without_secrets().save_to_file(path)
        }
        None => run_deploy(&cli).await,
    }
}

/// Load the layered configuration and apply the command line overrides on top.
fn resolve_config(cli: &Cli) -> Result<DeployConfig> {
    let mut config = DeployConfig::load(cli.config.as_deref())?;

    if let Some(network) = &cli.network {
        config.network = network.clone();
    }
    if let Some(artifacts) = &cli.artifacts {
        config.artifacts = artifacts.clone();
    }
    if let Some(record_dir) = &cli.record_dir {
        config.record_dir = Some(record_dir.clone());
    }

    // Without an explicit URL, the network must already be configured.
    if cli.rpc_url.is_none() {
        config.network_config()?;
    }

    let network = config.network_config_mut();
    if let Some(rpc_url) = &cli.rpc_url {
        network.url = rpc_url.clone();
    }
    if let Some(private_key) = &cli.private_key {
        network.private_key = Some(private_key.clone());
    }
    if let Some(confirmations) = cli.confirmations {
        network.confirmations = confirmations;
    }

    Ok(config)
}

async fn run_deploy(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let network = config.network_config()?;

    tracing::info!(
        network = %config.network,
        url = %network.url,
        artifacts = %config.artifacts.display(),
        "Deploying to network..."
    );

    if let Some(record_dir) = &config.record_dir {
        DeploymentRecord::prepare_dir(record_dir, &config.network)?;
    }

    let env = RpcEnvironment::connect(network, ArtifactStore::new(&config.artifacts)).await?;
    let deployed = deploy(&env, &config.deployment, &mut std::io::stdout()).await?;

    // The contract is on chain at this point, a failed record must not fail the run.
    if let Some(record_dir) = &config.record_dir {
        let record = DeploymentRecord::new(&config.network, &config.deployment, &deployed);
        if let Err(e) = record.save(record_dir) {
            tracing::warn!(
                error = %e,
                address = %deployed.address,
                "Failed to save the deployment record"
            );
        }
    }

    Ok(())
}

fn split(args: &SplitArgs) -> Result<()> {
    let split = flow::split(args.flow_rate, args.reserve_a, args.reserve_b)?;

    let rows = [
        ("ratio", split.ratio),
        ("out_rate_a", split.out_rate_a),
        ("out_rate_b", split.out_rate_b),
    ];

    let mut stdout = std::io::stdout();
    let written = match args.format {
        SplitFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Flow", "Value"]);
            for (name, value) in rows {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            writeln!(stdout, "{table}")
        }
        SplitFormat::Plain => rows
            .iter()
            .try_for_each(|(name, value)| writeln!(stdout, "{} {}", name, value)),
    };

    written.context("Failed to write the flow split")
}
