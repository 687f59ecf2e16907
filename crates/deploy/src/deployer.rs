use std::io::Write;

use anyhow::{Context, Result};

use crate::{
    request::DeploymentRequest,
    traits::{DeployEnvironment, DeployedContract},
};

/// Deploy the requested contract and report its address.
///
/// The factory is resolved and the creation transaction sent exactly once. Once the deployment
/// is confirmed, a single `<contract> deployed to: <address>` line is written to `out`.
/// Nothing is written when any step fails.
pub async fn deploy<E, W>(
    env: &E,
    request: &DeploymentRequest,
    out: &mut W,
) -> Result<DeployedContract>
where
    E: DeployEnvironment,
    W: Write,
{
    tracing::info!(
        contract = %request.contract,
        constructor_args = ?request.constructor_args,
        "Starting deployment..."
    );

    let factory = env
        .contract_factory(&request.contract)
        .with_context(|| format!("Failed to load contract \"{}\"", request.contract))?;

    let pending = env
        .deploy(&factory, &request.constructor_args)
        .await
        .with_context(|| format!("Failed to deploy \"{}\"", request.contract))?;

    let deployed = env.wait_deployed(pending).await.with_context(|| {
        format!(
            "Failed to confirm the deployment of \"{}\"",
            request.contract
        )
    })?;

    writeln!(
        out,
        "{} deployed to: {}",
        request.display_name(),
        deployed.address
    )
    .context("Failed to write the deployed address")?;

    Ok(deployed)
}
