//! Definitions of CLI arguments and commands for the contract management scripts

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use ethers::providers::Middleware;

use crate::{
    artifacts::ArtifactStore,
    commands::{deploy_proxy, upgrade},
    deployer::EthersDeployer,
    errors::ScriptError,
    verifier::EtherscanVerifier,
};

#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    // TODO: Better key management
    #[arg(short, long)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long)]
    pub rpc_url: String,

    /// Name of the target network, used to decide whether explorer
    /// verification runs after deployment
    #[arg(short, long)]
    pub network: String,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    DeployProxy(DeployProxyArgs),
    Upgrade(UpgradeArgs),
}

impl Command {
    pub async fn run(
        self,
        client: Arc<impl Middleware>,
        network: &str,
        artifacts_dir: &Path,
    ) -> Result<(), ScriptError> {
        let artifacts = ArtifactStore::new(artifacts_dir);
        let deployer = EthersDeployer::new(client, artifacts.clone());

        match self {
            Command::DeployProxy(args) => {
                let verifier = EtherscanVerifier::new(network, args.etherscan_api_key.clone());
                deploy_proxy(args, network, &artifacts, &deployer, &verifier).await
            }
            Command::Upgrade(args) => upgrade(args, &artifacts, &deployer).await,
        }
    }
}

/// Deploy the CollectibleStaking upgradeable proxy contract.
///
/// Concretely, this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
///
/// The staking implementation is deployed alongside the proxy and initialized
/// through it with the fuel token address.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Fuel token contract address, the staking contract's sole
    /// initializer argument
    #[arg(short, long, env = "FUEL_ADDRESS")]
    pub fuel_address: String,

    /// Block explorer API key, required when verifying on a public network
    #[arg(short, long, env = "ETHERSCAN_API_KEY")]
    pub etherscan_api_key: Option<String>,
}

/// Upgrade the staking proxy to a newly deployed implementation
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the CollectibleStaking proxy contract to upgrade
    #[arg(short, long, env = "COLLECTIBLE_STAKING_ADDRESS")]
    pub proxy: String,
}
