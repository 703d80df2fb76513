//! Utilities for the contract management scripts.

use std::{str::FromStr, sync::Arc};

use ethers::{
    abi::{Abi, Token},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};

use crate::{
    constants::{HARDHAT_NETWORK, INITIALIZE_METHOD, LOCALHOST_NETWORK},
    errors::ScriptError,
};

/// Sets up the client with which to deploy and interact with the contracts,
/// attaching the deployer's wallet to the provider.
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<Arc<impl Middleware>, ScriptError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let wallet = LocalWallet::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .as_u64();
    let client = Arc::new(SignerMiddleware::new(provider, wallet.with_chain_id(chain_id)));

    Ok(client)
}

/// Whether explorer verification should run on the given network.
///
/// Local development networks have no block explorer to verify against.
pub fn requires_verification(network: &str) -> bool {
    network != LOCALHOST_NETWORK && network != HARDHAT_NETWORK
}

/// Prepare calldata for the implementation contract's initializer method
pub fn initializer_calldata(abi: &Abi, args: &[Token]) -> Result<Vec<u8>, ScriptError> {
    abi.function(INITIALIZE_METHOD)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?
        .encode_input(args)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}
