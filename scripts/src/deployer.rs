//! The proxy deployment service: deploying an implementation behind a
//! transparent upgradeable proxy, and repointing the proxy at a new
//! implementation.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use ethers::{
    abi::{Address, Token},
    contract::ContractFactory,
    providers::Middleware,
    types::{Bytes, H256},
};

use crate::{
    artifacts::{ArtifactStore, ContractArtifact},
    constants::{
        NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT, NUM_DEPLOY_CONFIRMATIONS,
        PROXY_ADMIN_STORAGE_SLOT, PROXY_CONTRACT_NAME,
    },
    errors::ScriptError,
    solidity::ProxyAdminContract,
    utils::initializer_calldata,
};

/// The interface to the proxy deployment framework.
///
/// Implementations submit the underlying transactions and only resolve once
/// they are confirmed on-chain; no timeout is enforced anywhere, an
/// unresponsive network suspends the calling task indefinitely.
#[async_trait]
pub trait ProxyDeployer {
    /// Deploy a fresh implementation of the given artifact behind an
    /// upgradeable proxy, initializing it through the proxy with the given
    /// arguments. Returns the proxy's address once confirmed.
    async fn deploy_proxy(
        &self,
        implementation: &ContractArtifact,
        init_args: &[Token],
    ) -> Result<Address, ScriptError>;

    /// Deploy a fresh implementation of the given artifact and repoint the
    /// existing proxy at it. Returns the new implementation's address once
    /// confirmed.
    async fn upgrade_proxy(
        &self,
        proxy: Address,
        implementation: &ContractArtifact,
    ) -> Result<Address, ScriptError>;
}

/// A [`ProxyDeployer`] backed by an RPC client with the deployer's
/// wallet attached
pub struct EthersDeployer<M> {
    /// The RPC client used to submit transactions
    client: Arc<M>,
    /// The store from which the proxy contract's own artifact is resolved
    artifacts: ArtifactStore,
}

impl<M: Middleware> EthersDeployer<M> {
    pub fn new(client: Arc<M>, artifacts: ArtifactStore) -> Self {
        Self { client, artifacts }
    }

    /// Deploy the implementation contract for the given artifact.
    ///
    /// The implementation takes no constructor arguments; initialization
    /// happens through the proxy.
    async fn deploy_implementation(
        &self,
        implementation: &ContractArtifact,
        map_err: fn(String) -> ScriptError,
    ) -> Result<Address, ScriptError> {
        let factory = ContractFactory::new(
            implementation.abi.clone(),
            implementation.bytecode.clone(),
            self.client.clone(),
        );

        let contract = factory
            .deploy_tokens(vec![])
            .map_err(|e| map_err(e.to_string()))?
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .send()
            .await
            .map_err(|e| map_err(e.to_string()))?;

        Ok(contract.address())
    }
}

#[async_trait]
impl<M: Middleware> ProxyDeployer for EthersDeployer<M> {
    async fn deploy_proxy(
        &self,
        implementation: &ContractArtifact,
        init_args: &[Token],
    ) -> Result<Address, ScriptError> {
        let implementation_address = self
            .deploy_implementation(implementation, ScriptError::ProxyDeployment)
            .await?;

        let init_calldata = initializer_calldata(&implementation.abi, init_args)?;

        // The deployer is the initial owner of the proxy admin contract
        let admin_owner = self
            .client
            .default_sender()
            .ok_or_else(|| {
                ScriptError::ClientInitialization(
                    "client does not have sender attached".to_string(),
                )
            })?;

        let proxy_artifact = self.artifacts.load(PROXY_CONTRACT_NAME)?;
        let proxy_factory = ContractFactory::new(
            proxy_artifact.abi.clone(),
            proxy_artifact.bytecode.clone(),
            self.client.clone(),
        );

        let proxy_contract = proxy_factory
            .deploy_tokens(vec![
                Token::Address(implementation_address),
                Token::Address(admin_owner),
                Token::Bytes(init_calldata),
            ])
            .map_err(|e| ScriptError::ProxyDeployment(e.to_string()))?
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .send()
            .await
            .map_err(|e| ScriptError::ProxyDeployment(e.to_string()))?;

        Ok(proxy_contract.address())
    }

    async fn upgrade_proxy(
        &self,
        proxy: Address,
        implementation: &ContractArtifact,
    ) -> Result<Address, ScriptError> {
        let implementation_address = self
            .deploy_implementation(implementation, ScriptError::ProxyUpgrade)
            .await?;

        // Get the proxy admin contract address.
        // This is the recommended way to get the proxy admin address:
        // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
        let admin_slot_value = self
            .client
            .get_storage_at(
                proxy,
                // Can `unwrap` here since we know the storage slot constitutes a valid H256
                H256::from_str(PROXY_ADMIN_STORAGE_SLOT).unwrap(),
                None, /* block */
            )
            .await
            .map_err(|e| ScriptError::ProxyUpgrade(e.to_string()))?;

        let proxy_admin_address = Address::from_slice(
            &admin_slot_value.as_bytes()[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..],
        );
        let proxy_admin = ProxyAdminContract::new(proxy_admin_address, self.client.clone());

        proxy_admin
            .upgrade_and_call(proxy, implementation_address, Bytes::new())
            .send()
            .await
            .map_err(|e| ScriptError::ProxyUpgrade(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ProxyUpgrade(e.to_string()))?;

        Ok(implementation_address)
    }
}
