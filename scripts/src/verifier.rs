//! The block-explorer source verification service.

use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    abi::{encode, Address, Token},
    etherscan::{verify::VerifyContract, Client, Response},
    types::Chain,
};
use tokio::time::sleep;
use tracing::info;

use crate::{
    artifacts::ContractArtifact,
    constants::{
        EXPLORER_SUCCESS_STATUS, PENDING_VERIFICATION_RESULT, VERIFICATION_POLL_INTERVAL_SECS,
    },
    errors::ScriptError,
};

/// The interface to the block-explorer verification service
#[async_trait]
pub trait SourceVerifier {
    /// Register the deployed contract's source with the block explorer,
    /// linking its on-chain bytecode to human-readable source
    async fn verify(
        &self,
        address: Address,
        artifact: &ContractArtifact,
        constructor_args: &[Token],
    ) -> Result<(), ScriptError>;
}

/// A [`SourceVerifier`] backed by the Etherscan-style explorer for the
/// target network
pub struct EtherscanVerifier {
    /// The name of the target network
    network: String,
    /// The explorer API key, if one was supplied
    api_key: Option<String>,
}

impl EtherscanVerifier {
    pub fn new(network: &str, api_key: Option<String>) -> Self {
        Self {
            network: network.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        address: Address,
        artifact: &ContractArtifact,
        constructor_args: &[Token],
    ) -> Result<(), ScriptError> {
        let chain = self.network.parse::<Chain>().map_err(|_| {
            ScriptError::Verification(format!(
                "no block explorer known for network `{}`",
                self.network
            ))
        })?;
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ScriptError::Verification("an explorer API key is required".to_string())
        })?;
        let client =
            Client::new(chain, api_key).map_err(|e| ScriptError::Verification(e.to_string()))?;

        let source = artifact.source.clone().ok_or_else(|| {
            ScriptError::Verification(format!(
                "artifact for {} does not include source code",
                artifact.contract_name
            ))
        })?;
        let compiler_version = artifact.compiler_version.clone().ok_or_else(|| {
            ScriptError::Verification(format!(
                "artifact for {} does not include a compiler version",
                artifact.contract_name
            ))
        })?;

        let constructor_arguments =
            (!constructor_args.is_empty()).then(|| hex::encode(encode(constructor_args)));

        let request = VerifyContract::new(
            address,
            artifact.contract_name.clone(),
            source,
            compiler_version,
        )
        .constructor_arguments(constructor_arguments);

        let response = client
            .submit_contract_verification(&request)
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;
        if response.status != EXPLORER_SUCCESS_STATUS {
            return Err(ScriptError::Verification(response.result));
        }

        let guid = response.result;
        info!("verification submitted, request id {guid}");

        // The explorer verifies asynchronously; a GUID only acknowledges the
        // request, so poll its status until it reaches a terminal state
        loop {
            sleep(Duration::from_secs(VERIFICATION_POLL_INTERVAL_SECS)).await;

            let status = client
                .check_contract_verification_status(&guid)
                .await
                .map_err(|e| ScriptError::Verification(e.to_string()))?;

            if let Some(outcome) = verification_outcome(&status) {
                return outcome;
            }
        }
    }
}

/// Interpret a verification status response, returning `None` while the
/// explorer still has the request queued
fn verification_outcome(response: &Response<String>) -> Option<Result<(), ScriptError>> {
    if response.result == PENDING_VERIFICATION_RESULT {
        return None;
    }

    if response.status == EXPLORER_SUCCESS_STATUS {
        Some(Ok(()))
    } else {
        Some(Err(ScriptError::Verification(response.result.clone())))
    }
}
