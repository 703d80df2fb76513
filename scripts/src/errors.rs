//! Definitions of errors that can occur during the execution of the contract management scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the contract management scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error resolving a compiled contract artifact
    ArtifactResolution(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying the upgradeable proxy
    ProxyDeployment(String),
    /// Error upgrading the proxy to a new implementation
    ProxyUpgrade(String),
    /// Error verifying contract source on the block explorer
    Verification(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactResolution(s) => write!(f, "error resolving artifact: {}", s),
            ScriptError::CalldataConstruction(s) => {
                write!(f, "error constructing calldata: {}", s)
            }
            ScriptError::ProxyDeployment(s) => write!(f, "error deploying proxy: {}", s),
            ScriptError::ProxyUpgrade(s) => write!(f, "error upgrading proxy: {}", s),
            ScriptError::Verification(s) => write!(f, "error verifying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
