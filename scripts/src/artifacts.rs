//! Resolution of compiled contract artifacts.
//!
//! The Solidity toolchain compiles the contracts out-of-band and writes one
//! JSON artifact per contract into the artifacts directory; this module only
//! resolves that output by contract name.

use std::{fs::File, path::PathBuf};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use crate::errors::ScriptError;

/// A compiled contract artifact, as written by the Solidity toolchain
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The name of the compiled contract
    pub contract_name: String,
    /// The contract's ABI
    pub abi: Abi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
    /// The contract's flattened source, included when the artifact
    /// is exported for explorer verification
    #[serde(default)]
    pub source: Option<String>,
    /// The full version string of the compiler that produced the artifact
    #[serde(default)]
    pub compiler_version: Option<String>,
}

/// Resolves contract artifacts from the artifacts directory by contract name
#[derive(Clone)]
pub struct ArtifactStore {
    /// The directory containing the compiled artifacts
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the artifact for the named contract, failing if the contract
    /// has not been compiled into the artifacts directory
    pub fn load(&self, contract_name: &str) -> Result<ContractArtifact, ScriptError> {
        let path = self.dir.join(format!("{contract_name}.json"));
        let file = File::open(&path)
            .map_err(|e| ScriptError::ArtifactResolution(format!("{}: {}", path.display(), e)))?;

        serde_json::from_reader(file).map_err(|e| ScriptError::ArtifactResolution(e.to_string()))
    }
}
