//! Scripts for deploying and upgrading the CollectibleStaking contracts.

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod deployer;
pub mod errors;
mod solidity;
pub mod utils;
pub mod verifier;
