//! Constants used in the contract management scripts

/// The name of the staking contract deployed behind the upgradeable proxy
pub const STAKING_CONTRACT_NAME: &str = "CollectibleStaking";

/// The name of the implementation contract deployed when upgrading the proxy
pub const STAKING_IMPLEMENTATION_CONTRACT_NAME: &str = "CollectibleStakingFactory";

/// The name of the OpenZeppelin transparent upgradeable proxy contract
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The name of the local development network, on which explorer verification is skipped
pub const LOCALHOST_NETWORK: &str = "localhost";

/// The name of the in-process development network, on which explorer verification is skipped
pub const HARDHAT_NETWORK: &str = "hardhat";

/// The number of seconds to wait after deployment before requesting verification,
/// giving the block explorer's indexer time to pick up the new contract
pub const VERIFICATION_DELAY_SECS: u64 = 20;

/// The number of seconds between checks of a pending verification's status
pub const VERIFICATION_POLL_INTERVAL_SECS: u64 = 5;

/// The status value an explorer API response carries on success
pub const EXPLORER_SUCCESS_STATUS: &str = "1";

/// The result value a verification status check carries while the request
/// is still queued
pub const PENDING_VERIFICATION_RESULT: &str = "Pending in queue";

/// The number of confirmations to wait for contract deployment transactions
pub const NUM_DEPLOY_CONFIRMATIONS: usize = 1;

/// The name of the initializer method called through the proxy at deployment
pub const INITIALIZE_METHOD: &str = "initialize";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;
