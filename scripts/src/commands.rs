//! Implementations of the contract management workflows

use std::time::Duration;

use ethers::{abi::Token, types::Address};
use tokio::time::sleep;
use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    cli::{DeployProxyArgs, UpgradeArgs},
    constants::{
        STAKING_CONTRACT_NAME, STAKING_IMPLEMENTATION_CONTRACT_NAME, VERIFICATION_DELAY_SECS,
    },
    deployer::ProxyDeployer,
    errors::ScriptError,
    utils::requires_verification,
    verifier::SourceVerifier,
};

/// Deploy the staking contract behind an upgradeable proxy and, on networks
/// with a block explorer, verify its source afterwards
pub async fn deploy_proxy(
    args: DeployProxyArgs,
    network: &str,
    artifacts: &ArtifactStore,
    deployer: &impl ProxyDeployer,
    verifier: &impl SourceVerifier,
) -> Result<(), ScriptError> {
    let staking_artifact = artifacts.load(STAKING_CONTRACT_NAME)?;

    let fuel_address: Address = args
        .fuel_address
        .parse()
        .map_err(|e| ScriptError::CalldataConstruction(format!("fuel address: {e}")))?;
    let constructor_args = vec![Token::Address(fuel_address)];

    let proxy_address = deployer
        .deploy_proxy(&staking_artifact, &constructor_args)
        .await?;
    info!("CollectibleStaking (proxy) deployed at {:#x}", proxy_address);

    if requires_verification(network) {
        info!("Sleeping for {VERIFICATION_DELAY_SECS}s before verification");
        sleep(Duration::from_secs(VERIFICATION_DELAY_SECS)).await;

        verifier
            .verify(proxy_address, &staking_artifact, &constructor_args)
            .await?;
        info!("CollectibleStaking source verified");
    }

    Ok(())
}

/// Deploy a new staking implementation and repoint the existing proxy at it
pub async fn upgrade(
    args: UpgradeArgs,
    artifacts: &ArtifactStore,
    deployer: &impl ProxyDeployer,
) -> Result<(), ScriptError> {
    let implementation_artifact = artifacts.load(STAKING_IMPLEMENTATION_CONTRACT_NAME)?;

    let proxy_address: Address = args
        .proxy
        .parse()
        .map_err(|e| ScriptError::CalldataConstruction(format!("proxy address: {e}")))?;

    let implementation_address = deployer
        .upgrade_proxy(proxy_address, &implementation_artifact)
        .await?;
    info!(
        "CollectibleStaking upgraded, implementation now at {:#x}",
        implementation_address
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        future::Future,
        io,
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::artifacts::ContractArtifact;

    use super::*;

    const FUEL_ADDRESS: &str = "0x00000000000000000000000000000000deadbeef";
    const PROXY_ADDRESS: &str = "0x0000000000000000000000000000000000000abc";
    const IMPLEMENTATION_ADDRESS: &str = "0x0000000000000000000000000000000000000def";

    #[derive(Default)]
    struct MockDeployer {
        deploys: AtomicUsize,
        upgrades: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ProxyDeployer for MockDeployer {
        async fn deploy_proxy(
            &self,
            _implementation: &ContractArtifact,
            _init_args: &[Token],
        ) -> Result<Address, ScriptError> {
            self.deploys.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(ScriptError::ProxyDeployment(
                    "insufficient funds".to_string(),
                ));
            }
            Ok(PROXY_ADDRESS.parse().unwrap())
        }

        async fn upgrade_proxy(
            &self,
            _proxy: Address,
            _implementation: &ContractArtifact,
        ) -> Result<Address, ScriptError> {
            self.upgrades.fetch_add(1, Ordering::SeqCst);
            Ok(IMPLEMENTATION_ADDRESS.parse().unwrap())
        }
    }

    #[derive(Default)]
    struct MockVerifier {
        calls: Mutex<Vec<(Address, Vec<Token>)>>,
        fail: bool,
    }

    #[async_trait]
    impl SourceVerifier for MockVerifier {
        async fn verify(
            &self,
            address: Address,
            _artifact: &ContractArtifact,
            constructor_args: &[Token],
        ) -> Result<(), ScriptError> {
            self.calls
                .lock()
                .unwrap()
                .push((address, constructor_args.to_vec()));

            if self.fail {
                Err(ScriptError::Verification("rejected by explorer".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// A per-test artifacts directory, removed again when the test ends
    struct TestArtifacts {
        dir: PathBuf,
    }

    impl TestArtifacts {
        fn store(&self) -> ArtifactStore {
            ArtifactStore::new(&self.dir)
        }
    }

    impl Drop for TestArtifacts {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    /// A shared in-memory writer for capturing log output
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run the given workflow under a subscriber that captures its log output
    async fn capture_logs<F: Future>(fut: F) -> (F::Output, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();

        let output = fut.with_subscriber(subscriber).await;

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (output, logs)
    }

    /// Write artifacts for both staking contracts into a fresh directory
    fn test_artifacts(test_name: &str) -> TestArtifacts {
        let dir = std::env::temp_dir().join(format!(
            "collectible-scripts-{test_name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();

        for name in [STAKING_CONTRACT_NAME, STAKING_IMPLEMENTATION_CONTRACT_NAME] {
            let artifact = format!(
                r#"{{
                    "contractName": "{name}",
                    "abi": [
                        {{
                            "inputs": [{{ "internalType": "address", "name": "fuel", "type": "address" }}],
                            "name": "initialize",
                            "outputs": [],
                            "stateMutability": "nonpayable",
                            "type": "function"
                        }}
                    ],
                    "bytecode": "0x6080604052"
                }}"#
            );
            fs::write(dir.join(format!("{name}.json")), artifact).unwrap();
        }

        TestArtifacts { dir }
    }

    fn deploy_args() -> DeployProxyArgs {
        DeployProxyArgs {
            fuel_address: FUEL_ADDRESS.to_string(),
            etherscan_api_key: None,
        }
    }

    #[tokio::test]
    async fn test_deploy_on_localhost_skips_verification() {
        let artifacts = test_artifacts("deploy-localhost");
        let deployer = MockDeployer::default();
        let verifier = MockVerifier::default();

        deploy_proxy(deploy_args(), "localhost", &artifacts.store(), &deployer, &verifier)
            .await
            .unwrap();

        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 1);
        assert!(verifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_on_mainnet_verifies_with_matching_args() {
        let artifacts = test_artifacts("deploy-mainnet");
        let deployer = MockDeployer::default();
        let verifier = MockVerifier::default();

        deploy_proxy(deploy_args(), "mainnet", &artifacts.store(), &deployer, &verifier)
            .await
            .unwrap();

        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 1);

        let calls = verifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);

        let (verified_address, verified_args) = &calls[0];
        assert_eq!(*verified_address, PROXY_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(
            verified_args,
            &vec![Token::Address(FUEL_ADDRESS.parse().unwrap())],
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_verification_failure_propagates() {
        let artifacts = test_artifacts("deploy-verification-failure");
        let deployer = MockDeployer::default();
        let verifier = MockVerifier {
            fail: true,
            ..Default::default()
        };

        let err = deploy_proxy(deploy_args(), "mainnet", &artifacts.store(), &deployer, &verifier)
            .await
            .unwrap_err();

        // The deployment itself went through before verification failed
        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ScriptError::Verification(_)));
    }

    #[tokio::test]
    async fn test_deploy_rejects_malformed_fuel_address() {
        let artifacts = test_artifacts("deploy-bad-address");
        let deployer = MockDeployer::default();
        let verifier = MockVerifier::default();

        let args = DeployProxyArgs {
            fuel_address: "not-an-address".to_string(),
            etherscan_api_key: None,
        };

        let err = deploy_proxy(args, "mainnet", &artifacts.store(), &deployer, &verifier)
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 0);
        assert!(verifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_missing_artifact_aborts_before_deployment() {
        let deployer = MockDeployer::default();
        let verifier = MockVerifier::default();

        let err = deploy_proxy(
            deploy_args(),
            "mainnet",
            &ArtifactStore::new("nonexistent-artifacts-dir"),
            &deployer,
            &verifier,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScriptError::ArtifactResolution(_)));
        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deploy_failure_emits_no_address_log() {
        let artifacts = test_artifacts("deploy-failure-logs");
        let deployer = MockDeployer {
            fail: true,
            ..Default::default()
        };
        let verifier = MockVerifier::default();

        let (result, logs) = capture_logs(deploy_proxy(
            deploy_args(),
            "localhost",
            &artifacts.store(),
            &deployer,
            &verifier,
        ))
        .await;

        assert!(matches!(
            result.unwrap_err(),
            ScriptError::ProxyDeployment(_),
        ));
        assert!(!logs.contains("deployed at"));
    }

    #[tokio::test]
    async fn test_deploy_success_logs_full_proxy_address() {
        let artifacts = test_artifacts("deploy-success-logs");
        let deployer = MockDeployer::default();
        let verifier = MockVerifier::default();

        let (result, logs) = capture_logs(deploy_proxy(
            deploy_args(),
            "localhost",
            &artifacts.store(),
            &deployer,
            &verifier,
        ))
        .await;

        result.unwrap();
        // The full 0x-prefixed address, as `{:#x}` renders it
        assert!(logs.contains(&format!("deployed at {PROXY_ADDRESS}")));
    }

    #[tokio::test]
    async fn test_upgrade_never_deploys_a_proxy() {
        let artifacts = test_artifacts("upgrade");
        let deployer = MockDeployer::default();

        let args = UpgradeArgs {
            proxy: PROXY_ADDRESS.to_string(),
        };
        upgrade(args, &artifacts.store(), &deployer).await.unwrap();

        assert_eq!(deployer.upgrades.load(Ordering::SeqCst), 1);
        assert_eq!(deployer.deploys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upgrade_rejects_malformed_proxy_address() {
        let artifacts = test_artifacts("upgrade-bad-address");
        let deployer = MockDeployer::default();

        let args = UpgradeArgs {
            proxy: "not-an-address".to_string(),
        };
        let err = upgrade(args, &artifacts.store(), &deployer).await.unwrap_err();

        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
        assert_eq!(deployer.upgrades.load(Ordering::SeqCst), 0);
    }
}
