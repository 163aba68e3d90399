mod common;

use std::sync::Arc;

use ethers::abi::AbiDecode;
use ethers::types::{Bytes, U256};

use common::{contracts, MockChain, MockCustodial};
use pm_wallet::bindings::collateral_token::ApproveCall;
use pm_wallet::custodial::CustodialApi;
use pm_wallet::sender::PollingSender;
use pm_wallet::{
    CustodialSigner, EnginePolicy, Error, PollPolicy, SignatureMode, SignerBackend, TradingEngine,
};

fn custodial_signer(api: &Arc<MockCustodial>) -> SignerBackend {
    let api_dyn: Arc<dyn CustodialApi> = api.clone();
    SignerBackend::Custodial(CustodialSigner::new(
        api_dyn,
        api.address(),
        Some(PollPolicy::immediate(100)),
    ))
}

fn fast_policy() -> EnginePolicy {
    EnginePolicy {
        poll: PollPolicy::immediate(100),
        ..Default::default()
    }
}

mod polling_sender_tests {
    use super::*;

    #[tokio::test]
    async fn test_gives_up_after_one_hundred_reads() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().never_confirm = true;
        let sender = PollingSender::new(api.clone(), Some(PollPolicy::immediate(100)));

        let err = sender
            .send(contracts().collateral, Bytes::from(vec![1, 2, 3, 4]), U256::zero())
            .await
            .unwrap_err();

        match err {
            Error::ConfirmationTimeout { id, attempts } => {
                assert_eq!(id, "custody-1");
                assert_eq!(attempts, 100);
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(api.state.lock().unwrap().status_reads, 100);
    }

    #[tokio::test]
    async fn test_returns_hash_once_confirming() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().pending_reads = 4;
        let sender = PollingSender::new(api.clone(), Some(PollPolicy::immediate(100)));
        let data: Bytes = ethers::abi::AbiEncode::encode(ApproveCall {
            spender: contracts().exchange,
            amount: U256::MAX,
        })
        .into();

        let hash = sender
            .send(contracts().collateral, data, U256::zero())
            .await
            .unwrap();

        assert_eq!(hash, chain.sent()[0].hash);
        assert_eq!(api.state.lock().unwrap().status_reads, 5);
    }

    #[tokio::test]
    async fn test_remote_failure_is_reported() {
        let chain = MockChain::new();
        chain.with_state(|s| s.fail_after = Some(0));
        let api = MockCustodial::new(chain.clone());
        let sender = PollingSender::new(api.clone(), Some(PollPolicy::immediate(100)));

        let err = sender
            .send(contracts().collateral, Bytes::new(), U256::zero())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteTransactionFailed { ref status, .. } if status == "FAILED"
        ));
    }

    #[tokio::test]
    async fn test_status_read_errors_are_submission_failures() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().fail_status = true;
        let sender = PollingSender::new(api.clone(), Some(PollPolicy::immediate(100)));

        let err = sender
            .send(contracts().collateral, Bytes::from(vec![1, 2, 3, 4]), U256::zero())
            .await
            .unwrap_err();

        match err {
            Error::SubmissionFailed { step, to, message } => {
                assert_eq!(step, "polling custody status");
                assert_eq!(to, contracts().collateral);
                assert!(message.contains("connection reset"), "{message}");
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(api.state.lock().unwrap().status_reads, 1);
    }
}

mod custodial_engine_tests {
    use super::*;

    #[tokio::test]
    async fn test_eoa_approvals_go_through_the_service() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        let engine = TradingEngine::new(
            chain.client(),
            Some(custodial_signer(&api)),
            SignatureMode::Eoa,
            None,
            Some(fast_policy()),
        )
        .await
        .unwrap();

        let hashes = engine.ensure_trading_enabled().await.unwrap();

        assert_eq!(hashes.len(), 6);
        assert_eq!(api.state.lock().unwrap().calls.len(), 6);
        assert!(chain.sent().iter().all(|tx| tx.from == api.address()));
    }

    #[tokio::test]
    async fn test_smart_wallet_deploy_and_relay_with_remote_signatures() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().pending_reads = 2;
        let engine = TradingEngine::new(
            chain.client(),
            Some(custodial_signer(&api)),
            SignatureMode::SmartWallet,
            None,
            Some(fast_policy()),
        )
        .await
        .unwrap();

        let (wallet, _) = engine.deploy_smart_wallet().await.unwrap();
        chain.with_state(|s| assert_eq!(s.safes.get(&wallet), Some(&api.address())));

        let hashes = engine.ensure_trading_enabled().await.unwrap();
        assert_eq!(hashes.len(), 6);

        let sent = chain.sent();
        assert_eq!(sent.len(), 7);
        for tx in &sent[1..] {
            assert_eq!(tx.to, wallet);
            assert_eq!(tx.holder, wallet);
        }
        let first = ApproveCall::decode(&sent[1].inner).unwrap();
        assert_eq!(first.spender, contracts().exchange);
    }

    async fn smart_wallet_engine(chain: &Arc<MockChain>, api: &Arc<MockCustodial>) -> TradingEngine {
        TradingEngine::new(
            chain.client(),
            Some(custodial_signer(api)),
            SignatureMode::SmartWallet,
            None,
            Some(fast_policy()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_unconfirmed_signature_is_a_signing_failure() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().never_confirm = true;
        let engine = smart_wallet_engine(&chain, &api).await;

        let err = engine.deploy_smart_wallet().await.unwrap_err();

        match err {
            Error::SignatureFailure(message) => {
                assert!(message.contains("custody-1"), "{message}");
                assert!(message.contains("100 attempts"), "{message}");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(chain.sent().is_empty());
        assert!(api.state.lock().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_signature_is_a_signing_failure() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().reject_signing = true;
        let engine = smart_wallet_engine(&chain, &api).await;

        let err = engine.deploy_smart_wallet().await.unwrap_err();

        match err {
            Error::SignatureFailure(message) => {
                assert!(message.contains("REJECTED"), "{message}");
                assert!(message.contains("blocked by signing policy"), "{message}");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_status_endpoint_is_a_signing_failure() {
        let chain = MockChain::new();
        let api = MockCustodial::new(chain.clone());
        api.state.lock().unwrap().fail_status = true;
        let engine = smart_wallet_engine(&chain, &api).await;

        let err = engine.deploy_smart_wallet().await.unwrap_err();

        assert!(matches!(err, Error::SignatureFailure(ref m) if m.contains("connection reset")));
        assert!(chain.sent().is_empty());
    }
}
