mod common;

use ethers::abi::AbiDecode;
use ethers::types::{H256, U256};

use common::{contracts, engine, safe_engine, MockChain};
use pm_wallet::bindings::{conditional_tokens, neg_risk_adapter};
use pm_wallet::{MarketKind, SignatureMode};

fn condition() -> H256 {
    H256::repeat_byte(0x5c)
}

fn binary() -> Vec<U256> {
    vec![U256::from(1u64), U256::from(2u64)]
}

mod standard_markets {
    use super::*;

    #[tokio::test]
    async fn test_split_goes_to_conditional_tokens() {
        let chain = MockChain::new();
        let engine = engine(&chain, SignatureMode::Eoa, None).await;
        let c = contracts();

        engine
            .split(condition(), U256::from(10_000_000u64), MarketKind::Standard)
            .await
            .unwrap();

        let tx = &chain.sent()[0];
        assert_eq!(tx.to, c.conditional_tokens);
        let call = conditional_tokens::SplitPositionCall::decode(&tx.input).unwrap();
        assert_eq!(call.collateral_token, c.collateral);
        assert_eq!(call.parent_collection_id, [0u8; 32]);
        assert_eq!(call.condition_id, condition().0);
        assert_eq!(call.partition, binary());
        assert_eq!(call.amount, U256::from(10_000_000u64));
    }

    #[tokio::test]
    async fn test_merge_uses_the_binary_partition() {
        let chain = MockChain::new();
        let engine = engine(&chain, SignatureMode::Eoa, None).await;

        engine
            .merge(condition(), U256::from(3u64), MarketKind::Standard)
            .await
            .unwrap();

        let call = conditional_tokens::MergePositionsCall::decode(&chain.sent()[0].input).unwrap();
        assert_eq!(call.partition, binary());
        assert_eq!(call.amount, U256::from(3u64));
    }

    #[tokio::test]
    async fn test_redeem_through_the_safe() {
        let chain = MockChain::new();
        let (engine, wallet) = safe_engine(&chain).await;
        let c = contracts();

        engine.redeem(condition()).await.unwrap();

        let tx = &chain.sent()[0];
        assert_eq!(tx.to, wallet);
        assert_eq!(tx.target, c.conditional_tokens);
        let call = conditional_tokens::RedeemPositionsCall::decode(&tx.inner).unwrap();
        assert_eq!(call.index_sets, binary());
        assert_eq!(call.condition_id, condition().0);
    }
}

mod neg_risk_markets {
    use super::*;

    #[tokio::test]
    async fn test_split_and_merge_go_to_the_adapter() {
        let chain = MockChain::new();
        let engine = engine(&chain, SignatureMode::Eoa, None).await;
        let c = contracts();

        engine
            .split(condition(), U256::from(7u64), MarketKind::NegRisk)
            .await
            .unwrap();
        engine
            .merge(condition(), U256::from(7u64), MarketKind::NegRisk)
            .await
            .unwrap();

        let sent = chain.sent();
        assert!(sent.iter().all(|tx| tx.to == c.neg_risk_adapter));
        let split = neg_risk_adapter::SplitPositionCall::decode(&sent[0].input).unwrap();
        assert_eq!(split.condition_id, condition().0);
        assert_eq!(split.amount, U256::from(7u64));
        neg_risk_adapter::MergePositionsCall::decode(&sent[1].input).unwrap();
    }

    #[tokio::test]
    async fn test_redeem_passes_outcome_amounts() {
        let chain = MockChain::new();
        let (engine, _) = safe_engine(&chain).await;
        let amounts = vec![U256::from(5u64), U256::zero()];

        engine
            .redeem_neg_risk(condition(), amounts.clone())
            .await
            .unwrap();

        let tx = &chain.sent()[0];
        assert_eq!(tx.target, contracts().neg_risk_adapter);
        let call = neg_risk_adapter::RedeemPositionsCall::decode(&tx.inner).unwrap();
        assert_eq!(call.amounts, amounts);
    }
}
