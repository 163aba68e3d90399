use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};

use crate::prelude::Result;
use crate::safe::SafeExecutor;
use crate::sender::TransactionSender;
use crate::signature::SafeOperation;

/// Where a trading call is executed from. Both arms expose the same
/// `send`, so callers never branch on the signature mode themselves.
#[derive(Debug, Clone)]
pub enum Route {
    /// The controlling account sends the call itself.
    Direct {
        sender: TransactionSender,
        account: Address,
    },
    /// The call is relayed through the owner's Safe.
    Relayed {
        executor: Arc<SafeExecutor>,
        wallet: Address,
    },
}

impl Route {
    /// The account whose balances and approvals the call acts on.
    pub fn holder(&self) -> Address {
        match self {
            Route::Direct { account, .. } => *account,
            Route::Relayed { wallet, .. } => *wallet,
        }
    }

    pub async fn send(&self, to: Address, data: Bytes, value: U256) -> Result<H256> {
        match self {
            Route::Direct { sender, .. } => sender.send(to, data, value).await,
            Route::Relayed { executor, wallet } => {
                executor
                    .execute(*wallet, to, value, data, SafeOperation::Call, None)
                    .await
            }
        }
    }
}
