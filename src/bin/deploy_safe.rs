use log::{error, info};
use pm_wallet::prelude::Result;
use pm_wallet::{derive_create2_address, Error, Settings, TradingEngine};

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    let engine = TradingEngine::from_settings(&settings).await?;
    let owner = engine.signer()?.address();

    let account = engine.smart_wallet_account(owner).await?;
    let offline = derive_create2_address(engine.contracts().safe_proxy_factory, owner)?;
    if offline != account.address {
        return Err(Error::DerivationFailed {
            owner,
            message: format!(
                "factory reports {:?}, CREATE2 gives {offline:?}",
                account.address
            ),
        });
    }
    info!("owner {owner:?} -> safe {:?} (deployed: {})", account.address, account.deployed);

    match engine.deploy_smart_wallet().await {
        Ok((wallet, hash)) => info!("deploying {wallet:?} in {hash:?}"),
        Err(Error::AlreadyDeployed(wallet)) => info!("{wallet:?} is already deployed"),
        Err(e) => return Err(e),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("deploy_safe failed: {e}");
        std::process::exit(1);
    }
}
