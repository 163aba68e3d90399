use log::{error, info};
use pm_wallet::prelude::Result;
use pm_wallet::{Settings, TradingEngine};

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    let engine = TradingEngine::from_settings(&settings).await?;

    let holder = engine.trading_address().await?;
    let before = engine.allowance_snapshot(holder).await?;
    info!("before: {before}");

    let hashes = engine.ensure_trading_enabled().await?;
    if hashes.is_empty() {
        info!("nothing to approve");
    }
    for hash in &hashes {
        info!("submitted {hash:?}");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("enable_trading failed: {e}");
        std::process::exit(1);
    }
}
