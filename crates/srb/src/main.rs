use std::sync::Arc;

use srb_core::{config::Config, store::ReviewStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    srb_core::logging::init("srb");

    let cfg = Arc::new(Config::load()?);
    let store = ReviewStore::open(&cfg.database_path)?;

    srb_telegram::router::run_polling(cfg, store).await
}
