use std::sync::Arc;

use tbot_prozorro::ProzorroClient;

use tbot_core::{config::Config, formatting::TenderFormatter, pipeline::TenderPipeline};

#[tokio::main]
async fn main() -> Result<(), tbot_core::Error> {
    tbot_core::logging::init("tbot")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        base_url = %cfg.registry.base_url,
        page_limit = cfg.walk.page_limit,
        max_pages = cfg.walk.max_pages,
        "registry configured"
    );

    let source = Arc::new(ProzorroClient::new(cfg.registry.clone())?);
    let pipeline = Arc::new(TenderPipeline::new(
        source,
        cfg.filter.clone(),
        cfg.walk,
        TenderFormatter::new(cfg.deadline_offset),
    ));

    tbot_telegram::router::run_polling(cfg, pipeline)
        .await
        .map_err(|e| tbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
