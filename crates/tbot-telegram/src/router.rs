use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tbot_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use tbot_core::{
    config::Config,
    dispatch::Dispatcher as TenderDispatcher,
    messaging::port::MessagingPort,
    pipeline::TenderPipeline,
    scheduler::PeriodicScheduler,
    service::TenderService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: TenderService,
    pub messenger: Arc<dyn MessagingPort>,
    pub scheduler: PeriodicScheduler,
}

impl AppState {
    /// Wire the shared tender service, the scheduled broadcast and the reply messenger.
    pub fn new(
        cfg: Arc<Config>,
        pipeline: Arc<TenderPipeline>,
        raw_messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
            raw_messenger,
            ThrottleConfig {
                global_min_interval: cfg.telegram_global_interval,
                ..ThrottleConfig::default()
            },
        ));
        let service = TenderService::new(
            pipeline,
            TenderDispatcher::new(messenger.clone(), cfg.send_delay),
        );
        let scheduler = PeriodicScheduler::new(service.clone(), cfg.schedule());

        Self {
            cfg,
            service,
            messenger,
            scheduler,
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>, pipeline: Arc<TenderPipeline>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    serve(bot, cfg, pipeline).await
}

/// Fails before anything is started if the token is rejected.
async fn serve(bot: Bot, cfg: Arc<Config>, pipeline: Arc<TenderPipeline>) -> anyhow::Result<()> {
    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed, check TELEGRAM_BOT_TOKEN")?;
    tracing::info!(username = %me.username(), "tender bot started");
    tracing::info!("commands: /start, /help, /tenders, /status");
    tracing::info!(
        every_mins = cfg.check_interval.as_secs() / 60,
        chat_id = cfg.chat_id.0,
        "automatic check configured"
    );

    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, pipeline, raw_messenger));

    state.scheduler.start().await;

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    state.scheduler.stop().await;
    tracing::info!("tender bot stopped");

    Ok(())
}
