use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{error, info};

use srb_core::{
    config::{Config, ModerationBackendKind},
    messaging::port::MessagingPort,
    ports::ModerationBackend,
    render::ReviewCards,
    store::ReviewStore,
};
use srb_metrics::MetricsClient;
use srb_site::SiteClient;
use srb_webhook::WebhookState;

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: ReviewStore,
    pub site: Arc<SiteClient>,
    pub metrics: Arc<MetricsClient>,
    pub backend: Arc<dyn ModerationBackend>,
    pub messenger: Arc<dyn MessagingPort>,
    pub cards: Arc<ReviewCards>,
}

pub async fn run_polling(cfg: Arc<Config>, store: ReviewStore) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("bot started: @{}", me.username());
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let site = Arc::new(SiteClient::new(
        cfg.site_api_url.clone(),
        cfg.site_api_key.clone(),
    ));
    let metrics = Arc::new(MetricsClient::new(
        cfg.metrics_counter_id.clone(),
        cfg.metrics_token.clone(),
    ));

    // Deployment variant: where decisions land.
    let backend: Arc<dyn ModerationBackend> = match cfg.moderation_backend {
        ModerationBackendKind::Site => site.clone(),
        ModerationBackendKind::Local => Arc::new(store.clone()),
    };

    let cards = Arc::new(ReviewCards::default());

    // The inbound review listener runs beside the polling loop.
    let webhook_state = WebhookState {
        cfg: cfg.clone(),
        messenger: messenger.clone(),
        cards: cards.clone(),
    };
    let webhook_port = cfg.webhook_port;
    tokio::spawn(async move {
        if let Err(e) = srb_webhook::serve(webhook_state, webhook_port).await {
            error!("webhook listener failed: {e}");
        }
    });

    let state = Arc::new(AppState {
        cfg,
        store,
        site,
        metrics,
        backend,
        messenger,
        cards,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
