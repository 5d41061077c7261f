use std::sync::Arc;

use tracing::info;

use crate::api::handlers::AppState;
use crate::config::Config;
use crate::error::AppResult;
use crate::notify::{ChangeNotifier, LogNotifier, Notifier, PollScheduler, TelegramNotifier};
use crate::registry::RegistryReader;
use crate::sources::http_sheet::HttpSheetSource;
use crate::store::sqlite::SqliteStore;
use crate::summary::Aggregator;

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    // Durable store backs both the notified set and the subscriber directory
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);

    // One HTTP source serves both sheet shapes
    let sheets = Arc::new(HttpSheetSource::new(
        config.registry_location.clone(),
        config.fetch_timeout_secs,
    ));

    let reader = Arc::new(RegistryReader::new(sheets.clone()));
    info!("✅ Registry reader initialized for {}", config.registry_location);

    let aggregator = Arc::new(Aggregator::new(
        sheets,
        &config.paid_sentinel,
        config.fetch_concurrency,
    ));
    info!(
        "✅ Aggregator initialized (paid sentinel: {:?}, fan-out: {})",
        config.paid_sentinel, config.fetch_concurrency
    );

    let notifier: Arc<dyn Notifier> = match &config.telegram_bot_token {
        Some(token) => {
            info!("✅ Telegram notifier configured");
            Arc::new(TelegramNotifier::new(token))
        }
        None => {
            info!("⚠️  TELEGRAM_BOT_TOKEN not set - notifications are logged only");
            Arc::new(LogNotifier)
        }
    };

    let change_notifier = Arc::new(ChangeNotifier::new(
        reader.clone(),
        store.clone(),
        store.clone(),
        notifier,
        config.timezone(),
        config.tz_label.clone(),
        config.reminder_window(),
    ));

    // Time-driven path: recurring poll in the background
    let scheduler = PollScheduler::new(change_notifier, config.poll_interval_secs);
    scheduler.start();
    info!(
        "✅ Poll scheduler started (every {}s, reminder window {}h)",
        config.poll_interval_secs, config.reminder_window_hours
    );

    Ok(AppState {
        reader,
        aggregator,
        subscribers: store,
    })
}
