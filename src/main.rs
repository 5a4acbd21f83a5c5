#![allow(clippy::result_large_err)]

use classroom_buddy::{
    ai::{CompletionService, gemini::GeminiClient},
    bot::{self, BotData},
    config,
    core::{
        clock::SystemClock,
        rollover::{self, RolloverEngine},
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the seed configuration (classes and rules)
    let app_config = config::seed::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {e}"))?;

    // 4. Connect, create tables and seed
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;
    config::seed::seed_database(&db, &app_config)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to seed database: {e}"))?;

    // 5. Catch up on a rollover missed while the bot was offline
    let engine = RolloverEngine::new(Arc::new(SystemClock));
    match engine.check_and_run(&db).await {
        Ok(Some(result)) => info!("{}", rollover::format_rollover_summary(&result)?),
        Ok(None) => info!("Calendar week {} already rolled over", engine.current_week_id()),
        Err(e) => error!("Startup rollover check failed: {e}"),
    }

    // 6. Optional AI service
    let ai: Option<Arc<dyn CompletionService>> = match config::ai::load_ai_settings() {
        Some(settings) => {
            let client = GeminiClient::new(&settings)?;
            info!("AI service enabled with model {}", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set, AI commands are disabled");
            None
        }
    };

    // 7. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, engine, ai)).await
}
