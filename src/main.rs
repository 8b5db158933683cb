use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vedshop::{
    bot::{self, BotData},
    config::{admin, database, settings},
    errors::{Error, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Shop settings
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    info!(
        "Loaded settings: currency {}, {} categories",
        settings.currency,
        settings.categories.len()
    );

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Operator
    let admin_id = admin::get_admin_user_id();
    if admin_id.is_none() {
        info!("ADMIN_USER_ID not set; operator commands are disabled");
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, settings, admin_id)).await
}
