use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "doubloon={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let chat = Arc::new(server::HttpChat::new(
        reqwest::Client::new(),
        settings.gateway.url,
        settings.gateway.link_base,
    ));

    let starting_money = settings
        .economy
        .as_ref()
        .and_then(|economy| economy.starting_money)
        .unwrap_or(engine::DEFAULT_STARTING_MONEY);
    let weekly_money = settings
        .economy
        .as_ref()
        .and_then(|economy| economy.weekly_money);

    let server_engine = build_engine(db.clone(), chat.clone(), starting_money)?;
    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let token = settings.server.token;
    tasks.spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("failed to bind server listener: {err}");
                return;
            }
        };
        if let Err(err) = server::run_with_listener(server_engine, token, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    if let Some(amount) = weekly_money {
        let allowance_engine = build_engine(db, chat, starting_money)?;
        tasks.spawn(async move {
            tracing::info!("Weekly allowance of {amount} enabled...");
            let mut ticker = tokio::time::interval(WEEK);
            // The first tick completes immediately; startup is not payday.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = allowance_engine.distribute_allowance(amount).await {
                    tracing::error!("allowance distribution failed: {err}");
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

fn build_engine(
    db: sea_orm::DatabaseConnection,
    chat: Arc<server::HttpChat>,
    starting_money: i64,
) -> Result<engine::Engine, Box<dyn std::error::Error + Send + Sync>> {
    engine::Engine::builder()
        .database(db)
        .chat(chat)
        .starting_money(starting_money)
        .build()
        .map_err(Into::into)
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
