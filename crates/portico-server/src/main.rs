use clap::Parser;
use portico_server::config::AppConfig;
use portico_server::routes;
use portico_server::state::AppState;
use portico_sqldb::ConfigStore;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "portico-server", version, about = "Portico SQL database service host")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let database_url = config
        .platform_db
        .connection_string()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| {
            anyhow::anyhow!("no platform database configured (set platform_db.database_url or DATABASE_URL)")
        })?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    let store = ConfigStore::new(pool);
    store.migrate().await?;

    let state = AppState::new(store, config.oracle.clone());
    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    tracing::info!("portico-server listening on {}", config.server.bind);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
