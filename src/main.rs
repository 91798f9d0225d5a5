use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pmis_api::config::config;
use pmis_api::database::DatabaseManager;
use pmis_api::is_development;

#[derive(Parser)]
#[command(name = "pmis-api")]
#[command(about = "County project monitoring and planning API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on; overrides PMIS_API_PORT/PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, DB_*, etc.
    let _ = dotenvy::dotenv();

    let default_filter = if is_development!() { "info,pmis_api=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let cli = Cli::parse();
    let config = config();
    tracing::info!("Starting PMIS API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Migrate => {
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
        Command::Serve { port } => {
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }

            let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
            let listener = tokio::net::TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", bind_addr))?;
            tracing::info!("PMIS API listening on http://{}", bind_addr);

            axum::serve(listener, pmis_api::app(pool, config)).await?;
            Ok(())
        }
    }
}
