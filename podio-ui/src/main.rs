//! podio-ui - Congregation public-talk scheduling service
//!
//! HTTP service for administering speakers, congregations, the talk
//! catalog, the agenda and the history log.

use anyhow::Result;
use clap::Parser;
use podio_common::config;
use podio_common::db::init_database;
use podio_ui::{build_router, AppState};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "podio-ui", about = "Podio public-talk scheduling service")]
struct Args {
    /// Root folder holding the database (overrides PODIO_ROOT and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, default_value_t = 5730)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Podio UI (podio-ui) v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), "PODIO_ROOT")?;
    let db_path = config::prepare_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("podio-ui listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
