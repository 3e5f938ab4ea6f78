use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use accesshub::authz::web::{self, AppState};
use accesshub::authz::{loader, SnapshotStore};
use accesshub::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "accesshub",
    version,
    about = "Access-control resolution service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // load and compile the initial snapshot
    let policy = settings.resolution_policy();
    let snapshot = loader::load_snapshot(&settings.snapshot.path, policy)?;
    let state = Arc::new(AppState {
        store: SnapshotStore::new(snapshot),
        snapshot_path: settings.snapshot.path.clone(),
        policy,
    });

    // start web server
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, web::router(state))
        .await
        .into_diagnostic()?;
    Ok(())
}
