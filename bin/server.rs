// Student Registry - Web Server
// JSON API over the same registrations file the terminal UI uses

use anyhow::{Context, Result};
use std::path::PathBuf;
use student_registry::{api, init_logging, Config, Registry, Verbosity};
use tracing::info;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(Verbosity::Normal, None);

    // Optional config file as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load_from(config_path).context("failed to load configuration")?;

    let registry = Registry::from_config(&config);
    info!(
        path = %config.registrations_path().display(),
        output_dir = %config.output_dir().display(),
        "registry opened"
    );

    let app = api::router(registry);

    let addr = config.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(addr, "server running");
    println!("\n🚀 Server running on http://{addr}");
    println!("   API: http://{addr}/api/students");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("server stopped with an error")?;

    Ok(())
}
