// EJ Dashboard - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ej_dashboard::api::{router, AppState};
use ej_dashboard::{init_logging, load_csv, AppConfig};

#[derive(Parser)]
#[command(name = "ej-server", author, version, about = "Serve the EJ demographics dashboard over HTTP")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// EJ dataset CSV (overrides the config file)
    #[arg(short, long, value_name = "CSV")]
    data: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.data, cli.bind);
    init_logging(&config.logging);

    println!("🌐 EJ Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Missing or malformed data is fatal: nothing to serve without it
    let dataset = load_csv(&config.data.csv_path)?;
    println!("✓ Loaded {} tracts across {} counties", dataset.len(), dataset.counties().len());

    let app = router(AppState::new(dataset));

    let addr = config.server.bind_address.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard?county=...&bucket=Low", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
