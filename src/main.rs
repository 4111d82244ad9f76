//! gait - a git dashboard backend that drives the `git` binary
//!
//! # Usage
//! ```bash
//! gait /path/to/repository              # Serve one repository
//! gait --scan-root ~/code               # Start empty, pick repositories found under ~/code
//! gait . --port 4000 --cache-ttl-secs 10
//! ```

mod config;
mod error;
mod git;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Settings;
use git::{GitRepository, RepoSlot};

/// gait - browse and manage git repositories over a JSON API
#[derive(Parser)]
#[command(name = "gait")]
#[command(about = "A git dashboard backend", long_about = None)]
struct Cli {
    /// Path to the git repository to serve (none: start with no selection)
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<PathBuf>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Seconds a branches/tags/remotes listing stays cached
    #[arg(long, default_value = "30")]
    cache_ttl_secs: u64,

    /// Timeout in seconds for history queries
    #[arg(long, default_value = "10")]
    log_timeout_secs: u64,

    /// Timeout in seconds for branch/tag/remote listings
    #[arg(long, default_value = "5")]
    metadata_timeout_secs: u64,

    /// Default number of commits per page
    #[arg(long, default_value = "50")]
    default_limit: usize,

    /// Directory searched for repositories to switch between
    #[arg(long, value_name = "DIR")]
    scan_root: Option<PathBuf>,

    /// How many directory levels below the scan root to search
    #[arg(long, default_value = "3")]
    scan_depth: usize,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            log_timeout: Duration::from_secs(self.log_timeout_secs),
            metadata_timeout: Duration::from_secs(self.metadata_timeout_secs),
            default_limit: self.default_limit,
            scan_root: self.scan_root.clone(),
            scan_depth: self.scan_depth,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    println!("\n  Shutting down...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = cli.settings();

    let repo = match &cli.repo_path {
        Some(path) => match GitRepository::open(path, settings.clone()).await {
            Ok(repo) => Some(repo),
            Err(e) => {
                eprintln!("✗ Failed to open repository: {}", e);
                eprintln!("  Path: {}", path.display());
                std::process::exit(1);
            }
        },
        None => None,
    };

    let repo_label = repo
        .as_ref()
        .map(|r| r.path().display().to_string())
        .unwrap_or_else(|| "No repository selected".to_string());
    let slot = Arc::new(RepoSlot::new(repo, settings));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(slot))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to {}: {}", addr, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    println!();
    println!("  gait");
    println!();
    println!("  Repository: {}", repo_label);
    println!("  Server:     http://{}", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
