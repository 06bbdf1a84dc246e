// IBAN Checksum - Web Server
// REST API with Axum

use clap::Parser;
use iban_checksum::{api, logging, Config};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "iban-server", version, about = "Serve IBAN checksum validation over HTTP")]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from the configuration
    #[arg(long)]
    bind: Option<String>,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    // Server logs at info by default
    logging::init_logging(args.verbose.max(1));

    let config = match Config::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let addr = args.bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("Server running on http://{}", addr);
    info!("API: http://{}/api/validate/<IBAN>", addr);

    axum::serve(listener, api::router())
        .await
        .expect("Failed to start server");
}
