//! Huddle server: live estimation rooms over WebSocket plus the session
//! ledger and statistics HTTP API.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server
//! cargo run --bin huddle-server -- --host 0.0.0.0 --port 3000 --log-level debug
//! ```

use std::sync::Arc;

use clap::Parser;
use huddle_server::{
    ui::{AppState, Server, ServerConfig},
    usecase::DEFAULT_ACTIVE_WINDOW_DAYS,
};
use huddle_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "huddle-server")]
#[command(about = "Estimation room server with session ledger and statistics", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Days of inactivity after which a user stops counting as active
    #[arg(long, default_value_t = DEFAULT_ACTIVE_WINDOW_DAYS)]
    active_window_days: u32,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            active_window_days: args.active_window_days,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::from(args);
    let state = AppState::in_memory(Arc::new(SystemClock), config.active_window_days);
    tracing::info!(
        "Active user window: {} days",
        config.active_window_days
    );

    if let Err(e) = Server::new(state).run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
