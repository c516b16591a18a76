//! ==============================================================================
//! main.rs - smokedash entry point
//! ==============================================================================
//!
//! purpose:
//!     connects to the smoker's /status telemetry websocket and keeps a live,
//!     chart-ready history of pit temp, food temp, setpoint and blower speed.
//!
//! responsibilities:
//!     - load configuration (dashboard.toml or defaults)
//!     - initialise logging
//!     - serve the latest chart view over http
//!     - run the stream dispatcher until the connection closes
//!
//! architecture:
//!
//!     ┌────────────────────────────────────────────────────────────┐
//!     │                     smokedash (this file)                   │
//!     │  ┌──────────────────┐            ┌──────────────────────┐  │
//!     │  │ dispatcher       │  watch     │ view server          │  │
//!     │  │ (/status ws)     │ ─────────> │ (port 3000)          │  │
//!     │  └────────┬─────────┘            └──────────────────────┘  │
//!     │           │ decode -> reconcile -> buffer -> render        │
//!     └───────────┼────────────────────────────────────────────────┘
//!                 │ websocket
//!          ┌──────┴──────┐
//!          │  smoker     │
//!          │  controller │
//!          └─────────────┘
//!
//!     there is no reconnect loop: when the stream closes the last view
//!     stays available on the server until ctrl-c.
//!
//! ==============================================================================

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use smokedash::config::DashboardConfig;
use smokedash::dispatcher::Dispatcher;
use smokedash::logging;
use smokedash::server;
use smokedash::sinks::{LogSink, WatchSink};

#[derive(Parser)]
#[command(name = "smokedash")]
#[command(about = "Live telemetry dashboard for a PID-controlled smoker")]
struct Cli {
    /// path to dashboard.toml (default: search config/ and ../config/)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// websocket url of the /status stream, overrides the config file
    #[arg(long)]
    url: Option<String>,

    /// do not start the http view server
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // step 1: load configuration
    let (mut config, notes) = match &cli.config {
        Some(path) => {
            let note = format!("[CONFIG] Loaded from {}", path.display());
            (DashboardConfig::load(path)?, vec![note])
        }
        None => DashboardConfig::load_or_default(),
    };
    if let Some(url) = cli.url {
        config.stream.url = url;
    }
    if cli.no_server {
        config.server.enabled = false;
    }

    // step 2: logging
    logging::init_tracing(&config.logging.level);

    println!("===========================================================");
    println!("  smokedash - live smoker telemetry");
    println!("===========================================================");
    for note in notes {
        tracing::info!("{}", note);
    }
    config.log_summary();

    // step 3: sinks and the view server
    let (watch_sink, views) = WatchSink::channel();
    if config.server.enabled {
        let bind = config.server.bind;
        tokio::spawn(async move {
            if let Err(e) = server::run_server(bind, views).await {
                tracing::error!("[SERVER] {:#}", e);
            }
        });
    }
    let sink = (LogSink::new(config.logging.show_samples), watch_sink);

    // step 4: consume the stream until it closes
    let mut dispatcher = Dispatcher::new(sink, config.clock(), config.decode_options());
    let disconnect = dispatcher.connect(&config.stream.url).await?;
    let stats = dispatcher.stats();
    tracing::warn!(
        ?disconnect,
        applied = stats.applied,
        dropped = stats.dropped,
        samples = dispatcher.buffer().len(),
        "telemetry stream closed; not reconnecting"
    );

    if config.server.enabled {
        tracing::info!("keeping the last view available, ctrl-c to exit");
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
