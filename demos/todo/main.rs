//! Todo API served from `demos/todo/routes`.
//!
//! ```text
//! cargo run --example todo -- --config demos/todo/routedir.toml
//! curl -X POST localhost:4444/api/todos -H 'content-type: application/json' -d '{"title":"milk"}'
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use routedir::config::load_config;
use routedir::observability::{logging, metrics};
use routedir::{HttpServer, Shutdown};

#[path = "routes/_store.rs"]
mod store;
#[path = "routes/index.rs"]
mod index;
#[path = "routes/todos.rs"]
mod todos;

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Todo API on routedir")]
struct Args {
    /// Configuration file.
    #[arg(long, default_value = "demos/todo/routedir.toml")]
    config: PathBuf,

    /// Override the configured port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    logging::init(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = routedir::register_routes![index, todos];
    let server = HttpServer::bootstrap(config, &registry)?;
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
