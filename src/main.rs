use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_manager::{
    cache::LookupCache,
    config::Config,
    notifications::{NotificationHub, ObserverClient, ReconnectPolicy},
    repositories::JsonFileStore,
    services::CatalogService,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "catalog-manager")]
#[command(version)]
#[command(about = "A catalog service backed by a JSON document, with push notifications")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Catalog document path (overrides config file)
    #[arg(short = 'd', long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP and push-notification server (default)
    Serve,
    /// Connect to a running server and print catalog events as they arrive
    Watch {
        /// Push channel URL, defaults to the configured server's /ws endpoint
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("catalog_manager={},tower_http=trace", cli.log_level)
    } else {
        format!("catalog_manager={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(data_file) = cli.data_file {
        config.storage.data_file = data_file;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Watch { url } => watch(config, url).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting catalog manager v{}", env!("CARGO_PKG_VERSION"));
    info!("Using catalog document: {}", config.storage.data_file.display());

    let store = Arc::new(JsonFileStore::new(config.storage.data_file.clone()));

    let cache = LookupCache::new(config.cache.ttl());
    let _sweeper = cache.spawn_expiry_sweeper(config.cache.check_period());
    info!(
        ttl_secs = config.cache.ttl_seconds,
        check_period_secs = config.cache.check_period_seconds,
        "Listing cache initialized"
    );

    let notifications = NotificationHub::new(config.notifications.channel_capacity);
    let catalog = CatalogService::new(store, cache, notifications);

    let web_server = WebServer::new(config, catalog)?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}

async fn watch(config: Config, url: Option<String>) -> Result<()> {
    let url = url.unwrap_or_else(|| {
        let host = match config.web.host.as_str() {
            "0.0.0.0" => "127.0.0.1",
            host => host,
        };
        format!("ws://{}:{}/ws", host, config.web.port)
    });

    let policy = ReconnectPolicy {
        base_delay: Duration::from_secs(config.notifications.reconnect_delay_seconds),
        max_delay: Duration::from_secs(config.notifications.max_reconnect_delay_seconds),
        ..ReconnectPolicy::default()
    };
    let client = ObserverClient::new(&url, policy)?;
    info!("Watching catalog events from {}", client.url());

    tokio::select! {
        _ = client.run(|event| match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("Failed to print {} event: {}", event.kind(), e),
        }) => {}
        _ = tokio::signal::ctrl_c() => info!("Stopped watching"),
    }
    Ok(())
}
