use anyhow::Context;
use clap::Parser;
use mockapi_core::{
    registry::{api::GENERATE_PATH, config::RegistryConfig, init_registry},
    transport::http::{DEFAULT_BODY_LIMIT, DEFAULT_HTTP_PORT, HttpConfig, serve},
};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "mockapi-server")]
#[command(about = "Dynamic mock API server")]
struct MockApiServerArgs {
    /// Server address to bind to
    #[arg(short, long, env = "MOCKAPI_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// Server port to bind to
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_HTTP_PORT)]
    port: u16,

    /// Maximum request body size in bytes
    #[arg(long, env = "MOCKAPI_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,

    /// Base URL used in generated endpoint URLs, defaults to the request's host
    #[arg(long, env = "MOCKAPI_PUBLIC_URL")]
    public_url: Option<String>,

    /// Maximum number of live endpoints, unbounded if unset
    #[arg(long, env = "MOCKAPI_MAX_ENDPOINTS")]
    max_endpoints: Option<usize>,

    /// Count info requests as endpoint accesses
    #[arg(long, env = "MOCKAPI_COUNT_INSPECTIONS", default_value_t = false)]
    count_inspections: bool,
}

/// Log to stdout, filtered by `RUST_LOG` (defaults to info for this server and its core).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mockapi_server=info,mockapi_core=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true).compact().with_target(true))
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = MockApiServerArgs::parse();

    let registry_config = RegistryConfig::default()
        .with_count_inspections(args.count_inspections)
        .with_max_endpoints(args.max_endpoints);
    let http_config =
        HttpConfig::default().with_body_limit(args.body_limit).with_public_url(args.public_url);
    let (_, api_service) = init_registry(registry_config);

    let address = format!("{}:{}", args.address, args.port);
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind to {address}"))?;

    tracing::info!("Mock API server running on {}", listener.local_addr()?);
    tracing::info!("Access the generator at {}{}", address, GENERATE_PATH);

    serve(listener, api_service, http_config, shutdown_signal()).await?;

    Ok(())
}
