use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use shop_dashboard::config::AppConfig;
use shop_dashboard::services::dashboard::{DashboardOptions, DashboardService};
use shop_dashboard::services::shop_client::ShopClient;
use shop_dashboard::{routes, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env()?;

    let client = ShopClient::new(&config.shop_api_base_url, config.shop_api_timeout())?;
    let dashboard = Arc::new(DashboardService::new(
        client,
        DashboardOptions {
            settings: config.metrics.clone(),
            zone: config.local_zone(),
            demo_mode: config.demo_mode,
        },
    ));

    if config.demo_mode {
        tracing::warn!("Demo mode enabled: missing sales and waste are replaced with sample data");
    }

    // Warm the snapshot so the first dashboard request does not wait on the shop API.
    let warmup = Arc::clone(&dashboard);
    tokio::spawn(async move {
        warmup.refresh().await;
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(
        host = %addr,
        shop_api = %config.shop_api_base_url,
        "Starting shop dashboard API server"
    );

    let app = routes::router(AppState { config, dashboard });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
