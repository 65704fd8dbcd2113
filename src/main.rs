use anyhow::{bail, Context};
use clap::Parser;
use similar_products::api::{create_router, AppState};
use similar_products::config::Config;
use similar_products::klaviyo::KlaviyoClient;
use similar_products::prestashop::PrestaShopAdapter;
use similar_products::service::SimilarProductsService;
use similar_products::{adapter::EcommerceAdapter, logging};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Similar-products recommendation webhook service", long_about = None)]
struct Args {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init();

    let config = Config::from_env().context("configuration validation failed")?;
    let timeout = Duration::from_secs(config.api_timeout_secs);

    let adapter: Arc<dyn EcommerceAdapter> = match config.ecommerce_platform.to_lowercase().as_str()
    {
        "prestashop" => {
            let adapter =
                PrestaShopAdapter::new(&config.ecommerce_url, &config.ecommerce_api_key, timeout)?;
            tracing::info!("initialized PrestaShop adapter");
            Arc::new(adapter)
        }
        other => bail!("unsupported e-commerce platform: {}", other),
    };

    let klaviyo = KlaviyoClient::new(&config.klaviyo_api_key, &config.klaviyo_api_revision, timeout)?;
    tracing::info!("initialized Klaviyo client");

    let service =
        SimilarProductsService::new(adapter, Arc::new(klaviyo), config.similar_products_limit);

    let state = Arc::new(AppState {
        service,
        webhook_secret: config.webhook_secret.clone(),
    });
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;

    tracing::info!(%addr, "starting similar-products service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
