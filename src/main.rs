// =============================================================================
// Process entrypoint.
// =============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use sms_validation_bridge::cache::{MembershipCache, RedisMembershipCache};
use sms_validation_bridge::config::AppConfig;
use sms_validation_bridge::db;
use sms_validation_bridge::http;
use sms_validation_bridge::outbound::OutboundEmitter;
use sms_validation_bridge::pipeline::Pipeline;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "sms_validation_bridge=info,tower_http=info".into()))
        .json()
        .init();
    info!(version = VERSION, "sms validation bridge starting");

    let cfg = AppConfig::from_env();

    let pool = db::connect(&cfg).await.unwrap_or_else(|e| {
        eprintln!("failed to connect to the relational store: {e}");
        std::process::exit(1);
    });

    db::run_migrations(&pool).await.unwrap_or_else(|e| {
        eprintln!("failed to run migrations: {e}");
        std::process::exit(1);
    });

    let membership_cache = RedisMembershipCache::connect(&cfg.redis_url).await.unwrap_or_else(|e| {
        eprintln!("failed to connect to the membership cache: {e}");
        std::process::exit(1);
    });

    match membership_cache.warm_start(&pool).await {
        Ok(n) => info!(numbers = n, "membership_cache_warm_started"),
        Err(e) => tracing::error!(error = %e, "membership_cache_warm_start_failed"),
    }

    match &cfg.cf_backend_url {
        Some(url) => info!(cloud_forward_target = %url, "cloud_forward_configured"),
        None => info!("cloud_forward_disabled"),
    }

    let cache: Arc<dyn MembershipCache> = Arc::new(membership_cache);
    let emitter = OutboundEmitter::new(cfg.cf_backend_url.clone(), cfg.cf_api_key.clone());
    let pipeline = Arc::new(Pipeline::new(pool.clone(), cache, emitter));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline_handle = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.run(shutdown_rx).await })
    };

    let app = http::router(pool);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.ingress_port));
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {addr}: {e}");
        std::process::exit(1);
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown_signal_received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {e}");
            std::process::exit(1);
        });

    let _ = pipeline_handle.await;
    info!("shutdown_complete");
}
