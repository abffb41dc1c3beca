//! SoulCross Paywall Service
//!
//! Durable order tracking and exactly-once webhook reconciliation for paid
//! readings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use soulcross_paywall::checkout::{OrderManager, WebhookReconciler};
use soulcross_paywall::config::AppConfig;
use soulcross_paywall::handlers::{self, AppState};
use soulcross_paywall::metrics::PaywallMetrics;
use soulcross_paywall::reading::{ContentGenerator, ReadingManager, TemplateGenerator};
use soulcross_paywall::store::{JsonFileBackend, PaywallStore};
use soulcross_paywall::stripe::{
    PaymentProvider, SignatureVerifier, StripeCheckoutClient, StripeConfig,
};

/// SoulCross Paywall Service
#[derive(Parser, Debug)]
#[command(name = "sc-paywall")]
#[command(author = "SoulCross Team <team@soulcross.app>")]
#[command(version)]
#[command(about = "Paywall order-state service with idempotent checkout and webhook reconciliation")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Data directory for the durable snapshot (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = AppConfig::from_env()?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    let stripe = StripeConfig::from_env()?;

    let store = Arc::new(PaywallStore::new(JsonFileBackend::new(&config.data_dir)));
    let generator: Arc<dyn ContentGenerator> = Arc::new(TemplateGenerator);
    let payments: Arc<dyn PaymentProvider> =
        Arc::new(StripeCheckoutClient::new(stripe.clone()).context("building Stripe client")?);
    let verifier = SignatureVerifier::new(stripe.webhook_secret.clone())
        .with_tolerance(stripe.signature_tolerance);

    let readings = ReadingManager::new(store.clone(), generator.clone());
    let orders = OrderManager::new(store.clone(), generator.clone());
    let reconciler = WebhookReconciler::new(store.clone(), generator);

    // Complete any unlock interrupted between payment confirmation and
    // content materialization in a previous run.
    let recovered = reconciler.resume_pending_content().await?;
    if recovered > 0 {
        tracing::info!(recovered, "Materialized pending full content at startup");
    }

    let state = Arc::new(AppState {
        config,
        store,
        readings,
        orders,
        reconciler,
        payments,
        verifier,
        metrics: Arc::new(PaywallMetrics::new()),
        started_at: Instant::now(),
    });

    let app = handlers::router(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("SoulCross paywall service listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
