//! Storewatch - storefront listing availability monitor
//!
//! Probes configured listing pages once per invocation, detects health
//! transitions against the persisted state of previous runs, and alerts
//! through the configured notification channel.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod report;
pub mod serverchan;
pub mod state;
pub mod transition;
pub mod wecom;

pub use config::{load_config, Config};
pub use error::{Result, StorewatchError};

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{Engine, RunReport};
use crate::io::ReqwestHttpClient;
use crate::notifier::build_notifier;
use crate::probe::Prober;
use crate::state::StateStore;

/// Run one monitoring pass with the given configuration
pub async fn run(config: Config) -> Result<RunReport> {
    let endpoints = config.valid_endpoints();
    if endpoints.is_empty() {
        tracing::warn!("No valid endpoints configured, nothing to probe");
    }

    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.probe.timeout_seconds,
    ))?);

    // Fail before probing when the operator cannot be alerted at all
    let notifier = build_notifier(config.notifier.as_ref(), Arc::clone(&http))?;

    let prober = Prober::new(Arc::clone(&http), &config.probe);
    let store = StateStore::new(&config.state_file);

    tracing::info!(
        "Checking {} endpoints (mode {:?}, channel {})",
        endpoints.len(),
        config.alert_mode,
        notifier.type_name()
    );

    let engine = Engine::new(prober, store, notifier, config.alert_mode);
    engine.run_once(&endpoints).await
}
