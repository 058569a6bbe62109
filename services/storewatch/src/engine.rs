//! Orchestration of one monitoring run

use std::sync::Arc;

use chrono::Utc;

use crate::config::{AlertMode, Endpoint};
use crate::notifier::{Notification, Notifier};
use crate::probe::Prober;
use crate::report;
use crate::state::{StateMap, StateRecord, StateStore};
use crate::transition;

/// Aggregated result of one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub checked: usize,
    pub unhealthy: usize,
    pub alerts_sent: usize,
    pub delivery_failures: usize,
}

impl RunReport {
    /// Every endpoint healthy and every attempted alert delivered
    pub fn is_clean(&self) -> bool {
        self.unhealthy == 0 && self.delivery_failures == 0
    }

    /// Exit code for the external scheduler. Health drives it; delivery
    /// failures are visible in the log but do not change the code.
    pub fn exit_code(&self) -> u8 {
        if self.unhealthy > 0 {
            2
        } else {
            0
        }
    }
}

/// Runs the per-endpoint probe/decide/notify/record sequence and the single
/// state write at the end of the run.
pub struct Engine {
    prober: Prober,
    store: StateStore,
    notifier: Arc<dyn Notifier>,
    alert_mode: AlertMode,
}

impl Engine {
    pub fn new(
        prober: Prober,
        store: StateStore,
        notifier: Arc<dyn Notifier>,
        alert_mode: AlertMode,
    ) -> Self {
        Self {
            prober,
            store,
            notifier,
            alert_mode,
        }
    }

    /// Process every endpoint once, persist the rebuilt state map, and return
    /// the aggregated report.
    ///
    /// Endpoints are independent: a probe failure or an undeliverable alert
    /// for one never skips the rest. Alert decisions compare against the
    /// state loaded at run start; fresh records are written only after all
    /// endpoints are processed.
    pub async fn run_once(&self, endpoints: &[Endpoint]) -> crate::Result<RunReport> {
        let prior = self.store.load();
        let mut fresh = StateMap::new();
        let mut run = RunReport {
            checked: endpoints.len(),
            ..RunReport::default()
        };

        for endpoint in endpoints {
            let verdict = self.prober.probe(endpoint).await;

            if verdict.healthy {
                tracing::debug!("'{}' healthy", endpoint.name);
            } else {
                run.unhealthy += 1;
                tracing::warn!(
                    "'{}' unhealthy: {}",
                    endpoint.name,
                    report::describe_reason(&verdict)
                );
            }

            if transition::should_alert(&verdict, prior.get(&endpoint.key), self.alert_mode) {
                let notification = Notification {
                    title: String::new(),
                    message: report::alert_message(endpoint, &verdict, Utc::now()),
                };

                match self.notifier.notify(&notification).await {
                    Ok(()) => {
                        run.alerts_sent += 1;
                        tracing::info!(
                            "Alert for '{}' sent via {}",
                            endpoint.name,
                            self.notifier.type_name()
                        );
                    }
                    Err(e) => {
                        run.delivery_failures += 1;
                        tracing::warn!(
                            "Alert for '{}' via {} failed: {}",
                            endpoint.name,
                            self.notifier.type_name(),
                            e
                        );
                    }
                }
            }

            fresh.insert(endpoint.key.clone(), StateRecord::from_verdict(&verdict));
        }

        self.store.save(&fresh)?;

        tracing::info!(
            "Run complete: {} checked, {} unhealthy, {} alerts sent, {} delivery failures",
            run.checked,
            run.unhealthy,
            run.alerts_sent,
            run.delivery_failures
        );
        Ok(run)
    }
}
