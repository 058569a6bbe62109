//! Alert decision over fresh verdicts and persisted prior state

use crate::config::AlertMode;
use crate::probe::Verdict;
use crate::state::StateRecord;

/// Decide whether a fresh verdict warrants a notification.
///
/// Pure over its inputs. The orchestrator records the fresh verdict only
/// after calling this, so `prior` is always the previous run's persisted
/// state, never the value currently being written.
///
/// Under [`AlertMode::Transition`] only the edge from healthy-or-unknown into
/// unhealthy alerts; an endpoint already recorded unhealthy stays quiet until
/// a healthy observation resets the edge.
pub fn should_alert(fresh: &Verdict, prior: Option<&StateRecord>, mode: AlertMode) -> bool {
    if fresh.healthy {
        return false;
    }

    match mode {
        AlertMode::Always => true,
        AlertMode::Transition => prior.is_none_or(|record| record.healthy),
    }
}
