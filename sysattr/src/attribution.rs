//! Per-app fan-out shared by the calculators. Every app is queried
//! concurrently; a failed lookup is logged and attributed zero so one app in
//! a transitional state cannot hide the rest of the fleet.

use futures::future::join_all;
use std::iter::Sum;
use tracing::warn;

use crate::error::AppLookupError;
use crate::registry::AppRegistry;
use crate::types::AppUsage;

fn failed<T: Default>(app_id: &str, resource: &'static str, err: AppLookupError) -> AppUsage<T> {
    warn!(app = app_id, resource, "attributing zero usage: {err}");
    AppUsage {
        app_id: app_id.to_string(),
        used: T::default(),
        error: Some(err.to_string()),
    }
}

/// Sum the samples owned by each app. Output order follows `apps`.
pub(crate) async fn attribute_by_pid<T>(
    registry: &dyn AppRegistry,
    apps: &[String],
    samples: &[(u32, T)],
    resource: &'static str,
) -> Vec<AppUsage<T>>
where
    T: Copy + Default + Sum<T> + Send + Sync,
{
    join_all(apps.iter().map(|app_id| async move {
        match registry.owned_process_ids(app_id).await {
            Ok(pids) => AppUsage {
                app_id: app_id.clone(),
                used: samples
                    .iter()
                    .filter(|(pid, _)| pids.contains(pid))
                    .map(|(_, v)| *v)
                    .sum(),
                error: None,
            },
            Err(e) => failed(app_id, resource, e),
        }
    }))
    .await
}

/// Installed disk footprint of each app. Output order follows `apps`.
pub(crate) async fn attribute_footprints(
    registry: &dyn AppRegistry,
    apps: &[String],
) -> Vec<AppUsage<u64>> {
    join_all(apps.iter().map(|app_id| async move {
        match registry.disk_footprint(app_id).await {
            Ok(used) => AppUsage {
                app_id: app_id.clone(),
                used,
                error: None,
            },
            Err(e) => failed(app_id, "disk", e),
        }
    }))
    .await
}

pub(crate) fn apps_bytes(apps: &[AppUsage<u64>]) -> u64 {
    apps.iter().fold(0u64, |acc, a| acc.saturating_add(a.used))
}

pub(crate) fn apps_percent(apps: &[AppUsage<f64>]) -> f64 {
    apps.iter().map(|a| a.used).sum()
}

/// `max(floor, total - attributed)` without underflow.
pub(crate) fn clamp_system(total: u64, attributed: u64, floor: u64) -> u64 {
    total.saturating_sub(attributed).max(floor)
}

/// Percentages drift from rounding and sampling skew; never report below zero.
pub(crate) fn clamp_system_percent(total: f64, attributed: f64) -> f64 {
    (total - attributed).max(0.0)
}
