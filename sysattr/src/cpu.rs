//! CPU attribution from a single point-in-time process sample.
//!
//! The OS reports per-process usage relative to one core, so a process
//! saturating four threads shows 400%. Every sample is divided by the host's
//! thread count before summing; 100% then means every thread is busy.
//! Callers that want smoothed values must sample repeatedly themselves.

use tracing::debug;

use crate::attribution::{apps_percent, attribute_by_pid, clamp_system_percent};
use crate::error::UsageError;
use crate::registry::AppRegistry;
use crate::source::SnapshotSource;
use crate::types::{CpuUsage, ProcessCoreCpu, ProcessCpu};

/// Convert per-core percentages to percentages of the whole host.
pub fn normalize_by_threads(samples: &[ProcessCoreCpu], threads: usize) -> Vec<ProcessCpu> {
    let threads = threads.max(1) as f64;
    samples
        .iter()
        .map(|s| ProcessCpu {
            pid: s.pid,
            cpu_percent: s.core_percent.max(0.0) / threads,
        })
        .collect()
}

pub async fn cpu_usage(
    source: &dyn SnapshotSource,
    registry: &dyn AppRegistry,
) -> Result<CpuUsage, UsageError> {
    let raw = source.process_cpu().await?;
    let threads = source.thread_count().await.max(1);
    let processes = normalize_by_threads(&raw, threads);

    let total_used: f64 = processes.iter().map(|p| p.cpu_percent).sum();
    debug!(processes = processes.len(), threads, total_used, "cpu snapshot");

    let samples: Vec<(u32, f64)> = processes.iter().map(|p| (p.pid, p.cpu_percent)).collect();
    let app_ids = registry.list_apps().await;
    let apps = attribute_by_pid(registry, &app_ids, &samples, "cpu").await;

    let system = clamp_system_percent(total_used, apps_percent(&apps));
    Ok(CpuUsage {
        threads,
        total_used,
        system,
        apps,
    })
}
