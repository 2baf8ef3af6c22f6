//! Memory attribution. Uses proportional set size so shared pages are split
//! between the processes mapping them instead of being counted once each.

use tracing::debug;

use crate::attribution::{apps_bytes, attribute_by_pid, clamp_system};
use crate::error::UsageError;
use crate::registry::AppRegistry;
use crate::source::SnapshotSource;
use crate::types::{MemoryUsage, ProcessMemory, Totals};

fn sum_memory(processes: &[ProcessMemory]) -> u64 {
    processes
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.memory_bytes))
}

/// Installed memory and the memory used by all processes combined.
pub async fn system_memory_usage(source: &dyn SnapshotSource) -> Result<Totals, UsageError> {
    let size = source.total_memory().await;
    let processes = source.process_memory().await?;
    Ok(Totals {
        size,
        total_used: sum_memory(&processes),
    })
}

pub async fn memory_usage(
    source: &dyn SnapshotSource,
    registry: &dyn AppRegistry,
) -> Result<MemoryUsage, UsageError> {
    let processes = source.process_memory().await?;
    let size = source.total_memory().await;
    let total_used = sum_memory(&processes);
    debug!(processes = processes.len(), total_used, "memory snapshot");

    let samples: Vec<(u32, u64)> = processes.iter().map(|p| (p.pid, p.memory_bytes)).collect();
    let app_ids = registry.list_apps().await;
    let apps = attribute_by_pid(registry, &app_ids, &samples, "memory").await;

    let system = clamp_system(total_used, apps_bytes(&apps), 0);
    Ok(MemoryUsage {
        size,
        total_used,
        system,
        apps,
    })
}
