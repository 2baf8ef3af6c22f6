//! Disk attribution for the filesystem holding the data directory.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::attribution::{apps_bytes, attribute_footprints, clamp_system};
use crate::error::UsageError;
use crate::registry::AppRegistry;
use crate::source::SnapshotSource;
use crate::types::{DiskUsage, FilesystemInfo, Totals};

/// Baseline OS footprint; the system share is never reported below this.
pub const MIN_SYSTEM_DISK_USAGE: u64 = 2 * 1024 * 1024 * 1024;

/// Downloads area, relative to the data directory.
pub const DOWNLOADS_SUBDIR: &str = "data/storage/downloads";

/// Filesystem whose mount point is the longest component-wise prefix of `path`.
pub fn backing_filesystem<'a>(
    path: &Path,
    filesystems: &'a [FilesystemInfo],
) -> Option<&'a FilesystemInfo> {
    filesystems
        .iter()
        .filter(|fs| path.starts_with(&fs.mount_point))
        .max_by_key(|fs| fs.mount_point.components().count())
}

pub fn downloads_directory(data_directory: &Path) -> PathBuf {
    data_directory.join(DOWNLOADS_SUBDIR)
}

async fn resolve_data_directory(data_directory: &Path) -> Result<PathBuf, UsageError> {
    if data_directory.as_os_str().is_empty() {
        return Err(UsageError::InvalidDataDirectory);
    }
    // Symlinked data directories live on the filesystem of their target.
    Ok(tokio::fs::canonicalize(data_directory)
        .await
        .unwrap_or_else(|_| data_directory.to_path_buf()))
}

/// Size and usage of the filesystem containing `data_directory`.
pub async fn system_disk_usage(
    source: &dyn SnapshotSource,
    data_directory: &Path,
) -> Result<Totals, UsageError> {
    let resolved = resolve_data_directory(data_directory).await?;
    let filesystems = source.filesystems().await?;
    let fs = backing_filesystem(&resolved, &filesystems)
        .ok_or_else(|| UsageError::MountNotFound(resolved.clone()))?;
    debug!(mount = %fs.mount_point.display(), size = fs.size_bytes, used = fs.used_bytes, "data filesystem");
    Ok(Totals {
        size: fs.size_bytes,
        total_used: fs.used_bytes,
    })
}

pub async fn disk_usage(
    source: &dyn SnapshotSource,
    registry: &dyn AppRegistry,
    data_directory: &Path,
) -> Result<DiskUsage, UsageError> {
    let Totals { size, total_used } = system_disk_usage(source, data_directory).await?;

    let app_ids = registry.list_apps().await;
    let apps = attribute_footprints(registry, &app_ids).await;

    let downloads_dir = downloads_directory(data_directory);
    let downloads = match source.directory_size(&downloads_dir).await {
        Ok(size) => size.unwrap_or(0),
        Err(e) => {
            warn!(path = %downloads_dir.display(), "could not size downloads directory: {e}");
            0
        }
    };

    let attributed = apps_bytes(&apps).saturating_add(downloads);
    Ok(DiskUsage {
        size,
        total_used,
        system: clamp_system(total_used, attributed, MIN_SYSTEM_DISK_USAGE),
        downloads,
        apps,
    })
}
