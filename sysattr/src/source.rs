//! Raw host data acquisition. Implementations return plain snapshots and do
//! no attribution; `HostSource` reads the live machine, tests use fixtures.

use async_trait::async_trait;
use std::io;
use std::path::Path;

use crate::error::UsageError;
use crate::types::{
    FilesystemInfo, NetworkInterface, ProcessCoreCpu, ProcessMemory, SystemDescriptor,
};

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Installed RAM in bytes.
    async fn total_memory(&self) -> u64;

    /// Proportional set size of every process.
    async fn process_memory(&self) -> Result<Vec<ProcessMemory>, UsageError>;

    /// Per-core CPU percentage of every process, one point-in-time sample.
    async fn process_cpu(&self) -> Result<Vec<ProcessCoreCpu>, UsageError>;

    /// Logical CPU count, never zero.
    async fn thread_count(&self) -> usize;

    async fn filesystems(&self) -> Result<Vec<FilesystemInfo>, UsageError>;

    /// Total size of the files below `path`, or `None` if it does not exist.
    async fn directory_size(&self, path: &Path) -> io::Result<Option<u64>>;

    /// Primary CPU temperature in °C.
    async fn temperature(&self) -> Option<f64>;

    async fn system_descriptor(&self) -> SystemDescriptor;

    /// Free-form hardware description (the kernel's cpuinfo text on Linux).
    async fn hardware_info(&self) -> Option<String>;

    async fn network_interfaces(&self) -> Vec<NetworkInterface>;
}
