//! Deterministic snapshot source and registry for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sysattr::types::{
    FilesystemInfo, NetworkInterface, ProcessCoreCpu, ProcessMemory, SystemDescriptor,
};
use sysattr::{AppLookupError, AppRegistry, SnapshotSource, UsageError};

pub const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Default)]
pub struct FixtureSource {
    pub total_memory: u64,
    // None -> snapshot failure
    pub memory: Option<Vec<ProcessMemory>>,
    pub cpu: Option<Vec<ProcessCoreCpu>>,
    pub threads: usize,
    pub filesystems: Vec<FilesystemInfo>,
    pub dirs: HashMap<PathBuf, u64>,
    pub temperature: Option<f64>,
    pub descriptor: SystemDescriptor,
    pub hardware_info: Option<String>,
    pub interfaces: Vec<NetworkInterface>,
}

impl FixtureSource {
    pub fn with_memory(total: u64, procs: &[(u32, u64)]) -> Self {
        Self {
            total_memory: total,
            memory: Some(
                procs
                    .iter()
                    .map(|&(pid, memory_bytes)| ProcessMemory { pid, memory_bytes })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn with_cpu(threads: usize, procs: &[(u32, f64)]) -> Self {
        Self {
            threads,
            cpu: Some(
                procs
                    .iter()
                    .map(|&(pid, core_percent)| ProcessCoreCpu { pid, core_percent })
                    .collect(),
            ),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SnapshotSource for FixtureSource {
    async fn total_memory(&self) -> u64 {
        self.total_memory
    }

    async fn process_memory(&self) -> Result<Vec<ProcessMemory>, UsageError> {
        self.memory.clone().ok_or_else(|| {
            UsageError::snapshot("process memory", io::Error::other("ps exited 1"))
        })
    }

    async fn process_cpu(&self) -> Result<Vec<ProcessCoreCpu>, UsageError> {
        self.cpu
            .clone()
            .ok_or_else(|| UsageError::snapshot("process cpu", io::Error::other("top exited 1")))
    }

    async fn thread_count(&self) -> usize {
        self.threads
    }

    async fn filesystems(&self) -> Result<Vec<FilesystemInfo>, UsageError> {
        Ok(self.filesystems.clone())
    }

    async fn directory_size(&self, path: &Path) -> io::Result<Option<u64>> {
        Ok(self.dirs.get(path).copied())
    }

    async fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    async fn system_descriptor(&self) -> SystemDescriptor {
        self.descriptor.clone()
    }

    async fn hardware_info(&self) -> Option<String> {
        self.hardware_info.clone()
    }

    async fn network_interfaces(&self) -> Vec<NetworkInterface> {
        self.interfaces.clone()
    }
}

pub struct FixtureApp {
    pub id: &'static str,
    // None -> lookup failure
    pub pids: Option<Vec<u32>>,
    pub footprint: Option<u64>,
}

impl FixtureApp {
    pub fn owning(id: &'static str, pids: &[u32]) -> Self {
        Self {
            id,
            pids: Some(pids.to_vec()),
            footprint: None,
        }
    }

    pub fn sized(id: &'static str, footprint: u64) -> Self {
        Self {
            id,
            pids: None,
            footprint: Some(footprint),
        }
    }

    pub fn broken(id: &'static str) -> Self {
        Self {
            id,
            pids: None,
            footprint: None,
        }
    }
}

#[derive(Default)]
pub struct FixtureRegistry {
    pub apps: Vec<FixtureApp>,
    // simulated latency of every per-app query
    pub delay: Option<Duration>,
}

impl FixtureRegistry {
    pub fn new(apps: Vec<FixtureApp>) -> Self {
        Self { apps, delay: None }
    }

    fn app(&self, app_id: &str) -> Result<&FixtureApp, AppLookupError> {
        self.apps
            .iter()
            .find(|a| a.id == app_id)
            .ok_or_else(|| AppLookupError::new(app_id, "not installed"))
    }

    async fn wait(&self) {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl AppRegistry for FixtureRegistry {
    async fn list_apps(&self) -> Vec<String> {
        self.apps.iter().map(|a| a.id.to_string()).collect()
    }

    async fn owned_process_ids(&self, app_id: &str) -> Result<HashSet<u32>, AppLookupError> {
        self.wait().await;
        let app = self.app(app_id)?;
        app.pids
            .as_ref()
            .map(|p| p.iter().copied().collect())
            .ok_or_else(|| AppLookupError::new(app_id, "container is restarting"))
    }

    async fn disk_footprint(&self, app_id: &str) -> Result<u64, AppLookupError> {
        self.wait().await;
        self.app(app_id)?
            .footprint
            .ok_or_else(|| AppLookupError::new(app_id, "du failed"))
    }
}
