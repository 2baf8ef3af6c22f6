//! Live host snapshot source: sysinfo handles plus direct /proc and /sys
//! reads for what sysinfo does not expose (PSS, DMI, link types).
//!
//! File-based readers resolve paths under a configurable root so the agent
//! can run against a host filesystem mounted elsewhere, and so tests can
//! point it at a fake tree.

use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL,
};
use tokio::time::sleep;
use tracing::debug;

use crate::dirsize;
use crate::error::UsageError;
use crate::source::SnapshotSource;
use crate::types::{
    FilesystemInfo, InterfaceKind, NetworkInterface, ProcessCoreCpu, ProcessMemory,
    SystemDescriptor,
};

const DMI_DIR: &str = "sys/devices/virtual/dmi/id";
const NET_CLASS_DIR: &str = "sys/class/net";
const THERMAL_ZONE0: &str = "sys/class/thermal/thermal_zone0/temp";
const GOVERNOR_PATH: &str = "sys/devices/system/cpu/cpu0/cpufreq/scaling_governor";
const OS_MARKER: &str = "umbrelOS";

// ARPHRD_ETHER
const LINK_TYPE_ETHERNET: &str = "1";

#[derive(Debug, Clone)]
pub struct HostSource {
    root: PathBuf,
}

impl Default for HostSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// True when running on the managed OS image.
    pub async fn is_umbrel_os(&self) -> bool {
        tokio::fs::try_exists(self.path(OS_MARKER))
            .await
            .unwrap_or(false)
    }

    /// Write the cpufreq scaling governor. Not part of attribution; a plain
    /// pass-through for callers that tune power.
    pub async fn set_cpu_governor(&self, governor: &str) -> io::Result<()> {
        if governor.is_empty() || governor.chars().any(char::is_whitespace) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid cpu governor {governor:?}"),
            ));
        }
        tokio::fs::write(self.path(GOVERNOR_PATH), governor).await
    }

    async fn read_trimmed(&self, path: PathBuf) -> String {
        tokio::fs::read_to_string(path)
            .await
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    async fn interface_details(&self, name: &str) -> (bool, InterfaceKind) {
        let dir = self.path(NET_CLASS_DIR).join(name);
        let has_device = tokio::fs::try_exists(dir.join("device"))
            .await
            .unwrap_or(false);
        let wireless = tokio::fs::try_exists(dir.join("wireless"))
            .await
            .unwrap_or(false);
        let kind = if wireless {
            InterfaceKind::Wireless
        } else if self.read_trimmed(dir.join("type")).await == LINK_TYPE_ETHERNET {
            InterfaceKind::Wired
        } else {
            InterfaceKind::Other
        };
        (!has_device, kind)
    }

    async fn labelled_or_zone_temperature(&self, labelled: Option<f32>) -> Option<f64> {
        if let Some(t) = labelled {
            return Some(f64::from(t));
        }
        // Boards without labelled hwmon sensors still expose a thermal zone.
        let raw = tokio::fs::read_to_string(self.path(THERMAL_ZONE0)).await.ok()?;
        parse_millidegrees(&raw)
    }

    /// Sysinfo hands interfaces back in hash order; report them by name.
    async fn describe_interfaces(
        &self,
        mut listed: Vec<(String, Option<Ipv4Addr>)>,
    ) -> Vec<NetworkInterface> {
        listed.sort_by(|a, b| a.0.cmp(&b.0));
        let mut out = Vec::with_capacity(listed.len());
        for (name, ipv4) in listed {
            let (is_virtual, kind) = self.interface_details(&name).await;
            out.push(NetworkInterface {
                name,
                is_virtual,
                kind,
                ipv4,
            });
        }
        out
    }
}

/// `Pss:` from a smaps_rollup file, in bytes.
pub(crate) fn parse_pss(smaps_rollup: &str) -> Option<u64> {
    smaps_rollup.lines().find_map(|line| {
        let rest = line.strip_prefix("Pss:")?;
        let kb = rest.split_whitespace().next()?.parse::<u64>().ok()?;
        Some(kb.saturating_mul(1024))
    })
}

pub(crate) fn parse_millidegrees(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().map(|m| m / 1000.0)
}

fn read_all_pss(proc_dir: &Path) -> io::Result<Vec<ProcessMemory>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(proc_dir)?.flatten() {
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };
        // Kernel threads have an empty rollup and short-lived processes may
        // be gone already; neither holds attributable memory.
        let Ok(text) = std::fs::read_to_string(entry.path().join("smaps_rollup")) else {
            continue;
        };
        if let Some(memory_bytes) = parse_pss(&text) {
            out.push(ProcessMemory { pid, memory_bytes });
        }
    }
    if out.is_empty() {
        return Err(io::Error::other("no process exposes a proportional set size"));
    }
    Ok(out)
}

fn best_cpu_temp(components: &Components) -> Option<f32> {
    components
        .iter()
        .filter(|c| {
            let label = c.label().to_lowercase();
            label.contains("cpu")
                || label.contains("package")
                || label.contains("tctl")
                || label.contains("tdie")
        })
        .filter_map(|c| c.temperature())
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

#[async_trait]
impl SnapshotSource for HostSource {
    async fn total_memory(&self) -> u64 {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        sys.total_memory()
    }

    async fn process_memory(&self) -> Result<Vec<ProcessMemory>, UsageError> {
        let proc_dir = self.path("proc");
        let res = tokio::task::spawn_blocking(move || read_all_pss(&proc_dir))
            .await
            .map_err(|e| UsageError::snapshot("process memory", io::Error::other(e)))?;
        res.map_err(|e| UsageError::snapshot("process memory", e))
    }

    async fn process_cpu(&self) -> Result<Vec<ProcessCoreCpu>, UsageError> {
        // Two refreshes one minimum interval apart give sysinfo a delta to
        // compute per-process usage from.
        let kind = ProcessRefreshKind::nothing().with_cpu().without_tasks();
        let mut sys = System::new();
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
        sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);

        if sys.processes().is_empty() {
            return Err(UsageError::snapshot(
                "process cpu",
                io::Error::other("no processes visible"),
            ));
        }
        let samples: Vec<ProcessCoreCpu> = sys
            .processes()
            .values()
            .map(|p| ProcessCoreCpu {
                pid: p.pid().as_u32(),
                core_percent: f64::from(p.cpu_usage()),
            })
            .collect();
        debug!(processes = samples.len(), "sampled process cpu");
        Ok(samples)
    }

    async fn thread_count(&self) -> usize {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        sys.cpus().len().max(1)
    }

    async fn filesystems(&self) -> Result<Vec<FilesystemInfo>, UsageError> {
        let disks = Disks::new_with_refreshed_list();
        Ok(disks
            .list()
            .iter()
            .map(|d| FilesystemInfo {
                mount_point: d.mount_point().to_path_buf(),
                size_bytes: d.total_space(),
                used_bytes: d.total_space().saturating_sub(d.available_space()),
            })
            .collect())
    }

    async fn directory_size(&self, path: &Path) -> io::Result<Option<u64>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || dirsize::directory_size(&path))
            .await
            .map_err(io::Error::other)?
    }

    async fn temperature(&self) -> Option<f64> {
        let labelled = {
            let components = Components::new_with_refreshed_list();
            best_cpu_temp(&components)
        };
        self.labelled_or_zone_temperature(labelled).await
    }

    async fn system_descriptor(&self) -> SystemDescriptor {
        let dmi = self.path(DMI_DIR);
        SystemDescriptor {
            manufacturer: self.read_trimmed(dmi.join("sys_vendor")).await,
            model: self.read_trimmed(dmi.join("product_name")).await,
            serial: self.read_trimmed(dmi.join("product_serial")).await,
            uuid: self.read_trimmed(dmi.join("product_uuid")).await,
            sku: self.read_trimmed(dmi.join("product_sku")).await,
            version: self.read_trimmed(dmi.join("product_version")).await,
        }
    }

    async fn hardware_info(&self) -> Option<String> {
        tokio::fs::read_to_string(self.path("proc/cpuinfo")).await.ok()
    }

    async fn network_interfaces(&self) -> Vec<NetworkInterface> {
        let listed: Vec<(String, Option<Ipv4Addr>)> = {
            let networks = Networks::new_with_refreshed_list();
            networks
                .iter()
                .map(|(name, data)| {
                    let ipv4 = data.ip_networks().iter().find_map(|n| match n.addr {
                        IpAddr::V4(v4) => Some(v4),
                        IpAddr::V6(_) => None,
                    });
                    (name.to_string(), ipv4)
                })
                .collect()
        };
        self.describe_interfaces(listed).await
    }
}
