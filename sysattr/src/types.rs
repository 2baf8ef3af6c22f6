//! Data types returned to callers. Field names serialize as camelCase and
//! form the JSON contract of the agent, so keep this module stable.

use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Resource attributed to one managed application.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppUsage<T> {
    pub app_id: String,
    pub used: T,
    // set when the per-app lookup failed and `used` was recorded as zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
    pub size: u64,
    pub total_used: u64,
    pub system: u64,
    pub downloads: u64,
    pub apps: Vec<AppUsage<u64>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub size: u64,
    pub total_used: u64,
    pub system: u64,
    pub apps: Vec<AppUsage<u64>>,
}

/// CPU values are percentages of the whole host (all threads combined).
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    pub threads: usize,
    pub total_used: f64,
    pub system: f64,
    pub apps: Vec<AppUsage<f64>>,
}

/// Capacity and usage without per-app attribution.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub size: u64,
    pub total_used: u64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Warning {
    Normal,
    Warm,
    Hot,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ThermalReading {
    pub temperature: f64,
    pub warning: Warning,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device: String,
    pub product_name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub uuid: String,
}

// ---------- Raw snapshot data ----------

/// Proportional set size of one process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessMemory {
    pub pid: u32,
    pub memory_bytes: u64,
}

/// CPU usage of one process as reported by the OS: percent of a single core,
/// so a busy multi-threaded process can exceed 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCoreCpu {
    pub pid: u32,
    pub core_percent: f64,
}

/// CPU usage of one process as a percent of the whole host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCpu {
    pub pid: u32,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemInfo {
    pub mount_point: PathBuf,
    pub size_bytes: u64,
    pub used_bytes: u64,
}

/// SMBIOS/DMI style system descriptor. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemDescriptor {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub uuid: String,
    pub sku: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Wired,
    Wireless,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub is_virtual: bool,
    pub kind: InterfaceKind,
    pub ipv4: Option<Ipv4Addr>,
}
