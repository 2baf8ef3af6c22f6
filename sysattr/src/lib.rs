//! Host resource sampling with per-application attribution.
//!
//! Each calculator takes a fresh snapshot from a [`SnapshotSource`], asks an
//! [`AppRegistry`] which processes (or how much disk) every managed app owns,
//! and splits the total into `{system, apps[]}`. There is no cache and no
//! shared state between calls.

mod attribution;
pub mod cpu;
pub mod device;
pub mod dirsize;
pub mod disk;
pub mod error;
pub mod host;
pub mod memory;
pub mod network;
pub mod registry;
pub mod source;
pub mod thermal;
pub mod types;

pub use cpu::cpu_usage;
pub use device::{detect_device, is_raspberry_pi, is_umbrel_home};
pub use disk::{disk_usage, system_disk_usage};
pub use error::{AppLookupError, UsageError};
pub use host::HostSource;
pub use memory::{memory_usage, system_memory_usage};
pub use network::ip_addresses;
pub use registry::AppRegistry;
pub use source::SnapshotSource;
pub use thermal::cpu_temperature;
