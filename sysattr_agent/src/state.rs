//! Shared agent state: the host snapshot source and the app registry.
//! Nothing here caches samples; every request takes a fresh snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use sysattr::HostSource;

use crate::apps::ConfigRegistry;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<HostSource>,
    pub registry: Arc<ConfigRegistry>,
    pub data_dir: Arc<PathBuf>,
    pub auth_token: Option<String>,
}

#[cfg(test)]
impl AppState {
    /// State rooted at a scratch directory with no managed apps.
    pub fn rooted_at(root: &std::path::Path, auth_token: Option<&str>) -> Self {
        let registry = ConfigRegistry::new(
            crate::apps::AppsFile::default(),
            root.join("sys/fs/cgroup"),
        );
        Self {
            source: Arc::new(HostSource::with_root(root)),
            registry: Arc::new(registry),
            data_dir: Arc::new(root.join("data")),
            auth_token: auth_token.map(str::to_string),
        }
    }
}
