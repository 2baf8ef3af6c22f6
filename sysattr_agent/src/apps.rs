//! Managed apps from a JSON file holding a list keyed by `id`:
//! `{"apps": [{"id": "bitcoin", "dataDirectory": "...", "cgroup": "..."}]}`.
//! Default location is $XDG_CONFIG_HOME/sysattr/apps.json (fallback ~/.config/sysattr/apps.json).
//!
//! Process ownership comes from the app's cgroup (every `cgroup.procs` below
//! it), disk footprint from the size of its data directory.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::{fs, io};
use sysattr::{AppLookupError, AppRegistry};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    pub id: String,
    #[serde(default)]
    pub data_directory: Option<PathBuf>,
    // relative to the cgroup2 mount, e.g. "system.slice/app-bitcoin.slice"
    #[serde(default)]
    pub cgroup: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppsFile {
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("sysattr")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sysattr")
    }
}

pub fn default_apps_path() -> PathBuf {
    config_dir().join("apps.json")
}

/// A missing file means no managed apps; a malformed one is an error.
pub fn load_apps(path: &Path) -> anyhow::Result<AppsFile> {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s)
            .with_context(|| format!("parsing app registry {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppsFile::default()),
        Err(e) => Err(e).with_context(|| format!("reading app registry {}", path.display())),
    }
}

fn read_cgroup_pids(dir: &Path) -> io::Result<HashSet<u32>> {
    let mut pids = HashSet::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        // the top-level cgroup must exist; children may vanish while we walk
        let entries = match fs::read_dir(&d) {
            Ok(e) => e,
            Err(e) if d == dir => return Err(e),
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                pending.push(entry.path());
            }
        }
        if let Ok(procs) = fs::read_to_string(d.join("cgroup.procs")) {
            pids.extend(procs.lines().filter_map(|l| l.trim().parse::<u32>().ok()));
        }
    }
    Ok(pids)
}

pub struct ConfigRegistry {
    apps: Vec<AppEntry>,
    cgroup_root: PathBuf,
}

impl ConfigRegistry {
    pub fn new(file: AppsFile, cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            apps: file.apps,
            cgroup_root: cgroup_root.into(),
        }
    }

    pub fn app_count(&self) -> usize {
        self.apps.len()
    }

    fn entry(&self, app_id: &str) -> Result<&AppEntry, AppLookupError> {
        self.apps
            .iter()
            .find(|a| a.id == app_id)
            .ok_or_else(|| AppLookupError::new(app_id, "not registered"))
    }

    fn cgroup_dir(&self, app_id: &str, cgroup: &str) -> Result<PathBuf, AppLookupError> {
        let rel = Path::new(cgroup);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(AppLookupError::new(
                app_id,
                format!("cgroup {cgroup:?} must be a relative path without '..'"),
            ));
        }
        Ok(self.cgroup_root.join(rel))
    }
}

#[async_trait]
impl AppRegistry for ConfigRegistry {
    async fn list_apps(&self) -> Vec<String> {
        self.apps.iter().map(|a| a.id.clone()).collect()
    }

    async fn owned_process_ids(&self, app_id: &str) -> Result<HashSet<u32>, AppLookupError> {
        let cgroup = self
            .entry(app_id)?
            .cgroup
            .as_deref()
            .ok_or_else(|| AppLookupError::new(app_id, "no cgroup configured"))?;
        let dir = self.cgroup_dir(app_id, cgroup)?;
        tokio::task::spawn_blocking(move || read_cgroup_pids(&dir))
            .await
            .map_err(|e| AppLookupError::new(app_id, e.to_string()))?
            .map_err(|e| AppLookupError::new(app_id, format!("reading cgroup {cgroup}: {e}")))
    }

    async fn disk_footprint(&self, app_id: &str) -> Result<u64, AppLookupError> {
        let dir = self
            .entry(app_id)?
            .data_directory
            .clone()
            .ok_or_else(|| AppLookupError::new(app_id, "no data directory configured"))?;
        let shown = dir.display().to_string();
        let size = tokio::task::spawn_blocking(move || sysattr::dirsize::directory_size(&dir))
            .await
            .map_err(|e| AppLookupError::new(app_id, e.to_string()))?
            .map_err(|e| AppLookupError::new(app_id, format!("sizing {shown}: {e}")))?;
        size.ok_or_else(|| AppLookupError::new(app_id, format!("{shown} does not exist")))
    }
}
