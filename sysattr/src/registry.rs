//! Interface to whatever manages the application lifecycle.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::AppLookupError;

#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Ids of the managed applications, in the order results should use.
    async fn list_apps(&self) -> Vec<String>;

    /// OS process ids currently owned by `app_id`.
    async fn owned_process_ids(&self, app_id: &str) -> Result<HashSet<u32>, AppLookupError>;

    /// Bytes the application occupies on disk.
    async fn disk_footprint(&self, app_id: &str) -> Result<u64, AppLookupError>;
}
