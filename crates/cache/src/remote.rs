//! Remote store capability consumed by the orchestrator
//!
//! The cache core defines only the seam; transports (HTTP, gRPC, object
//! storage) live in their own crates. A remote implementation populates and
//! mirrors entries in the *local* cache root, so the commit-marker protocol
//! in [`LocalCacheStore`](crate::LocalCacheStore) stays the single source of
//! entry validity: after `retrieve` returns, the local root may or may not
//! contain a marker-committed entry for the hash.

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Optional cross-machine cache backend
///
/// Implementations must be thread-safe (`Send + Sync`) for concurrent task
/// execution.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Try to populate the local cache root with the entry for `hash`.
    ///
    /// Failure is treated by the orchestrator as "no better luck" - it is
    /// logged and the lookup degrades to a miss, never to an error.
    async fn retrieve(&self, hash: &str, cache_root: &Path) -> Result<()>;

    /// Mirror the locally committed entry for `hash` to the remote store.
    ///
    /// Called strictly after the local commit marker exists; a remote store
    /// can never observe an uncommitted local entry.
    async fn store(&self, hash: &str, cache_root: &Path) -> Result<()>;

    /// Backend name for log attribution
    fn name(&self) -> &'static str;
}
