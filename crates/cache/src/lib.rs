//! Content-keyed task result caching for runway
//!
//! Given a reproducible task identified by an externally computed content
//! hash, this crate stores the task's terminal output, exit code and declared
//! output artifacts, and restores them on a later invocation with the same
//! hash instead of re-executing.
//!
//! # Overview
//!
//! Three components, composed by the [`Cache`] orchestrator:
//!
//! - [`LocalCacheStore`]: atomic on-disk persistence of one entry per hash.
//!   An entry is valid if and only if its sidecar `<hash>.commit` marker
//!   exists; the marker is written last, so readers never observe a partial
//!   write and an interrupted writer leaves an ordinary miss behind.
//! - [`OutputHashTracker`]: persists, per declared output path, the hash of
//!   the task that last restored it, and decides whether a hit's outputs
//!   must be re-copied into the workspace.
//! - [`Cache`]: the engine-facing entry point. Checks the local store, falls
//!   back to an optional [`RemoteCache`] on a miss, mirrors fresh results to
//!   the remote after the local commit, and probabilistically triggers the
//!   external pruning routine through the [`CacheMaintenance`] port.
//!
//! # On-disk layout
//!
//! ```text
//! <cacheRoot>/
//!   <hash>/
//!     terminalOutput
//!     code
//!     outputs/...
//!   <hash>.commit
//!   terminalOutputs/<hash>          scratch, pre-commit capture
//!   latestOutputsHashes/<escaped>.hash
//! ```
//!
//! Remote failures never block correctness: a failed retrieve degrades to a
//! miss, a failed mirror is logged and dropped. Hash-record and maintenance
//! failures surface as a [`BestEffort`] outcome rather than an error.

mod config;
mod error;
mod io;
mod maintenance;
mod orchestrator;
mod remote;
mod store;
mod tracker;

pub use config::{CacheConfig, DEFAULT_PRUNE_INTERVAL};
pub use error::{BestEffort, Error, Result};
pub use maintenance::{CacheMaintenance, SubprocessMaintenance};
pub use orchestrator::Cache;
pub use remote::RemoteCache;
pub use store::LocalCacheStore;
pub use tracker::OutputHashTracker;
