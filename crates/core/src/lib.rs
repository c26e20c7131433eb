//! Core types shared between the runway execution engine and its result cache
//!
//! This crate defines the values that cross the engine/cache boundary: the
//! [`Task`] identity handed to the cache when looking up or persisting a
//! result, and the [`CachedResult`] handed back on a hit. It deliberately
//! carries no behavior beyond construction and accessors; hashing, scheduling
//! and storage all live in their own crates.

pub mod tasks;

pub use tasks::{CachedResult, Task};
