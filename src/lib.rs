//! VMware vCenter inventory poller in Rust
//!
//! This crate polls vCenter servers for virtual machine inventory and
//! serves the results from a TTL cache, so that callers on a hot path
//! (monitoring checks, UI panels) never wait on a live vCenter round
//! trip.
//!
//! # Features
//!
//! - Full VM inventory: power state, vCPUs, memory, disk capacity, NICs
//! - VLAN resolution for distributed and standard switch backings
//! - Background refresh on cache miss; callers never poll inline
//! - Failure backoff: a broken target is left alone for a short window
//!   instead of being hammered on every request
//! - Credential-derived cache keys, so password rotation invalidates
//!   stale results
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vcenter_inventory::{
//!     InventoryCollector, InventoryService, MemoryCache, PollerConfig, TokioTaskRunner,
//!     VCenterTarget, VimHttpConnector,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PollerConfig::from_env()?;
//!     let target = VCenterTarget::from_env()?;
//!
//!     let cache = Arc::new(MemoryCache::new());
//!     let connector = Arc::new(VimHttpConnector::new(config.request_timeout));
//!     let collector = Arc::new(InventoryCollector::new(
//!         connector,
//!         cache.clone(),
//!         config.cache.clone(),
//!     ));
//!     let runner = Arc::new(TokioTaskRunner::new(collector));
//!     let service = InventoryService::new(cache, runner);
//!
//!     match service.request_inventory(Some(&target)).await? {
//!         Some(snapshot) => println!("{} VMs", snapshot.vms.len()),
//!         None => println!("refresh dispatched, ask again shortly"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod inventory;
pub mod logging;
pub mod tasks;

// Re-export main types
pub use crate::{
    cache::{CacheLookup, CacheStore, CachedPoll, MemoryCache},
    client::vim_client::VimHttpConnector,
    client::{VimConnector, VimSession},
    config::{CacheTimeouts, PollerConfig, VCenterTarget},
    error::{Result, VcError},
    fingerprint::{fingerprint, Fingerprint},
    inventory::{InventoryCollector, InventoryService, InventorySnapshot, NicInfo, VmStats},
    tasks::{RefreshTask, TaskRunner, TokioTaskRunner},
};
