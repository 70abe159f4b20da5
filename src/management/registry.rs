//! In-process management registry backed by a concurrent map.

use super::{ManagementRegistry, MetricsSnapshot, PoolIdentity, PoolMetrics};
use crate::core::{PoolError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Registry keeping registered pools in memory for inspection.
#[derive(Default)]
pub struct InMemoryRegistry {
    pools: DashMap<PoolIdentity, Arc<dyn PoolMetrics>>,
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("identities", &self.identities())
            .finish()
    }
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics of the pool registered under `identity`
    pub fn get(&self, identity: &PoolIdentity) -> Option<Arc<dyn PoolMetrics>> {
        self.pools.get(identity).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `identity` is registered
    pub fn contains(&self, identity: &PoolIdentity) -> bool {
        self.pools.contains_key(identity)
    }

    /// Current snapshot of one pool
    pub fn snapshot(&self, identity: &PoolIdentity) -> Option<MetricsSnapshot> {
        // Clone the Arc out first so no shard lock is held while reading counters.
        self.get(identity).map(|pool| pool.snapshot())
    }

    /// Snapshots of every registered pool, ordered by identity
    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        let mut snapshots: Vec<_> = self.all().iter().map(|pool| pool.snapshot()).collect();
        snapshots.sort_by(|a, b| a.identity.cmp(&b.identity));
        snapshots
    }

    /// Snapshots of pools whose identity belongs to `domain`
    pub fn query_domain(&self, domain: &str) -> Vec<MetricsSnapshot> {
        self.snapshots()
            .into_iter()
            .filter(|snapshot| snapshot.identity.domain() == Some(domain))
            .collect()
    }

    /// Registered identities, sorted
    pub fn identities(&self) -> Vec<PoolIdentity> {
        let mut ids: Vec<_> = self.pools.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool is registered
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Every snapshot rendered as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshots())?)
    }

    fn all(&self) -> Vec<Arc<dyn PoolMetrics>> {
        self.pools
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

impl ManagementRegistry for InMemoryRegistry {
    fn register(&self, pool: Arc<dyn PoolMetrics>) -> Result<()> {
        match self.pools.entry(pool.identity().clone()) {
            Entry::Occupied(entry) => Err(PoolError::duplicate_identity(entry.key().as_str())),
            Entry::Vacant(entry) => {
                log::debug!("registered {}", entry.key());
                entry.insert(pool);
                Ok(())
            }
        }
    }

    fn unregister(&self, identity: &PoolIdentity) -> bool {
        let removed = self.pools.remove(identity).is_some();
        if removed {
            log::debug!("unregistered {}", identity);
        }
        removed
    }
}
