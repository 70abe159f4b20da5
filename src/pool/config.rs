//! Pool configuration.

use crate::core::{PoolError, Result};
use crate::management::{ManagementRegistry, PoolIdentity};
use crate::queue::SaturationPolicy;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Default worker poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a [`WorkerPool`](super::WorkerPool).
///
/// All values are fixed once the pool is built.
///
/// ```rust
/// use managed_pool::prelude::*;
///
/// let config = WorkerPoolConfig::new(4, 100)
///     .with_instance_name("orders")
///     .with_saturation_policy(SaturationPolicy::Discard);
///
/// let names = config.resolve_names().unwrap();
/// assert_eq!(names.name_prefix, "orders-");
/// assert_eq!(names.identity.key_property("name").as_deref(), Some("orders"));
/// ```
#[derive(Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, must be greater than 0
    pub size: usize,
    /// Bounded queue depth, must be greater than 0
    pub queue_capacity: usize,
    /// Worker thread name prefix; `"<instance_name>-"` when absent or empty
    pub name_prefix: Option<String>,
    /// Name of this pool instance; a process-unique `worker-pool-<n>` when absent
    pub instance_name: Option<String>,
    /// Registration key; derived from the instance name when absent or empty
    pub identity: Option<String>,
    /// Applied to refused submissions. Default: Abort
    pub saturation_policy: SaturationPolicy,
    /// How often idle workers re-check for shutdown. Default: 100ms
    pub poll_interval: Duration,
    registry: Option<Arc<dyn ManagementRegistry>>,
}

impl std::fmt::Debug for WorkerPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPoolConfig")
            .field("size", &self.size)
            .field("queue_capacity", &self.queue_capacity)
            .field("name_prefix", &self.name_prefix)
            .field("instance_name", &self.instance_name)
            .field("identity", &self.identity)
            .field("saturation_policy", &self.saturation_policy)
            .field("poll_interval", &self.poll_interval)
            .field("registry", &self.registry.as_ref().map(|_| "<registry>"))
            .finish()
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with `size` workers and a queue of `queue_capacity`
    #[must_use]
    pub fn new(size: usize, queue_capacity: usize) -> Self {
        Self {
            size,
            queue_capacity,
            name_prefix: None,
            instance_name: None,
            identity: None,
            saturation_policy: SaturationPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            registry: None,
        }
    }

    /// Set the worker thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Set the instance name used to derive the prefix and identity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_instance_name<S: Into<String>>(mut self, name: S) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Set an explicit registration identity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_identity<S: Into<String>>(mut self, identity: S) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Set the saturation policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_saturation_policy(mut self, policy: SaturationPolicy) -> Self {
        self.saturation_policy = policy;
        self
    }

    /// Set the worker poll interval.
    ///
    /// Shorter intervals make shutdown faster at the cost of more wakeups.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        self.poll_interval = interval;
        self
    }

    /// Register the pool with `registry` while it runs
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_registry(mut self, registry: Arc<dyn ManagementRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub(crate) fn registry(&self) -> Option<&Arc<dyn ManagementRegistry>> {
        self.registry.as_ref()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(PoolError::invalid_config(
                "size",
                "size must be greater than zero",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "queue_capacity must be greater than zero",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolError::invalid_config(
                "poll_interval",
                "poll interval must be non-zero",
            ));
        }
        Ok(())
    }

    /// Resolves the instance name, thread name prefix and identity.
    ///
    /// Each call without an instance name draws a fresh sequence number.
    pub fn resolve_names(&self) -> Result<ResolvedNames> {
        let instance_name = non_empty(&self.instance_name).map_or_else(
            || format!("worker-pool-{}", NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed)),
            str::to_string,
        );
        let name_prefix = non_empty(&self.name_prefix)
            .map_or_else(|| format!("{}-", instance_name), str::to_string);
        let identity = match non_empty(&self.identity) {
            Some(identity) => PoolIdentity::new(identity)?,
            None => PoolIdentity::derive(&instance_name),
        };

        Ok(ResolvedNames {
            instance_name,
            name_prefix,
            identity,
        })
    }

    /// Builds a configuration from deserialized settings.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] for non-positive sizes.
    pub fn from_settings(settings: PoolSettings) -> Result<Self> {
        let size = positive("size", settings.size)?;
        let queue_capacity = positive("queue_capacity", settings.queue_capacity)?;

        let mut config = Self::new(size, queue_capacity).with_saturation_policy(
            match settings.saturation_policy {
                PolicyKind::Abort => SaturationPolicy::Abort,
                PolicyKind::Discard => SaturationPolicy::Discard,
                PolicyKind::DiscardOldest => SaturationPolicy::DiscardOldest,
                PolicyKind::CallerRuns => SaturationPolicy::CallerRuns,
            },
        );
        config.name_prefix = settings.name_prefix;
        config.instance_name = settings.instance_name;
        config.identity = settings.identity;
        if let Some(ms) = settings.poll_interval_ms {
            if ms == 0 {
                return Err(PoolError::invalid_config(
                    "poll_interval_ms",
                    "poll interval must be non-zero",
                ));
            }
            config.poll_interval = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Parses [`PoolSettings`] from JSON.
    ///
    /// ```rust
    /// use managed_pool::prelude::*;
    ///
    /// let config = WorkerPoolConfig::from_json(
    ///     r#"{ "size": 2, "queue_capacity": 50, "saturation_policy": "caller_runs" }"#,
    /// ).unwrap();
    /// assert_eq!(config.size, 2);
    /// assert!(matches!(config.saturation_policy, SaturationPolicy::CallerRuns));
    ///
    /// assert!(WorkerPoolConfig::from_json(r#"{ "size": -1, "queue_capacity": 5 }"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: PoolSettings = serde_json::from_str(json)?;
        Self::from_settings(settings)
    }
}

/// Names derived from a configuration at construction time.
#[derive(Debug, Clone)]
pub struct ResolvedNames {
    /// Pool instance name
    pub instance_name: String,
    /// Worker thread name prefix
    pub name_prefix: String,
    /// Registration identity
    pub identity: PoolIdentity,
}

/// Serializable configuration surface.
///
/// Sizes are signed so that out-of-range values coming from a file are
/// reported as configuration errors rather than parse errors.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSettings {
    /// Worker thread count
    pub size: i64,
    /// Bounded queue depth
    pub queue_capacity: i64,
    /// Worker thread name prefix
    #[serde(default)]
    pub name_prefix: Option<String>,
    /// Pool instance name
    #[serde(default)]
    pub instance_name: Option<String>,
    /// Registration identity
    #[serde(default)]
    pub identity: Option<String>,
    /// Saturation policy
    #[serde(default)]
    pub saturation_policy: PolicyKind,
    /// Worker poll interval in milliseconds
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

/// Built-in saturation policies selectable from settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// [`SaturationPolicy::Abort`]
    #[default]
    Abort,
    /// [`SaturationPolicy::Discard`]
    Discard,
    /// [`SaturationPolicy::DiscardOldest`]
    DiscardOldest,
    /// [`SaturationPolicy::CallerRuns`]
    CallerRuns,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn positive(parameter: &str, value: i64) -> Result<usize> {
    if value <= 0 {
        return Err(PoolError::invalid_config(
            parameter,
            format!("{} must be greater than zero (got {})", parameter, value),
        ));
    }
    usize::try_from(value).map_err(|_| {
        PoolError::invalid_config(parameter, format!("{} is out of range", value))
    })
}
