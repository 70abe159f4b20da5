//! Property-based tests for managed_pool using proptest

use managed_pool::prelude::*;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Construction
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any positive size and capacity builds an idle pool
    #[test]
    fn test_valid_config_builds_idle_pool(size in 1usize..16, capacity in 1usize..1000) {
        let pool = WorkerPool::new(WorkerPoolConfig::new(size, capacity)).unwrap();

        prop_assert_eq!(pool.active_count(), 0);
        prop_assert_eq!(pool.task_count(), 0);
        prop_assert_eq!(pool.remaining_queue_capacity(), capacity);
        prop_assert_eq!(pool.pool_size(), size);
    }

    /// Non-positive sizes from settings are configuration errors
    #[test]
    fn test_non_positive_settings_rejected(size in -100i64..=0, capacity in 1i64..100) {
        let json = format!(r#"{{ "size": {}, "queue_capacity": {} }}"#, size, capacity);
        let size_err = WorkerPoolConfig::from_json(&json).unwrap_err();
        prop_assert!(
            matches!(size_err, PoolError::InvalidConfig { .. }),
            "unexpected error: {:?}",
            size_err
        );

        let json = format!(r#"{{ "size": {}, "queue_capacity": {} }}"#, capacity, size);
        let capacity_err = WorkerPoolConfig::from_json(&json).unwrap_err();
        prop_assert!(
            matches!(capacity_err, PoolError::InvalidConfig { .. }),
            "unexpected error: {:?}",
            capacity_err
        );
    }

    /// Derived identities keep the instance name recoverable
    #[test]
    fn test_identity_round_trips_instance_name(name in "[ -~]{1,24}") {
        let names = WorkerPoolConfig::new(1, 1)
            .with_instance_name(name.clone())
            .resolve_names()
            .unwrap();
        prop_assert_eq!(names.identity.key_property("name"), Some(name));
    }
}

// ============================================================================
// Accounting
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every job that fits is accepted, counted and executed once
    #[test]
    fn test_task_count_equals_accepted(size in 1usize..4, jobs in 1usize..40) {
        let pool = WorkerPool::new(WorkerPoolConfig::new(size, jobs)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..jobs {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }).unwrap();
        }

        prop_assert_eq!(pool.task_count(), jobs as u64);
        pool.shutdown().unwrap();
        prop_assert_eq!(counter.load(Ordering::SeqCst), jobs);
        prop_assert_eq!(pool.completed_count(), jobs as u64);
        prop_assert_eq!(pool.rejected_count(), 0);
    }

    /// Accepted plus rejected always equals attempted, whatever the policy
    #[test]
    fn test_accepted_plus_rejected_is_attempts(
        capacity in 1usize..5,
        attempts in 1usize..30,
        discard in any::<bool>(),
    ) {
        let policy = if discard { SaturationPolicy::Discard } else { SaturationPolicy::Abort };
        let pool = WorkerPool::new(
            WorkerPoolConfig::new(1, capacity).with_saturation_policy(policy),
        ).unwrap();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        pool.execute(move || {
            let _ = release_rx.recv();
            Ok(())
        }).unwrap();

        for _ in 0..attempts {
            let _ = pool.execute(|| Ok(()));
        }

        prop_assert_eq!(pool.task_count() + pool.rejected_count(), attempts as u64 + 1);
        prop_assert!(pool.active_count() <= pool.pool_size());
        prop_assert_eq!(
            pool.remaining_queue_capacity() + pool.queue_len(),
            pool.queue_capacity()
        );

        drop(release_tx);
        pool.shutdown().unwrap();
    }
}
