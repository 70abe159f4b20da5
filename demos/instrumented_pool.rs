//! Instrumented pool demonstration
//!
//! Runs a small pool into saturation and prints what the management registry
//! sees along the way.
//!
//! ```text
//! RUST_LOG=managed_pool=debug cargo run --example instrumented_pool
//! ```

use managed_pool::prelude::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Instrumented Worker Pool Demo ===\n");

    let registry = Arc::new(InMemoryRegistry::new());
    let pool = WorkerPool::new(
        WorkerPoolConfig::new(2, 2)
            .with_instance_name("demo")
            .with_registry(registry.clone()),
    )?;
    println!("1. Registered as {}", pool.identity());

    println!("\n2. Filling both workers and the queue:");
    let (started_tx, started_rx) = mpsc::channel();
    let mut gates = Vec::new();
    for id in 1..=4 {
        let (release, gate) = mpsc::channel::<()>();
        let started = started_tx.clone();
        pool.execute(move || {
            let _ = started.send(id);
            let _ = gate.recv();
            println!("   → job {} finished", id);
            Ok(())
        })?;
        gates.push(release);
    }
    for _ in 0..2 {
        let id = started_rx.recv().expect("worker did not start");
        println!("   → job {} running", id);
    }
    print_snapshot(&registry, &pool);

    println!("\n3. One more submission is refused:");
    match pool.execute(|| Ok(())) {
        Err(e @ PoolError::Saturated { .. }) => println!("   ✗ {}", e),
        other => println!("   unexpected: {:?}", other),
    }
    print_snapshot(&registry, &pool);

    println!("\n4. Releasing job 1 lets job 3 start:");
    gates[0].send(()).ok();
    let id = started_rx.recv().expect("queued job did not start");
    println!("   → job {} running", id);
    print_snapshot(&registry, &pool);

    println!("\n5. Results come back through a handle:");
    drop(gates);
    let handle = pool.submit_with_result(|| (1..=10u64).product::<u64>())?;
    println!("   ✓ 10! = {}", handle.join_timeout(Duration::from_secs(2))?);

    println!("\n6. Shutting down:");
    pool.shutdown()?;
    println!("   state: {}", pool.state());
    println!("   registered pools left: {}", registry.len());
    println!("   final: {}", serde_json::to_string_pretty(&pool.snapshot())?);

    Ok(())
}

fn print_snapshot(registry: &InMemoryRegistry, pool: &WorkerPool) {
    if let Some(s) = registry.snapshot(pool.identity()) {
        println!(
            "   active={} tasks={} remaining={} rejected={}",
            s.active_count, s.task_count, s.remaining_queue_capacity, s.rejected_count
        );
    }
}
