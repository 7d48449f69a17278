//! Concurrency tests for the timer engine.
//!
//! Control operations race each other on a multi-threaded runtime while a
//! monitor samples the driver counters. At no observation may more than one
//! clock driver run be alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{sleep, Duration};

use leanfocus::config::FocusConfig;
use leanfocus::daemon::timer::TimerEngine;
use leanfocus::sound::MockSoundPort;
use leanfocus::types::TimerState;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_engine() -> Arc<TimerEngine> {
    let config = Arc::new(FocusConfig::default());
    Arc::new(TimerEngine::new(config, Arc::new(MockSoundPort::new())))
}

/// Samples the driver counters until `stop` is set.
///
/// Returns the highest number of unjoined runs observed.
fn spawn_monitor(
    engine: Arc<TimerEngine>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut worst = 0;
        while !stop.load(Ordering::SeqCst) {
            let stats = engine.driver_stats();
            worst = worst.max(stats.in_flight()).max(stats.live);
            tokio::task::yield_now().await;
        }
        worst
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_start_pause_keeps_single_driver() {
    let engine = create_engine();
    engine.start().await;

    let stop = Arc::new(AtomicBool::new(false));
    let monitor = spawn_monitor(Arc::clone(&engine), Arc::clone(&stop));

    let mut handles = Vec::new();
    for i in 0..100 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                engine.start().await;
            } else {
                engine.pause().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    stop.store(true, Ordering::SeqCst);
    let worst = monitor.await.unwrap();
    let stats = engine.driver_stats();

    assert!(worst <= 1, "observed {} driver runs at once", worst);
    assert!(stats.in_flight() <= 1);
    assert_eq!(stats.peak_live, 1);
    assert!(matches!(
        engine.state(),
        TimerState::Working | TimerState::Paused
    ));
    engine.shutdown().await;
    assert_eq!(engine.driver_stats().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_operations_keep_state_consistent() {
    let engine = create_engine();

    let mut handles = Vec::new();
    for i in 0..100 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            match i % 5 {
                0 => {
                    engine.start().await;
                }
                1 => {
                    engine.pause().await;
                }
                2 => {
                    engine.toggle().await;
                }
                3 => {
                    engine.restart_and_pause().await;
                }
                _ => {
                    engine.reset().await;
                }
            }
            assert!(engine.snapshot().remaining_seconds <= 1500);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = engine.driver_stats();
    assert!(stats.peak_live <= 1);
    assert!(stats.in_flight() <= 1);
    assert_eq!(stats.in_flight() == 1, engine.state().is_running());
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_returns_after_driver_exit() {
    let engine = create_engine();

    for _ in 0..20 {
        engine.start().await;
        sleep(Duration::from_millis(5)).await;
        engine.pause().await;

        let stats = engine.driver_stats();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.in_flight(), 0);
    }
    assert_eq!(engine.driver_stats().spawned, 20);
}
