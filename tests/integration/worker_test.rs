//! Integration tests for the loader worker lifecycle

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use recents_loader::provider::memory::InMemoryProvider;
use recents_loader::{TaskKey, WorkerState};

use super::helpers::{loader_for, wait_until, GatedProvider, RecordingSink, SinkEvent, DRAIN};

fn gated(count: u32) -> Arc<GatedProvider> {
    Arc::new(GatedProvider::new(InMemoryProvider::synthetic(
        count, 8, 64, 0,
    )))
}

#[test]
fn stop_during_fetch_discards_result() {
    let provider = gated(3);
    let mut loader = loader_for(Arc::clone(&provider));
    let key = TaskKey::new(1, 0, 1_000);
    let sink = RecordingSink::default();
    loader.register_sink(key, sink.clone());

    loader.load_resource_data(&key);
    loader.start_loader();
    assert!(wait_until(|| provider.entered() == 1));

    // Restarting before the fetch returns must not revive its result
    loader.stop_loader();
    loader.start_loader();
    provider.release();
    assert!(wait_until(|| loader.thumbnail_cache().contains(&key)));

    assert_eq!(loader.drain_until_idle(DRAIN), 0);
    assert_eq!(
        sink.events(),
        vec![SinkEvent::loaded("default-icon", "loading-thumbnail")]
    );

    // The resources did land in the caches, so the next request is a hit
    let outcome = loader.load_resource_data(&key);
    assert!(!outcome.queued);
    assert_eq!(sink.last(), Some(SinkEvent::loaded("icon-1", "thumb-1")));
}

#[test]
fn stop_during_fetch_parks_worker() {
    let provider = gated(3);
    let loader = loader_for(Arc::clone(&provider));
    loader.load_resource_data(&TaskKey::new(1, 0, 1_000));
    loader.load_resource_data(&TaskKey::new(2, 0, 2_000));
    loader.start_loader();
    assert!(wait_until(|| provider.entered() == 1));

    loader.stop_loader();
    assert!(loader.queue().is_empty());
    provider.release();

    assert!(wait_until(|| loader.worker_state() == WorkerState::Stopped));
    assert_eq!(loader.dispatch_completions_timeout(Duration::from_millis(50)), 0);
    assert_eq!(provider.entered(), 1);
}

#[test]
fn requests_made_while_stopped_wait_for_start() {
    let provider = gated(3);
    provider.release();
    let loader = loader_for(Arc::clone(&provider));
    loader.load_resource_data(&TaskKey::new(2, 0, 2_000));

    assert_eq!(loader.dispatch_completions_timeout(Duration::from_millis(50)), 0);
    assert_eq!(provider.entered(), 0);

    loader.start_loader();
    assert_eq!(loader.drain_until_idle(DRAIN), 1);
    assert_eq!(provider.entered(), 1);
}

#[test]
fn drop_waits_for_in_flight_fetch() {
    let provider = gated(3);
    let loader = loader_for(Arc::clone(&provider));
    loader.load_resource_data(&TaskKey::new(1, 0, 1_000));
    loader.start_loader();
    assert!(wait_until(|| provider.entered() == 1));

    let releaser = {
        let provider = Arc::clone(&provider);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            provider.release();
        })
    };
    drop(loader);
    releaser.join().unwrap();
    assert_eq!(provider.inner().thumbnail_fetches(), 1);
}
