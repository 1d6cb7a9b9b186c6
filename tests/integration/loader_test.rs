//! Integration tests for the on-demand loader API

use std::sync::Arc;
use std::time::Duration;

use recents_loader::provider::memory::{blank_placeholders, Bitmap, InMemoryProvider};
use recents_loader::{Config, MemoryPressure, TaskKey, TaskLoader, WorkerState};

use super::helpers::{synthetic_loader, wait_until, RecordingSink, SinkEvent, DRAIN};

fn key(id: u32) -> TaskKey {
    TaskKey::new(id, 0, u64::from(id) * 1_000)
}

#[test]
fn miss_then_background_load_then_fresh_hit() {
    let (mut loader, provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());

    let outcome = loader.load_resource_data(&key(1));
    assert!(outcome.queued);
    assert_eq!(
        sink.events(),
        vec![SinkEvent::loaded("default-icon", "loading-thumbnail")]
    );

    loader.start_loader();
    assert_eq!(loader.drain_until_idle(DRAIN), 1);
    assert_eq!(sink.last(), Some(SinkEvent::loaded("icon-1", "thumb-1")));

    let outcome = loader.load_resource_data(&key(1));
    assert!(!outcome.queued);
    assert_eq!(outcome.icon.name, "icon-1");
    assert_eq!(sink.events().len(), 3);
    assert_eq!(provider.icon_fetches(), 1);
    assert_eq!(provider.thumbnail_fetches(), 1);
}

#[test]
fn unload_cancels_pending_load() {
    let (mut loader, provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(2), sink.clone());

    loader.load_resource_data(&key(2));
    loader.unload_resource_data(&key(2));
    assert!(loader.queue().is_empty());
    assert_eq!(sink.last(), Some(SinkEvent::unloaded()));

    loader.start_loader();
    assert_eq!(loader.drain_until_idle(DRAIN), 0);
    assert_eq!(provider.icon_fetches(), 0);
}

#[test]
fn unload_keeps_cached_entries() {
    let (mut loader, _provider) = synthetic_loader(3);
    loader.register_sink(key(1), RecordingSink::default());
    loader.start_loader();
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);

    loader.unload_resource_data(&key(1));
    assert!(loader.icon_cache().get_if_fresh(&key(1)).is_some());
    assert!(loader.thumbnail_cache().get_if_fresh(&key(1)).is_some());
}

#[test]
fn load_after_unload_is_served_from_cache() {
    let (mut loader, provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());
    loader.start_loader();
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);

    loader.unload_resource_data(&key(1));
    assert_eq!(sink.last(), Some(SinkEvent::unloaded()));

    let outcome = loader.load_resource_data(&key(1));
    assert!(!outcome.queued);
    assert!(loader.queue().is_empty());
    assert_eq!(sink.last(), Some(SinkEvent::loaded("icon-1", "thumb-1")));
    assert_eq!(provider.icon_fetches(), 1);
}

#[test]
fn load_after_unload_and_eviction_requeues() {
    let (mut loader, _provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());
    loader.start_loader();
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);
    // Keep the worker away from the queue so the request stays observable
    loader.stop_loader();

    loader.unload_resource_data(&key(1));
    loader.on_memory_pressure(MemoryPressure::Critical);

    let outcome = loader.load_resource_data(&key(1));
    assert!(outcome.queued);
    assert_eq!(outcome.icon.name, "default-icon");
    assert_eq!(outcome.thumbnail.name, "loading-thumbnail");
    assert!(loader.queue().contains(&key(1)));
    assert_eq!(
        sink.last(),
        Some(SinkEvent::loaded("default-icon", "loading-thumbnail"))
    );
}

#[test]
fn delete_forgets_task_and_optionally_notifies() {
    let (mut loader, _provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());
    loader.start_loader();
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);
    let before = sink.events().len();

    loader.delete_resource_data(&key(1), false);
    assert!(!loader.icon_cache().contains(&key(1)));
    assert!(!loader.thumbnail_cache().contains(&key(1)));
    assert_eq!(sink.events().len(), before);

    loader.delete_resource_data(&key(1), true);
    assert_eq!(sink.last(), Some(SinkEvent::unloaded()));
}

#[test]
fn activity_change_delivers_stale_then_refreshes() {
    let (mut loader, provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());
    loader.start_loader();
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);

    let touched = provider.touch(1, 9_000).unwrap();
    sink.clear();
    let outcome = loader.load_resource_data(&touched);
    assert!(outcome.queued);
    // The outdated resources are shown until the refresh lands
    assert_eq!(sink.events(), vec![SinkEvent::loaded("icon-1", "thumb-1")]);

    assert_eq!(loader.drain_until_idle(DRAIN), 1);
    assert_eq!(provider.icon_fetches(), 2);
    assert!(loader.icon_cache().get_if_fresh(&touched).is_some());
    assert!(loader.icon_cache().get_if_fresh(&key(1)).is_none());
}

#[test]
fn completions_are_dispatched_in_load_order() {
    let (mut loader, _provider) = synthetic_loader(5);
    let sink = RecordingSink::default();
    for id in [3, 1, 2] {
        loader.register_sink(key(id), sink.clone());
        loader.load_resource_data(&key(id));
    }
    sink.clear();

    loader.start_loader();
    assert_eq!(loader.drain_until_idle(DRAIN), 3);
    assert_eq!(
        sink.events(),
        vec![
            SinkEvent::loaded("icon-3", "thumb-3"),
            SinkEvent::loaded("icon-1", "thumb-1"),
            SinkEvent::loaded("icon-2", "thumb-2"),
        ]
    );
}

#[test]
fn completion_without_sink_is_dropped() {
    let (mut loader, _provider) = synthetic_loader(3);
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());
    assert!(loader.unregister_sink(&key(1)));
    assert!(!loader.unregister_sink(&key(1)));

    loader.load_resource_data(&key(1));
    loader.start_loader();
    assert_eq!(loader.drain_until_idle(DRAIN), 1);
    assert!(sink.events().is_empty());
    assert!(loader.icon_cache().contains(&key(1)));
}

#[test]
fn unresolvable_task_caches_placeholders() {
    let provider = Arc::new(InMemoryProvider::synthetic(4, 8, 64, 2));
    let mut loader =
        TaskLoader::new(&Config::default(), Arc::clone(&provider), blank_placeholders()).unwrap();
    let sink = RecordingSink::default();
    loader.register_sink(key(2), sink.clone());

    loader.start_loader();
    loader.load_resource_data(&key(2));
    loader.drain_until_idle(DRAIN);
    assert_eq!(
        sink.last(),
        Some(SinkEvent::loaded("default-icon", "default-thumbnail"))
    );

    // The placeholder counts as a fresh entry: no second lookup
    assert!(!loader.load_resource_data(&key(2)).queued);
    assert_eq!(provider.icon_fetches(), 1);
}

#[test]
fn ui_hidden_stops_worker_and_drops_queue() {
    let (loader, _provider) = synthetic_loader(3);
    loader.start_loader();
    assert!(wait_until(|| loader.worker_state() == WorkerState::WaitingForWork));

    loader.on_memory_pressure(MemoryPressure::UiHidden);
    loader.load_resource_data(&key(1));
    assert!(wait_until(|| loader.worker_state() == WorkerState::Stopped));
    assert_eq!(loader.dispatch_completions_timeout(Duration::from_millis(50)), 0);
    assert_eq!(loader.queue().len(), 1);

    // Pending work left by a later request is dropped by the next hide
    loader.on_memory_pressure(MemoryPressure::UiHidden);
    assert!(loader.queue().is_empty());
}

#[test]
fn ui_hidden_then_moderate_trims_only_on_moderate() {
    let (loader, _provider) = synthetic_loader(0);
    let budget = loader.budget();
    let chunk = budget.thumbnail_bytes / 4;
    for id in 1..=4 {
        loader.thumbnail_cache().put(key(id), Arc::new(Bitmap::new("t", chunk)));
    }
    assert!(loader.thumbnail_cache().size() > budget.thumbnail_bytes / 2);
    for id in 10..=12 {
        loader.load_resource_data(&key(id));
    }
    assert_eq!(loader.queue().len(), 3);
    let before = (loader.thumbnail_cache().len(), loader.thumbnail_cache().size());

    loader.on_memory_pressure(MemoryPressure::UiHidden);
    assert!(loader.queue().is_empty());
    assert_eq!(
        (loader.thumbnail_cache().len(), loader.thumbnail_cache().size()),
        before
    );

    loader.on_memory_pressure(MemoryPressure::Moderate);
    assert!(loader.queue().is_empty());
    assert!(loader.thumbnail_cache().size() <= budget.thumbnail_bytes / 2);
    assert_eq!(loader.thumbnail_cache().len(), 2);
    assert!(loader.thumbnail_cache().contains(&key(4)));
}

#[test]
fn disabled_background_cache_survives_partial_trims() {
    let mut config = Config::default();
    config.cache.disable_background_cache = true;
    let provider = Arc::new(InMemoryProvider::synthetic(2, 8, 64, 0));
    let loader = TaskLoader::new(&config, provider, blank_placeholders()).unwrap();
    assert_eq!(loader.trim_budget(), Config::default().budget());

    loader.start_loader();
    loader.load_resource_data(&key(2));
    loader.drain_until_idle(DRAIN);

    loader.on_memory_pressure(MemoryPressure::Moderate);
    loader.on_memory_pressure(MemoryPressure::Low);
    assert!(loader.icon_cache().contains(&key(2)));
    assert!(loader.thumbnail_cache().contains(&key(2)));

    loader.on_memory_pressure(MemoryPressure::Critical);
    assert!(loader.thumbnail_cache().is_empty());
}

#[test]
fn low_and_critical_pressure_shed_caches() {
    let (loader, _provider) = synthetic_loader(0);
    let budget = loader.budget();
    let chunk = budget.thumbnail_bytes / 8;
    for id in 1..=8 {
        loader.thumbnail_cache().put(
            key(id),
            Arc::new(Bitmap::new("t", chunk)),
        );
    }
    loader.icon_cache().put(
        key(1),
        Arc::new(Bitmap::new("i", 8)),
    );

    loader.on_memory_pressure(MemoryPressure::Low);
    assert_eq!(loader.thumbnail_cache().len(), 2);
    assert!(loader.thumbnail_cache().contains(&key(8)));
    assert_eq!(loader.icon_cache().len(), 1);

    loader.on_memory_pressure(MemoryPressure::Critical);
    assert!(loader.thumbnail_cache().is_empty());
    assert!(loader.icon_cache().is_empty());
}

#[test]
fn disabled_background_cache_keeps_only_latest_entry() {
    let mut config = Config::default();
    config.cache.disable_background_cache = true;
    let provider = Arc::new(InMemoryProvider::synthetic(3, 8, 64, 0));
    let loader = TaskLoader::new(&config, provider, blank_placeholders()).unwrap();

    loader.start_loader();
    for id in 1..=3 {
        loader.load_resource_data(&key(id));
    }
    assert_eq!(loader.drain_until_idle(DRAIN), 3);
    assert_eq!(loader.icon_cache().len(), 1);
    assert!(loader.thumbnail_cache().contains(&key(3)));
}

#[test]
fn set_provider_switches_source() {
    let (mut loader, _old) = synthetic_loader(3);
    let replacement = Arc::new(InMemoryProvider::synthetic(3, 8, 64, 1));
    let sink = RecordingSink::default();
    loader.register_sink(key(1), sink.clone());

    loader.start_loader();
    loader.set_provider(Arc::clone(&replacement));
    loader.load_resource_data(&key(1));
    loader.drain_until_idle(DRAIN);

    assert_eq!(replacement.icon_fetches(), 1);
    assert_eq!(
        sink.last(),
        Some(SinkEvent::loaded("default-icon", "default-thumbnail"))
    );
}
