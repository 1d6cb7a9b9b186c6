//! Task loader facade
//!
//! Owns the icon and thumbnail caches, the load queue and the worker, and
//! is the only type consumers talk to. It lives on the consumer thread:
//! sinks are registered here and completions from the worker are dispatched
//! here, in the order the worker produced them.
//!
//! ```text
//!   consumer ──load_resource_data──► caches ──hit──► sink (sync)
//!                                      │
//!                                     miss ──► queue ──► worker ──► provider
//!                                                          │
//!   consumer ◄──dispatch_completions── channel ◄───────────┘
//! ```

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::BoundedResourceCache;
use crate::config::{CacheBudget, Config, LoaderConfig};
use crate::error::LoaderError;
use crate::key::TaskKey;
use crate::pressure::MemoryPressure;
use crate::provider::{Placeholders, ResourceProvider, ResultSink};
use crate::queue::LoadQueue;
use crate::stack::{Task, TaskStack};
use crate::worker::{Completion, ResourceLoaderWorker, WorkerState};

type IconOf<P> = <P as ResourceProvider>::Icon;
type ThumbnailOf<P> = <P as ResourceProvider>::Thumbnail;
type BoxedSink<P> = Box<dyn ResultSink<IconOf<P>, ThumbnailOf<P>> + Send>;

/// What `load_resource_data` handed to the sink.
#[derive(Debug)]
pub struct LoadOutcome<I, T> {
    pub icon: Arc<I>,
    pub thumbnail: Arc<T>,
    /// A background load is pending for the key
    pub queued: bool,
}

/// Asynchronous icon/thumbnail loader for recent tasks.
pub struct TaskLoader<P: ResourceProvider> {
    settings: LoaderConfig,
    budget: CacheBudget,
    trim_budget: CacheBudget,
    provider: Arc<P>,
    placeholders: Placeholders<P::Icon, P::Thumbnail>,
    icons: Arc<BoundedResourceCache<TaskKey, P::Icon>>,
    thumbnails: Arc<BoundedResourceCache<TaskKey, P::Thumbnail>>,
    queue: Arc<LoadQueue<TaskKey>>,
    sinks: HashMap<TaskKey, BoxedSink<P>>,
    completions: Receiver<Completion<P::Icon, P::Thumbnail>>,
    worker: ResourceLoaderWorker<P>,
}

impl<P: ResourceProvider> TaskLoader<P> {
    /// Builds the caches and spawns the (stopped) worker.
    pub fn new(
        config: &Config,
        provider: Arc<P>,
        placeholders: Placeholders<P::Icon, P::Thumbnail>,
    ) -> Result<Self, LoaderError> {
        config.validate()?;
        let budget = config.budget();
        let icons = Arc::new(BoundedResourceCache::new("icons", budget.icon_bytes));
        let thumbnails = Arc::new(BoundedResourceCache::new(
            "thumbnails",
            budget.thumbnail_bytes,
        ));
        let queue = Arc::new(LoadQueue::new());
        let (tx, rx) = channel();
        let worker = ResourceLoaderWorker::spawn(
            Arc::clone(&queue),
            Arc::clone(&icons),
            Arc::clone(&thumbnails),
            placeholders.clone(),
            tx,
        )?;

        debug!(
            icon_budget = budget.icon_bytes,
            thumbnail_budget = budget.thumbnail_bytes,
            "task loader created"
        );

        Ok(Self {
            settings: config.loader.clone(),
            budget,
            trim_budget: config.trim_budget(),
            provider,
            placeholders,
            icons,
            thumbnails,
            queue,
            sinks: HashMap::new(),
            completions: rx,
            worker,
        })
    }

    /// Routes notifications for `key` to `sink`, replacing any previous one.
    pub fn register_sink(
        &mut self,
        key: TaskKey,
        sink: impl ResultSink<P::Icon, P::Thumbnail> + Send + 'static,
    ) {
        self.sinks.insert(key, Box::new(sink));
    }

    pub fn unregister_sink(&mut self, key: &TaskKey) -> bool {
        self.sinks.remove(key).is_some()
    }

    /// Delivers whatever is cached for `key` right away.
    ///
    /// Missing resources are replaced by the default icon and the loading
    /// thumbnail, and the key is queued. Stale entries are delivered as they
    /// are and queued for a refresh. Fresh hits are not queued.
    pub fn load_resource_data(&self, key: &TaskKey) -> LoadOutcome<P::Icon, P::Thumbnail> {
        let icon = self.icons.get_versioned(key);
        let thumbnail = self.thumbnails.get_versioned(key);
        let fresh = matches!(icon, Some((_, true))) && matches!(thumbnail, Some((_, true)));

        let icon = icon
            .map(|(icon, _)| icon)
            .unwrap_or_else(|| Arc::clone(&self.placeholders.default_icon));
        let thumbnail = thumbnail
            .map(|(thumbnail, _)| thumbnail)
            .unwrap_or_else(|| Arc::clone(&self.placeholders.loading_thumbnail));

        if !fresh {
            self.queue.enqueue(*key);
        }
        trace!(%key, queued = !fresh, "load requested");

        if let Some(sink) = self.sinks.get(key) {
            sink.on_data_loaded(Arc::clone(&thumbnail), Arc::clone(&icon));
        }

        LoadOutcome {
            icon,
            thumbnail,
            queued: !fresh,
        }
    }

    /// Cancels any pending load for `key` and hands the sink the default
    /// placeholders. Cached entries stay for quick re-display.
    pub fn unload_resource_data(&self, key: &TaskKey) {
        self.queue.remove(key);
        trace!(%key, "unloaded");
        self.notify_unloaded(key);
    }

    /// Forgets `key` entirely: pending load and both cache entries.
    pub fn delete_resource_data(&self, key: &TaskKey, notify: bool) {
        self.queue.remove(key);
        self.thumbnails.remove(key);
        self.icons.remove(key);
        trace!(%key, "deleted");
        if notify {
            self.notify_unloaded(key);
        }
    }

    /// Sheds memory according to `level`. Only the caches and the queue are
    /// affected.
    ///
    /// Trim targets are fractions of the nominal budget, so the single-byte
    /// caches of `disable_background_cache` keep their one entry.
    pub fn on_memory_pressure(&self, level: MemoryPressure) {
        debug!(%level, "memory pressure");
        match level {
            MemoryPressure::UiHidden => self.stop_loader(),
            MemoryPressure::Moderate | MemoryPressure::Low => {
                let divisor = level.trim_divisor().unwrap_or(1);
                let target = self.trim_budget.scaled(divisor);
                self.thumbnails.trim_to_size(target.thumbnail_bytes);
                self.icons.trim_to_size(target.icon_bytes);
            }
            MemoryPressure::Critical => {
                self.thumbnails.evict_all();
                self.icons.evict_all();
            }
        }
    }

    /// Rebuilds the recent task stack and starts background loading.
    ///
    /// The last `preload_count` tasks get whatever is fresh in the caches.
    /// The foremost task's missing resources are fetched synchronously;
    /// the others are queued for the worker.
    pub fn reload(&self, preload_count: usize) -> TaskStack<P::Icon, P::Thumbnail> {
        let mut descriptors = self
            .provider
            .list_recent_tasks(self.settings.recent_task_limit);
        descriptors.reverse();

        let count = descriptors.len();
        let preload_from = count.saturating_sub(preload_count);
        let mut to_load: Vec<TaskKey> = Vec::new();
        let mut stack = TaskStack::new();

        for (i, descriptor) in descriptors.into_iter().enumerate() {
            let is_foremost = i + 1 == count;
            let mut task = Task::new(descriptor, is_foremost);

            if i >= preload_from {
                task.icon = self.icons.get_if_fresh(&task.key);
                if task.icon.is_none() {
                    if is_foremost {
                        task.icon = Some(self.fetch_icon(&task.key));
                    } else if !to_load.contains(&task.key) {
                        to_load.push(task.key);
                    }
                }

                task.thumbnail = self.thumbnails.get_if_fresh(&task.key);
                if task.thumbnail.is_none() {
                    if is_foremost {
                        task.thumbnail = Some(self.fetch_thumbnail(&task.key));
                    } else if !to_load.contains(&task.key) {
                        to_load.push(task.key);
                    }
                }
            }

            stack.push(task);
        }

        self.start_loader();
        let queued = to_load.len();
        for key in to_load {
            self.queue.enqueue(key);
        }

        debug!(tasks = count, queued, "recent tasks reloaded");
        stack
    }

    /// The recent task stack without touching caches or the worker.
    pub fn shallow_task_stack(&self) -> TaskStack<P::Icon, P::Thumbnail> {
        let mut descriptors = self
            .provider
            .list_recent_tasks(self.settings.recent_task_limit);
        descriptors.reverse();
        let count = descriptors.len();
        let mut stack = TaskStack::new();
        for (i, descriptor) in descriptors.into_iter().enumerate() {
            stack.push(Task::new(descriptor, i + 1 == count));
        }
        stack
    }

    /// Starts (or resumes) the worker with the current provider.
    pub fn start_loader(&self) {
        self.worker.start(Arc::clone(&self.provider));
    }

    /// Stops the worker and drops every pending request.
    pub fn stop_loader(&self) {
        self.worker.stop();
        self.queue.clear();
    }

    /// Replaces the provider. A running worker switches over on its next
    /// item.
    pub fn set_provider(&mut self, provider: Arc<P>) {
        self.provider = provider;
        if self.worker.is_started() {
            self.start_loader();
        }
    }

    /// Hands every completion received so far to its sink.
    ///
    /// Returns the number of completions processed.
    pub fn dispatch_completions(&self) -> usize {
        let mut dispatched = 0;
        while let Ok(completion) = self.completions.try_recv() {
            self.deliver(completion);
            dispatched += 1;
        }
        dispatched
    }

    /// Like [`dispatch_completions`](Self::dispatch_completions), but waits
    /// up to `timeout` for the first completion.
    pub fn dispatch_completions_timeout(&self, timeout: Duration) -> usize {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => {
                self.deliver(completion);
                1 + self.dispatch_completions()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Dispatches completions until the queue is drained and the worker is
    /// idle (or stopped), or until `timeout` passes.
    pub fn drain_until_idle(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let step = Duration::from_millis(5);
        let mut dispatched = 0;
        loop {
            dispatched += self.dispatch_completions_timeout(step);
            let idle = self.queue.is_empty() && self.worker.state() == WorkerState::WaitingForWork;
            if idle || !self.worker.is_started() || Instant::now() >= deadline {
                return dispatched + self.dispatch_completions();
            }
        }
    }

    /// Capacities of the two caches.
    pub fn budget(&self) -> CacheBudget {
        self.budget
    }

    /// Budget that pressure trims are computed from.
    pub fn trim_budget(&self) -> CacheBudget {
        self.trim_budget
    }

    pub fn icon_cache(&self) -> &BoundedResourceCache<TaskKey, P::Icon> {
        &self.icons
    }

    pub fn thumbnail_cache(&self) -> &BoundedResourceCache<TaskKey, P::Thumbnail> {
        &self.thumbnails
    }

    pub fn queue(&self) -> &LoadQueue<TaskKey> {
        &self.queue
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    fn deliver(&self, completion: Completion<P::Icon, P::Thumbnail>) {
        match self.sinks.get(&completion.key) {
            Some(sink) => sink.on_data_loaded(completion.thumbnail, completion.icon),
            None => trace!(key = %completion.key, "no sink registered, completion dropped"),
        }
    }

    fn notify_unloaded(&self, key: &TaskKey) {
        if let Some(sink) = self.sinks.get(key) {
            sink.on_data_unloaded(
                Arc::clone(&self.placeholders.default_thumbnail),
                Arc::clone(&self.placeholders.default_icon),
            );
        }
    }

    fn fetch_icon(&self, key: &TaskKey) -> Arc<P::Icon> {
        let icon = match self.provider.resolve_icon(key) {
            Some(icon) => Arc::new(icon),
            None => Arc::clone(&self.placeholders.default_icon),
        };
        self.icons.put(*key, Arc::clone(&icon));
        icon
    }

    fn fetch_thumbnail(&self, key: &TaskKey) -> Arc<P::Thumbnail> {
        let thumbnail = match self.provider.resolve_thumbnail(key) {
            Some(thumbnail) => Arc::new(thumbnail),
            None => Arc::clone(&self.placeholders.default_thumbnail),
        };
        self.thumbnails.put(*key, Arc::clone(&thumbnail));
        thumbnail
    }
}
