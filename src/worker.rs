//! Background worker that resolves queued task resources
//!
//! One thread, one key at a time. For each dequeued key the worker fills the
//! icon and thumbnail caches (fetching only what is missing or stale) and
//! sends a [`Completion`] to the consumer over a channel.
//!
//! # Lifecycle
//!
//! ```text
//!   Stopped ──start(provider)──► Running ◄──work arrives── WaitingForWork
//!      ▲                            │  └──queue empty──────────►  │
//!      └───────stop() observed──────┴──────────────────────────────┘
//! ```
//!
//! - `start` installs the provider and clears the cancel flag.
//! - `stop` sets the cancel flag and advances the run epoch. A result
//!   whose fetch began under an older epoch is dropped, even if the worker
//!   has been started again in the meantime.
//! - The thread is spawned once and parks while stopped. Dropping the
//!   worker shuts it down and joins it.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::cache::BoundedResourceCache;
use crate::key::TaskKey;
use crate::provider::{Placeholders, ResourceProvider};
use crate::queue::LoadQueue;

/// Name given to the loader thread.
pub const THREAD_NAME: &str = "recents-task-loader";

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Parked until the next `start`
    Stopped,
    /// Processing queued keys
    Running,
    /// Blocked on an empty queue
    WaitingForWork,
}

/// Resources resolved for one task, sent from the worker to the consumer.
#[derive(Debug)]
pub struct Completion<I, T> {
    pub key: TaskKey,
    pub thumbnail: Arc<T>,
    pub icon: Arc<I>,
}

struct Control<P> {
    provider: Option<Arc<P>>,
    state: WorkerState,
}

struct Shared<P: ResourceProvider> {
    control: Mutex<Control<P>>,
    resumed: Condvar,
    cancelled: AtomicBool,
    shutdown: AtomicBool,
    epoch: AtomicU64,
    queue: Arc<LoadQueue<TaskKey>>,
    icons: Arc<BoundedResourceCache<TaskKey, P::Icon>>,
    thumbnails: Arc<BoundedResourceCache<TaskKey, P::Thumbnail>>,
    placeholders: Placeholders<P::Icon, P::Thumbnail>,
}

impl<P: ResourceProvider> Shared<P> {
    fn interrupted(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.shutdown.load(Ordering::SeqCst)
    }
}

/// Handle to the loader thread.
pub struct ResourceLoaderWorker<P: ResourceProvider> {
    shared: Arc<Shared<P>>,
    handle: Option<JoinHandle<()>>,
}

impl<P: ResourceProvider> ResourceLoaderWorker<P> {
    /// Spawns the loader thread in the `Stopped` state.
    pub fn spawn(
        queue: Arc<LoadQueue<TaskKey>>,
        icons: Arc<BoundedResourceCache<TaskKey, P::Icon>>,
        thumbnails: Arc<BoundedResourceCache<TaskKey, P::Thumbnail>>,
        placeholders: Placeholders<P::Icon, P::Thumbnail>,
        completions: Sender<Completion<P::Icon, P::Thumbnail>>,
    ) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                provider: None,
                state: WorkerState::Stopped,
            }),
            resumed: Condvar::new(),
            cancelled: AtomicBool::new(true),
            shutdown: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            queue,
            icons,
            thumbnails,
            placeholders,
        });

        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run(&shared, &completions))?
        };

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Resumes loading with `provider`.
    ///
    /// The provider may differ from the previous run's.
    pub fn start(&self, provider: Arc<P>) {
        let mut control = self.shared.control.lock();
        control.provider = Some(provider);
        self.shared.cancelled.store(false, Ordering::SeqCst);
        self.shared.resumed.notify_all();
        debug!("task loader started");
    }

    /// Asks the worker to stop after its current item.
    ///
    /// Never blocks on an in-flight fetch. Its result will be discarded.
    pub fn stop(&self) {
        {
            let mut control = self.shared.control.lock();
            self.shared.cancelled.store(true, Ordering::SeqCst);
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            if control.state == WorkerState::WaitingForWork {
                control.provider = None;
            }
        }
        self.shared.queue.wake();
        debug!("task loader stop requested");
    }

    pub fn state(&self) -> WorkerState {
        self.shared.control.lock().state
    }

    /// Whether the last call was `start` rather than `stop`.
    pub fn is_started(&self) -> bool {
        !self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl<P: ResourceProvider> Drop for ResourceLoaderWorker<P> {
    fn drop(&mut self) {
        {
            let _control = self.shared.control.lock();
            self.shared.shutdown.store(true, Ordering::SeqCst);
            self.shared.resumed.notify_all();
        }
        self.shared.queue.wake();
        if let Some(handle) = self.handle.take() {
            // A provider that never returns keeps the thread alive; join
            // waits for it like any other in-flight fetch.
            let _ = handle.join();
        }
    }
}

fn run<P: ResourceProvider>(
    shared: &Shared<P>,
    completions: &Sender<Completion<P::Icon, P::Thumbnail>>,
) {
    loop {
        let (provider, epoch) = {
            let mut control = shared.control.lock();
            let provider = loop {
                if shared.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if !shared.cancelled.load(Ordering::SeqCst) {
                    if let Some(provider) = control.provider.clone() {
                        break provider;
                    }
                }
                if control.state != WorkerState::Stopped {
                    control.provider = None;
                    control.state = WorkerState::Stopped;
                    debug!("task loader parked");
                }
                shared.resumed.wait(&mut control);
            };
            control.state = WorkerState::Running;
            (provider, shared.epoch.load(Ordering::SeqCst))
        };

        match shared.queue.dequeue() {
            Some(key) => load(shared, &provider, key, epoch, completions),
            None => {
                drop(provider);
                shared.control.lock().state = WorkerState::WaitingForWork;
                shared.queue.wait_for_work(|| shared.interrupted());
            }
        }
    }
}

fn load<P: ResourceProvider>(
    shared: &Shared<P>,
    provider: &P,
    key: TaskKey,
    epoch: u64,
    completions: &Sender<Completion<P::Icon, P::Thumbnail>>,
) {
    let icon = match shared.icons.get_if_fresh(&key) {
        Some(icon) => icon,
        None => {
            // Failed lookups cache the placeholder until the task's
            // activity time changes.
            let icon = match provider.resolve_icon(&key) {
                Some(icon) => Arc::new(icon),
                None => {
                    debug!(%key, "icon unavailable, using placeholder");
                    Arc::clone(&shared.placeholders.default_icon)
                }
            };
            shared.icons.put(key, Arc::clone(&icon));
            icon
        }
    };

    let thumbnail = match shared.thumbnails.get_if_fresh(&key) {
        Some(thumbnail) => thumbnail,
        None => {
            let thumbnail = match provider.resolve_thumbnail(&key) {
                Some(thumbnail) => Arc::new(thumbnail),
                None => {
                    debug!(%key, "thumbnail unavailable, using placeholder");
                    Arc::clone(&shared.placeholders.default_thumbnail)
                }
            };
            shared.thumbnails.put(key, Arc::clone(&thumbnail));
            thumbnail
        }
    };

    if shared.cancelled.load(Ordering::SeqCst) || shared.epoch.load(Ordering::SeqCst) != epoch {
        trace!(%key, "stopped during load, result dropped");
        return;
    }

    trace!(%key, "task resources loaded");
    if completions
        .send(Completion {
            key,
            thumbnail,
            icon,
        })
        .is_err()
    {
        trace!(%key, "completion receiver gone");
    }
}
