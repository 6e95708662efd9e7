//! ListView: one mounted list page.
//!
//! Mounting subscribes to a [`FilterStore`] and spawns a driver task that owns
//! the [`FetchCoordinator`] and the [`PageCache`]. The driver publishes a
//! [`ViewState`] snapshot through a `watch` channel after every transition.
//!
//! A new dispatch aborts the request still in flight; completions that were
//! already queued are filtered by sequence tag, so an older answer never
//! overwrites a newer one. A failed fetch keeps the rows on screen and raises
//! a [`Notice`] instead. A fetch that panics counts as failed.
//!
//! Appends ask for the page after the last one actually applied, whatever
//! page index the store has moved on to.

use std::sync::Arc;
use std::time::Duration;

use replydesk_runtime_config::ListSettings;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::cache::{PageCache, PageResult};
use crate::coordinator::{Directive, Dispatch, FetchCoordinator};
use crate::query::{MAX_PAGE_INDEX, QueryDescriptor};
use crate::source::{FetchError, PageSource};
use crate::store::{ApplyMode, FilterStore, StoreChange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub debounce: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

impl From<&ListSettings> for ListOptions {
    fn from(settings: &ListSettings) -> Self {
        Self {
            debounce: settings.debounce(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First load; nothing to show yet.
    Loading,
    /// Rows from the previous query stay visible while the next one loads.
    Refreshing,
    LoadingMore,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// The server could not be reached; retrying later may help.
    Warning,
    Error,
}

/// Transient message shown next to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn from_fetch_error(id: u64, err: &FetchError) -> Self {
        let level = match err {
            FetchError::Client(e) if e.is_transport() => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self {
            id,
            level,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<R> {
    pub cache: PageCache<R>,
    pub phase: Phase,
    pub notice: Option<Notice>,
    /// Bumped whenever a fetch settles, successfully or not.
    pub revision: u64,
}

impl<R> Default for ViewState<R> {
    fn default() -> Self {
        Self {
            cache: PageCache::new(),
            phase: Phase::Loading,
            notice: None,
            revision: 0,
        }
    }
}

pub struct ListView<R> {
    name: &'static str,
    state: Arc<watch::Sender<ViewState<R>>>,
    shutdown: watch::Sender<bool>,
    driver: Option<JoinHandle<()>>,
}

impl<R: Clone + Send + Sync + 'static> ListView<R> {
    /// Start driving `source` from `store` and issue the initial fetch.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount<S>(store: &mut FilterStore, source: S, options: ListOptions) -> Self
    where
        S: PageSource<Row = R>,
    {
        let name = store.schema().name;
        let filtering = store.schema().filtering;
        let changes = store.subscribe();
        let initial = store.descriptor();
        let state = Arc::new(watch::Sender::new(ViewState::default()));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            name,
            source: Arc::new(source),
            coordinator: FetchCoordinator::new(options.debounce),
            state: Arc::clone(&state),
            in_flight: None,
            done_tx,
            notices: 0,
        };
        let handle = tokio::spawn(driver.run(initial, changes, done_rx, shutdown_rx));
        debug!(list = name, ?filtering, "list view mounted");

        Self {
            name,
            state,
            shutdown,
            driver: Some(handle),
        }
    }

    pub fn snapshot(&self) -> ViewState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<R>> {
        self.state.subscribe()
    }

    pub fn dismiss_notice(&self) {
        self.state.send_if_modified(|s| s.notice.take().is_some());
    }

    /// Wait until a fetch newer than `revision` has settled and nothing is
    /// loading.
    pub async fn settled_after(&self, revision: u64) -> ViewState<R> {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|s| s.revision > revision && s.phase == Phase::Idle)
            .await
            .map(|s| (*s).clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.snapshot(),
        }
    }

    /// Stop the driver and drop the in-flight request. Nothing is applied
    /// afterwards.
    pub async fn unmount(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.driver.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(list = self.name, "list driver panicked: {e}");
                }
            }
        }
        info!(list = self.name, "list view unmounted");
    }
}

impl<R> Drop for ListView<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.take() {
            handle.abort();
        }
    }
}

struct Completion<R> {
    tag: u64,
    mode: ApplyMode,
    outcome: Result<PageResult<R>, FetchError>,
}

/// Aborts the request task when replaced or dropped.
struct InFlight {
    tag: u64,
    handle: JoinHandle<()>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Aborts the wrapped task when the owner is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Driver<S: PageSource> {
    name: &'static str,
    source: Arc<S>,
    coordinator: FetchCoordinator,
    state: Arc<watch::Sender<ViewState<S::Row>>>,
    in_flight: Option<InFlight>,
    done_tx: mpsc::UnboundedSender<Completion<S::Row>>,
    notices: u64,
}

impl<S: PageSource> Driver<S> {
    async fn run(
        mut self,
        initial: QueryDescriptor,
        mut changes: mpsc::UnboundedReceiver<StoreChange>,
        mut done_rx: mpsc::UnboundedReceiver<Completion<S::Row>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        if let Directive::Dispatch(dispatch) = self.coordinator.start(initial) {
            self.launch(dispatch);
        }
        let mut store_open = true;

        loop {
            let deadline = self.coordinator.deadline();
            tokio::select! {
                biased;

                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                Some(done) = done_rx.recv() => self.complete(done),

                change = changes.recv(), if store_open => match change {
                    Some(change) => {
                        if let Directive::Dispatch(dispatch) =
                            self.coordinator.on_change(change, Instant::now())
                        {
                            self.launch(dispatch);
                        }
                    }
                    None => {
                        debug!(list = self.name, "store dropped");
                        store_open = false;
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(dispatch) = self.coordinator.on_deadline(Instant::now()) {
                        self.launch(dispatch);
                    }
                }
            }
        }

        self.coordinator.close();
        self.in_flight = None;
        debug!(list = self.name, "list driver stopped");
    }

    fn launch(&mut self, dispatch: Dispatch) {
        let Dispatch {
            tag,
            mut descriptor,
            mode,
        } = dispatch;

        if mode == ApplyMode::Append {
            let state = self.state.borrow();
            let cache = &state.cache;
            if cache.is_loaded() && cache.page_size() == descriptor.page_size {
                let next = cache.page_index().saturating_add(1).min(MAX_PAGE_INDEX);
                if next != descriptor.page_index {
                    debug!(
                        list = self.name,
                        requested = descriptor.page_index,
                        next,
                        "appending after the last applied page"
                    );
                    descriptor.page_index = next;
                }
            }
        }

        self.state.send_modify(|s| {
            s.phase = match mode {
                ApplyMode::Append => Phase::LoadingMore,
                ApplyMode::Replace if s.cache.is_loaded() => Phase::Refreshing,
                ApplyMode::Replace => Phase::Loading,
            };
        });

        let source = Arc::clone(&self.source);
        let done_tx = self.done_tx.clone();
        let handle = tokio::spawn(async move {
            // The inner task isolates a panicking source; its JoinError is
            // reported like any other failure.
            let mut fetch = AbortOnDrop(tokio::spawn(async move {
                source.fetch(&descriptor).await
            }));
            let outcome = match (&mut fetch.0).await {
                Ok(outcome) => outcome,
                Err(e) => Err(FetchError::Task(e.to_string())),
            };
            let _ = done_tx.send(Completion { tag, mode, outcome });
        });

        if let Some(previous) = self.in_flight.replace(InFlight { tag, handle }) {
            debug!(list = self.name, tag = previous.tag, "aborting superseded fetch");
        }
    }

    fn complete(&mut self, done: Completion<S::Row>) {
        if !self.coordinator.accepts(done.tag) {
            return;
        }
        self.in_flight = None;

        match done.outcome {
            Ok(page) => {
                debug!(
                    list = self.name,
                    tag = done.tag,
                    rows = page.rows.len(),
                    "applying page"
                );
                self.state.send_modify(|s| {
                    match done.mode {
                        ApplyMode::Replace => s.cache.replace(page),
                        ApplyMode::Append => s.cache.append(page),
                    }
                    s.phase = Phase::Idle;
                    s.notice = None;
                    s.revision += 1;
                });
            }
            Err(err) => {
                warn!(list = self.name, tag = done.tag, "fetch failed, keeping previous rows: {err}");
                self.notices += 1;
                let notice = Notice::from_fetch_error(self.notices, &err);
                self.state.send_modify(|s| {
                    s.phase = Phase::Idle;
                    s.notice = Some(notice);
                    s.revision += 1;
                });
            }
        }
    }
}
