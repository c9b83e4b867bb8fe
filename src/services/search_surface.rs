// Directory search surface - overlapping searches resolve last-request-wins

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::latency::RequestClass;
use crate::infrastructure::request_simulator::RequestSimulator;
use crate::models::Alumni;
use crate::services::query_engine::{AlumniQuery, QueryEngine};

/// What a consumer of the surface sees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Sequence number of the request whose outcome is shown; 0 before any
    pub sequence: u64,
    pub loading: bool,
    pub query: Option<AlumniQuery>,
    pub results: Vec<Alumni>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct SurfaceShared {
    issued: AtomicU64,
    closed: AtomicBool,
    state: watch::Sender<SearchState>,
}

impl SurfaceShared {
    /// Apply an outcome only if `sequence` is still the newest request issued.
    /// Returns false when the outcome was stale and dropped.
    fn apply(&self, sequence: u64, query: AlumniQuery, outcome: AppResult<Vec<Alumni>>) -> bool {
        self.state.send_if_modified(|current| {
            if self.closed.load(Ordering::SeqCst)
                || sequence != self.issued.load(Ordering::SeqCst)
                || sequence <= current.sequence
            {
                return false;
            }
            current.sequence = sequence;
            current.loading = false;
            current.query = Some(query);
            match outcome {
                Ok(results) => {
                    current.results = results;
                    current.error = None;
                }
                Err(e) => current.error = Some(e.to_string()),
            }
            true
        })
    }
}

/// One search box's worth of state. Each `submit` supersedes the previous one.
#[derive(Debug)]
pub struct SearchSurface {
    simulator: RequestSimulator,
    engine: QueryEngine,
    shared: Arc<SurfaceShared>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl SearchSurface {
    pub fn new(simulator: RequestSimulator, engine: QueryEngine) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            simulator,
            engine,
            shared: Arc::new(SurfaceShared {
                issued: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                state,
            }),
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn current(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    pub fn latest_issued(&self) -> u64 {
        self.shared.issued.load(Ordering::SeqCst)
    }

    /// Issue a search and return its sequence number. Must be called within a
    /// tokio runtime.
    #[instrument(skip(self))]
    pub fn submit(&self, query: AlumniQuery) -> AppResult<u64> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(AppError::Cancelled("search surface is closed".into()));
        }

        let sequence = self.shared.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.state.send_modify(|s| s.loading = true);

        let simulator = self.simulator.clone();
        let engine = self.engine.clone();
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let outcome = simulator
                .run(RequestClass::Search, || {
                    let query = query.clone();
                    async move { Ok(engine.search_alumni(&query).await) }
                })
                .await;
            if !shared.apply(sequence, query, outcome) {
                debug!("Dropped stale search #{}", sequence);
                simulator.record(|s| s.superseded += 1);
            }
        });

        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            if !previous.is_finished() {
                previous.abort();
                self.simulator.record(|s| s.superseded += 1);
                debug!("Search #{} superseded by #{}", sequence - 1, sequence);
            }
        }
        Ok(sequence)
    }

    /// Resolve once the newest issued search has been applied
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if self.shared.closed.load(Ordering::SeqCst)
                    || (!state.loading && state.sequence >= self.latest_issued())
                {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.current();
            }
        }
    }

    /// Abort outstanding work; nothing is applied after this returns
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        self.shared.state.send_modify(|s| s.loading = false);
    }
}

impl Drop for SearchSurface {
    fn drop(&mut self) {
        self.close();
    }
}
