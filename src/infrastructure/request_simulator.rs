// Async Request Simulator - every portal call waits out a simulated network delay

use futures::future;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::latency::{LatencyModel, RequestClass};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulatorStats {
    pub issued: u64,
    pub completed: u64,
    pub failed: u64,
    /// Search results dropped because a newer search had been issued
    pub superseded: u64,
    /// Requests abandoned by shutdown
    pub cancelled: u64,
}

#[derive(Debug)]
struct SimulatorInner {
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    stats: Mutex<SimulatorStats>,
}

/// Cloneable handle; clones share shutdown state and statistics
#[derive(Debug, Clone)]
pub struct RequestSimulator {
    latency: Arc<dyn LatencyModel>,
    inner: Arc<SimulatorInner>,
}

impl RequestSimulator {
    pub fn new(latency: Arc<dyn LatencyModel>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            latency,
            inner: Arc::new(SimulatorInner {
                closed: AtomicBool::new(false),
                shutdown,
                stats: Mutex::new(SimulatorStats::default()),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Wait out the latency for `class`, then run `op`. Errors from `op` are
    /// returned unchanged. Dropping the returned future drops its timer.
    pub async fn run<T, F, Fut>(&self, class: RequestClass, op: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if self.is_closed() {
            return Err(cancelled(class));
        }
        self.record(|s| s.issued += 1);

        let delay = self.latency.delay_for(class);
        debug!("Simulating {:?} request with {:?} latency", class, delay);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_shutdown(self.inner.shutdown.subscribe()) => {
                self.record(|s| s.cancelled += 1);
                return Err(cancelled(class));
            }
        }

        let outcome = op().await;
        match &outcome {
            Ok(_) => self.record(|s| s.completed += 1),
            Err(e) => {
                debug!("{:?} request failed: {}", class, e);
                self.record(|s| s.failed += 1);
            }
        }
        outcome
    }

    /// Stop resolving: pending and future requests fail with `Cancelled`
    pub fn shutdown(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            self.inner.shutdown.send_replace(true);
            info!("Request simulator shut down");
        }
    }

    pub fn stats(&self) -> SimulatorStats {
        *self.inner.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut SimulatorStats)) {
        let mut stats = self.inner.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }
}

fn cancelled(class: RequestClass) -> AppError {
    AppError::Cancelled(format!("{:?} request abandoned", class))
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}
