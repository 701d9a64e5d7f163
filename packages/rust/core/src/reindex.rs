//! Fire-and-forget background reindexing with trigger coalescing.
//!
//! At most one pass runs at a time. Triggers that arrive while a pass is
//! running collapse into a single follow-up pass; if any of them asked for a
//! forced pass, the follow-up is forced. A started pass always runs to
//! completion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use flowindex_shared::IndexReport;

use crate::indexer::{Indexer, SilentProgress};

/// What a call to [`ReindexTrigger::trigger`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new pass was spawned.
    Started,
    /// A pass is already running; a follow-up pass is queued.
    Coalesced,
}

#[derive(Debug, Default)]
struct State {
    running: bool,
    /// Follow-up pass requested while running, and whether it must be forced.
    pending: Option<bool>,
    last_report: Option<IndexReport>,
    last_error: Option<String>,
}

struct Shared {
    indexer: Arc<Indexer>,
    state: Mutex<State>,
    idle: watch::Sender<bool>,
    passes: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for requesting background passes; cheap to clone.
#[derive(Clone)]
pub struct ReindexTrigger {
    shared: Arc<Shared>,
}

impl ReindexTrigger {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                indexer,
                state: Mutex::new(State::default()),
                idle,
                passes: AtomicUsize::new(0),
            }),
        }
    }

    /// Request a pass. Must be called from within a tokio runtime.
    pub fn trigger(&self, force: bool) -> TriggerOutcome {
        {
            let mut state = self.shared.lock();
            if state.running {
                state.pending = Some(state.pending.unwrap_or(false) || force);
                return TriggerOutcome::Coalesced;
            }
            state.running = true;
            self.shared.idle.send_replace(false);
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { run_passes(shared, force).await });
        TriggerOutcome::Started
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Resolve once no pass is running or queued.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.idle.subscribe();
        // The sender lives in `shared`, which `self` keeps alive.
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Number of passes completed, successfully or not.
    pub fn passes_completed(&self) -> usize {
        self.shared.passes.load(Ordering::SeqCst)
    }

    pub fn last_report(&self) -> Option<IndexReport> {
        self.shared.lock().last_report.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }
}

async fn run_passes(shared: Arc<Shared>, mut force: bool) {
    loop {
        let result = shared.indexer.run(force, &SilentProgress).await;
        shared.passes.fetch_add(1, Ordering::SeqCst);

        let mut state = shared.lock();
        match result {
            Ok(report) => {
                info!(processed = report.processed, "background reindex finished");
                state.last_report = Some(report);
                state.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "background reindex failed");
                state.last_error = Some(e.to_string());
            }
        }

        match state.pending.take() {
            Some(next_force) => force = next_force,
            None => {
                state.running = false;
                // Under the lock, so a racing trigger cannot be overwritten.
                shared.idle.send_replace(true);
                return;
            }
        }
    }
}
