use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::SearchState;
use crate::source::SearchSource;

/// One issued lookup. Only the ticket matching the latest generation may commit.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub query: String,
    generation: u64,
}

impl Ticket {
    fn is_current(&self, latest: &AtomicU64) -> bool {
        latest.load(Ordering::SeqCst) == self.generation
    }
}

/// Runs settled queries against a source and publishes a single [`SearchState`].
///
/// Late completions for superseded queries are computed but never committed.
/// The generation bump and the commit check both happen while the watch value
/// is locked, so a result can never land between a newer query's loading
/// transition and its own completion.
pub struct QueryExecutor {
    source: Arc<dyn SearchSource>,
    state: Arc<watch::Sender<SearchState>>,
    generation: Arc<AtomicU64>,
}

impl QueryExecutor {
    pub fn new(source: Arc<dyn SearchSource>) -> Self {
        let (state, _) = watch::channel(SearchState::idle());
        Self {
            source,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Starts a lookup for `query`, superseding any outstanding one.
    ///
    /// Returns `None` when the query is blank: the state resets to idle and no
    /// request is made.
    pub fn execute(&self, query: &str) -> Option<JoinHandle<()>> {
        if query.trim().is_empty() {
            self.state.send_modify(|state| {
                self.generation.fetch_add(1, Ordering::SeqCst);
                *state = SearchState::idle();
            });
            return None;
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = state.loading();
        });
        let ticket = Ticket {
            query: query.to_string(),
            generation,
        };

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.generation);
        tracing::debug!(source = source.name(), query = %ticket.query, generation, "query issued");

        Some(tokio::spawn(async move {
            let outcome = source.search(&ticket.query).await;
            let committed = state.send_if_modified(|snapshot| {
                if !ticket.is_current(&latest) {
                    return false;
                }
                *snapshot = match outcome {
                    Ok(items) => {
                        tracing::debug!(query = %ticket.query, count = items.len(), "query resolved");
                        SearchState::resolved(items)
                    }
                    Err(err) => {
                        tracing::warn!(query = %ticket.query, status = ?err.status_code(), error = %err, "query failed");
                        snapshot.failed(err)
                    }
                };
                true
            });

            if !committed {
                tracing::debug!(query = %ticket.query, generation = ticket.generation, "discarded stale result");
            }
        }))
    }

    /// Runs one query to completion and returns the resulting state.
    pub async fn resolve(&self, query: &str) -> SearchState {
        if let Some(handle) = self.execute(query) {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "search task aborted");
            }
        }
        self.snapshot()
    }
}

impl Drop for QueryExecutor {
    fn drop(&mut self) {
        // Outstanding tickets must not commit once nobody drives this executor.
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
