use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::debounce::Debouncer;
use crate::executor::QueryExecutor;
use crate::model::SearchState;
use crate::source::SearchSource;

/// Debounced search over one source, driven by raw input changes.
///
/// Dropping the session tears it down: the pending debounce timer is
/// cancelled and in-flight results are no longer committed.
pub struct SearchSession {
    debouncer: Debouncer,
    state: watch::Receiver<SearchState>,
    driver: JoinHandle<()>,
}

impl SearchSession {
    pub fn start(source: Arc<dyn SearchSource>, debounce: Duration) -> Self {
        let (debouncer, settled) = Debouncer::new(debounce);
        let executor = QueryExecutor::new(source);
        let state = executor.subscribe();
        let driver = tokio::spawn(drive(executor, settled));

        Self {
            debouncer,
            state,
            driver,
        }
    }

    /// Feeds the current raw input. Call on every change.
    pub fn set_query(&self, raw: &str) {
        self.debouncer.update(raw);
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive(executor: QueryExecutor, mut settled: mpsc::UnboundedReceiver<String>) {
    let mut last_query = String::new();

    while let Some(query) = settled.recv().await {
        if query == last_query {
            tracing::trace!(query = %query, "settled query unchanged");
            continue;
        }
        // Completion is committed by the spawned task itself.
        let _ = executor.execute(&query);
        last_query = query;
    }
}
