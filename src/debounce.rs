use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Trailing-edge debouncer: a value is emitted once `delay` has passed without
/// another update. Dropping the debouncer cancels any pending emission.
pub struct Debouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, updates) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, updates, settled_tx));
        (Self { input, task }, settled_rx)
    }

    pub fn update(&self, value: impl Into<String>) {
        // The task only stops once the consumer is gone, so a failed send has nowhere to go.
        let _ = self.input.send(value.into());
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    delay: Duration,
    mut updates: mpsc::UnboundedReceiver<String>,
    settled: mpsc::UnboundedSender<String>,
) {
    let mut pending: Option<(String, Instant)> = None;

    loop {
        let deadline = pending
            .as_ref()
            .map_or_else(Instant::now, |(_, deadline)| *deadline);

        tokio::select! {
            biased;

            update = updates.recv() => match update {
                Some(value) => pending = Some((value, Instant::now() + delay)),
                None => break,
            },
            () = time::sleep_until(deadline), if pending.is_some() => {
                if let Some((value, _)) = pending.take() {
                    tracing::trace!(value = %value, "debounced value settled");
                    if settled.send(value).is_err() {
                        break;
                    }
                }
            }
            () = settled.closed() => break,
        }
    }
}
