//! Infinite scroll: turns sentinel visibility reports into `load_more` calls.

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::debug;

use super::{PageController, PageSource};

/// Visible fraction of the sentinel at which it counts as intersecting.
pub const INTERSECTION_THRESHOLD: f64 = 0.1;

/// Owns the watcher task for one list. Signals that arrive while a fetch is
/// outstanding are dropped by the controller's single-flight check, never queued.
pub struct InfiniteScroll<S: PageSource> {
    controller: PageController<S>,
    signals: Option<mpsc::UnboundedSender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<S: PageSource> InfiniteScroll<S> {
    pub fn new(controller: PageController<S>) -> Self {
        Self {
            controller,
            signals: None,
            task: None,
        }
    }

    pub fn controller(&self) -> &PageController<S> {
        &self.controller
    }

    /// Begin watching. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.task = Some(tokio::spawn(watch(self.controller.clone(), rx)));
        self.signals = Some(tx);
        debug!("Infinite scroll started");
    }

    /// Stop watching and abort any fetch the watcher started.
    pub fn stop(&mut self) {
        self.signals = None;
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Infinite scroll stopped");
        }
    }

    /// Stop watching and clear the list.
    pub fn reset(&mut self) {
        self.stop();
        self.controller.reset();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Report the sentinel's visible fraction. Returns whether it counted as
    /// an intersection and was handed to the watcher.
    pub fn observe(&self, visible_ratio: f64) -> bool {
        if visible_ratio < INTERSECTION_THRESHOLD {
            return false;
        }
        match &self.signals {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

impl<S: PageSource> Drop for InfiniteScroll<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch<S: PageSource>(controller: PageController<S>, mut signals: mpsc::UnboundedReceiver<()>) {
    // Dropping the set on exit aborts whatever is still loading.
    let mut loads = JoinSet::new();

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(()) => {
                    let controller = controller.clone();
                    loads.spawn(async move { controller.load_more().await });
                }
                None => break,
            },
            Some(done) = loads.join_next(), if !loads.is_empty() => {
                if let Ok(Ok(outcome)) = done {
                    debug!("Sentinel load finished: {:?}", outcome);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::controller::tests::FakeSource;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .page("ALL", 0, &["a", "b", "c"], true)
            .page("ALL", 1, &["d", "e"], false)
    }

    #[tokio::test]
    async fn test_intersection_loads_next_page() {
        let controller = PageController::new(source());
        controller.load_initial("ALL".to_string()).await.unwrap();

        let mut scroll = InfiniteScroll::new(controller.clone());
        scroll.start();
        assert!(scroll.observe(1.0));
        wait_until(|| controller.len() == 5).await;
        assert!(!controller.has_more());
    }

    #[tokio::test]
    async fn test_below_threshold_is_ignored() {
        let controller = PageController::new(source());
        controller.load_initial("ALL".to_string()).await.unwrap();

        let mut scroll = InfiniteScroll::new(controller.clone());
        scroll.start();
        assert!(!scroll.observe(0.05));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.source().fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_signals_during_fetch_are_suppressed() {
        let gate = Arc::new(Semaphore::new(1));
        let controller = PageController::new(source().gated(gate.clone()));
        controller.load_initial("ALL".to_string()).await.unwrap();

        let mut scroll = InfiniteScroll::new(controller.clone());
        scroll.start();
        for _ in 0..3 {
            scroll.observe(0.5);
        }
        wait_until(|| controller.is_loading()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        gate.add_permits(1);
        wait_until(|| controller.len() == 5).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // One initial fetch plus exactly one sentinel fetch.
        assert_eq!(controller.source().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stop_disconnects_sentinel() {
        let controller = PageController::new(source());
        controller.load_initial("ALL".to_string()).await.unwrap();

        let mut scroll = InfiniteScroll::new(controller.clone());
        scroll.start();
        assert!(scroll.is_running());
        scroll.stop();
        assert!(!scroll.is_running());
        assert!(!scroll.observe(1.0));
        assert_eq!(controller.len(), 3);

        scroll.reset();
        assert!(controller.is_empty());
    }
}
