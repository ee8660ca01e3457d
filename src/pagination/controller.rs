//! Single-flight page loader shared by every list view.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Page, PageSource};
use crate::error::Result;

/// What a load call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched a page holding this many items.
    Loaded(usize),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is outstanding.
    InFlight,
    /// The last page said there is nothing more.
    Exhausted,
    /// `load_more` before any `load_initial`.
    NotStarted,
    /// The filter changed while this fetch was outstanding; its result was dropped.
    Superseded,
}

struct State<I, F> {
    items: Vec<I>,
    page: u32,
    has_more: bool,
    is_loading: bool,
    total_elements: u64,
    error: Option<String>,
    filter: Option<F>,
    /// Bumped by every `load_initial`/`reset`; fetches started under an older
    /// value must not touch the state.
    generation: u64,
}

impl<I, F> Default for State<I, F> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            has_more: false,
            is_loading: false,
            total_elements: 0,
            error: None,
            filter: None,
            generation: 0,
        }
    }
}

struct Inner<S: PageSource> {
    source: S,
    state: Mutex<State<S::Item, S::Filter>>,
}

/// Accumulating list over a [`PageSource`]. Clones share the same list.
pub struct PageController<S: PageSource> {
    inner: Arc<Inner<S>>,
}

impl<S: PageSource> Clone for PageController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> PageController<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Drop the current list and fetch page 0 for `filter`. Any fetch still
    /// outstanding for the previous filter is ignored when it lands.
    pub async fn load_initial(&self, filter: S::Filter) -> Result<LoadOutcome> {
        let generation = {
            let mut state = self.inner.state.lock();
            let generation = state.generation + 1;
            *state = State {
                filter: Some(filter.clone()),
                is_loading: true,
                generation,
                ..State::default()
            };
            generation
        };

        let mut flight = InFlight::new(&self.inner.state, generation);
        let result = self.inner.source.fetch_page(&filter, 0).await;
        flight.land(result, 0)
    }

    /// Fetch and append the next page. A no-op while another fetch is
    /// outstanding or once the list is exhausted.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (filter, next, generation) = {
            let mut state = self.inner.state.lock();
            if state.is_loading {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            let Some(filter) = state.filter.clone() else {
                return Ok(LoadOutcome::Skipped(SkipReason::NotStarted));
            };
            if !state.has_more {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            state.is_loading = true;
            (filter, state.page + 1, state.generation)
        };

        let mut flight = InFlight::new(&self.inner.state, generation);
        let result = self.inner.source.fetch_page(&filter, next).await;
        flight.land(result, next)
    }

    /// Forget everything, including the filter.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        let generation = state.generation + 1;
        *state = State {
            generation,
            ..State::default()
        };
    }

    pub fn items(&self) -> Vec<S::Item> {
        self.inner.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().items.is_empty()
    }

    /// Index of the last page merged into the list.
    pub fn page(&self) -> u32 {
        self.inner.state.lock().page
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().is_loading
    }

    pub fn total_elements(&self) -> u64 {
        self.inner.state.lock().total_elements
    }

    /// Message of the most recent failed fetch, cleared by the next success.
    pub fn error(&self) -> Option<String> {
        self.inner.state.lock().error.clone()
    }

    pub fn filter(&self) -> Option<S::Filter> {
        self.inner.state.lock().filter.clone()
    }
}

/// Marks one outstanding fetch. If the fetch future is dropped before it
/// lands, the loading flag is released so the list does not wedge.
struct InFlight<'a, I, F> {
    state: &'a Mutex<State<I, F>>,
    generation: u64,
    landed: bool,
}

impl<'a, I, F> InFlight<'a, I, F> {
    fn new(state: &'a Mutex<State<I, F>>, generation: u64) -> Self {
        Self {
            state,
            generation,
            landed: false,
        }
    }

    fn land(&mut self, result: Result<Page<I>>, page: u32) -> Result<LoadOutcome> {
        self.landed = true;
        let mut state = self.state.lock();

        if state.generation != self.generation {
            debug!("Discarding page {} from a superseded filter", page);
            return Ok(LoadOutcome::Skipped(SkipReason::Superseded));
        }
        state.is_loading = false;

        match result {
            Ok(fetched) => {
                let count = fetched.items.len();
                state.items.extend(fetched.items);
                state.page = page;
                state.has_more = fetched.has_more;
                state.total_elements = fetched.total_elements;
                state.error = None;
                debug!(
                    "Loaded page {} ({} items, {} total, has_more={})",
                    page,
                    count,
                    state.items.len(),
                    state.has_more
                );
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                warn!("Failed to load page {}: {}", page, e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl<I, F> Drop for InFlight<'_, I, F> {
    fn drop(&mut self) {
        if self.landed {
            return;
        }
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.is_loading = false;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::collections::HashMap;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// In-memory source: pages keyed by (filter, page), optional gate that
    /// holds every fetch until a permit is added.
    pub(crate) struct FakeSource {
        pages: HashMap<(String, u32), (Vec<&'static str>, bool)>,
        pub(crate) fetches: AtomicUsize,
        pub(crate) gate: Option<Arc<Semaphore>>,
        fail_on: Option<u32>,
    }

    impl FakeSource {
        pub(crate) fn new() -> Self {
            Self {
                pages: HashMap::new(),
                fetches: AtomicUsize::new(0),
                gate: None,
                fail_on: None,
            }
        }

        pub(crate) fn page(mut self, filter: &str, page: u32, items: &[&'static str], has_more: bool) -> Self {
            self.pages
                .insert((filter.to_string(), page), (items.to_vec(), has_more));
            self
        }

        pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn failing_on(mut self, page: u32) -> Self {
            self.fail_on = Some(page);
            self
        }
    }

    #[async_trait::async_trait]
    impl PageSource for FakeSource {
        type Item = &'static str;
        type Filter = String;

        async fn fetch_page(&self, filter: &String, page: u32) -> Result<Page<&'static str>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.map(|p| p.forget()).ok();
            }
            if self.fail_on == Some(page) {
                return Err(ApiError::Validation {
                    path: "/fake".to_string(),
                    details: "boom".to_string(),
                });
            }
            let (items, has_more) = self
                .pages
                .get(&(filter.clone(), page))
                .cloned()
                .unwrap_or_default();
            Ok(Page {
                total_elements: 5,
                items,
                has_more,
            })
        }
    }

    fn two_page_source() -> FakeSource {
        FakeSource::new()
            .page("ALL", 0, &["a", "b", "c"], true)
            .page("ALL", 1, &["d", "e"], false)
    }

    #[tokio::test]
    async fn test_loads_until_exhausted() {
        let controller = PageController::new(two_page_source());

        let outcome = controller.load_initial("ALL".to_string()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(3));
        assert_eq!(controller.items(), vec!["a", "b", "c"]);
        assert_eq!(controller.page(), 0);
        assert!(controller.has_more());

        controller.load_more().await.unwrap();
        assert_eq!(controller.items(), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(controller.page(), 1);
        assert!(!controller.has_more());
        assert!(!controller.is_loading());

        let outcome = controller.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Exhausted));
        assert_eq!(controller.source().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_more_before_start_is_noop() {
        let controller = PageController::new(two_page_source());
        assert_eq!(
            controller.load_more().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::NotStarted)
        );
        assert_eq!(controller.source().fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_load_more_is_single_flight() {
        let gate = Arc::new(Semaphore::new(1));
        let controller = PageController::new(two_page_source().gated(gate.clone()));
        controller.load_initial("ALL".to_string()).await.unwrap();

        let first = tokio::spawn({
            let c = controller.clone();
            async move { c.load_more().await }
        });
        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }

        let second = controller.load_more().await.unwrap();
        assert_eq!(second, LoadOutcome::Skipped(SkipReason::InFlight));

        gate.add_permits(1);
        assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Loaded(2));
        assert_eq!(controller.source().fetches.load(Ordering::SeqCst), 2);
        assert_eq!(controller.len(), 5);
    }

    #[tokio::test]
    async fn test_stale_filter_result_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::new()
            .page("BACKEND", 0, &["old"], true)
            .page("FRONTEND", 0, &["new"], false)
            .gated(gate.clone());
        let controller = PageController::new(source);

        let stale = tokio::spawn({
            let c = controller.clone();
            async move { c.load_initial("BACKEND".to_string()).await }
        });
        while controller.source().fetches.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let fresh = tokio::spawn({
            let c = controller.clone();
            async move { c.load_initial("FRONTEND".to_string()).await }
        });
        while controller.source().fetches.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Release both fetches; whichever lands, only FRONTEND may stick.
        gate.add_permits(2);
        let stale = stale.await.unwrap().unwrap();
        let fresh = fresh.await.unwrap().unwrap();

        assert_eq!(stale, LoadOutcome::Skipped(SkipReason::Superseded));
        assert_eq!(fresh, LoadOutcome::Loaded(1));
        assert_eq!(controller.items(), vec!["new"]);
        assert_eq!(controller.filter().as_deref(), Some("FRONTEND"));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_failure_keeps_state_and_records_error() {
        let controller = PageController::new(two_page_source().failing_on(1));
        controller.load_initial("ALL".to_string()).await.unwrap();

        assert!(controller.load_more().await.is_err());
        assert_eq!(controller.items(), vec!["a", "b", "c"]);
        assert_eq!(controller.page(), 0);
        assert!(controller.has_more());
        assert!(!controller.is_loading());
        assert!(controller.error().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_dropped_fetch_releases_loading_flag() {
        let gate = Arc::new(Semaphore::new(1));
        let controller = PageController::new(two_page_source().gated(gate.clone()));
        controller.load_initial("ALL".to_string()).await.unwrap();

        let task = tokio::spawn({
            let c = controller.clone();
            async move { c.load_more().await }
        });
        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        assert!(!controller.is_loading());
        assert_eq!(controller.len(), 3);
    }

    #[tokio::test]
    async fn test_reset_clears_list() {
        let controller = PageController::new(two_page_source());
        controller.load_initial("ALL".to_string()).await.unwrap();
        controller.reset();
        assert!(controller.is_empty());
        assert!(controller.filter().is_none());
        assert_eq!(
            controller.load_more().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::NotStarted)
        );
    }

    proptest! {
        #[test]
        fn test_load_more_appends_pages_in_order(sizes in prop::collection::vec(0usize..6, 1..8)) {
            let mut source = FakeSource::new();
            let mut expected = Vec::new();
            for (page, size) in sizes.iter().enumerate() {
                let items: Vec<&'static str> = (0..*size)
                    .map(|i| {
                        let item: &'static str = Box::leak(format!("p{}-{}", page, i).into_boxed_str());
                        item
                    })
                    .collect();
                expected.extend(items.iter().copied());
                source = source.page("ALL", page as u32, &items, page + 1 < sizes.len());
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let (items, last_page, past_end) = runtime.block_on(async {
                let controller = PageController::new(source);
                controller.load_initial("ALL".to_string()).await.unwrap();
                while controller.has_more() {
                    controller.load_more().await.unwrap();
                }
                let past_end = controller.load_more().await.unwrap();
                (controller.items(), controller.page(), past_end)
            });

            prop_assert_eq!(items, expected);
            prop_assert_eq!(last_page as usize, sizes.len() - 1);
            prop_assert_eq!(past_end, LoadOutcome::Skipped(SkipReason::Exhausted));
        }
    }
}
