//! Debounced search-as-you-type.
//!
//! Each keystroke cancels the pending lookup and schedules a new one after the
//! quiet period. Lookups that land after a newer keystroke are dropped.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS;
use crate::services::search::{is_searchable, Suggestion};
use crate::services::SearchApi;

#[derive(Default)]
struct Shared {
    suggestions: Vec<Suggestion>,
    total_matches: u64,
    /// Bumped on every keystroke, `stop` and `reset`.
    generation: u64,
}

pub struct Autocomplete {
    api: SearchApi,
    debounce: Duration,
    shared: Arc<Mutex<Shared>>,
    pending: Option<JoinHandle<()>>,
}

impl Autocomplete {
    pub fn new(api: SearchApi) -> Self {
        Self {
            api,
            debounce: Duration::from_millis(DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS),
            shared: Arc::new(Mutex::new(Shared::default())),
            pending: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Feed the current input. Must be called inside a tokio runtime.
    pub fn input(&mut self, query: &str) {
        self.cancel_pending();
        let generation = {
            let mut shared = self.shared.lock();
            shared.generation += 1;
            if !is_searchable(query) {
                shared.suggestions.clear();
                shared.total_matches = 0;
                return;
            }
            shared.generation
        };

        let api = self.api.clone();
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        let query = query.trim().to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = api.autocomplete(&query).await;

            let mut shared = shared.lock();
            if shared.generation != generation {
                debug!("Dropping stale suggestions for {:?}", query);
                return;
            }
            match result {
                Ok(list) => {
                    shared.suggestions = list.suggestions;
                    shared.total_matches = list.total_matches;
                }
                Err(e) => {
                    warn!("Autocomplete lookup for {:?} failed: {}", query, e);
                    shared.suggestions.clear();
                    shared.total_matches = 0;
                }
            }
        }));
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.shared.lock().suggestions.clone()
    }

    pub fn total_matches(&self) -> u64 {
        self.shared.lock().total_matches
    }

    /// Whether a lookup is scheduled or in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel any pending lookup; current suggestions stay.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.shared.lock().generation += 1;
    }

    /// Cancel any pending lookup and clear suggestions.
    pub fn reset(&mut self) {
        self.stop();
        let mut shared = self.shared.lock();
        shared.suggestions.clear();
        shared.total_matches = 0;
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for Autocomplete {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
