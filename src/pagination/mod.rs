//! Page-at-a-time list loading.
//!
//! Defines the [`PageSource`] trait so every paginated endpoint can drive the
//! same [`PageController`], plus the [`InfiniteScroll`] sentinel that turns
//! viewport visibility signals into `load_more` calls.

pub mod controller;
pub mod scroll;
pub mod sources;

pub use controller::{LoadOutcome, PageController, SkipReason};
pub use scroll::{InfiniteScroll, INTERSECTION_THRESHOLD};
pub use sources::{
    AdminArticleFeed, ArticleFeed, FulltextSearch, GitRepoFeed, MediaLeaderboardFeed,
    ReadHistoryFeed, SavedArticlesFeed, TrendingRepoFeed,
};

use crate::error::Result;
use crate::schema::{PageResponse, SpringPage};

/// One fetched page, normalized across the backend's two envelope shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub total_elements: u64,
}

impl<T> From<PageResponse<T>> for Page<T> {
    fn from(page: PageResponse<T>) -> Self {
        Self {
            items: page.content,
            has_more: page.has_more,
            total_elements: page.total_elements,
        }
    }
}

impl<T> From<SpringPage<T>> for Page<T> {
    fn from(page: SpringPage<T>) -> Self {
        Self {
            items: page.content,
            has_more: !page.last,
            total_elements: page.total_elements,
        }
    }
}

/// Async trait implemented by each paginated endpoint.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    /// What the list is narrowed by: a category, a query string, or `()`.
    type Filter: Clone + Send + Sync + 'static;

    /// Fetch page `page` (zero-based) for `filter`.
    async fn fetch_page(&self, filter: &Self::Filter, page: u32) -> Result<Page<Self::Item>>;
}
