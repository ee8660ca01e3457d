//! Autocomplete and full-text search endpoints.

use serde::{Deserialize, Serialize};

use super::page_query;
use crate::error::Result;
use crate::http::ApiClient;
use crate::schema::{Article, Category, PageResponse, Validate};

/// Queries shorter than this (in characters, after trimming) are never sent.
pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    Title,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub external_id: String,
    pub summary_ko_title: String,
    pub source: String,
    pub category: Category,
    pub match_type: MatchType,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionList {
    pub suggestions: Vec<Suggestion>,
    pub total_matches: u64,
}

impl Validate for SuggestionList {}

/// Whether `query` is long enough to be worth a request.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

#[derive(Debug, Clone)]
pub struct SearchApi {
    client: ApiClient,
}

impl SearchApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Title suggestions for a partial query. Short queries resolve to an
    /// empty list without touching the network.
    pub async fn autocomplete(&self, query: &str) -> Result<SuggestionList> {
        if !is_searchable(query) {
            return Ok(SuggestionList::default());
        }
        self.client
            .get(
                "/api/articles/autocomplete",
                &vec![("q", query.trim().to_string())],
            )
            .await
    }

    pub async fn fulltext(&self, query: &str, page: u32, size: u32) -> Result<PageResponse<Article>> {
        let mut params = vec![("q", query.trim().to_string())];
        params.extend(page_query(page, size));
        self.client
            .get("/api/articles/search/fulltext", &params)
            .await
    }
}
