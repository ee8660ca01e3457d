//! Article feed, article detail, ticker and GitHub repository endpoints.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::page_query;
use crate::error::Result;
use crate::http::{ApiClient, Query};
use crate::schema::{
    Article, ArticleMetadata, Category, CategoryFilter, GitRepo, ItemType, PageResponse, Validate,
};

pub const DEFAULT_ARTICLE_PAGE_SIZE: u32 = 9;
pub const DEFAULT_GIT_REPO_PAGE_SIZE: u32 = 10;

/// Full article as shown on the detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub external_id: String,
    pub item_type: ItemType,
    pub source: String,
    pub category: Category,
    pub summary_ko_title: String,
    #[serde(default)]
    pub summary_ko_body: String,
    pub title_en: String,
    pub url: String,
    pub score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at_source: String,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

impl Validate for ArticleDetail {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.external_id.is_empty() {
            return Err("externalId is empty".to_string());
        }
        Ok(())
    }
}

/// Headline scrolling across the top of the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTicker {
    pub id: String,
    pub summary_ko_title: String,
    pub url: String,
    pub created_at_source: String,
}

impl Validate for TrendingTicker {}

#[derive(Debug, Clone)]
pub struct ArticlesApi {
    client: ApiClient,
}

impl ArticlesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of the article feed. `CategoryFilter::All` sends no category.
    pub async fn list(
        &self,
        category: &CategoryFilter,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<Article>> {
        self.client
            .get("/api/articles", &category_page_query(category, page, size))
            .await
    }

    pub async fn get(&self, external_id: &str) -> Result<ArticleDetail> {
        self.client
            .get(&format!("/api/articles/{}", external_id), &Vec::new())
            .await
    }

    pub async fn trending_ticker(&self, limit: u32) -> Result<Vec<TrendingTicker>> {
        self.client
            .get("/api/articles/trending-ticker", &limit_query(limit))
            .await
    }

    /// Repository-typed articles. Superseded by the git-repo endpoints but still served.
    pub async fn github_trending(&self, limit: u32) -> Result<Vec<Article>> {
        self.client
            .get("/api/articles/github-trending", &limit_query(limit))
            .await
    }

    /// Record a view. Never fails: view tracking is best effort.
    pub async fn track_view(&self, article_id: &str) {
        let path = format!("/api/articles/{}/view", article_id);
        if let Err(e) = self.client.post_empty(&path).await {
            warn!("Failed to track article view {}: {}", article_id, e);
        }
    }

    pub async fn list_git_repos(
        &self,
        category: &CategoryFilter,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<GitRepo>> {
        self.client
            .get("/api/git-repos", &category_page_query(category, page, size))
            .await
    }

    pub async fn trending_git_repos(&self, limit: u32) -> Result<Vec<GitRepo>> {
        self.client
            .get("/api/git-repos/trending", &limit_query(limit))
            .await
    }

    pub async fn trending_git_repos_page(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<GitRepo>> {
        self.client
            .get("/api/git-repos/trending", &page_query(page, size))
            .await
    }

    pub async fn git_repos_by_language(&self, language: &str, limit: u32) -> Result<Vec<GitRepo>> {
        self.client
            .get(
                &format!("/api/git-repos/language/{}", language),
                &limit_query(limit),
            )
            .await
    }

    pub async fn top_weekly_git_repos(&self) -> Result<Vec<GitRepo>> {
        self.client
            .get("/api/git-repos/top-weekly", &Vec::new())
            .await
    }
}

fn category_page_query(category: &CategoryFilter, page: u32, size: u32) -> Query {
    let mut query = page_query(page, size);
    if let Some(category) = category.as_query() {
        query.push(("category", category.to_string()));
    }
    query
}

fn limit_query(limit: u32) -> Query {
    vec![("limit", limit.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{article_page_json, client_for};
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_all_category_omits_param() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/articles")
            .match_query(Matcher::Exact("page=0&size=9".to_string()))
            .with_status(200)
            .with_body(article_page_json(&["a", "b"], true))
            .create_async()
            .await;

        let page = client_for(&server)
            .articles()
            .list(&CategoryFilter::All, 0, DEFAULT_ARTICLE_PAGE_SIZE)
            .await
            .unwrap();
        assert_eq!(page.content.len(), 2);
        assert!(page.has_more);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_category_param_sent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/git-repos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("category".into(), "AI_LLM".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"content":[],"totalElements":0,"totalPages":0,"currentPage":2,"hasMore":false}"#)
            .create_async()
            .await;

        let page = client_for(&server)
            .articles()
            .list_git_repos(&CategoryFilter::Only(Category::AiLlm), 2, 10)
            .await
            .unwrap();
        assert!(page.content.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_track_view_swallows_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/articles/a1/view")
            .with_status(500)
            .create_async()
            .await;

        client_for(&server).articles().track_view("a1").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ticker_decodes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/articles/trending-ticker")
            .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
            .with_status(200)
            .with_body(r#"[{"id":"t1","summaryKoTitle":"속보","url":"https://x","createdAtSource":"2025-01-01"}]"#)
            .create_async()
            .await;

        let ticker = client_for(&server).articles().trending_ticker(20).await.unwrap();
        assert_eq!(ticker[0].summary_ko_title, "속보");
    }
}
