//! Bookmarks and reading history of the signed-in user.

use serde::{Deserialize, Serialize};

use super::page_query;
use crate::error::Result;
use crate::http::ApiClient;
use crate::schema::{PageResponse, Validate};

pub const DEFAULT_ME_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    pub article_id: String,
    pub summary_ko_title: String,
    pub source: String,
    pub category: String,
    pub url: String,
    pub saved_at: String,
}

impl Validate for SavedArticle {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadHistoryEntry {
    pub article_id: String,
    pub summary_ko_title: String,
    pub source: String,
    pub category: String,
    pub url: String,
    pub read_at: String,
}

impl Validate for ReadHistoryEntry {}

#[derive(Debug, Deserialize)]
struct SavedStatus {
    saved: bool,
}

impl Validate for SavedStatus {}

#[derive(Debug, Clone)]
pub struct MeApi {
    client: ApiClient,
}

impl MeApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn saved_articles(&self, page: u32, size: u32) -> Result<PageResponse<SavedArticle>> {
        self.client
            .get("/api/me/saved-articles", &page_query(page, size))
            .await
    }

    pub async fn save(&self, article_id: &str) -> Result<()> {
        self.client
            .post_empty(&format!("/api/me/saved-articles/{}", article_id))
            .await
    }

    pub async fn unsave(&self, article_id: &str) -> Result<()> {
        self.client
            .delete(&format!("/api/me/saved-articles/{}", article_id))
            .await
    }

    pub async fn is_saved(&self, article_id: &str) -> Result<bool> {
        let status: SavedStatus = self
            .client
            .get(
                &format!("/api/me/saved-articles/{}/status", article_id),
                &Vec::new(),
            )
            .await?;
        Ok(status.saved)
    }

    /// Flip the bookmark and return the new state.
    pub async fn toggle_saved(&self, article_id: &str, currently_saved: bool) -> Result<bool> {
        if currently_saved {
            self.unsave(article_id).await?;
        } else {
            self.save(article_id).await?;
        }
        Ok(!currently_saved)
    }

    pub async fn read_history(&self, page: u32, size: u32) -> Result<PageResponse<ReadHistoryEntry>> {
        self.client
            .get("/api/me/read-history", &page_query(page, size))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use mockito::Server;

    #[tokio::test]
    async fn test_is_saved_reads_flag() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/me/saved-articles/a1/status")
            .with_status(200)
            .with_body(r#"{"saved":true}"#)
            .create_async()
            .await;

        assert!(client_for(&server).me().is_saved("a1").await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_saved_picks_verb() {
        let mut server = Server::new_async().await;
        let save = server
            .mock("POST", "/api/me/saved-articles/a1")
            .with_status(200)
            .create_async()
            .await;
        let unsave = server
            .mock("DELETE", "/api/me/saved-articles/a1")
            .with_status(204)
            .create_async()
            .await;

        let me = client_for(&server).me();
        assert!(me.toggle_saved("a1", false).await.unwrap());
        assert!(!me.toggle_saved("a1", true).await.unwrap());
        save.assert_async().await;
        unsave.assert_async().await;
    }

    #[tokio::test]
    async fn test_toggle_failure_propagates() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/me/saved-articles/a1")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).me().toggle_saved("a1", false).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
