//! Article comment endpoints.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::ApiClient;
use crate::schema::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// A comment as the backend returns it: flat, pointing at its parent by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub author: CommentAuthor,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_owner: bool,
}

impl Validate for Comment {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.id.is_empty() {
            return Err("comment id is empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateComment {
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CommentsApi {
    client: ApiClient,
}

impl CommentsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All comments of an article, flat, in creation order.
    pub async fn list(&self, article_id: &str) -> Result<Vec<Comment>> {
        self.client.get(&comments_path(article_id), &Vec::new()).await
    }

    pub async fn create(&self, article_id: &str, request: &CreateComment) -> Result<Comment> {
        self.client.post(&comments_path(article_id), request).await
    }

    pub async fn update(
        &self,
        article_id: &str,
        comment_id: &str,
        request: &UpdateComment,
    ) -> Result<Comment> {
        self.client
            .put(&comment_path(article_id, comment_id), request)
            .await
    }

    pub async fn delete(&self, article_id: &str, comment_id: &str) -> Result<()> {
        self.client.delete(&comment_path(article_id, comment_id)).await
    }
}

fn comments_path(article_id: &str) -> String {
    format!("/api/articles/{}/comments", article_id)
}

fn comment_path(article_id: &str, comment_id: &str) -> String {
    format!("/api/articles/{}/comments/{}", article_id, comment_id)
}
