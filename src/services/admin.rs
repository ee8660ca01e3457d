//! Admin content-management endpoints (articles, repositories, LLM catalog).
//!
//! All calls require an admin bearer token; the backend answers 401/403
//! otherwise and the error is returned unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page_query;
use super::llm::{BenchmarkType, LlmBenchmark, LlmModelDetail};
use crate::error::Result;
use crate::http::ApiClient;
use crate::schema::{Article, ArticleMetadata, GitRepo, ItemType, PageResponse, Validate};

pub const DEFAULT_ADMIN_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticle {
    pub item_type: ItemType,
    pub source: String,
    pub category: String,
    pub summary_ko_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_ko_body: Option<String>,
    pub title_en: String,
    pub url: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGitRepo {
    pub full_name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars_this_week: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_ko_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_ko_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub score: f64,
}

/// New or replacement LLM catalog entry. Scores are keyed by benchmark and
/// flattened into `score*` fields on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLlmModel {
    pub model_id: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_creator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_input: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_output: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_blended: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speed_median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ttft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip)]
    pub scores: BTreeMap<BenchmarkType, f64>,
}

impl CreateLlmModel {
    fn to_body(&self) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut body {
            for (benchmark, score) in &self.scores {
                map.insert(benchmark.score_field().to_string(), Value::from(*score));
            }
        }
        body
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelCreator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCreator {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

impl Validate for ModelCreator {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBenchmark {
    pub benchmark_type: String,
    pub display_name: String,
    pub category_group: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub sort_order: i32,
}

/// Raw post handed to the backend's LLM summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmArticleInput {
    pub title_en: String,
    pub url: String,
    pub content: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
}

/// What the summarizer would publish, without persisting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmArticlePreview {
    pub is_technical: bool,
    pub title_ko: String,
    pub summary_ko: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub url: String,
    pub title_en: String,
    pub source: String,
}

impl Validate for LlmArticlePreview {}

#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // ── Articles ────────────────────────────────────────────────────────────

    pub async fn list_articles(
        &self,
        page: u32,
        size: u32,
        search: Option<&str>,
    ) -> Result<PageResponse<Article>> {
        let mut query = page_query(page, size);
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        self.client.get("/api/admin/articles", &query).await
    }

    pub async fn create_article(&self, request: &CreateArticle) -> Result<Article> {
        self.client.post("/api/admin/articles", request).await
    }

    pub async fn update_article(&self, id: &str, request: &CreateArticle) -> Result<Article> {
        self.client
            .put(&format!("/api/admin/articles/{}", id), request)
            .await
    }

    pub async fn delete_article(&self, id: &str) -> Result<()> {
        self.client
            .delete(&format!("/api/admin/articles/{}", id))
            .await
    }

    /// Summarize, classify and publish a raw post in one step.
    pub async fn process_article_with_llm(&self, input: &LlmArticleInput) -> Result<Article> {
        self.client
            .post("/api/admin/articles/llm-process", input)
            .await
    }

    pub async fn preview_article_llm(&self, input: &LlmArticleInput) -> Result<LlmArticlePreview> {
        self.client
            .post("/api/admin/articles/llm-preview", input)
            .await
    }

    // ── Git repositories ────────────────────────────────────────────────────

    pub async fn create_git_repo(&self, request: &CreateGitRepo) -> Result<GitRepo> {
        self.client.post("/api/admin/git-repos", request).await
    }

    pub async fn update_git_repo(&self, id: i64, request: &CreateGitRepo) -> Result<GitRepo> {
        self.client
            .put(&format!("/api/admin/git-repos/{}", id), request)
            .await
    }

    pub async fn delete_git_repo(&self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/api/admin/git-repos/{}", id))
            .await
    }

    // ── LLM models ──────────────────────────────────────────────────────────

    pub async fn create_llm_model(&self, request: &CreateLlmModel) -> Result<LlmModelDetail> {
        self.client
            .post("/api/admin/llm-models", &request.to_body())
            .await
    }

    pub async fn update_llm_model(
        &self,
        id: i64,
        request: &CreateLlmModel,
    ) -> Result<LlmModelDetail> {
        self.client
            .put(&format!("/api/admin/llm-models/{}", id), &request.to_body())
            .await
    }

    pub async fn delete_llm_model(&self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/api/admin/llm-models/{}", id))
            .await
    }

    // ── Model creators ──────────────────────────────────────────────────────

    pub async fn create_model_creator(&self, request: &CreateModelCreator) -> Result<ModelCreator> {
        self.client.post("/api/admin/model-creators", request).await
    }

    pub async fn update_model_creator(
        &self,
        id: i64,
        request: &CreateModelCreator,
    ) -> Result<ModelCreator> {
        self.client
            .put(&format!("/api/admin/model-creators/{}", id), request)
            .await
    }

    pub async fn delete_model_creator(&self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/api/admin/model-creators/{}", id))
            .await
    }

    // ── Benchmarks ──────────────────────────────────────────────────────────

    pub async fn create_benchmark(&self, request: &CreateBenchmark) -> Result<LlmBenchmark> {
        self.client.post("/api/admin/llm-benchmarks", request).await
    }

    pub async fn update_benchmark(
        &self,
        benchmark_type: &str,
        request: &CreateBenchmark,
    ) -> Result<LlmBenchmark> {
        self.client
            .put(&format!("/api/admin/llm-benchmarks/{}", benchmark_type), request)
            .await
    }

    pub async fn delete_benchmark(&self, benchmark_type: &str) -> Result<()> {
        self.client
            .delete(&format!("/api/admin/llm-benchmarks/{}", benchmark_type))
            .await
    }
}
