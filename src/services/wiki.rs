//! Project wiki endpoints: section snapshots, the domain directory and the
//! per-project Q&A chat.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::http::ApiClient;
use crate::schema::Validate;

/// Section keys in page order.
pub const WIKI_SECTIONS: [&str; 5] = ["what", "how", "architecture", "activity", "releases"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSection {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_dive_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_diagram_dsl: Option<String>,
    #[serde(default)]
    pub default_expanded: bool,
}

/// Generated wiki of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSnapshot {
    pub project_external_id: String,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub is_data_ready: bool,
    #[serde(default)]
    pub hidden_sections: Vec<String>,
    #[serde(default)]
    pub what: Option<WikiSection>,
    #[serde(default)]
    pub how: Option<WikiSection>,
    #[serde(default)]
    pub architecture: Option<WikiSection>,
    #[serde(default)]
    pub activity: Option<WikiSection>,
    #[serde(default)]
    pub releases: Option<WikiSection>,
}

impl WikiSnapshot {
    pub fn section(&self, key: &str) -> Option<&WikiSection> {
        match key {
            "what" => self.what.as_ref(),
            "how" => self.how.as_ref(),
            "architecture" => self.architecture.as_ref(),
            "activity" => self.activity.as_ref(),
            "releases" => self.releases.as_ref(),
            _ => None,
        }
    }

    /// Section keys to render: present and not listed in `hiddenSections`.
    pub fn visible_sections(&self) -> Vec<&'static str> {
        WIKI_SECTIONS
            .into_iter()
            .filter(|key| !self.hidden_sections.iter().any(|h| h == key))
            .filter(|key| self.section(key).is_some())
            .collect()
    }
}

impl Validate for WikiSnapshot {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.project_external_id.is_empty() {
            return Err("wiki snapshot has no project id".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseProject {
    pub project_external_id: String,
    pub full_name: String,
    #[serde(default)]
    pub stars: u64,
}

/// One domain of the wiki directory. Only projects with a ready wiki are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainBrowseCard {
    pub domain: String,
    #[serde(default)]
    pub project_count: u32,
    #[serde(default)]
    pub top_projects: Vec<BrowseProject>,
}

impl Validate for DomainBrowseCard {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub project_external_id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub include_citations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Validate for ChatReply {}

#[derive(Debug, Clone)]
pub struct WikiApi {
    client: ApiClient,
}

impl WikiApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn snapshot(&self, project_id: &str) -> Result<WikiSnapshot> {
        self.client
            .get(&project_path(project_id, &[])?, &Vec::new())
            .await
    }

    pub async fn domain_cards(&self) -> Result<Vec<DomainBrowseCard>> {
        self.client.get("/api/wiki/domains", &Vec::new()).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let path = project_path(&request.project_external_id, &["chat"])?;
        self.client.post(&path, request).await
    }
}

/// `/api/wiki/projects/{id}[/...]` with the id escaped as one path segment.
/// Project ids look like `github:owner/repo`.
fn project_path(project_id: &str, tail: &[&str]) -> Result<String> {
    let mut url = Url::parse("http://wiki.invalid/api/wiki/projects").map_err(|e| ApiError::Config {
        details: format!("wiki path base: {}", e),
    })?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Config {
            details: "wiki path base cannot take segments".to_string(),
        })?
        .push(project_id)
        .extend(tail);
    Ok(url.path().to_string())
}
