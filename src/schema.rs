//! Wire types shared across the service modules.
//!
//! Field names follow the backend's camelCase JSON. Every response type
//! implements [`Validate`], which the HTTP client runs right after decoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Post-decode checks for a response body.
///
/// Decoding enforces the shape; `validate` rejects values that decode but
/// cannot be right (an empty id, more items than the reported total).
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate().map_err(|e| format!("[{}]: {}", i, e)))
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), String> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl Validate for serde_json::Value {}

/// Content category of an article or repository.
///
/// Unknown values from newer backends are kept verbatim instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    AiLlm,
    DevopsSre,
    InfraCloud,
    Database,
    Blockchain,
    Security,
    DataScience,
    Architecture,
    Mobile,
    Frontend,
    Backend,
    Other,
    Unknown(String),
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::AiLlm,
        Category::DevopsSre,
        Category::InfraCloud,
        Category::Database,
        Category::Blockchain,
        Category::Security,
        Category::DataScience,
        Category::Architecture,
        Category::Mobile,
        Category::Frontend,
        Category::Backend,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::AiLlm => "AI_LLM",
            Self::DevopsSre => "DEVOPS_SRE",
            Self::InfraCloud => "INFRA_CLOUD",
            Self::Database => "DATABASE",
            Self::Blockchain => "BLOCKCHAIN",
            Self::Security => "SECURITY",
            Self::DataScience => "DATA_SCIENCE",
            Self::Architecture => "ARCHITECTURE",
            Self::Mobile => "MOBILE",
            Self::Frontend => "FRONTEND",
            Self::Backend => "BACKEND",
            Self::Other => "OTHER",
            Self::Unknown(raw) => raw,
        }
    }

    /// Display label shown on category chips.
    pub fn label(&self) -> &str {
        match self {
            Self::AiLlm => "AI/LLM",
            Self::DevopsSre => "DevOps/SRE",
            Self::InfraCloud => "Infra/Cloud",
            Self::Database => "Database",
            Self::Blockchain => "Blockchain",
            Self::Security => "Security",
            Self::DataScience => "Data Science",
            Self::Architecture => "Architecture",
            Self::Mobile => "Mobile",
            Self::Frontend => "Frontend",
            Self::Backend => "Backend",
            Self::Other => "기타",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == raw)
            .cloned()
            .unwrap_or(Self::Unknown(raw))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category selector for list endpoints. `All` omits the query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn as_query(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(category) => Some(category.as_str()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(Category::from(s.to_ascii_uppercase())))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(category) => category.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Blog,
    Discussion,
    Repo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Aggregated blog post or discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub item_type: ItemType,
    pub source: String,
    pub category: Category,
    pub summary_ko_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_ko_body: Option<String>,
    pub title_en: String,
    pub url: String,
    pub score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArticleMetadata>,
}

impl Validate for Article {
    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("article id is empty".to_string());
        }
        Ok(())
    }
}

/// Trending GitHub repository, tracked separately from articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepo {
    pub id: i64,
    pub full_name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub stars_this_week: u64,
    #[serde(default)]
    pub summary_ko_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_ko_body: Option<String>,
    pub category: Category,
    pub score: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Validate for GitRepo {}

/// Page envelope used by the article, search and "me" endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
    pub has_more: bool,
}

impl<T: Validate> Validate for PageResponse<T> {
    fn validate(&self) -> Result<(), String> {
        check_page_len(self.content.len(), self.total_elements)?;
        self.content.validate()
    }
}

/// Spring Data page envelope used by the LLM media endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringPage<T> {
    pub content: Vec<T>,
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T: Validate> Validate for SpringPage<T> {
    fn validate(&self) -> Result<(), String> {
        check_page_len(self.content.len(), self.total_elements)?;
        self.content.validate()
    }
}

fn check_page_len(len: usize, total: u64) -> Result<(), String> {
    // A zero total is what older endpoints send when they skip counting.
    if total > 0 && len as u64 > total {
        return Err(format!("page holds {} items but total is {}", len, total));
    }
    Ok(())
}
