//! [`PageSource`] implementations for the backend's paginated endpoints.

use async_trait::async_trait;

use super::{Page, PageSource};
use crate::error::Result;
use crate::schema::{Article, CategoryFilter, GitRepo};
use crate::services::admin::DEFAULT_ADMIN_PAGE_SIZE;
use crate::services::articles::{DEFAULT_ARTICLE_PAGE_SIZE, DEFAULT_GIT_REPO_PAGE_SIZE};
use crate::services::llm::{MediaModel, MediaType, DEFAULT_MEDIA_PAGE_SIZE, DEFAULT_MEDIA_SORT};
use crate::services::me::{ReadHistoryEntry, SavedArticle, DEFAULT_ME_PAGE_SIZE};
use crate::services::search::DEFAULT_SEARCH_PAGE_SIZE;
use crate::services::{AdminApi, ArticlesApi, LlmApi, MeApi, SearchApi};

// ── Articles ────────────────────────────────────────────────────────────────

/// Main article feed, filtered by category.
#[derive(Debug, Clone)]
pub struct ArticleFeed {
    api: ArticlesApi,
    page_size: u32,
}

impl ArticleFeed {
    pub fn new(api: ArticlesApi) -> Self {
        Self {
            api,
            page_size: DEFAULT_ARTICLE_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl PageSource for ArticleFeed {
    type Item = Article;
    type Filter = CategoryFilter;

    async fn fetch_page(&self, filter: &CategoryFilter, page: u32) -> Result<Page<Article>> {
        Ok(self.api.list(filter, page, self.page_size).await?.into())
    }
}

/// Full-text search results; the filter is the query string.
#[derive(Debug, Clone)]
pub struct FulltextSearch {
    api: SearchApi,
    page_size: u32,
}

impl FulltextSearch {
    pub fn new(api: SearchApi) -> Self {
        Self {
            api,
            page_size: DEFAULT_SEARCH_PAGE_SIZE,
        }
    }
}

#[async_trait]
impl PageSource for FulltextSearch {
    type Item = Article;
    type Filter = String;

    async fn fetch_page(&self, query: &String, page: u32) -> Result<Page<Article>> {
        Ok(self.api.fulltext(query, page, self.page_size).await?.into())
    }
}

// ── Git repositories ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GitRepoFeed {
    api: ArticlesApi,
    page_size: u32,
}

impl GitRepoFeed {
    pub fn new(api: ArticlesApi) -> Self {
        Self {
            api,
            page_size: DEFAULT_GIT_REPO_PAGE_SIZE,
        }
    }
}

#[async_trait]
impl PageSource for GitRepoFeed {
    type Item = GitRepo;
    type Filter = CategoryFilter;

    async fn fetch_page(&self, filter: &CategoryFilter, page: u32) -> Result<Page<GitRepo>> {
        Ok(self
            .api
            .list_git_repos(filter, page, self.page_size)
            .await?
            .into())
    }
}

#[derive(Debug, Clone)]
pub struct TrendingRepoFeed {
    api: ArticlesApi,
    page_size: u32,
}

impl TrendingRepoFeed {
    pub fn new(api: ArticlesApi) -> Self {
        Self {
            api,
            page_size: DEFAULT_GIT_REPO_PAGE_SIZE,
        }
    }
}

#[async_trait]
impl PageSource for TrendingRepoFeed {
    type Item = GitRepo;
    type Filter = ();

    async fn fetch_page(&self, _: &(), page: u32) -> Result<Page<GitRepo>> {
        Ok(self
            .api
            .trending_git_repos_page(page, self.page_size)
            .await?
            .into())
    }
}

// ── Signed-in user ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SavedArticlesFeed {
    api: MeApi,
}

impl SavedArticlesFeed {
    pub fn new(api: MeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for SavedArticlesFeed {
    type Item = SavedArticle;
    type Filter = ();

    async fn fetch_page(&self, _: &(), page: u32) -> Result<Page<SavedArticle>> {
        Ok(self
            .api
            .saved_articles(page, DEFAULT_ME_PAGE_SIZE)
            .await?
            .into())
    }
}

#[derive(Debug, Clone)]
pub struct ReadHistoryFeed {
    api: MeApi,
}

impl ReadHistoryFeed {
    pub fn new(api: MeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for ReadHistoryFeed {
    type Item = ReadHistoryEntry;
    type Filter = ();

    async fn fetch_page(&self, _: &(), page: u32) -> Result<Page<ReadHistoryEntry>> {
        Ok(self
            .api
            .read_history(page, DEFAULT_ME_PAGE_SIZE)
            .await?
            .into())
    }
}

// ── LLM media ───────────────────────────────────────────────────────────────

/// Media-model ranking for one media type, best rank first.
#[derive(Debug, Clone)]
pub struct MediaLeaderboardFeed {
    api: LlmApi,
    page_size: u32,
    sort: String,
}

impl MediaLeaderboardFeed {
    pub fn new(api: LlmApi) -> Self {
        Self {
            api,
            page_size: DEFAULT_MEDIA_PAGE_SIZE,
            sort: DEFAULT_MEDIA_SORT.to_string(),
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl PageSource for MediaLeaderboardFeed {
    type Item = MediaModel;
    type Filter = MediaType;

    async fn fetch_page(&self, media_type: &MediaType, page: u32) -> Result<Page<MediaModel>> {
        Ok(self
            .api
            .media_leaderboard(*media_type, page, self.page_size, &self.sort)
            .await?
            .into())
    }
}

// ── Admin ───────────────────────────────────────────────────────────────────

/// Admin article table; the filter is the optional title search.
#[derive(Debug, Clone)]
pub struct AdminArticleFeed {
    api: AdminApi,
}

impl AdminArticleFeed {
    pub fn new(api: AdminApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for AdminArticleFeed {
    type Item = Article;
    type Filter = Option<String>;

    async fn fetch_page(&self, search: &Option<String>, page: u32) -> Result<Page<Article>> {
        Ok(self
            .api
            .list_articles(page, DEFAULT_ADMIN_PAGE_SIZE, search.as_deref())
            .await?
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageController;
    use crate::schema::Category;
    use crate::services::test_support::{article_page_json, client_for};
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_article_feed_walks_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/api/articles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "0".into()),
                Matcher::UrlEncoded("size".into(), "9".into()),
            ]))
            .with_status(200)
            .with_body(article_page_json(&["a", "b", "c"], true))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/articles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("size".into(), "9".into()),
            ]))
            .with_status(200)
            .with_body(article_page_json(&["d", "e"], false))
            .expect(1)
            .create_async()
            .await;

        let feed = PageController::new(ArticleFeed::new(client_for(&server).articles()));
        feed.load_initial(CategoryFilter::All).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.page(), 0);

        feed.load_more().await.unwrap();
        feed.load_more().await.unwrap();

        let ids: Vec<String> = feed.items().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(feed.page(), 1);
        assert!(!feed.has_more());
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_category_filter_sent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/git-repos")
            .match_query(Matcher::UrlEncoded("category".into(), "DEVOPS_SRE".into()))
            .with_status(200)
            .with_body(r#"{"content":[],"totalElements":0,"totalPages":0,"currentPage":0,"hasMore":false}"#)
            .create_async()
            .await;

        let feed = PageController::new(GitRepoFeed::new(client_for(&server).articles()));
        feed.load_initial(CategoryFilter::Only(Category::DevopsSre))
            .await
            .unwrap();
        assert!(feed.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_media_feed_uses_spring_last_flag() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/media/text-to-image")
            .match_query(Matcher::UrlEncoded("sort".into(), "rank,asc".into()))
            .with_status(200)
            .with_body(r#"{"content":[],"number":0,"size":20,"totalElements":0,"last":false}"#)
            .create_async()
            .await;

        let feed = PageController::new(MediaLeaderboardFeed::new(client_for(&server).llm()));
        feed.load_initial(MediaType::TextToImage).await.unwrap();
        assert!(feed.has_more());
    }

    #[tokio::test]
    async fn test_media_feed_page_size() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/llm/media/image-editing")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "0".into()),
                Matcher::UrlEncoded("size".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"content":[],"number":0,"size":10,"totalElements":0,"last":true}"#)
            .expect(1)
            .create_async()
            .await;

        let source = MediaLeaderboardFeed::new(client_for(&server).llm())
            .with_page_size(crate::rankings::RANKINGS_MEDIA_PAGE_SIZE);
        let feed = PageController::new(source);
        feed.load_initial(MediaType::ImageEditing).await.unwrap();
        assert!(!feed.has_more());
        mock.assert_async().await;
    }
}
