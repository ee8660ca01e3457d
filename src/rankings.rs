//! LLM rankings page state.
//!
//! Benchmark metadata is loaded first; every benchmark then gets its own
//! leaderboard fetch with separate loading and error state. Media boards load
//! one first page per media type, and only for signed-in users. Each board is
//! fetched at most once until [`LlmRankings::reset`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::http::{ApiClient, TokenStore};
use crate::services::llm::{
    BenchmarkType, LeaderboardEntry, LeaderboardFilters, LlmApi, LlmBenchmark, MediaModel, MediaType,
    DEFAULT_MEDIA_SORT,
};

/// First-page size of each media board on the rankings page.
pub const RANKINGS_MEDIA_PAGE_SIZE: u32 = 10;
/// The only benchmark group shown to anonymous visitors.
pub const ANONYMOUS_BENCHMARK_GROUP: &str = "Composite";
pub const RANKINGS_LOAD_ERROR: &str = "랭킹 데이터를 불러오지 못했습니다.";

/// Benchmarks without a sort order go last.
const UNSORTED: i32 = 999;

/// One benchmark's leaderboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkBoard {
    pub entries: Vec<LeaderboardEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

/// First page of one media leaderboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaBoard {
    pub items: Vec<MediaModel>,
    pub page: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub last: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once a fetch finished, successfully or not.
    pub initialized: bool,
}

/// Benchmarks of one category group, in sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSection {
    pub group: String,
    pub anchor_id: String,
    pub benchmarks: Vec<LlmBenchmark>,
}

/// Header counters of the rankings page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankingsSummary {
    pub benchmark_count: usize,
    pub model_count: usize,
    pub provider_count: usize,
    /// Models across all media boards that have loaded.
    pub media_total: u64,
    /// Every media board has finished its first fetch.
    pub media_ready: bool,
}

#[derive(Default)]
struct State {
    benchmarks: Vec<LlmBenchmark>,
    boards: HashMap<String, BenchmarkBoard>,
    media: HashMap<MediaType, MediaBoard>,
    /// Bumped whenever the boards are cleared; fetches started before are
    /// discarded.
    board_generation: u64,
    media_generation: u64,
}

/// Shared rankings state. Clones observe the same boards.
#[derive(Clone)]
pub struct LlmRankings {
    api: LlmApi,
    tokens: TokenStore,
    state: Arc<Mutex<State>>,
}

impl LlmRankings {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            api: client.llm(),
            tokens: client.tokens().clone(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Benchmark metadata, then every leaderboard and media board.
    pub async fn load(&self) -> Result<()> {
        self.load_benchmarks().await?;
        tokio::join!(self.load_leaderboards(), self.load_media());
        Ok(())
    }

    /// Fetch benchmark metadata: every benchmark when signed in, the
    /// composite group otherwise. Leaderboards loaded so far are dropped.
    pub async fn load_benchmarks(&self) -> Result<()> {
        self.reset_benchmarks();

        let signed_in = self.tokens.is_authenticated();
        let fetched = if signed_in {
            self.api.benchmarks().await
        } else {
            self.api.benchmarks_by_group(ANONYMOUS_BENCHMARK_GROUP).await
        };

        let benchmarks = fetched.inspect_err(|e| warn!("Failed to load benchmarks: {}", e))?;
        debug!("Loaded {} benchmarks (signed in: {})", benchmarks.len(), signed_in);
        self.state.lock().benchmarks = benchmarks;
        Ok(())
    }

    /// Fetch the leaderboard of every benchmark that has none yet. Fetches
    /// run concurrently; each failure lands on its own board.
    pub async fn load_leaderboards(&self) {
        let mut tasks = JoinSet::new();
        let generation = {
            let mut state = self.state.lock();
            let keys: Vec<String> = state
                .benchmarks
                .iter()
                .map(|b| b.benchmark_type.clone())
                .collect();

            for key in keys {
                if state.boards.contains_key(&key) {
                    continue;
                }
                state.boards.insert(
                    key.clone(),
                    BenchmarkBoard {
                        loading: true,
                        ..BenchmarkBoard::default()
                    },
                );

                let api = self.api.clone();
                tasks.spawn(async move {
                    let result = match key.parse::<BenchmarkType>() {
                        Ok(benchmark) => api.leaderboard(benchmark, &LeaderboardFilters::default()).await,
                        Err(details) => Err(ApiError::Validation {
                            path: "/api/llm/leaderboard".to_string(),
                            details,
                        }),
                    };
                    (key, result)
                });
            }
            state.board_generation
        };

        while let Some(joined) = tasks.join_next().await {
            let Ok((key, result)) = joined else {
                continue;
            };
            let board = match result {
                Ok(entries) => BenchmarkBoard {
                    entries,
                    loading: false,
                    error: None,
                },
                Err(e) => {
                    warn!("Failed to load leaderboard {}: {}", key, e);
                    BenchmarkBoard {
                        entries: Vec::new(),
                        loading: false,
                        error: Some(RANKINGS_LOAD_ERROR.to_string()),
                    }
                }
            };

            let mut state = self.state.lock();
            if state.board_generation == generation {
                state.boards.insert(key, board);
            }
        }
    }

    /// Fetch the first page of every media board not fetched yet. Anonymous
    /// visitors see no media boards.
    pub async fn load_media(&self) {
        if !self.tokens.is_authenticated() {
            debug!("Skipping media leaderboards for anonymous visitor");
            return;
        }

        let mut tasks = JoinSet::new();
        let generation = {
            let mut state = self.state.lock();
            for media_type in MediaType::ALL {
                if state.media.contains_key(&media_type) {
                    continue;
                }
                state.media.insert(
                    media_type,
                    MediaBoard {
                        loading: true,
                        ..MediaBoard::default()
                    },
                );

                let api = self.api.clone();
                tasks.spawn(async move {
                    let result = api
                        .media_leaderboard(media_type, 0, RANKINGS_MEDIA_PAGE_SIZE, DEFAULT_MEDIA_SORT)
                        .await;
                    (media_type, result)
                });
            }
            state.media_generation
        };

        while let Some(joined) = tasks.join_next().await {
            let Ok((media_type, result)) = joined else {
                continue;
            };
            let board = match result {
                Ok(page) => MediaBoard {
                    items: page.content,
                    page: page.number,
                    total_elements: page.total_elements,
                    total_pages: page.total_pages,
                    last: page.last,
                    loading: false,
                    error: None,
                    initialized: true,
                },
                Err(e) => {
                    warn!("Failed to load media leaderboard {}: {}", media_type, e);
                    MediaBoard {
                        error: Some(RANKINGS_LOAD_ERROR.to_string()),
                        initialized: true,
                        ..MediaBoard::default()
                    }
                }
            };

            let mut state = self.state.lock();
            if state.media_generation == generation {
                state.media.insert(media_type, board);
            }
        }
    }

    /// Forget every board so the next load fetches them again.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.boards.clear();
        state.media.clear();
        state.board_generation += 1;
        state.media_generation += 1;
    }

    fn reset_benchmarks(&self) {
        let mut state = self.state.lock();
        state.benchmarks.clear();
        state.boards.clear();
        state.board_generation += 1;
    }

    pub fn benchmarks(&self) -> Vec<LlmBenchmark> {
        self.state.lock().benchmarks.clone()
    }

    pub fn board(&self, benchmark_type: &str) -> Option<BenchmarkBoard> {
        self.state.lock().boards.get(benchmark_type).cloned()
    }

    pub fn media_board(&self, media_type: MediaType) -> Option<MediaBoard> {
        self.state.lock().media.get(&media_type).cloned()
    }

    /// Benchmarks ordered by `sortOrder` and grouped by category group, groups
    /// in order of their first benchmark.
    pub fn sections(&self) -> Vec<BenchmarkSection> {
        let mut sorted = self.benchmarks();
        sorted.sort_by_key(|b| b.sort_order.unwrap_or(UNSORTED));

        let mut sections: Vec<BenchmarkSection> = Vec::new();
        for benchmark in sorted {
            match sections.iter_mut().find(|s| s.group == benchmark.category_group) {
                Some(section) => section.benchmarks.push(benchmark),
                None => sections.push(BenchmarkSection {
                    anchor_id: format!("benchmark-{}", benchmark.category_group.to_lowercase()),
                    group: benchmark.category_group.clone(),
                    benchmarks: vec![benchmark],
                }),
            }
        }
        sections
    }

    pub fn summary(&self) -> RankingsSummary {
        let state = self.state.lock();
        let mut models = HashSet::new();
        let mut providers = HashSet::new();
        for entry in state.boards.values().flat_map(|b| b.entries.iter()) {
            models.insert(entry.model_id.as_str());
            if !entry.provider.is_empty() {
                providers.insert(entry.provider.as_str());
            }
        }

        let loaded: Vec<&MediaBoard> = state.media.values().filter(|b| b.initialized).collect();
        RankingsSummary {
            benchmark_count: state.benchmarks.len(),
            model_count: models.len(),
            provider_count: providers.len(),
            media_total: loaded.iter().map(|b| b.total_elements).sum(),
            media_ready: loaded.len() == MediaType::ALL.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TokenPair;
    use crate::services::test_support::client_for;
    use mockito::{Matcher, Server};

    const BENCHMARKS: &str = r#"[
        {"benchmarkType":"AIME","displayName":"AIME","categoryGroup":"Math","description":"d","sortOrder":3},
        {"benchmarkType":"MMLU_PRO","displayName":"MMLU Pro","categoryGroup":"Reasoning","description":"d","sortOrder":1},
        {"benchmarkType":"MATH_500","displayName":"MATH 500","categoryGroup":"Math","description":"d"},
        {"benchmarkType":"GPQA_DIAMOND","displayName":"GPQA","categoryGroup":"Reasoning","description":"d","sortOrder":2}
    ]"#;

    fn entries_json(model: &str, provider: &str) -> String {
        format!(
            r#"[{{"rank":1,"modelId":"{model}","modelName":"{model}","provider":"{provider}","score":80.5}}]"#
        )
    }

    fn media_json(total: u64) -> String {
        format!(
            r#"{{"content":[{{"id":1,"externalId":"e1","slug":"m","name":"Model",
                "modelCreator":{{"id":1,"name":"Lab"}},"elo":1200.0,"rank":1}}],
                "number":0,"size":10,"totalElements":{total},"totalPages":1,"last":true}}"#
        )
    }

    fn sign_in(client: &ApiClient) {
        client.tokens().set(TokenPair {
            access_token: "tok".to_string(),
            refresh_token: "ref".to_string(),
        });
    }

    #[tokio::test]
    async fn test_anonymous_loads_composite_group_and_no_media() {
        let mut server = Server::new_async().await;
        let group = server
            .mock("GET", "/api/llm/benchmarks/Composite")
            .with_status(200)
            .with_body(
                r#"[{"benchmarkType":"AA_INTELLIGENCE_INDEX","displayName":"Index","categoryGroup":"Composite","description":"d"}]"#,
            )
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/api/llm/leaderboard/AA_INTELLIGENCE_INDEX")
            .with_status(200)
            .with_body(entries_json("gpt", "OpenAI"))
            .create_async()
            .await;
        let media = server
            .mock("GET", Matcher::Regex(r"^/api/llm/media/".to_string()))
            .expect(0)
            .create_async()
            .await;

        let rankings = LlmRankings::new(&client_for(&server));
        rankings.load().await.unwrap();

        group.assert_async().await;
        media.assert_async().await;
        let board = rankings.board("AA_INTELLIGENCE_INDEX").unwrap();
        assert!(!board.loading);
        assert_eq!(board.entries[0].model_id, "gpt");
        assert!(rankings.media_board(MediaType::TextToImage).is_none());
        assert!(!rankings.summary().media_ready);
    }

    #[tokio::test]
    async fn test_signed_in_loads_every_board_once() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/benchmarks")
            .with_status(200)
            .with_body(BENCHMARKS)
            .create_async()
            .await;
        let mut boards = Vec::new();
        for (benchmark, model, provider) in [
            ("AIME", "a", "OpenAI"),
            ("MMLU_PRO", "b", "Google"),
            ("MATH_500", "a", "OpenAI"),
            ("GPQA_DIAMOND", "c", ""),
        ] {
            boards.push(
                server
                    .mock("GET", format!("/api/llm/leaderboard/{}", benchmark).as_str())
                    .with_status(200)
                    .with_body(entries_json(model, provider))
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        let media = server
            .mock("GET", Matcher::Regex(r"^/api/llm/media/".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "0".into()),
                Matcher::UrlEncoded("size".into(), "10".into()),
                Matcher::UrlEncoded("sort".into(), "rank,asc".into()),
            ]))
            .with_status(200)
            .with_body(media_json(7))
            .expect(5)
            .create_async()
            .await;

        let client = client_for(&server);
        sign_in(&client);
        let rankings = LlmRankings::new(&client);
        rankings.load().await.unwrap();

        // A second pass finds every board present and fetches nothing.
        rankings.load_leaderboards().await;
        rankings.load_media().await;

        for board in boards {
            board.assert_async().await;
        }
        media.assert_async().await;

        let summary = rankings.summary();
        assert_eq!(summary.benchmark_count, 4);
        assert_eq!(summary.model_count, 3);
        assert_eq!(summary.provider_count, 2);
        assert_eq!(summary.media_total, 35);
        assert!(summary.media_ready);
        assert_eq!(rankings.media_board(MediaType::TextToVideo).unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_leaderboard_sets_its_own_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/benchmarks/Composite")
            .with_status(200)
            .with_body(
                r#"[{"benchmarkType":"AIME","displayName":"AIME","categoryGroup":"Math","description":"d"},
                    {"benchmarkType":"SCICODE","displayName":"SciCode","categoryGroup":"Coding","description":"d"}]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/llm/leaderboard/AIME")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/api/llm/leaderboard/SCICODE")
            .with_status(200)
            .with_body(entries_json("s", "Lab"))
            .create_async()
            .await;

        let rankings = LlmRankings::new(&client_for(&server));
        rankings.load().await.unwrap();

        let failed = rankings.board("AIME").unwrap();
        assert_eq!(failed.error.as_deref(), Some(RANKINGS_LOAD_ERROR));
        assert!(failed.entries.is_empty());
        assert!(!failed.loading);
        assert!(rankings.board("SCICODE").unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_failed_media_board_is_initialized_with_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/media/text-to-speech")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(r"^/api/llm/media/".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(media_json(2))
            .expect(4)
            .create_async()
            .await;

        let client = client_for(&server);
        sign_in(&client);
        let rankings = LlmRankings::new(&client);
        rankings.load_media().await;

        let failed = rankings.media_board(MediaType::TextToSpeech).unwrap();
        assert!(failed.initialized);
        assert_eq!(failed.error.as_deref(), Some(RANKINGS_LOAD_ERROR));
        let summary = rankings.summary();
        assert!(summary.media_ready);
        assert_eq!(summary.media_total, 8);
    }

    #[tokio::test]
    async fn test_failed_benchmark_metadata_returns_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/benchmarks/Composite")
            .with_status(503)
            .create_async()
            .await;

        let rankings = LlmRankings::new(&client_for(&server));
        assert!(rankings.load().await.is_err());
        assert!(rankings.benchmarks().is_empty());
        assert!(rankings.sections().is_empty());
    }

    #[tokio::test]
    async fn test_sections_follow_sort_order() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/benchmarks")
            .with_status(200)
            .with_body(BENCHMARKS)
            .create_async()
            .await;

        let client = client_for(&server);
        sign_in(&client);
        let rankings = LlmRankings::new(&client);
        rankings.load_benchmarks().await.unwrap();

        let sections = rankings.sections();
        let outline: Vec<(&str, Vec<&str>)> = sections
            .iter()
            .map(|s| {
                (
                    s.group.as_str(),
                    s.benchmarks.iter().map(|b| b.benchmark_type.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            outline,
            vec![
                ("Reasoning", vec!["MMLU_PRO", "GPQA_DIAMOND"]),
                ("Math", vec!["AIME", "MATH_500"]),
            ]
        );
        assert_eq!(sections[1].anchor_id, "benchmark-math");
    }

    #[tokio::test]
    async fn test_reset_refetches_boards() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/benchmarks/Composite")
            .with_status(200)
            .with_body(
                r#"[{"benchmarkType":"AIME","displayName":"AIME","categoryGroup":"Math","description":"d"}]"#,
            )
            .create_async()
            .await;
        let board = server
            .mock("GET", "/api/llm/leaderboard/AIME")
            .with_status(200)
            .with_body(entries_json("a", "OpenAI"))
            .expect(2)
            .create_async()
            .await;

        let rankings = LlmRankings::new(&client_for(&server));
        rankings.load().await.unwrap();
        rankings.reset();
        assert!(rankings.board("AIME").is_none());
        rankings.load_leaderboards().await;

        board.assert_async().await;
        assert_eq!(rankings.board("AIME").unwrap().entries.len(), 1);
    }
}
