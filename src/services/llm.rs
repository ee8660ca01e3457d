//! LLM benchmark leaderboards, model details and media-model rankings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::{ApiClient, Query};
use crate::schema::{SpringPage, Validate};

pub const DEFAULT_MEDIA_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MEDIA_SORT: &str = "rank,asc";

/// The fifteen benchmarks the leaderboard can rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenchmarkType {
    TerminalBenchHard,
    TauBenchTelecom,
    AaLcr,
    HumanitysLastExam,
    MmluPro,
    GpqaDiamond,
    LivecodeBench,
    Scicode,
    Ifbench,
    #[serde(rename = "MATH_500")]
    Math500,
    Aime,
    #[serde(rename = "AIME_2025")]
    Aime2025,
    AaIntelligenceIndex,
    AaCodingIndex,
    AaMathIndex,
}

impl BenchmarkType {
    pub const ALL: [BenchmarkType; 15] = [
        Self::TerminalBenchHard,
        Self::TauBenchTelecom,
        Self::AaLcr,
        Self::HumanitysLastExam,
        Self::MmluPro,
        Self::GpqaDiamond,
        Self::LivecodeBench,
        Self::Scicode,
        Self::Ifbench,
        Self::Math500,
        Self::Aime,
        Self::Aime2025,
        Self::AaIntelligenceIndex,
        Self::AaCodingIndex,
        Self::AaMathIndex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TerminalBenchHard => "TERMINAL_BENCH_HARD",
            Self::TauBenchTelecom => "TAU_BENCH_TELECOM",
            Self::AaLcr => "AA_LCR",
            Self::HumanitysLastExam => "HUMANITYS_LAST_EXAM",
            Self::MmluPro => "MMLU_PRO",
            Self::GpqaDiamond => "GPQA_DIAMOND",
            Self::LivecodeBench => "LIVECODE_BENCH",
            Self::Scicode => "SCICODE",
            Self::Ifbench => "IFBENCH",
            Self::Math500 => "MATH_500",
            Self::Aime => "AIME",
            Self::Aime2025 => "AIME_2025",
            Self::AaIntelligenceIndex => "AA_INTELLIGENCE_INDEX",
            Self::AaCodingIndex => "AA_CODING_INDEX",
            Self::AaMathIndex => "AA_MATH_INDEX",
        }
    }

    /// Name of the matching score field on model payloads.
    pub fn score_field(self) -> &'static str {
        match self {
            Self::TerminalBenchHard => "scoreTerminalBenchHard",
            Self::TauBenchTelecom => "scoreTauBenchTelecom",
            Self::AaLcr => "scoreAaLcr",
            Self::HumanitysLastExam => "scoreHumanitysLastExam",
            Self::MmluPro => "scoreMmluPro",
            Self::GpqaDiamond => "scoreGpqaDiamond",
            Self::LivecodeBench => "scoreLivecodeBench",
            Self::Scicode => "scoreScicode",
            Self::Ifbench => "scoreIfbench",
            Self::Math500 => "scoreMath500",
            Self::Aime => "scoreAime",
            Self::Aime2025 => "scoreAime2025",
            Self::AaIntelligenceIndex => "scoreAaIntelligenceIndex",
            Self::AaCodingIndex => "scoreAaCodingIndex",
            Self::AaMathIndex => "scoreAaMathIndex",
        }
    }

    pub fn group(self) -> BenchmarkGroup {
        match self {
            Self::TerminalBenchHard | Self::TauBenchTelecom => BenchmarkGroup::Agentic,
            Self::AaLcr | Self::HumanitysLastExam | Self::MmluPro | Self::GpqaDiamond => {
                BenchmarkGroup::Reasoning
            }
            Self::LivecodeBench | Self::Scicode | Self::Ifbench => BenchmarkGroup::Coding,
            Self::Math500 | Self::Aime | Self::Aime2025 => BenchmarkGroup::Math,
            Self::AaIntelligenceIndex | Self::AaCodingIndex | Self::AaMathIndex => {
                BenchmarkGroup::Intelligence
            }
        }
    }
}

impl fmt::Display for BenchmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchmarkType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| format!("unknown benchmark type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkGroup {
    Intelligence,
    Agentic,
    Reasoning,
    Coding,
    Math,
    Specialized,
}

impl BenchmarkGroup {
    pub fn label_ko(self) -> &'static str {
        match self {
            Self::Intelligence => "종합 지능",
            Self::Agentic => "에이전틱",
            Self::Reasoning => "추론",
            Self::Coding => "코딩",
            Self::Math => "수학",
            Self::Specialized => "특수 분야",
        }
    }

    /// Anchor id of the group's section on the rankings page.
    pub fn anchor_id(self) -> String {
        format!("benchmark-{}", format!("{:?}", self).to_lowercase())
    }
}

/// Media leaderboards published alongside the text-model rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    TextToImage,
    ImageEditing,
    TextToSpeech,
    TextToVideo,
    ImageToVideo,
}

impl MediaType {
    pub const ALL: [MediaType; 5] = [
        Self::TextToImage,
        Self::ImageEditing,
        Self::TextToSpeech,
        Self::TextToVideo,
        Self::ImageToVideo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextToImage => "text-to-image",
            Self::ImageEditing => "image-editing",
            Self::TextToSpeech => "text-to-speech",
            Self::TextToVideo => "text-to-video",
            Self::ImageToVideo => "image-to-video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown media type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub model_id: String,
    pub model_name: String,
    pub provider: String,
    #[serde(default)]
    pub model_creator_name: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub price_blended: Option<f64>,
    #[serde(default)]
    pub context_window: Option<u64>,
}

impl Validate for LeaderboardEntry {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.rank == 0 {
            return Err(format!("model {} has rank 0", self.model_id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmBenchmark {
    pub benchmark_type: String,
    pub display_name: String,
    pub category_group: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl Validate for LlmBenchmark {}

/// A model with every published benchmark score (0-100 scale).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmModelDetail {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub slug: String,
    pub model_id: String,
    pub model_name: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model_creator_id: Option<i64>,
    #[serde(default)]
    pub model_creator_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_input: Option<f64>,
    #[serde(default)]
    pub price_output: Option<f64>,
    #[serde(default)]
    pub price_blended: Option<f64>,
    #[serde(default)]
    pub context_window: Option<u64>,
    #[serde(default)]
    pub output_speed_median: Option<f64>,
    #[serde(default)]
    pub latency_ttft: Option<f64>,
    #[serde(default)]
    pub median_time_to_first_answer_token: Option<f64>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub score_terminal_bench_hard: Option<f64>,
    #[serde(default)]
    pub score_tau_bench_telecom: Option<f64>,
    #[serde(default)]
    pub score_aa_lcr: Option<f64>,
    #[serde(default)]
    pub score_humanitys_last_exam: Option<f64>,
    #[serde(default)]
    pub score_mmlu_pro: Option<f64>,
    #[serde(default)]
    pub score_gpqa_diamond: Option<f64>,
    #[serde(default)]
    pub score_livecode_bench: Option<f64>,
    #[serde(default)]
    pub score_scicode: Option<f64>,
    #[serde(default)]
    pub score_ifbench: Option<f64>,
    #[serde(default)]
    pub score_math500: Option<f64>,
    #[serde(default)]
    pub score_aime: Option<f64>,
    #[serde(default)]
    pub score_aime2025: Option<f64>,
    #[serde(default)]
    pub score_aa_intelligence_index: Option<f64>,
    #[serde(default)]
    pub score_aa_coding_index: Option<f64>,
    #[serde(default)]
    pub score_aa_math_index: Option<f64>,
}

impl LlmModelDetail {
    pub fn score(&self, benchmark: BenchmarkType) -> Option<f64> {
        match benchmark {
            BenchmarkType::TerminalBenchHard => self.score_terminal_bench_hard,
            BenchmarkType::TauBenchTelecom => self.score_tau_bench_telecom,
            BenchmarkType::AaLcr => self.score_aa_lcr,
            BenchmarkType::HumanitysLastExam => self.score_humanitys_last_exam,
            BenchmarkType::MmluPro => self.score_mmlu_pro,
            BenchmarkType::GpqaDiamond => self.score_gpqa_diamond,
            BenchmarkType::LivecodeBench => self.score_livecode_bench,
            BenchmarkType::Scicode => self.score_scicode,
            BenchmarkType::Ifbench => self.score_ifbench,
            BenchmarkType::Math500 => self.score_math500,
            BenchmarkType::Aime => self.score_aime,
            BenchmarkType::Aime2025 => self.score_aime2025,
            BenchmarkType::AaIntelligenceIndex => self.score_aa_intelligence_index,
            BenchmarkType::AaCodingIndex => self.score_aa_coding_index,
            BenchmarkType::AaMathIndex => self.score_aa_math_index,
        }
    }
}

impl Validate for LlmModelDetail {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaModelCreator {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaModelCategory {
    #[serde(default)]
    pub style_category: Option<String>,
    #[serde(default)]
    pub subject_matter_category: Option<String>,
    #[serde(default)]
    pub format_category: Option<String>,
    pub elo: f64,
    #[serde(default)]
    pub ci95: Option<f64>,
    #[serde(default)]
    pub appearances: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaModel {
    pub id: i64,
    pub external_id: String,
    pub slug: String,
    pub name: String,
    pub model_creator: MediaModelCreator,
    pub elo: f64,
    pub rank: u32,
    #[serde(default)]
    pub ci95: Option<f64>,
    #[serde(default)]
    pub appearances: Option<u64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub categories: Vec<MediaModelCategory>,
}

impl Validate for MediaModel {}

/// Optional narrowing of a benchmark leaderboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardFilters {
    pub provider: Option<String>,
    pub creator_slug: Option<String>,
    pub license: Option<String>,
    pub max_price: Option<f64>,
    pub min_context_window: Option<u64>,
}

impl LeaderboardFilters {
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(v) = &self.provider {
            query.push(("provider", v.clone()));
        }
        if let Some(v) = &self.creator_slug {
            query.push(("creatorSlug", v.clone()));
        }
        if let Some(v) = &self.license {
            query.push(("license", v.clone()));
        }
        if let Some(v) = self.max_price {
            query.push(("maxPrice", v.to_string()));
        }
        if let Some(v) = self.min_context_window {
            query.push(("minContextWindow", v.to_string()));
        }
        query
    }
}

/// Render a score for display; missing or non-finite scores show as `-`.
pub fn format_score(score: Option<f64>, digits: usize) -> String {
    match score {
        Some(s) if s.is_finite() => format!("{:.*}", digits, s),
        _ => "-".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LlmApi {
    client: ApiClient,
}

impl LlmApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn leaderboard(
        &self,
        benchmark: BenchmarkType,
        filters: &LeaderboardFilters,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.client
            .get(
                &format!("/api/llm/leaderboard/{}", benchmark),
                &filters.to_query(),
            )
            .await
    }

    pub async fn benchmarks(&self) -> Result<Vec<LlmBenchmark>> {
        self.client.get("/api/llm/benchmarks", &Vec::new()).await
    }

    pub async fn benchmarks_by_group(&self, group: &str) -> Result<Vec<LlmBenchmark>> {
        self.client
            .get(&format!("/api/llm/benchmarks/{}", group), &Vec::new())
            .await
    }

    pub async fn model(&self, model_id: &str) -> Result<LlmModelDetail> {
        self.client
            .get(&format!("/api/llm/models/{}", model_id), &Vec::new())
            .await
    }

    pub async fn media_leaderboard(
        &self,
        media_type: MediaType,
        page: u32,
        size: u32,
        sort: &str,
    ) -> Result<SpringPage<MediaModel>> {
        self.client
            .get(
                &format!("/api/llm/media/{}", media_type),
                &vec![
                    ("page", page.to_string()),
                    ("size", size.to_string()),
                    ("sort", sort.to_string()),
                ],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use mockito::{Matcher, Server};

    #[test]
    fn test_benchmark_wire_names() {
        assert_eq!(
            serde_json::to_string(&BenchmarkType::Math500).unwrap(),
            "\"MATH_500\""
        );
        assert_eq!(
            serde_json::to_string(&BenchmarkType::Aime2025).unwrap(),
            "\"AIME_2025\""
        );
        for b in BenchmarkType::ALL {
            let json = serde_json::to_string(&b).unwrap();
            assert_eq!(json, format!("\"{}\"", b.as_str()));
        }
        let model = LlmModelDetail {
            score_ifbench: Some(1.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json[BenchmarkType::Ifbench.score_field()], 1.0);
        assert_eq!(
            "gpqa-diamond".parse::<BenchmarkType>().unwrap(),
            BenchmarkType::GpqaDiamond
        );
    }

    #[test]
    fn test_groups_and_anchor() {
        assert_eq!(BenchmarkType::Aime.group(), BenchmarkGroup::Math);
        assert_eq!(BenchmarkType::AaCodingIndex.group(), BenchmarkGroup::Intelligence);
        assert_eq!(BenchmarkGroup::Coding.anchor_id(), "benchmark-coding");
        assert_eq!(BenchmarkGroup::Reasoning.label_ko(), "추론");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(71.234), 1), "71.2");
        assert_eq!(format_score(None, 1), "-");
        assert_eq!(format_score(Some(f64::NAN), 2), "-");
    }

    #[tokio::test]
    async fn test_leaderboard_filters_as_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/llm/leaderboard/MMLU_PRO")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("provider".into(), "OpenAI".into()),
                Matcher::UrlEncoded("minContextWindow".into(), "128000".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"rank":1,"modelId":"gpt","modelName":"GPT","provider":"OpenAI","score":85.1}]"#,
            )
            .create_async()
            .await;

        let filters = LeaderboardFilters {
            provider: Some("OpenAI".to_string()),
            min_context_window: Some(128_000),
            ..Default::default()
        };
        let entries = client_for(&server)
            .llm()
            .leaderboard(BenchmarkType::MmluPro, &filters)
            .await
            .unwrap();
        assert_eq!(entries[0].rank, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_media_leaderboard_spring_page() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/llm/media/text-to-image")
            .match_query(Matcher::UrlEncoded("sort".into(), "rank,asc".into()))
            .with_status(200)
            .with_body(
                r#"{"content":[{"id":1,"externalId":"e1","slug":"m","name":"Model",
                    "modelCreator":{"id":3,"name":"Lab"},"elo":1200.5,"rank":1}],
                    "pageable":{},"sort":{"sorted":true,"unsorted":false,"empty":false},
                    "first":true,"last":false,"number":0,"size":20,"numberOfElements":1,
                    "totalElements":40,"totalPages":2,"empty":false}"#,
            )
            .create_async()
            .await;

        let page = client_for(&server)
            .llm()
            .media_leaderboard(MediaType::TextToImage, 0, 20, DEFAULT_MEDIA_SORT)
            .await
            .unwrap();
        assert!(!page.last);
        assert_eq!(page.content[0].model_creator.name, "Lab");
    }

    #[test]
    fn test_model_score_lookup() {
        let model = LlmModelDetail {
            score_aime2025: Some(88.0),
            ..Default::default()
        };
        assert_eq!(model.score(BenchmarkType::Aime2025), Some(88.0));
        assert_eq!(model.score(BenchmarkType::Aime), None);
    }
}
