//! devport - console driver for the devport.kr backend.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use devport_client::comment_tree::{can_nest, CommentSection, DEFAULT_MAX_VISUAL_DEPTH};
use devport_client::pagination::{
    ArticleFeed, FulltextSearch, GitRepoFeed, MediaLeaderboardFeed, PageController, PageSource,
    TrendingRepoFeed,
};
use devport_client::schema::CategoryFilter;
use devport_client::services::llm::{format_score, BenchmarkType, LeaderboardFilters, MediaType};
use devport_client::rankings::RANKINGS_MEDIA_PAGE_SIZE;
use devport_client::{wiki, ApiClient, Autocomplete, ClientConfig, LlmRankings, WikiChat};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "devport", about = "Browse devport.kr from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Article feed, optionally by category
    Feed {
        #[arg(long, default_value = "ALL")]
        category: CategoryFilter,
        /// Pages to load through infinite scroll
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// GitHub repositories by category, or the trending list
    Repos {
        #[arg(long, default_value = "ALL")]
        category: CategoryFilter,
        #[arg(long)]
        trending: bool,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Comment thread of an article
    Comments { article_id: String },
    /// Full-text search
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Title suggestions, typed one character at a time
    Suggest { input: String },
    /// LLM benchmark leaderboard
    Leaderboard {
        benchmark: BenchmarkType,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        license: Option<String>,
    },
    /// Media model leaderboard
    Media {
        media_type: MediaType,
        #[arg(long, default_value_t = 1)]
        pages: u32,
        #[arg(long, default_value_t = RANKINGS_MEDIA_PAGE_SIZE)]
        size: u32,
    },
    /// Rankings overview: every benchmark board, plus media boards when signed in
    Rankings,
    /// Ask a question about a project's wiki
    Ask {
        project: String,
        question: String,
        #[arg(long)]
        citations: bool,
    },
    /// Outline a wiki Markdown file: headings and diagram blocks
    Wiki {
        file: PathBuf,
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devport_client=info,devport=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("loading client config")?;
    let client = ApiClient::new(&config)?;
    info!("Using backend {}", client.base_url());

    match cli.command {
        Command::Feed { category, pages } => {
            let feed = PageController::new(ArticleFeed::new(client.articles()));
            scroll(&feed, category, pages).await?;
            for article in feed.items() {
                println!("[{}] {}  ({})", article.category.label(), article.summary_ko_title, article.url);
            }
            println!("{} of {} articles", feed.len(), feed.total_elements());
        }
        Command::Repos { category, trending, pages } => {
            let repos = if trending {
                let feed = PageController::new(TrendingRepoFeed::new(client.articles()));
                scroll(&feed, (), pages).await?;
                feed.items()
            } else {
                let feed = PageController::new(GitRepoFeed::new(client.articles()));
                scroll(&feed, category, pages).await?;
                feed.items()
            };
            for repo in repos {
                println!(
                    "{:<40} ★{:<7} +{:<5} {}",
                    repo.full_name,
                    repo.stars,
                    repo.stars_this_week,
                    repo.language.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Comments { article_id } => {
            let mut section = CommentSection::new(client.comments(), article_id);
            section.refresh().await.context("loading comments")?;
            println!("{} comments", section.total());

            let mut stack: Vec<_> = section.tree().iter().rev().map(|n| (n, 0usize)).collect();
            while let Some((node, depth)) = stack.pop() {
                let indent = "  ".repeat(depth.min(DEFAULT_MAX_VISUAL_DEPTH));
                let body = if node.comment.deleted {
                    "(삭제된 댓글)"
                } else {
                    node.comment.content.as_str()
                };
                println!("{}- {}: {}", indent, node.comment.author.name, body);

                let child_depth = if can_nest(depth, DEFAULT_MAX_VISUAL_DEPTH) { depth + 1 } else { depth };
                stack.extend(node.replies.iter().rev().map(|r| (r, child_depth)));
            }
        }
        Command::Search { query, pages } => {
            let results = PageController::new(FulltextSearch::new(client.search()));
            scroll(&results, query, pages).await?;
            for article in results.items() {
                println!("{}  {}", article.summary_ko_title, article.url);
            }
            println!("{} of {} matches", results.len(), results.total_elements());
        }
        Command::Suggest { input } => {
            let mut autocomplete =
                Autocomplete::new(client.search()).with_debounce(config.autocomplete_debounce);
            let mut typed = String::new();
            for ch in input.chars() {
                typed.push(ch);
                autocomplete.input(&typed);
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            while autocomplete.is_pending() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            for suggestion in autocomplete.suggestions() {
                println!("{}  [{:?}]", suggestion.summary_ko_title, suggestion.match_type);
            }
        }
        Command::Leaderboard { benchmark, provider, license } => {
            let filters = LeaderboardFilters {
                provider,
                license,
                ..LeaderboardFilters::default()
            };
            let entries = client.llm().leaderboard(benchmark, &filters).await?;
            println!("{} ({})", benchmark, benchmark.group().label_ko());
            for entry in entries {
                println!(
                    "{:>3}. {:<40} {:>7}  {}",
                    entry.rank,
                    entry.model_name,
                    format_score(Some(entry.score), 1),
                    entry.provider
                );
            }
        }
        Command::Media { media_type, pages, size } => {
            let board =
                PageController::new(MediaLeaderboardFeed::new(client.llm()).with_page_size(size));
            scroll(&board, media_type, pages).await?;
            for model in board.items() {
                println!(
                    "{:>3}. {:<40} {:>7}  {}",
                    model.rank,
                    model.name,
                    format_score(Some(model.elo), 0),
                    model.model_creator.name
                );
            }
        }
        Command::Rankings => {
            let rankings = LlmRankings::new(&client);
            rankings.load().await.context("loading benchmarks")?;
            for section in rankings.sections() {
                println!("## {}  #{}", section.group, section.anchor_id);
                for benchmark in &section.benchmarks {
                    let Some(board) = rankings.board(&benchmark.benchmark_type) else {
                        continue;
                    };
                    match (&board.error, board.entries.first()) {
                        (Some(error), _) => println!("  {:<24} {}", benchmark.display_name, error),
                        (None, Some(top)) => println!(
                            "  {:<24} {} ({})",
                            benchmark.display_name,
                            top.model_name,
                            format_score(Some(top.score), 1)
                        ),
                        (None, None) => println!("  {:<24} -", benchmark.display_name),
                    }
                }
            }
            for media_type in MediaType::ALL {
                if let Some(board) = rankings.media_board(media_type) {
                    let leader = board.items.first().map(|m| m.name.as_str()).unwrap_or("-");
                    println!("{:<16} {} of {}", media_type.as_str(), leader, board.total_elements);
                }
            }
            let summary = rankings.summary();
            println!(
                "{} benchmarks, {} models, {} providers",
                summary.benchmark_count, summary.model_count, summary.provider_count
            );
        }
        Command::Ask { project, question, citations } => {
            let mut chat = WikiChat::new(client.wiki(), project);
            chat.set_include_citations(citations);
            if let Some(answer) = chat.ask(&question).await.context("asking the wiki")? {
                println!("{}", answer.content);
                if answer.needs_clarification {
                    println!("(clarification requested, please add more context)");
                }
                for citation in &answer.citations {
                    println!("  - {}  {}", citation.title, citation.url);
                }
            }
        }
        Command::Wiki { file, prefix } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let Some(doc) = wiki::prepare_wiki(&raw, &prefix) else {
                warn!("{} has no content after cleanup", file.display());
                return Ok(());
            };
            for heading in &doc.headings {
                println!("{}{}  #{}", "  ".repeat(heading.level as usize - 1), heading.label, heading.id);
            }
            let diagrams = doc
                .blocks
                .iter()
                .filter(|b| matches!(b, wiki::WikiBlock::Mermaid(_)))
                .count();
            println!("{} blocks, {} diagrams", doc.blocks.len(), diagrams);
        }
    }

    Ok(())
}

/// Load page 0, then keep scrolling until `pages` are loaded or the list ends.
async fn scroll<S: PageSource>(
    controller: &PageController<S>,
    filter: S::Filter,
    pages: u32,
) -> anyhow::Result<()> {
    controller.load_initial(filter).await.context("loading first page")?;
    for _ in 1..pages {
        if !controller.has_more() {
            break;
        }
        controller.load_more().await.context("loading next page")?;
    }
    Ok(())
}
