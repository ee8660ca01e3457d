//! devport-client - typed client for the devport.kr developer-trends backend.
//!
//! Service wrappers for every REST endpoint, the comment reply-tree builder,
//! page/infinite-scroll and autocomplete controllers, the LLM rankings and
//! wiki chat state, and the wiki text pipeline.

pub mod autocomplete;
pub mod comment_tree;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod rankings;
pub mod schema;
pub mod services;
pub mod wiki;
pub mod wiki_chat;

pub use autocomplete::Autocomplete;
pub use comment_tree::{build_comment_tree, count_comments, CommentSection, CommentTreeNode};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{ApiClient, TokenPair, TokenStore};
pub use pagination::{InfiniteScroll, LoadOutcome, Page, PageController, PageSource};
pub use rankings::LlmRankings;
pub use wiki_chat::WikiChat;
