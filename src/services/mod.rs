//! Typed wrappers around the backend's REST endpoints, one module per domain.
//!
//! Each wrapper borrows nothing: it holds a clone of the shared [`ApiClient`],
//! so wrappers can be handed to controllers and spawned tasks freely.

pub mod admin;
pub mod articles;
pub mod auth;
pub mod comments;
pub mod llm;
pub mod me;
pub mod search;
pub mod wiki;

use crate::http::{ApiClient, Query};

pub use admin::AdminApi;
pub use articles::ArticlesApi;
pub use auth::AuthApi;
pub use comments::CommentsApi;
pub use llm::LlmApi;
pub use me::MeApi;
pub use search::SearchApi;
pub use wiki::WikiApi;

impl ApiClient {
    pub fn articles(&self) -> ArticlesApi {
        ArticlesApi::new(self.clone())
    }

    pub fn comments(&self) -> CommentsApi {
        CommentsApi::new(self.clone())
    }

    pub fn search(&self) -> SearchApi {
        SearchApi::new(self.clone())
    }

    pub fn me(&self) -> MeApi {
        MeApi::new(self.clone())
    }

    pub fn llm(&self) -> LlmApi {
        LlmApi::new(self.clone())
    }

    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.clone())
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn wiki(&self) -> WikiApi {
        WikiApi::new(self.clone())
    }
}

/// `page`/`size` pair used by every paginated endpoint.
pub(crate) fn page_query(page: u32, size: u32) -> Query {
    vec![("page", page.to_string()), ("size", size.to_string())]
}
