//! Q&A chat about one wiki project.
//!
//! The backend keeps short-lived conversation memory keyed by the session id
//! it hands out with the first answer; later questions send it back.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::services::wiki::{ChatRequest, Citation, WikiApi};

/// Shown in place of an answer when the request fails.
pub const CHAT_FALLBACK_ANSWER: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub citations: Vec<Citation>,
    pub needs_clarification: bool,
}

impl ChatMessage {
    fn user(content: String) -> Self {
        Self {
            role: ChatRole::User,
            content,
            citations: Vec::new(),
            needs_clarification: false,
        }
    }

    fn assistant(content: String) -> Self {
        Self {
            role: ChatRole::Assistant,
            ..Self::user(content)
        }
    }
}

pub struct WikiChat {
    api: WikiApi,
    project_id: String,
    session_id: Option<String>,
    include_citations: bool,
    messages: Vec<ChatMessage>,
}

impl WikiChat {
    pub fn new(api: WikiApi, project_id: impl Into<String>) -> Self {
        Self {
            api,
            project_id: project_id.into(),
            session_id: None,
            include_citations: false,
            messages: Vec::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn include_citations(&self) -> bool {
        self.include_citations
    }

    /// Ask for sources with the following answers, or stop asking.
    pub fn set_include_citations(&mut self, include: bool) {
        self.include_citations = include;
    }

    /// Send a question and append both sides of the exchange. Blank input is
    /// ignored (`Ok(None)`). On failure a fallback answer is appended and the
    /// error returned.
    pub async fn ask(&mut self, question: &str) -> Result<Option<&ChatMessage>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        self.messages.push(ChatMessage::user(question.to_string()));

        let request = ChatRequest {
            project_external_id: self.project_id.clone(),
            question: question.to_string(),
            session_id: self.session_id.clone(),
            include_citations: self.include_citations,
        };

        match self.api.chat(&request).await {
            Ok(reply) => {
                if self.session_id.is_none() {
                    if let Some(session) = reply.session_id {
                        debug!("Wiki chat for {} opened session {}", self.project_id, session);
                        self.session_id = Some(session);
                    }
                }
                self.messages.push(ChatMessage {
                    citations: reply.citations,
                    needs_clarification: reply.needs_clarification,
                    ..ChatMessage::assistant(reply.answer)
                });
                Ok(self.messages.last())
            }
            Err(e) => {
                warn!("Wiki chat request for {} failed: {}", self.project_id, e);
                self.messages
                    .push(ChatMessage::assistant(CHAT_FALLBACK_ANSWER.to_string()));
                Err(e)
            }
        }
    }

    /// Drop the history and the session; the next question starts fresh.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.session_id = None;
    }
}
