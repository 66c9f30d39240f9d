use super::item::{ImageItem, ItemCollection};
use crate::prompts::PromptGenError;
use serde::Serialize;
use thiserror::Error;

/// Shown on an item whose generation failed; the cause goes to the log.
pub const GENERATION_FAILED: &str = "Generation Failed";

/// Session banner raised when a failure looks like an auth or quota problem.
pub const CRITICAL_NOTICE: &str =
    "A critical error occurred (quota limit or API key issue). Some images may have failed.";

pub const EMPTY_ARTICLE: &str = "Please paste an article before generating prompts.";

pub const MORE_PROMPTS_FAILED: &str = "Failed to generate more prompts";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please paste an article before generating prompts.")]
    EmptyArticle,
    #[error("a prompt request is already in progress")]
    Busy,
    #[error(transparent)]
    Prompts(#[from] PromptGenError),
}

/// Everything a session owns. Only ever touched under the session lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub article: String,
    pub items: ItemCollection,
    pub error: Option<String>,
    pub generating_prompts: bool,
    pub generating_more: bool,
    /// Bumped by submit and reset; work started under an older epoch is stale.
    pub epoch: u64,
}

impl SessionState {
    pub fn prompt_request_running(&self) -> bool {
        self.generating_prompts || self.generating_more
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            article: self.article.clone(),
            items: self.items.items().to_vec(),
            error: self.error.clone(),
            generating_prompts: self.generating_prompts,
            generating_more: self.generating_more,
            has_pending: self.items.has_pending(),
            is_generating: self.items.is_generating(),
        }
    }
}

/// Read-only view of a session, published after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub article: String,
    pub items: Vec<ImageItem>,
    pub error: Option<String>,
    pub generating_prompts: bool,
    pub generating_more: bool,
    pub has_pending: bool,
    pub is_generating: bool,
}
