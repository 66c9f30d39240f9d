//! Image items and the ordered collection that holds them.
//!
//! The collection performs no I/O. Every status change goes through
//! [`ItemCollection::set_status`] or the begin/finish generation pair, which
//! keeps an item's payload consistent with its status: a result only on
//! `success`, a message only on `error`.

use crate::imagegen::ImageGenResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Loading,
    Success,
    Error,
    Cancelled,
}

impl ImageStatus {
    /// `success` and `cancelled` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ImageStatus::Success | ImageStatus::Cancelled)
    }

    /// Generation may start from `pending`, or again from `error`.
    pub fn can_generate(self) -> bool {
        matches!(self, ImageStatus::Pending | ImageStatus::Error)
    }
}

/// Status plus the payload that status allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemState {
    Pending,
    Loading,
    Success { image: ImageGenResult },
    Error { error: String },
    Cancelled,
}

impl ItemState {
    pub fn status(&self) -> ImageStatus {
        match self {
            ItemState::Pending => ImageStatus::Pending,
            ItemState::Loading => ImageStatus::Loading,
            ItemState::Success { .. } => ImageStatus::Success,
            ItemState::Error { .. } => ImageStatus::Error,
            ItemState::Cancelled => ImageStatus::Cancelled,
        }
    }
}

/// A requested status change, carrying whatever the new status needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Pending,
    Loading,
    Success(ImageGenResult),
    Error(String),
    Cancelled,
}

impl From<StatusUpdate> for ItemState {
    fn from(update: StatusUpdate) -> Self {
        match update {
            StatusUpdate::Pending => ItemState::Pending,
            StatusUpdate::Loading => ItemState::Loading,
            StatusUpdate::Success(image) => ItemState::Success { image },
            StatusUpdate::Error(error) => ItemState::Error { error },
            StatusUpdate::Cancelled => ItemState::Cancelled,
        }
    }
}

/// One prompt and its generation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    pub prompt: String,
    #[serde(flatten)]
    state: ItemState,
    /// Identifies the current `loading` attempt; zero when not loading.
    #[serde(skip)]
    ticket: u64,
}

impl ImageItem {
    pub fn pending(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            state: ItemState::Pending,
            ticket: 0,
        }
    }

    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub fn status(&self) -> ImageStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&ImageGenResult> {
        match &self.state {
            ItemState::Success { image } => Some(image),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ItemState::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Handed out when an item enters `loading`; needed to write the outcome back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub ticket: u64,
    /// The prompt text at the moment generation started.
    pub prompt: String,
}

/// Ordered items. Indices are stable: the collection only grows by
/// appending and is otherwise replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    items: Vec<ImageItem>,
    // Survives initialize/clear so tickets stay unique for the collection's lifetime.
    next_ticket: u64,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with one `pending` item per prompt, in order.
    pub fn initialize<I, S>(&mut self, prompts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = prompts.into_iter().map(ImageItem::pending).collect();
    }

    /// Add `pending` items after the existing ones.
    pub fn append<I, S>(&mut self, prompts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(prompts.into_iter().map(ImageItem::pending));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Overwrite a prompt whatever the item's status. Out of range is a no-op.
    pub fn set_prompt(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.prompt = text.into();
                true
            }
            None => false,
        }
    }

    /// Move an item to a new status, dropping any payload the old status had.
    pub fn set_status(&mut self, index: usize, update: StatusUpdate) -> bool {
        let ticket = match update {
            StatusUpdate::Loading => self.issue_ticket(),
            _ => 0,
        };
        match self.items.get_mut(index) {
            Some(item) => {
                item.state = update.into();
                item.ticket = ticket;
                true
            }
            None => false,
        }
    }

    /// Move a `pending` or `error` item to `loading`. `None` when the index
    /// is out of range or the item is in any other status.
    pub fn begin_generation(&mut self, index: usize) -> Option<GenerationTicket> {
        if !self.items.get(index)?.status().can_generate() {
            return None;
        }
        let ticket = self.issue_ticket();
        let item = self.items.get_mut(index)?;
        item.state = ItemState::Loading;
        item.ticket = ticket;
        Some(GenerationTicket {
            ticket,
            prompt: item.prompt.clone(),
        })
    }

    /// Write a generation outcome back, but only if the item is still in the
    /// `loading` attempt identified by `ticket`.
    pub fn finish_generation(&mut self, index: usize, ticket: u64, update: StatusUpdate) -> bool {
        match self.items.get_mut(index) {
            Some(item) if item.status() == ImageStatus::Loading && item.ticket == ticket => {
                item.state = update.into();
                item.ticket = 0;
                true
            }
            _ => false,
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    pub fn get(&self, index: usize) -> Option<&ImageItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn prompts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.prompt.clone()).collect()
    }

    pub fn has_pending(&self) -> bool {
        self.items.iter().any(|item| item.status() == ImageStatus::Pending)
    }

    pub fn is_generating(&self) -> bool {
        self.items.iter().any(|item| item.status() == ImageStatus::Loading)
    }
}
