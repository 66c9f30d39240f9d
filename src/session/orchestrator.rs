//! The generation session: owns the item collection and drives every
//! status transition in response to commands.
//!
//! State lives behind a single async mutex that is never held across a
//! service call. A generation is started under the lock (the item moves to
//! `loading` and receives a ticket), the service is awaited unlocked, and the
//! outcome is written back only if the same ticket is still current. Two
//! different indices can therefore be in flight at once, while a reset or a
//! fresh submission silently invalidates anything started before it.

use super::item::{ImageItem, ImageStatus, StatusUpdate};
use super::state::{
    SessionError, SessionSnapshot, SessionState, CRITICAL_NOTICE, EMPTY_ARTICLE, GENERATION_FAILED,
    MORE_PROMPTS_FAILED,
};
use crate::imagegen::ImageGenerator;
use crate::prompts::PromptGenerator;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

/// What a single `generate` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Index out of range, or the item was not `pending`/`error`. Nothing changed.
    Skipped,
    Generated,
    Failed { critical: bool },
    /// The service answered but the item had moved on (reset, resubmit).
    Discarded,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
    images: Arc<dyn ImageGenerator>,
    prompts: Arc<dyn PromptGenerator>,
}

impl Session {
    pub fn new(images: Arc<dyn ImageGenerator>, prompts: Arc<dyn PromptGenerator>) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::default()),
                snapshots,
                images,
                prompts,
            }),
        }
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Run `f` under the lock and publish the resulting state.
    async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.state.lock().await;
        let out = f(&mut state);
        self.inner.snapshots.send_replace(state.snapshot());
        out
    }

    async fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.inner.state.lock().await;
        f(&state)
    }

    // ── User edits ─────────────────────────────────────────

    /// Replace the article text. Refused while prompts are being fetched or
    /// an image is generating.
    pub async fn set_article(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(|s| {
            if s.prompt_request_running() || s.items.is_generating() {
                return false;
            }
            s.article = text;
            true
        })
        .await
    }

    /// Edit the prompt of a `pending` or `error` item.
    pub async fn set_prompt(&self, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(|s| {
            let editable = s
                .items
                .get(index)
                .is_some_and(|item| item.status().can_generate());
            editable && s.items.set_prompt(index, text)
        })
        .await
    }

    /// Drop the article, every item and any session error.
    pub async fn reset(&self) {
        self.update(|s| {
            s.article.clear();
            s.items.clear();
            s.error = None;
            s.generating_prompts = false;
            s.generating_more = false;
            s.epoch += 1;
        })
        .await;
        info!("session reset");
    }

    // ── Prompt fetching ────────────────────────────────────

    /// Turn the current article into a fresh set of `pending` items.
    /// Returns how many prompts arrived.
    pub async fn submit_article(&self) -> Result<usize, SessionError> {
        let started = self
            .update(|s| {
                if s.prompt_request_running() {
                    return Err(SessionError::Busy);
                }
                if s.article.trim().is_empty() {
                    s.error = Some(EMPTY_ARTICLE.to_string());
                    return Err(SessionError::EmptyArticle);
                }
                s.generating_prompts = true;
                s.error = None;
                s.items.clear();
                s.epoch += 1;
                Ok((s.article.clone(), s.epoch))
            })
            .await;
        let (article, epoch) = started?;

        let result = self.inner.prompts.generate_prompts(&article, &[]).await;

        self.update(|s| {
            if s.epoch != epoch {
                debug!("discarding prompts for a session that was reset");
                return Ok(0);
            }
            s.generating_prompts = false;
            match result {
                Ok(prompts) => {
                    let count = prompts.len();
                    s.items.initialize(prompts);
                    info!(count, "prompts ready");
                    Ok(count)
                }
                Err(err) => {
                    error!(error = %err, "prompt generation failed");
                    s.error = Some(err.to_string());
                    Err(SessionError::from(err))
                }
            }
        })
        .await
    }

    /// Ask for another batch of prompts, steering away from the current ones,
    /// and append them. A blank article is a silent no-op.
    pub async fn generate_more(&self) -> Result<usize, SessionError> {
        let started = self
            .update(|s| {
                if s.article.trim().is_empty() {
                    return Ok(None);
                }
                if s.prompt_request_running() {
                    return Err(SessionError::Busy);
                }
                s.generating_more = true;
                s.error = None;
                Ok(Some((s.article.clone(), s.items.prompts(), s.epoch)))
            })
            .await;
        let Some((article, existing, epoch)) = started? else {
            return Ok(0);
        };

        let result = self.inner.prompts.generate_prompts(&article, &existing).await;

        self.update(|s| {
            if s.epoch != epoch {
                debug!("discarding extra prompts for a session that was reset");
                return Ok(0);
            }
            s.generating_more = false;
            match result {
                Ok(prompts) => {
                    let count = prompts.len();
                    s.items.append(prompts);
                    info!(count, total = s.items.len(), "more prompts appended");
                    Ok(count)
                }
                Err(err) => {
                    error!(error = %err, "generating more prompts failed");
                    s.error = Some(format!("{}: {}", MORE_PROMPTS_FAILED, err));
                    Err(SessionError::from(err))
                }
            }
        })
        .await
    }

    // ── Image generation ───────────────────────────────────

    /// Render one item. Only `pending` and `error` items are generated; any
    /// other call is a no-op. Failures stay on the item and never propagate.
    pub async fn generate(&self, index: usize) -> GenerateOutcome {
        let Some(started) = self.update(|s| s.items.begin_generation(index)).await else {
            debug!(index, "skipping generation: no such item or not generatable");
            return GenerateOutcome::Skipped;
        };

        match self.inner.images.generate_image(&started.prompt).await {
            Ok(result) => {
                let written = self
                    .update(|s| {
                        s.items
                            .finish_generation(index, started.ticket, StatusUpdate::Success(result))
                    })
                    .await;
                if written {
                    info!(index, "image generated");
                    GenerateOutcome::Generated
                } else {
                    debug!(index, "discarding image for an item that moved on");
                    GenerateOutcome::Discarded
                }
            }
            Err(err) => {
                error!(
                    index,
                    prompt = %started.prompt,
                    kind = ?err.kind(),
                    error = %err,
                    "failed to generate image"
                );
                let critical = err.is_critical();
                let written = self
                    .update(|s| {
                        let written = s.items.finish_generation(
                            index,
                            started.ticket,
                            StatusUpdate::Error(GENERATION_FAILED.to_string()),
                        );
                        if written && critical {
                            s.error = Some(CRITICAL_NOTICE.to_string());
                        }
                        written
                    })
                    .await;
                if !written {
                    debug!(index, "discarding failure for an item that moved on");
                    return GenerateOutcome::Discarded;
                }
                if critical {
                    warn!(index, "critical image failure; later generations may fail too");
                }
                GenerateOutcome::Failed { critical }
            }
        }
    }

    /// Render every `pending` item one after another in index order.
    ///
    /// Each item's status is re-read right before it is generated, so items
    /// started, finished or edited elsewhere in the meantime are left alone.
    /// Covers the items present when the call began; stops early if the
    /// session is reset or resubmitted.
    pub async fn generate_all(&self) -> Vec<(usize, GenerateOutcome)> {
        let (len, epoch) = self.read(|s| (s.items.len(), s.epoch)).await;
        let mut attempted = Vec::new();

        for index in 0..len {
            let (live_epoch, status) = self
                .read(|s| (s.epoch, s.items.get(index).map(|item| item.status())))
                .await;
            if live_epoch != epoch {
                debug!(index, "session changed; stopping batch");
                break;
            }
            if status != Some(ImageStatus::Pending) {
                continue;
            }
            let outcome = self.generate(index).await;
            attempted.push((index, outcome));
        }

        info!(attempted = attempted.len(), total = len, "batch generation finished");
        attempted
    }

    pub async fn item(&self, index: usize) -> Option<ImageItem> {
        self.read(|s| s.items.get(index).cloned()).await
    }
}
