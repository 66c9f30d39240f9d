use crate::imagegen::{ImageGenError, ImageGenResult, ImageGenerator};
use crate::prompts::{PromptGenError, PromptGenerator};
use crate::session::{ImageStatus, Session, SessionSnapshot};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ── Scripted image service ──────────────────────────────────

/// Image service double. Succeeds unless a failure is scripted for the
/// prompt; calls for a gated prompt wait until the gate is opened.
#[derive(Default)]
pub struct ScriptedImages {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ImageGenError>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    /// When set, every success writes a real file here.
    output_dir: Option<PathBuf>,
}

impl ScriptedImages {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writing_to(dir: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            output_dir: Some(dir.into()),
            ..Self::default()
        })
    }

    pub fn fail(&self, prompt: &str, error: ImageGenError) {
        self.failures.lock().unwrap().insert(prompt.to_string(), error);
    }

    pub fn heal(&self, prompt: &str) {
        self.failures.lock().unwrap().remove(prompt);
    }

    /// Hold calls for `prompt` until the returned gate is notified.
    pub fn gate(&self, prompt: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(prompt.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImages {
    async fn generate_image(&self, prompt: &str) -> Result<ImageGenResult, ImageGenError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let gate = self.gates.lock().unwrap().get(prompt).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self.failures.lock().unwrap().get(prompt).cloned();
        if let Some(err) = failure {
            return Err(err);
        }

        let image_url = match &self.output_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.png", uuid::Uuid::new_v4()));
                std::fs::write(&path, prompt.as_bytes()).unwrap();
                path.to_string_lossy().to_string()
            }
            None => format!("memory://{}", prompt),
        };

        Ok(ImageGenResult {
            image_url,
            prompt: prompt.to_string(),
            provider_id: "scripted".to_string(),
            format: "png".to_string(),
        })
    }
}

// ── Scripted prompt service ─────────────────────────────────

/// Prompt service double answering from a queue of scripted replies.
#[derive(Default)]
pub struct ScriptedPrompts {
    replies: Mutex<VecDeque<Result<Vec<String>, PromptGenError>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedPrompts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, prompts: &[&str]) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(prompts.iter().map(|p| p.to_string()).collect()));
    }

    pub fn reply_err(&self, error: PromptGenError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Hold the next calls until the returned gate is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Every call as `(article, existing prompts)`.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptGenerator for ScriptedPrompts {
    async fn generate_prompts(
        &self,
        article: &str,
        existing: &[String],
    ) -> Result<Vec<String>, PromptGenError> {
        self.calls
            .lock()
            .unwrap()
            .push((article.to_string(), existing.to_vec()));

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PromptGenError::Empty))
    }
}

// ── Session setup ───────────────────────────────────────────

pub const ARTICLE: &str = "City rooftops are turning into beehives, one permit at a time.";

pub fn new_session(images: &Arc<ScriptedImages>, prompts: &Arc<ScriptedPrompts>) -> Session {
    Session::new(images.clone(), prompts.clone())
}

/// A session whose article has been submitted and produced `initial`.
pub async fn seeded_session(initial: &[&str]) -> (Session, Arc<ScriptedImages>, Arc<ScriptedPrompts>) {
    let images = ScriptedImages::new();
    let prompts = ScriptedPrompts::new();
    let session = new_session(&images, &prompts);
    prompts.reply(initial);
    assert!(session.set_article(ARTICLE).await);
    assert_eq!(session.submit_article().await.unwrap(), initial.len());
    (session, images, prompts)
}

pub fn statuses(snapshot: &SessionSnapshot) -> Vec<ImageStatus> {
    snapshot.items.iter().map(|item| item.status()).collect()
}

pub fn prompts_of(snapshot: &SessionSnapshot) -> Vec<String> {
    snapshot.items.iter().map(|item| item.prompt.clone()).collect()
}

/// Wait until item `index` reports `status`.
pub async fn wait_for_status(session: &Session, index: usize, status: ImageStatus) {
    let mut rx = session.subscribe();
    rx.wait_for(|s| s.items.get(index).map(|item| item.status()) == Some(status))
        .await
        .unwrap();
}
