pub mod config;
pub mod imagegen;
pub mod logging;
pub mod prompts;
pub mod session;
pub mod utils;

use crate::config::WeaverConfig;
use crate::imagegen::ImageGenService;
use crate::prompts::{PromptGenError, PromptService};
use crate::session::Session;
use std::sync::Arc;
use tracing::info;

/// Wire a session to the services described by `config`.
///
/// Image providers that cannot be built are skipped with a warning; a
/// missing prompt provider is an error because nothing works without one.
pub async fn build_session(config: &WeaverConfig) -> Result<Session, PromptGenError> {
    let output_dir = config.resolve_output_dir();
    let images = ImageGenService::init_from_config(&config.imagegen, &output_dir).await;
    let prompts = PromptService::from_config(&config.prompts)?;

    info!(
        output_dir = %output_dir.display(),
        image_providers = ?images.list_providers().await,
        "session ready"
    );

    Ok(Session::new(Arc::new(images), Arc::new(prompts)))
}
