use super::config::{ImageGenProviderConfig, ImageGenSystemConfig};
use super::google::GoogleImageGenProvider;
use super::interface::{
    ImageGenError, ImageGenParams, ImageGenProvider, ImageGenResponse, ImageGenResult, ImageGenerator,
};
use super::openai::OpenAIImageGenProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ImageGenService {
    providers: Arc<RwLock<HashMap<String, Box<dyn ImageGenProvider>>>>,
    default_provider: Arc<RwLock<Option<String>>>,
    output_dir: PathBuf,
}

impl ImageGenService {
    /// An empty service writing into `output_dir`. Providers are added with
    /// [`ImageGenService::register_provider`].
    pub fn new(output_dir: impl Into<PathBuf>, default_provider: Option<String>) -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            default_provider: Arc::new(RwLock::new(default_provider)),
            output_dir: output_dir.into(),
        }
    }

    pub async fn init_from_config(config: &ImageGenSystemConfig, output_dir: &Path) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            error!(path = %output_dir.display(), error = %e, "failed to create output directory");
        }

        let service = Self::new(output_dir, config.default_provider.clone());

        if !config.enabled {
            info!("image generation is disabled in config");
            return service;
        }

        for provider_config in &config.providers {
            if !provider_config.enabled {
                continue;
            }

            match Self::build_provider(provider_config) {
                Ok(provider) => {
                    info!(provider = %provider.id(), "registering image provider");
                    service.register_provider(provider).await;
                }
                Err(e) => {
                    warn!(
                        provider = %provider_config.id,
                        provider_type = %provider_config.provider_type,
                        error = %e,
                        "failed to build image provider"
                    );
                }
            }
        }

        service
    }

    fn build_provider(config: &ImageGenProviderConfig) -> Result<Box<dyn ImageGenProvider>, ImageGenError> {
        match config.provider_type.as_str() {
            "google" => Ok(Box::new(GoogleImageGenProvider::new(config)?)),
            "openai" => Ok(Box::new(OpenAIImageGenProvider::new(config)?)),
            other => Err(ImageGenError::ConfigError(format!(
                "Unknown provider type: {}",
                other
            ))),
        }
    }

    pub async fn register_provider(&self, provider: Box<dyn ImageGenProvider>) {
        let id = provider.id();
        let mut providers = self.providers.write().await;
        providers.insert(id, provider);
    }

    pub async fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().await;
        let mut ids: Vec<String> = providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn generate(
        &self,
        prompt: String,
        provider_id: Option<String>,
        params: Option<ImageGenParams>,
    ) -> Result<ImageGenResult, ImageGenError> {
        let providers = self.providers.read().await;

        let target_id = match provider_id {
            Some(id) => id,
            None => self
                .default_provider
                .read()
                .await
                .clone()
                .ok_or_else(|| ImageGenError::ConfigError("No default provider configured".to_string()))?,
        };

        let provider = providers
            .get(&target_id)
            .ok_or_else(|| ImageGenError::ProviderNotFound(target_id.clone()))?;

        if !provider.is_available().await {
            return Err(ImageGenError::Unavailable(format!(
                "Provider {} is not available",
                target_id
            )));
        }

        let mut gen_params = params.unwrap_or_else(|| ImageGenParams::for_prompt(""));
        if gen_params.prompt.is_empty() {
            gen_params.prompt = prompt.clone();
        }

        debug!(provider = %target_id, prompt = %prompt, "generating image");

        let response = provider.generate(gen_params).await?;
        let format = resolve_format(&response);

        let filename = format!(
            "{}_{}.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            uuid::Uuid::new_v4(),
            format
        );
        let path = self.output_dir.join(&filename);

        tokio::fs::write(&path, &response.data)
            .await
            .map_err(|e| ImageGenError::GenerationFailed(format!("Failed to save image: {}", e)))?;

        info!(provider = %target_id, path = %path.display(), bytes = response.data.len(), "image saved");

        Ok(ImageGenResult {
            image_url: path.to_string_lossy().to_string(),
            prompt,
            provider_id: target_id,
            format,
        })
    }
}

#[async_trait]
impl ImageGenerator for ImageGenService {
    async fn generate_image(&self, prompt: &str) -> Result<ImageGenResult, ImageGenError> {
        self.generate(prompt.to_string(), None, None).await
    }
}

/// Trust the provider's format when given, otherwise sniff the bytes.
fn resolve_format(response: &ImageGenResponse) -> String {
    if let Some(format) = response.format.as_deref().filter(|f| !f.is_empty()) {
        return format.to_string();
    }
    image::guess_format(&response.data)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("png")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    struct FixedProvider {
        id: &'static str,
        available: bool,
        format: Option<&'static str>,
        data: Vec<u8>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ImageGenProvider for FixedProvider {
        fn id(&self) -> String {
            self.id.to_string()
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn generate(&self, _params: ImageGenParams) -> Result<ImageGenResponse, ImageGenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ImageGenResponse {
                format: self.format.map(str::to_string),
                data: self.data.clone(),
            })
        }
    }

    fn fixed(id: &'static str, format: Option<&'static str>, data: &[u8]) -> (Box<FixedProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(FixedProvider {
            id,
            available: true,
            format,
            data: data.to_vec(),
            calls: calls.clone(),
        });
        (provider, calls)
    }

    #[tokio::test]
    async fn test_generate_writes_file_and_reports_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let service = ImageGenService::new(tmp.path(), Some("fixed".to_string()));
        let (provider, calls) = fixed("fixed", Some("png"), &PNG_MAGIC);
        service.register_provider(provider).await;

        let result = service.generate_image("a red kite").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.prompt, "a red kite");
        assert_eq!(result.provider_id, "fixed");
        assert_eq!(result.format, "png");
        assert!(result.image_url.ends_with(".png"));
        assert_eq!(std::fs::read(&result.image_url).unwrap(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_unknown_format_is_sniffed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let service = ImageGenService::new(tmp.path(), Some("fixed".to_string()));
        let mut jpeg = JPEG_MAGIC.to_vec();
        jpeg.resize(64, 0);
        let (provider, _) = fixed("fixed", None, &jpeg);
        service.register_provider(provider).await;

        let result = service.generate_image("x").await.unwrap();
        assert_eq!(result.format, "jpg");
    }

    #[tokio::test]
    async fn test_no_default_provider_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let service = ImageGenService::new(tmp.path(), None);
        let err = service.generate_image("x").await.unwrap_err();
        assert!(matches!(err, ImageGenError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_missing_provider_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let service = ImageGenService::new(tmp.path(), Some("ghost".to_string()));
        let err = service.generate_image("x").await.unwrap_err();
        assert!(matches!(err, ImageGenError::ProviderNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_not_called() {
        let tmp = tempfile::TempDir::new().unwrap();
        let service = ImageGenService::new(tmp.path(), Some("off".to_string()));
        let calls = Arc::new(AtomicUsize::new(0));
        service
            .register_provider(Box::new(FixedProvider {
                id: "off",
                available: false,
                format: None,
                data: vec![],
                calls: calls.clone(),
            }))
            .await;

        let err = service.generate_image("x").await.unwrap_err();
        assert!(matches!(err, ImageGenError::Unavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_init_skips_providers_without_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = ImageGenSystemConfig::default();
        for provider in &mut config.providers {
            provider.enabled = true;
            provider.api_key = None;
            provider.api_key_env = Some("IMAGE_WEAVER_TEST_NO_SUCH_KEY".to_string());
        }
        config.providers[0].api_key = Some("k".to_string());

        let out = tmp.path().join("images");
        let service = ImageGenService::init_from_config(&config, &out).await;
        assert_eq!(service.list_providers().await, vec!["google".to_string()]);
        assert!(out.is_dir());
    }
}
