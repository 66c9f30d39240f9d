pub mod config;
pub mod google;
pub mod interface;
pub mod openai;
pub mod service;

pub use config::{ImageGenProviderConfig, ImageGenSystemConfig};
pub use interface::{
    ErrorKind, ImageGenError, ImageGenParams, ImageGenProvider, ImageGenResponse, ImageGenResult,
    ImageGenerator,
};
pub use service::ImageGenService;
