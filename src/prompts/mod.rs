pub mod config;
pub mod gemini;
pub mod instructions;
pub mod interface;
pub mod openai;
pub mod service;

pub use config::{PromptGenConfig, PromptProviderConfig};
pub use interface::{PromptGenError, PromptGenProvider, PromptGenerator, PromptRequest};
pub use service::PromptService;
