pub mod export;
pub mod item;
pub mod orchestrator;
pub mod state;

pub use export::ExportError;
pub use item::{GenerationTicket, ImageItem, ImageStatus, ItemCollection, ItemState, StatusUpdate};
pub use orchestrator::{GenerateOutcome, Session};
pub use state::{SessionError, SessionSnapshot, CRITICAL_NOTICE, EMPTY_ARTICLE, GENERATION_FAILED};

#[cfg(test)]
mod tests;
