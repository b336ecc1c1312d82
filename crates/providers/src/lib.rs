//! LLM provider implementations for RallyCoach.
//!
//! All providers implement the `rallycoach_core::Provider` trait.
//! The router selects the chat and embedding providers from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
