//! # RallyCoach Core
//!
//! Domain types, traits, and error definitions for the RallyCoach
//! retrieval-augmented chat assistant. This crate has **no framework
//! dependencies**; it defines the model every other crate implements against.
//!
//! The three remote collaborators of a chat turn live here as traits:
//! - [`Provider`] covers both the completion client and the embedding client
//! - [`VectorIndex`] is the nearest-neighbour passage lookup
//!
//! Concrete implementations live in `rallycoach-providers` and
//! `rallycoach-retrieval`, which keeps the engine testable with stubs.

pub mod error;
pub mod event;
pub mod index;
pub mod message;
pub mod provider;

pub use error::{Error, IndexError, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use index::VectorIndex;
pub use message::{Message, Role};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage};
