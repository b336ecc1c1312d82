//! The conversational engine behind RallyCoach.
//!
//! One turn runs as:
//!
//! 1. **Resolve** the session (created lazily) and lock it for the turn
//! 2. **Retrieve** passages close to the question (degrades to no context)
//! 3. **Assemble** the system prompt from the persona, passages and the
//!    key-concepts latch
//! 4. **Complete** with the session history and a latch-dependent token budget
//! 5. **Trim** a cut-off trailing sentence and record the exchange
//!
//! Sessions are serialized per id; different sessions run concurrently.

pub mod engine;
pub mod postprocess;
pub mod prompt;
pub mod retriever;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{APOLOGY, ChatEngine, EngineSettings};
pub use postprocess::trim_incomplete_sentence;
pub use prompt::{ContextAssembler, DEFAULT_PERSONA, KEY_CONCEPTS_NOTE};
pub use retriever::{PASSAGE_SEPARATOR, Retriever};
pub use session::{Session, SessionStore};
