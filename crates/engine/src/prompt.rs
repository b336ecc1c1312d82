//! System prompt assembly.
//!
//! The system message is rebuilt every turn from three parts: the coaching
//! persona, the retrieved reference material, and (on a session's first
//! turn only) a note asking the model to define its key terms.

/// The built-in coaching persona and conversation rules.
pub const DEFAULT_PERSONA: &str = r#"You are a tennis mental performance coach.

You also know "The Inner Game of Tennis" by Timothy Gallwey. Key concepts you can reference when relevant:
- Self 1: The conscious, critical mind that overthinks and judges
- Self 2: The body's natural ability that performs best when trusted
- Quieting Self 1 and trusting Self 2 leads to peak performance

Use your natural coaching style. When Inner Game concepts fit, weave them in - but don't force them.

RULES:
- If asked about something unrelated to tennis, say "I can only help with tennis-related questions."
- Don't end responses with questions like "Does that make sense?" or "What do you think?" - give your advice and let the player respond when they're ready. Only ask a question if you genuinely need more information to help them.
- When the player thanks you or shows appreciation, give a brief encouraging recap of what you discussed and ask "Is there anything else I can help with?"
- When the player indicates they're done (says no, nothing else, that's all, etc.), close warmly with something like "Happy I could help! Let me know how it goes. You got this!"
"#;

/// Appended while the session has not yet had a reply.
pub const KEY_CONCEPTS_NOTE: &str = "\n\nNote: If you mention Self 1 or Self 2, briefly explain what they mean since this player may not know.";

const REFERENCE_HEADER: &str = "\n\n--- REFERENCE MATERIAL (use if relevant) ---\n";
const REFERENCE_FOOTER: &str = "\n---";

/// Builds the system message for a turn.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    persona: String,
}

impl ContextAssembler {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Persona, then the reference block (present even when `context` is
    /// empty), then the key-concepts note when `explain_key_concepts` is set.
    pub fn assemble(&self, context: &str, explain_key_concepts: bool) -> String {
        let mut content = String::with_capacity(
            self.persona.len()
                + REFERENCE_HEADER.len()
                + context.len()
                + REFERENCE_FOOTER.len()
                + KEY_CONCEPTS_NOTE.len(),
        );
        content.push_str(&self.persona);
        content.push_str(REFERENCE_HEADER);
        content.push_str(context);
        content.push_str(REFERENCE_FOOTER);

        if explain_key_concepts {
            content.push_str(KEY_CONCEPTS_NOTE);
        }

        content
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}
