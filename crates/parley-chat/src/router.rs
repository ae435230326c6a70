//! Keyword-driven intent classification.
//!
//! Pure over the configured keyword sets, so the router is trivially
//! testable and the whole vocabulary can be swapped for another locale
//! through configuration.

use tracing::debug;

use parley_core::config::RouterConfig;
use parley_core::types::Intent;

/// Classifies one utterance into an [`Intent`].
///
/// Session-control words (exit, restart) match the whole trimmed utterance
/// case-insensitively; capability triggers match as case-insensitive
/// substrings. Precedence on conflict: Exit > Restart > GenerateImage >
/// DescribeScene > Query.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    config: RouterConfig,
}

impl IntentRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Classify an utterance.
    ///
    /// Only the zero-length utterance is `Empty`; whitespace counts as
    /// content and classifies as `Query`.
    pub fn classify(&self, utterance: &str) -> Intent {
        if utterance.is_empty() {
            return Intent::Empty;
        }

        let normalized = utterance.trim().to_lowercase();
        let intent = if word_match(&self.config.exit_words, &normalized) {
            Intent::Exit
        } else if word_match(&self.config.restart_words, &normalized) {
            Intent::Restart
        } else if trigger_match(&self.config.generate_triggers, &normalized) {
            Intent::GenerateImage
        } else if trigger_match(&self.config.describe_triggers, &normalized) {
            Intent::DescribeScene
        } else {
            Intent::Query
        };

        debug!(?intent, "Classified utterance");
        intent
    }

    /// Whether `text` asks for the imagine-the-scene overlay.
    ///
    /// Checked against both the user's utterance and the assistant's reply,
    /// so the overlay also fires when the model itself proposes imagining
    /// the scene.
    pub fn wants_overlay(&self, text: &str) -> bool {
        trigger_match(&self.config.imagine_triggers, &text.to_lowercase())
    }
}

/// Session-control word match, case-insensitively.
///
/// A word matches when it equals the whole trimmed utterance or its leading
/// token (trailing punctuation ignored). The leading-token rule lets a
/// command carry a trailer ("sair, gerar imagem" still exits) without
/// hijacking sentences that merely mention the word ("como sair dessa
/// situação?" stays a query).
fn word_match(words: &[String], normalized: &str) -> bool {
    let leading = normalized
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| !c.is_alphanumeric());
    words.iter().any(|w| {
        let w = w.to_lowercase();
        w == normalized || w == leading
    })
}

/// Substring match against a trigger list, case-insensitively.
fn trigger_match(triggers: &[String], normalized: &str) -> bool {
    triggers.iter().any(|t| normalized.contains(&t.to_lowercase()))
}
