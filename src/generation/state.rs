//! State of the current generation

use crate::models::Flashcard;
use crate::models::PartialDeck;

/// What a [`StreamingClient`](super::StreamingClient) publishes.
///
/// `generation` identifies the submission the rest of the fields belong
/// to; it is 0 before anything was submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationState {
    pub generation: u64,
    pub partial_result: PartialDeck,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::idle()
    }
}

impl GenerationState {
    pub fn idle() -> Self {
        Self {
            generation: 0,
            partial_result: PartialDeck::empty(),
            is_loading: false,
            error: None,
        }
    }

    /// Fresh state for a submission that just started
    pub fn started(generation: u64) -> Self {
        Self {
            generation,
            partial_result: PartialDeck::empty(),
            is_loading: true,
            error: None,
        }
    }

    /// Renderable cards so far
    pub fn cards(&self) -> Vec<Flashcard> {
        self.partial_result.complete_cards()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_state() {
        let state = GenerationState::started(3);
        assert_eq!(state.generation, 3);
        assert!(state.is_loading);
        assert_eq!(state.partial_result, PartialDeck::empty());
        assert!(state.cards().is_empty());
        assert!(!state.has_error());
    }

    #[test]
    fn test_idle_state() {
        let state = GenerationState::default();
        assert_eq!(state.generation, 0);
        assert!(!state.is_loading);
    }
}
