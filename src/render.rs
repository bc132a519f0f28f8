//! Incremental rendering of a deck that is still streaming in
//!
//! [`IncrementalRenderer`] turns each published [`GenerationState`] into a
//! [`RenderFrame`]: the complete cards in arrival order, whether the
//! "generating" placeholder shows, which cards are new, and whether the
//! view should scroll. [`TerminalRenderer`] draws frames as appended
//! text.

use std::io;
use std::io::Write;
use std::ops::Range;
use std::time::Duration;

use crate::cli::output::truncate_str;
use crate::generation::GenerationState;
use crate::models::Flashcard;

/// Wait before scrolling so the new card has been laid out
pub const SCROLL_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Placeholder tile text while more cards are coming
pub const PLACEHOLDER_TEXT: &str = "Generating...";

/// Shown while loading before the deck itself has started
pub const PENDING_TEXT: &str = "Generating flashcards...";

/// Scroll to the bottom once `delay` has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub generation: u64,
    pub cards: Vec<Flashcard>,
    /// The decoded document has a `flashcards` list, possibly empty
    pub has_deck: bool,
    pub show_placeholder: bool,
    /// Indices into `cards` that were not in any earlier frame
    pub new_cards: Range<usize>,
    pub scroll: Option<ScrollRequest>,
}

impl RenderFrame {
    /// "Generated N flashcards", with " (streaming...)" while loading
    pub fn status_line(&self) -> Option<String> {
        if self.has_deck {
            let suffix = if self.show_placeholder {
                " (streaming...)"
            } else {
                ""
            };
            Some(format!("Generated {} flashcards{suffix}", self.cards.len()))
        } else if self.show_placeholder {
            Some(PENDING_TEXT.to_string())
        } else {
            None
        }
    }
}

/// Tracks the largest card count seen in the current generation
#[derive(Debug, Default, Clone)]
pub struct IncrementalRenderer {
    generation: u64,
    max_count: usize,
}

impl IncrementalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, state: &GenerationState) -> RenderFrame {
        if state.generation != self.generation {
            self.generation = state.generation;
            self.max_count = 0;
        }

        let cards = state.cards();
        let previous = self.max_count;
        let scroll = if cards.len() > previous {
            self.max_count = cards.len();
            Some(ScrollRequest {
                delay: SCROLL_SETTLE_DELAY,
            })
        } else {
            None
        };

        RenderFrame {
            generation: state.generation,
            new_cards: previous.min(cards.len())..cards.len(),
            has_deck: state.partial_result.flashcards.is_some(),
            show_placeholder: state.is_loading,
            cards,
            scroll,
        }
    }
}

/// Appends cards to a writer as they settle.
///
/// While loading, the last complete card may still be growing (its
/// definition is streaming), so it is held back until a later card
/// exists or loading ends.
pub struct TerminalRenderer<W: Write> {
    out: W,
    renderer: IncrementalRenderer,
    generation: u64,
    printed: usize,
    pending_shown: bool,
    width: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            renderer: IncrementalRenderer::new(),
            generation: 0,
            printed: 0,
            pending_shown: false,
            width: 400,
        }
    }

    /// Truncate definitions longer than `width` characters
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn update(&mut self, state: &GenerationState) -> RenderFrame {
        self.renderer.update(state)
    }

    pub fn draw(&mut self, frame: &RenderFrame) -> io::Result<()> {
        if frame.generation != self.generation {
            self.generation = frame.generation;
            self.printed = 0;
            self.pending_shown = false;
        }

        if frame.show_placeholder && !self.pending_shown {
            writeln!(self.out, "{PLACEHOLDER_TEXT}")?;
            self.pending_shown = true;
        }

        let settled = if frame.show_placeholder {
            frame.cards.len().saturating_sub(1)
        } else {
            frame.cards.len()
        };
        for (index, card) in frame.cards.iter().enumerate().take(settled).skip(self.printed) {
            writeln!(self.out, "{:>3}. {}", index + 1, card.word)?;
            writeln!(self.out, "     {}", truncate_str(&card.definition, self.width))?;
        }
        self.printed = self.printed.max(settled);

        if !frame.show_placeholder {
            if let Some(status) = frame.status_line() {
                writeln!(self.out, "{status}")?;
            }
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
