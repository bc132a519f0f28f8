//! Export of finished cards as tab-separated text
//!
//! The text is `word<TAB>definition` per card, cards joined by `\n`,
//! which is what Quizlet's import box expects. Delivery goes through two
//! capabilities so the terminal, a file system and tests can each
//! provide their own: [`Clipboard`] and [`FileSaver`].

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::models::Flashcard;
use crate::Result;

/// Name of the downloaded file
pub const EXPORT_FILENAME: &str = "flashcards.txt";

/// How long the "copied" acknowledgment stays up
pub const COPY_ACK_WINDOW: Duration = Duration::from_secs(2);

pub const FORMAT_HINT: &str = "Format: word\\tdefinition\\nword\\tdefinition";

pub const COPY_LABEL: &str = "Copy to Clipboard";
pub const COPIED_LABEL: &str = "Copied!";

/// Shown once after the first copy
pub const IMPORT_INSTRUCTIONS: &str = "\
How to Import Flashcards in Quizlet
Follow these steps to import your flashcards into Quizlet

Create a new flashcard set
  1. Click on the \"+\" button near the top right
  2. Click \"Flashcard set\"

Import your flashcards
  3. Click the \"+ Import\" button
  4. Paste the info copied from this site into the large text box
  5. Make sure \"Between Term and Definition\" is set to Tab and \"Between cards\" is set to New line
  6. Click \"Import\" at the bottom right";

/// Join cards as `word\tdefinition` lines, in order
pub fn to_tsv(cards: &[Flashcard]) -> String {
    cards
        .iter()
        .map(|card| format!("{}\t{}", card.word, card.definition))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split exported text back into cards. Lines without a tab are skipped.
pub fn parse_tsv(text: &str) -> Vec<Flashcard> {
    text.split('\n')
        .filter_map(|line| line.split_once('\t'))
        .map(|(word, definition)| Flashcard::new(word, definition))
        .collect()
}

/// Somewhere text can be copied to
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Sets the terminal's clipboard with an OSC 52 escape sequence
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        write!(self.out, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Hands a finished file to the user
pub trait FileSaver {
    /// Returns where the file ended up
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf>;
}

/// Writes into a fixed directory
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Keeps saved files in memory
#[derive(Debug, Default)]
pub struct MemorySaver {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySaver {
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FileSaver for MemorySaver {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}

/// Copy and download actions for the current cards
pub struct ExportPanel<C, S> {
    clipboard: C,
    saver: S,
    copied_at: Option<Instant>,
    show_instructions: bool,
}

impl<C: Clipboard, S: FileSaver> ExportPanel<C, S> {
    pub fn new(clipboard: C, saver: S) -> Self {
        Self {
            clipboard,
            saver,
            copied_at: None,
            show_instructions: false,
        }
    }

    /// Copy the cards and open the import instructions
    pub fn copy(&mut self, cards: &[Flashcard], now: Instant) -> Result<()> {
        self.clipboard.write_text(&to_tsv(cards))?;
        self.copied_at = Some(now);
        self.show_instructions = true;
        Ok(())
    }

    /// Whether the copy acknowledgment is still showing at `now`
    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPY_ACK_WINDOW)
    }

    pub fn copy_label(&self, now: Instant) -> &'static str {
        if self.is_copied(now) {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    /// Instructions pending display, cleared once taken
    pub fn take_instructions(&mut self) -> Option<&'static str> {
        std::mem::take(&mut self.show_instructions).then_some(IMPORT_INSTRUCTIONS)
    }

    pub fn download(&self, cards: &[Flashcard]) -> Result<PathBuf> {
        self.saver.save(to_tsv(cards).as_bytes(), EXPORT_FILENAME)
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }
}
