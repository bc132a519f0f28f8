//! Flashcard generation from the terminal

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::output::print_error;
use crate::cli::output::print_info;
use crate::cli::output::print_notice;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::errors::FlashgenError;
use crate::export::DirectorySaver;
use crate::export::ExportPanel;
use crate::export::Osc52Clipboard;
use crate::export::FORMAT_HINT;
use crate::generation::GenerationForm;
use crate::generation::GenerationObserver;
use crate::generation::Notice;
use crate::generation::StreamingClient;
use crate::models::FlashcardDeck;
use crate::models::GradeLevel;
use crate::render::TerminalRenderer;
use crate::settings::CachedSettings;
use crate::settings::FileSettingsStore;
use crate::AppConfig;
use crate::Result;

/// Options of the `generate` command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub topic: String,
    pub count: i64,
    pub grade: GradeLevel,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub download: Option<PathBuf>,
    pub copy: bool,
}

/// Forwards completion notices to the command loop
struct NoticeChannel(mpsc::UnboundedSender<Notice>);

impl GenerationObserver for NoticeChannel {
    fn on_finish(&self, deck: &FlashcardDeck) {
        let _ = self.0.send(Notice::generated(deck.flashcards.len()));
    }

    fn on_error(&self, error: &FlashgenError) {
        debug!("Generation failed: {error}");
        let _ = self.0.send(Notice::failed());
    }
}

pub async fn handle_generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let mut settings = CachedSettings::open(Box::new(FileSettingsStore::new(
        &config.client.settings_path,
    )))?;
    if let Some(key) = &args.api_key {
        if settings.set_api_key(key.trim())? {
            print_info("API key saved for later runs");
        }
    }

    let form = GenerationForm::new(args.topic, args.count, args.grade);
    let endpoint = args
        .endpoint
        .as_deref()
        .unwrap_or_else(|| config.client_endpoint());
    let (notices_tx, mut notices) = mpsc::unbounded_channel();
    let client =
        StreamingClient::new(endpoint)?.with_observer(Arc::new(NoticeChannel(notices_tx)));

    let mut updates = client.subscribe();
    if let Err(notice) = client.submit_form(&form, settings.get()) {
        print_notice(&notice);
        return Ok(());
    }

    println!(
        "📚 {} flashcards about \"{}\" ({})",
        form.num_flashcards(),
        form.topic.trim(),
        form.grade_level.label()
    );
    println!();

    let mut terminal = TerminalRenderer::new(io::stdout());
    let mut stopped = false;
    let final_state = loop {
        let state = updates.borrow_and_update().clone();
        let frame = terminal.update(&state);
        if let Some(scroll) = frame.scroll {
            tokio::time::sleep(scroll.delay).await;
        }
        terminal.draw(&frame)?;
        if !state.is_loading {
            break state;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break client.state();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                stopped = client.stop();
            }
        }
    };

    if stopped {
        print_warning("Generation stopped");
    } else if let Some(notice) = notices.recv().await {
        print_notice(&notice);
    }

    let cards = final_state.cards();
    if cards.is_empty() || (args.download.is_none() && !args.copy) {
        return Ok(());
    }

    println!();
    println!("{FORMAT_HINT}");
    let mut panel = ExportPanel::new(
        Osc52Clipboard::new(io::stdout()),
        DirectorySaver::new(args.download.clone().unwrap_or_else(|| PathBuf::from("."))),
    );

    if args.download.is_some() {
        match panel.download(&cards) {
            Ok(path) => print_success(&format!("Saved {}", path.display())),
            Err(e) => print_error(&format!("Download failed: {e}")),
        }
    }

    if args.copy {
        let now = Instant::now();
        panel.copy(&cards, now)?;
        print_success(panel.copy_label(now));
        if let Some(instructions) = panel.take_instructions() {
            println!();
            println!("{instructions}");
        }
    }

    Ok(())
}
