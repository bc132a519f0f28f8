//! Streaming client for the generation endpoint
//!
//! A [`StreamingClient`] runs at most one generation at a time. Each
//! submission posts the request, feeds the response body into a
//! [`PartialJsonDecoder`] and publishes a fresh [`GenerationState`]
//! through a `watch` channel whenever the decoded deck changes.
//!
//! - `submit` while a stream is running cancels it and starts over
//! - `stop` cancels without touching what was already published
//! - the observer hears about completion or failure, never about a stop

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use super::GenerationForm;
use super::GenerationState;
use super::Notice;
use crate::api::types::ErrorResponse;
use crate::config::AppConfig;
use crate::errors::FlashgenError;
use crate::models::FlashcardDeck;
use crate::models::GenerationRequest;
use crate::models::PartialDeck;
use crate::partial_json::PartialJsonDecoder;
use crate::settings::Settings;
use crate::Result;

/// Route of the generation endpoint, relative to the server root
pub const GENERATE_PATH: &str = "api/generate-flashcards";

/// Completion callbacks. Both default to doing nothing.
pub trait GenerationObserver: Send + Sync {
    fn on_finish(&self, _deck: &FlashcardDeck) {}

    fn on_error(&self, _error: &FlashgenError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

struct ActiveGeneration {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StreamingClient {
    http: reqwest::Client,
    url: Url,
    state: Arc<watch::Sender<GenerationState>>,
    active: Mutex<Option<ActiveGeneration>>,
    next_id: AtomicU64,
    observer: Arc<dyn GenerationObserver>,
}

impl StreamingClient {
    /// Client for the server rooted at `endpoint`
    pub fn new(endpoint: &str) -> Result<Self> {
        let url = generation_url(endpoint)?;
        let (state, _) = watch::channel(GenerationState::idle());
        Ok(Self {
            http: reqwest::Client::new(),
            url,
            state: Arc::new(state),
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.client_endpoint())
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Start a generation and return its id. Any generation still in
    /// flight is cancelled first. Must be called inside a Tokio runtime.
    pub fn submit(&self, request: GenerationRequest) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            if !previous.task.is_finished() {
                info!("Generation {} superseded by {id}", previous.id);
            }
            previous.cancel.cancel();
        }

        self.state.send_replace(GenerationState::started(id));
        info!(
            "Submitting request for topic: {} ({} cards, {})",
            request.topic, request.num_flashcards, request.grade_level
        );

        let run = GenerationRun {
            id,
            http: self.http.clone(),
            url: self.url.clone(),
            request,
            cancel: cancel.clone(),
            state: Arc::clone(&self.state),
            observer: Arc::clone(&self.observer),
        };
        let task = tokio::spawn(run.execute());

        *active = Some(ActiveGeneration { id, cancel, task });
        id
    }

    /// Validate the form against the stored settings and submit it.
    /// A validation failure comes back as an error notice and nothing is
    /// sent; the current state is left untouched.
    pub fn submit_form(
        &self,
        form: &GenerationForm,
        settings: &Settings,
    ) -> std::result::Result<u64, Notice> {
        match form.build_request(settings) {
            Ok(request) => Ok(self.submit(request)),
            Err(e) => {
                debug!("Generation not submitted: {e}");
                Err(Notice::from(e))
            }
        }
    }

    /// Abort the in-flight stream. Cards already published stay; no
    /// callback fires. Returns whether anything was loading.
    pub fn stop(&self) -> bool {
        let Some(active) = self.lock_active().take() else {
            return false;
        };
        active.cancel.cancel();

        let stopped = self.state.send_if_modified(|state| {
            if state.generation == active.id && state.is_loading {
                state.is_loading = false;
                true
            } else {
                false
            }
        });
        if stopped {
            info!("Generation {} stopped", active.id);
        }
        stopped
    }

    /// Receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// Latest published state
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Wait until nothing is loading and return the state at that point
    pub async fn finished(&self) -> GenerationState {
        let mut receiver = self.state.subscribe();
        let settled = receiver.wait_for(|state| !state.is_loading).await;
        match settled {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveGeneration>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StreamingClient {
    fn drop(&mut self) {
        if let Some(active) = self.lock_active().take() {
            active.cancel.cancel();
        }
    }
}

fn generation_url(endpoint: &str) -> Result<Url> {
    let mut base = Url::parse(endpoint)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(GENERATE_PATH)?)
}

/// Everything one spawned generation needs
struct GenerationRun {
    id: u64,
    http: reqwest::Client,
    url: Url,
    request: GenerationRequest,
    cancel: CancellationToken,
    state: Arc<watch::Sender<GenerationState>>,
    observer: Arc<dyn GenerationObserver>,
}

impl GenerationRun {
    async fn execute(self) {
        let outcome = tokio::select! {
            () = self.cancel.cancelled() => {
                debug!("Generation {} cancelled", self.id);
                return;
            }
            outcome = self.stream() => outcome,
        };

        match outcome {
            Ok(deck) => {
                let published = self.publish(|state| {
                    state.partial_result = PartialDeck::from_deck(&deck);
                    state.is_loading = false;
                    true
                });
                if published {
                    info!("Generation {} finished with {} cards", self.id, deck.flashcards.len());
                    self.observer.on_finish(&deck);
                }
            }
            Err(e) => {
                let message = e.to_string();
                let published = self.publish(|state| {
                    state.is_loading = false;
                    state.error = Some(message);
                    true
                });
                if published {
                    warn!("Error generating flashcards: {e}");
                    self.observer.on_error(&e);
                }
            }
        }
    }

    async fn stream(&self) -> Result<FlashcardDeck> {
        let response = self.http.post(self.url.clone()).json(&self.request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|error| error.error)
                .unwrap_or(body);
            return Err(FlashgenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut decoder = PartialJsonDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            decoder.push(&chunk?);
            if let Some(value) = decoder.snapshot() {
                let deck = PartialDeck::from_value(&value);
                self.publish(|state| {
                    if state.partial_result == deck {
                        false
                    } else {
                        state.partial_result = deck;
                        true
                    }
                });
            }
        }

        debug!("Generation {} stream closed after {} bytes", self.id, decoder.text().len());
        let value = decoder.finalize()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Apply `update` if this run is still the current one and was not
    /// cancelled. Returns whether it was applied.
    fn publish(&self, update: impl FnOnce(&mut GenerationState) -> bool) -> bool {
        let mut current = false;
        self.state.send_if_modified(|state| {
            if state.generation != self.id || self.cancel.is_cancelled() {
                return false;
            }
            current = true;
            update(state)
        });
        current
    }
}
