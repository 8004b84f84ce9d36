use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::catalog::Category;
use crate::client::{GenerationClient, HttpGenerationClient};
use crate::config::StudioConfig;
use crate::download::DownloadArtifact;
use crate::error::{MockupError, Result, ValidationError};
use crate::image::ImagePayload;
use crate::request::GenerationRequest;
use crate::slots::{RemakeApplied, ResultSlot, SlotBoard, SlotStatus};
use crate::surface::{ErrorNotice, MISSING_INPUTS_MESSAGE};

/// Live user selections feeding the next request.
#[derive(Debug, Clone, Default)]
struct Selections {
    image: Option<ImagePayload>,
    category: Option<Category>,
    prompt: String,
}

impl Selections {
    fn is_complete(&self) -> bool {
        self.image.is_some() && self.category.is_some()
    }

    fn request(&self, count: u32) -> std::result::Result<GenerationRequest, ValidationError> {
        let mut builder = GenerationRequest::builder()
            .prompt(self.prompt.clone())
            .count(count);
        if let Some(image) = &self.image {
            builder = builder.image(image.clone());
        }
        if let Some(category) = self.category {
            builder = builder.category(category);
        }
        builder.build()
    }
}

/// Display-facing view of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub index: usize,
    pub ordinal: usize,
    pub status: SlotStatus,
    /// True while a request for this slot is in flight.
    pub busy: bool,
    pub image: Option<ImagePayload>,
}

impl From<&ResultSlot> for SlotView {
    fn from(slot: &ResultSlot) -> Self {
        Self {
            index: slot.index(),
            ordinal: slot.ordinal(),
            status: slot.status(),
            busy: slot.is_busy(),
            image: slot.image().cloned(),
        }
    }
}

/// A consistent view of the session after one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub slots: Vec<SlotView>,
    /// A batch generation is in flight.
    pub generating: bool,
    /// Image and category are selected and no batch is in flight.
    pub can_generate: bool,
    pub error: Option<ErrorNotice>,
}

impl SessionSnapshot {
    fn capture(selections: &Selections, board: &SlotBoard) -> Self {
        Self {
            slots: board.slots().iter().map(SlotView::from).collect(),
            generating: board.is_generating(),
            can_generate: selections.is_complete() && !board.is_generating(),
            error: board.error().cloned(),
        }
    }
}

/// Orchestrates batch generation and single-slot remakes for one user session.
///
/// All methods take `&self`: a batch, or several remakes on different slots,
/// can be awaited concurrently (e.g. with `tokio::join!`). Locks are only
/// held while a transition is applied, never across the service call.
///
/// # Example
/// ```no_run
/// use mockup_studio::{MockupSession, StudioConfig};
///
/// # async fn example(png: Vec<u8>) -> mockup_studio::Result<()> {
/// let session = MockupSession::from_config(StudioConfig::default());
/// session.upload_png(&png, "image/png")?;
/// session.select_category("t-shirt")?;
/// session.set_prompt("dark fabric, studio light");
///
/// session.generate().await?;
/// session.remake(2).await?;
///
/// let file = session.download(2)?;
/// std::fs::write(&file.file_name, &file.bytes).unwrap();
/// # Ok(())
/// # }
/// ```
pub struct MockupSession<C> {
    client: C,
    config: StudioConfig,
    selections: Mutex<Selections>,
    board: Mutex<SlotBoard>,
    updates: watch::Sender<SessionSnapshot>,
}

impl MockupSession<HttpGenerationClient> {
    /// Create a session talking to the HTTP service named in `config`.
    pub fn from_config(config: StudioConfig) -> Self {
        let client = HttpGenerationClient::from_config(&config);
        Self::new(client, config)
    }
}

impl<C> MockupSession<C> {
    // Lock order is always selections, then board.
    fn selections(&self) -> MutexGuard<'_, Selections> {
        self.selections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn board(&self) -> MutexGuard<'_, SlotBoard> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, selections: &Selections, board: &SlotBoard) {
        self.updates
            .send_replace(SessionSnapshot::capture(selections, board));
    }
}

/// Which operation an [`InFlight`] guard rolls back.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Batch,
    Remake(usize),
}

/// Rolls an operation back when its future is dropped while the service
/// call is outstanding, so no slot stays Pending without a call behind it.
struct InFlight<'a, C> {
    session: &'a MockupSession<C>,
    operation: Operation,
    armed: bool,
}

impl<'a, C> InFlight<'a, C> {
    fn new(session: &'a MockupSession<C>, operation: Operation) -> Self {
        Self {
            session,
            operation,
            armed: true,
        }
    }

    /// The call returned; its outcome will be applied normally.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let selections = self.session.selections();
        let mut board = self.session.board();
        let rolled_back = match self.operation {
            Operation::Batch => board.abandon_batch(),
            Operation::Remake(index) => board.abandon_remake(index),
        };
        if rolled_back {
            self.session.publish(&selections, &board);
            tracing::warn!(operation = ?self.operation, "operation cancelled before completion");
        }
    }
}

impl<C: GenerationClient> MockupSession<C> {
    pub fn new(client: C, config: StudioConfig) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            client,
            config,
            selections: Mutex::new(Selections::default()),
            board: Mutex::new(SlotBoard::new()),
            updates,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// The current state of every slot, the busy flags and the error message.
    pub fn snapshot(&self) -> SessionSnapshot {
        let selections = self.selections();
        let board = self.board();
        SessionSnapshot::capture(&selections, &board)
    }

    /// Receive a new snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    // ── Selections ──────────────────────────────────────────────────

    /// Replace the source image with one that already passed intake.
    /// Clears the current error message; existing results are kept.
    pub fn upload_image(&self, image: ImagePayload) {
        let mut selections = self.selections();
        let mut board = self.board();
        selections.image = Some(image);
        board.clear_error();
        self.publish(&selections, &board);
    }

    /// Run intake on raw file bytes and use them as the source image.
    ///
    /// A non-PNG or empty file is rejected and the session is left untouched.
    pub fn upload_png(&self, bytes: &[u8], mime_type: &str) -> Result<()> {
        let image = ImagePayload::from_png_bytes(bytes, mime_type).map_err(|e| {
            tracing::warn!(error = %e, "upload rejected by intake");
            e
        })?;
        self.upload_image(image);
        Ok(())
    }

    pub fn set_category(&self, category: Category) {
        let mut selections = self.selections();
        selections.category = Some(category);
        let board = self.board();
        self.publish(&selections, &board);
    }

    /// Select a category by id from the fixed table.
    pub fn select_category(&self, id: &str) -> Result<&'static Category> {
        let category = Category::parse(id)?;
        self.set_category(*category);
        Ok(category)
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.selections().prompt = prompt.into();
    }

    pub fn image(&self) -> Option<ImagePayload> {
        self.selections().image.clone()
    }

    pub fn category(&self) -> Option<Category> {
        self.selections().category
    }

    pub fn prompt(&self) -> String {
        self.selections().prompt.clone()
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Generate a fresh batch of `batch_size` mockups, replacing all slots.
    ///
    /// Rejected without a service call when a batch or remake is in flight,
    /// or when the image or category is missing (the latter also sets the
    /// instructive message). On failure the slots are emptied and the global
    /// failure message is set; the error is also returned.
    pub async fn generate(&self) -> Result<()> {
        let count = self.config.batch_size;
        let (ticket, request) = {
            let selections = self.selections();
            let mut board = self.board();
            if let Err(e) = board.check_batch() {
                tracing::warn!(error = %e, "batch generation rejected");
                return Err(e.into());
            }
            let request = match selections.request(count) {
                Ok(request) => request,
                Err(e) => {
                    board.reject(MISSING_INPUTS_MESSAGE);
                    self.publish(&selections, &board);
                    tracing::warn!(error = %e, "batch generation rejected");
                    return Err(e.into());
                }
            };
            let ticket = board.start_batch(count as usize)?;
            self.publish(&selections, &board);
            (ticket, request)
        };

        tracing::info!(
            count,
            category = request.category().name,
            "batch generation started"
        );
        let in_flight = InFlight::new(self, Operation::Batch);
        let outcome = self.client.generate(&request).await;
        in_flight.disarm();

        let result = {
            let selections = self.selections();
            let mut board = self.board();
            let result = board.complete_batch(ticket, outcome);
            self.publish(&selections, &board);
            result
        };

        match result {
            Ok(()) => {
                tracing::info!(count, "batch generation completed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch generation failed");
                Err(e.into())
            }
        }
    }

    /// Regenerate the mockup at `index` without touching any other slot.
    ///
    /// Uses the current selections with a count of one. Rejected while a
    /// batch is in flight or while `index` is already being remade. On
    /// failure only this slot becomes Failed and the message names its
    /// ordinal.
    pub async fn remake(&self, index: usize) -> Result<RemakeApplied> {
        let (ticket, request) = {
            let selections = self.selections();
            let mut board = self.board();
            if let Err(e) = board.check_remake(index) {
                tracing::warn!(index, error = %e, "remake rejected");
                return Err(e.into());
            }
            let request = match selections.request(1) {
                Ok(request) => request,
                Err(e) => {
                    board.reject(MISSING_INPUTS_MESSAGE);
                    self.publish(&selections, &board);
                    tracing::warn!(index, error = %e, "remake rejected");
                    return Err(e.into());
                }
            };
            let ticket = board.start_remake(index)?;
            self.publish(&selections, &board);
            (ticket, request)
        };

        tracing::info!(index, "remake started");
        let in_flight = InFlight::new(self, Operation::Remake(index));
        let outcome = self.client.generate(&request).await;
        in_flight.disarm();

        let result = {
            let selections = self.selections();
            let mut board = self.board();
            let result = board.complete_remake(ticket, outcome);
            self.publish(&selections, &board);
            result
        };

        match result {
            Ok(applied) => {
                if applied == RemakeApplied::Unchanged {
                    tracing::warn!(index, "remake returned no image, slot left unchanged");
                } else {
                    tracing::info!(index, "remake completed");
                }
                Ok(applied)
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "remake failed");
                Err(e.into())
            }
        }
    }

    /// Decoded image and suggested file name for a Ready slot.
    pub fn download(&self, index: usize) -> Result<DownloadArtifact> {
        let image = {
            let board = self.board();
            match board.slot(index) {
                Some(slot) if slot.status() == SlotStatus::Ready => slot.image().cloned(),
                Some(_) => None,
                None => {
                    return Err(ValidationError::SlotOutOfRange {
                        index,
                        len: board.len(),
                    }
                    .into())
                }
            }
        };
        let image = image.ok_or(MockupError::Validation(ValidationError::SlotNotReady {
            index,
        }))?;
        DownloadArtifact::new(&image, &self.config.filename_prefix, chrono::Utc::now()).map_err(
            |e| MockupError::Download {
                index,
                reason: e.to_string(),
            },
        )
    }
}
