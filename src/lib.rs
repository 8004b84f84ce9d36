//! # mockup-studio
//!
//! Turns a transparent-background design into a batch of AI-composited
//! mockups (t-shirt, billboard, packaging, ...) and tracks every result slot
//! independently, so one mockup can be remade without disturbing the rest.
//!
//! ## Features
//!
//! - **Batch generation**: one service call produces N slots, applied in
//!   request order in a single transition
//! - **Single-slot remakes**: regenerate mockup #N while the others keep
//!   their state; remakes on different slots may run concurrently
//! - **In-flight guards**: a second batch, a batch during remakes, or a
//!   duplicate remake of the same slot is rejected, never queued
//! - **One error message per operation**, scoped to the batch or to a slot
//! - **Snapshots** published on a `tokio::sync::watch` channel after every
//!   transition
//! - **Pluggable service** via the [`GenerationClient`] trait, with a
//!   `reqwest`-based [`HttpGenerationClient`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use mockup_studio::{MockupSession, StudioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StudioConfig::builder()
//!         .with_endpoint("http://127.0.0.1:8787")
//!         .with_batch_size(4)
//!         .build()?;
//!     let session = MockupSession::from_config(config);
//!
//!     session.upload_png(&std::fs::read("logo.png")?, "image/png")?;
//!     session.select_category("billboard")?;
//!     session.set_prompt("night, city lights");
//!
//!     session.generate().await?;
//!     for slot in session.snapshot().slots {
//!         println!("mockup #{}: {:?}", slot.ordinal, slot.status);
//!     }
//!
//!     // Not happy with the third one
//!     session.remake(2).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod image;
pub mod request;
pub mod session;
pub mod slots;
pub mod surface;

pub use catalog::{Category, CATEGORIES};
pub use client::{GenerationClient, HttpGenerationClient};
pub use config::{StudioConfig, StudioConfigBuilder, DEFAULT_BATCH_SIZE};
pub use download::DownloadArtifact;
pub use error::{GenerationError, IntakeError, MockupError, Result, ValidationError};
pub use image::ImagePayload;
pub use request::{GenerationRequest, GenerationRequestBuilder};
pub use session::{MockupSession, SessionSnapshot, SlotView};
pub use slots::{BatchTicket, RemakeApplied, RemakeTicket, ResultSlot, SlotBoard, SlotStatus};
pub use surface::{ErrorNotice, ErrorScope, ErrorSurface};
