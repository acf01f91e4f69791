//! # Gallery Ingest
//!
//! The image ingestion and gallery-ordering pipeline behind a content
//! marketplace: games, programs, and blog posts each carry an ordered set
//! of screenshots, and this crate owns everything between "the user picked
//! some files" and "the gallery renders them in order".
//!
//! # Architecture: One Pipeline, Three Seams
//!
//! ```text
//! files ──▶ validate ──▶ transcode ──▶ thumbnail ──▶ upload ──▶ insert row
//!                            │                          │           │
//!                       ImageBackend              ObjectStore  MetadataStore
//! ```
//!
//! Orchestration lives in [`gallery::GalleryManager`]; the pixel work, the
//! blob storage, and the row storage sit behind traits. That split exists
//! for three reasons:
//!
//! - **Testability**: the manager's policies (batch continuation, resync,
//!   degrade-not-fail) are exercised against deterministic fakes without
//!   encoding a single pixel.
//! - **Transport independence**: the hosted storage and database services
//!   are reached through whatever client the embedding application already
//!   has; this crate consumes a logical contract, not a wire format.
//! - **Honest failure design**: nothing here is transactional. Every
//!   recovery path (per-item batch failures, reorder resync, orphan
//!   tolerance) is explicit in the manager, and the [`reconcile`] pass
//!   exists because blobs and rows *will* drift.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Orchestration: upload batches, delete, reorder, text edits, partition cache |
//! | [`imaging`] | Pure-Rust transcoding: dual-bound resize, thumbnailing, degrade-not-fail |
//! | [`object_store`] | Blob storage trait + filesystem and in-memory implementations |
//! | [`metadata_store`] | Row storage trait + in-memory implementation |
//! | [`reconcile`] | Detects and repairs blob/row drift and broken orderings |
//! | [`naming`] | Deterministic storage paths and URL recovery |
//! | [`config`] | `GalleryConfig`: bounds, qualities, size ceiling, bucket |
//! | [`types`] | `GalleryImage` row and owner-partition keys |
//! | [`output`] | Formats pipeline events into user-facing notification lines |
//!
//! # Design Decisions
//!
//! ## JPEG-Only Output
//!
//! Every successfully transcoded variant is JPEG. Marketplace uploads are
//! overwhelmingly screenshots and photographs, one format means one decode
//! path for everything the pipeline wrote, and the quality factors (85 main,
//! 80 thumbnail) keep artifacts invisible at gallery sizes. Files the
//! decoder cannot handle are stored as-is rather than rejected; see below.
//!
//! ## Degrade, Don't Fail
//!
//! A corrupt or exotically-encoded image falls back to the original bytes
//! instead of failing the upload, and a thumbnail that cannot be produced
//! is simply absent. The user's upload succeeding matters more than the
//! optimization applied to it. Only pre-I/O validation (wrong media type,
//! oversized file) rejects a file outright.
//!
//! ## No Transactions, Reconciliation Instead
//!
//! The hosted backend offers per-row atomicity and nothing more. Rather
//! than pretending otherwise, multi-step operations are ordered so the
//! cheap inconsistency survives (an orphaned blob, a briefly gapped
//! ordering) and [`reconcile::reconcile`] sweeps periodically. The one race
//! this does not close: two sessions reordering the same partition can
//! duplicate `display_order` values, which the sweep repairs after the
//! fact.
//!
//! ## Sequential Batches
//!
//! An upload batch processes files one at a time in input order. The
//! storage service bounds throughput anyway, and serial processing makes
//! `display_order` assignment trivially match the order the user picked.

pub mod config;
pub mod gallery;
pub mod imaging;
pub mod metadata_store;
pub mod naming;
pub mod object_store;
pub mod output;
pub mod reconcile;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
