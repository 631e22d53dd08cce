//! Core domain types and shared logic for the courier submission service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Submission lifecycle states and the legal transitions between them
//! - Object-store summaries for uploaded submission archives
//! - Routing metadata captured from submit requests
//! - Callback URL validation rules
//! - Application configuration

pub mod callback_url;
pub mod config;
pub mod error;
pub mod submission;

pub use callback_url::{CallbackUrlError, validate_callback_url};
pub use error::{Error, Result};
pub use submission::{ObjectSummary, SubmissionMetadata, SubmissionStatus};

/// Name of the PDF entry inside a submission archive.
pub const PDF_ENTRY_NAME: &str = "form.pdf";

/// Name of the routing metadata entry inside a submission archive.
pub const METADATA_ENTRY_NAME: &str = "metadata.xml";
