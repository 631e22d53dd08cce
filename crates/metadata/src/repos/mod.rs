//! Repository traits for metadata operations.

pub mod submissions;

pub use submissions::{ListQuery, LockOutcome, ReplaceFn, SubmissionRepo};
