//! HTTP handlers.

mod admin;
mod common;
mod sdes;
mod submissions;

pub use admin::{get_submission, list_submissions};
pub use common::health_check;
pub use sdes::sdes_callback;
pub use submissions::submit;
