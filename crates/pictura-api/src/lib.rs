//! Pictura API Library
//!
//! HTTP surface of the image captioning service: upload page, image and
//! caption retrieval, and the OAuth gate in front of them.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;
pub mod validation;

pub use error::{ErrorResponse, HttpAppError};
pub use services::{IngestionError, IngestionOutcome, IngestionPipeline};
