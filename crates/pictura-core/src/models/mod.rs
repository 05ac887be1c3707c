//! Data models for the application
//!
//! Organized by domain: caption results produced by the generator and the
//! image details returned by the retrieval path.

mod caption;
mod image_details;

pub use caption::*;
pub use image_details::*;
