pub mod auth;
pub mod files;
pub mod health;
pub mod image_details;
pub mod index;
