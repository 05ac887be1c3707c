pub mod cookies;
pub mod filename;
pub mod html;
