//! Application state shared by every request.

use crate::auth::AuthGate;
use crate::services::IngestionPipeline;
use crate::utils::cookies::CookieSettings;
use std::sync::Arc;

/// Built once at startup; immutable afterwards.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    /// `None` when the OAuth gate is disabled.
    pub auth: Option<Arc<AuthGate>>,
    pub cookies: CookieSettings,
}
