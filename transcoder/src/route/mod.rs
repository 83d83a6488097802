use std::sync::Arc;

use crate::overlay::OverlayStore;
use crate::session::SessionManager;

pub mod overlay;
pub mod session;
pub mod stream;

#[derive(Clone)]
pub struct AppState {
    pub session_manager: Arc<SessionManager>,
    pub overlays: Arc<dyn OverlayStore>,
}
