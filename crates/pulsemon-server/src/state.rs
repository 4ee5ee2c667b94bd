use std::sync::Arc;

use crate::broadcast::Broadcaster;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
}
