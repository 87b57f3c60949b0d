use rl_core::storage::ReadingStorage;
use std::sync::Arc;

use crate::chat::ChatLog;

/// Shared per-process state, built once at startup and handed to every
/// handler.
pub struct AppState {
    pub storage: Arc<dyn ReadingStorage>,
    pub chat: ChatLog,
}
