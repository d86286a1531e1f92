use std::sync::Arc;

use crate::storage::Storage;

/// Shared application state: handlers hold no state of their own beyond the
/// storage handle.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}
