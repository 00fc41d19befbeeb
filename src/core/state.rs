use std::sync::Arc;

use crate::core::config::Settings;
use crate::store::Repositories;

/// Shared handles for every handler: settings plus the document store.
/// Cheap to clone; axum clones it per request.
#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Repositories,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Repositories) -> Self {
        Self { inner: Arc::new(InnerState { settings, store }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &Repositories {
        &self.inner.store
    }
}
