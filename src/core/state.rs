use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::notifications::ResultNotifier;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    notifier: ResultNotifier,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, notifier: ResultNotifier) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, notifier }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn notifier(&self) -> &ResultNotifier {
        &self.inner.notifier
    }
}
