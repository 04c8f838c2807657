use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::code_judge::CodeJudge;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    judge: CodeJudge,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, judge: CodeJudge) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, judge }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn judge(&self) -> &CodeJudge {
        &self.inner.judge
    }
}
