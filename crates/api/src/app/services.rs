//! Service wiring: storage, resolver, layout, font and audit trail.

use std::fmt::Display;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use cartaporte_documents::CrtDocument;
use cartaporte_infra::{
    CrtResolver, CrtStore, InMemoryCrtStore, PostgresCrtStore, ResolveError,
};
use cartaporte_observability::{AuditEvent, AuditSink, JsonlAuditLog};
use cartaporte_render::{FontSource, LayoutError, LayoutTable, RenderedPdf, render};

use crate::config::{ApiConfig, StartupError};

pub type SharedStore = Arc<dyn CrtStore>;

pub struct AppServices {
    pub resolver: CrtResolver<SharedStore>,
    layout: LayoutTable,
    font: Option<FontSource>,
    audit: Arc<dyn AuditSink>,
}

impl AppServices {
    /// Validates the form layout once; a broken layout refuses startup.
    pub fn new(
        store: SharedStore,
        audit: Arc<dyn AuditSink>,
        font: Option<FontSource>,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            resolver: CrtResolver::new(store),
            layout: LayoutTable::standard()?,
            font,
            audit,
        })
    }

    /// Render one document. Never fails; font problems degrade to the built-in font.
    pub fn render(&self, doc: &CrtDocument) -> RenderedPdf {
        render(doc, &self.layout, self.font.as_ref())
    }

    /// Append to the audit trail. A failing sink is logged, never surfaced.
    pub fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event) {
            tracing::warn!(error = %e, "audit append failed");
        }
    }

    /// Log and audit a failure before it is returned to the caller.
    pub fn report_failure(&self, msg: &'static str, err: &dyn Display) {
        tracing::error!(error = %err, "{msg}");
        self.audit(AuditEvent::error(msg).with("err", err.to_string()));
    }

    pub fn report_resolve_failure(&self, msg: &'static str, err: &ResolveError) {
        match err {
            ResolveError::NotFound { .. } | ResolveError::InvalidInput(_) => {
                tracing::warn!(error = %err, "{msg}");
                self.audit(AuditEvent::error(msg).with("err", err.to_string()));
            }
            ResolveError::Storage(_) => self.report_failure(msg, err),
        }
    }
}

/// Wire services from configuration.
///
/// With `DATABASE_URL` set the pool is created here and injected into the
/// store; otherwise the in-memory sample store is used.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(config.db_acquire_timeout)
                .connect(url)
                .await
                .map_err(|e| StartupError {
                    code: "ERR_DB_CONNECT",
                    message: format!("failed to connect to Postgres: {e}"),
                })?;
            let store = PostgresCrtStore::connect(pool, config.schema_revision)
                .await
                .map_err(|e| StartupError {
                    code: "ERR_DB_SCHEMA",
                    message: e.to_string(),
                })?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; serving the in-memory sample store");
            Arc::new(InMemoryCrtStore::with_sample_data(config.schema_revision))
        }
    };

    let audit = JsonlAuditLog::open(&config.audit_log_path).map_err(|e| StartupError {
        code: "ERR_AUDIT_LOG",
        message: e.to_string(),
    })?;

    AppServices::new(store, Arc::new(audit), Some(config.font.clone())).map_err(|e| StartupError {
        code: "ERR_INVALID_LAYOUT",
        message: e.to_string(),
    })
}
