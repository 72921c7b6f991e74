//! Event ledger repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use sqlx::types::Json;
use uuid::Uuid;

use docflow_core::error::{AppError, ErrorKind};
use docflow_core::result::AppResult;
use docflow_core::types::{DocumentId, EventId};
use docflow_entity::document::DocumentStatus;
use docflow_entity::event::{DocumentEvent, NewEvent};

/// Append-only storage of ledger events.
#[async_trait]
pub trait EventRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert the event and refresh the document's cached last event and
    /// status, atomically. Versioned types are numbered inside the same
    /// transaction.
    async fn append(&self, event: &NewEvent, status: DocumentStatus) -> AppResult<DocumentEvent>;

    /// Remove whatever an append attempt left behind and re-point the
    /// document's cache at its latest remaining event.
    async fn delete_by_attempt(&self, attempt_id: Uuid) -> AppResult<u64>;

    /// All events of a document, oldest first.
    async fn find_by_document(&self, document_id: DocumentId) -> AppResult<Vec<DocumentEvent>>;
}

/// Insert `event` within `tx` and point the document's cache at it.
///
/// The document row is locked first, so concurrent appends to one
/// document are numbered one after the other.
pub(crate) async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewEvent,
    status: DocumentStatus,
) -> AppResult<DocumentEvent> {
    let locked: Option<DocumentId> =
        sqlx::query_scalar("SELECT id FROM documents WHERE id = $1 FOR UPDATE")
            .bind(event.document_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock document", e))?;
    if locked.is_none() {
        return Err(AppError::not_found(format!(
            "Document {} not found",
            event.document_id
        )));
    }

    let version_number = if event.event_type.is_versioned() {
        let previous: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM document_events WHERE document_id = $1 AND event_type = $2",
        )
        .bind(event.document_id)
        .bind(event.event_type)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count events", e))?;
        Some(previous as i32 + 1)
    } else {
        None
    };

    let stored = sqlx::query_as::<_, DocumentEvent>(
        "INSERT INTO document_events (document_id, event_type, editor_id, comment, \
         additional_message, version_number, recipients, attachments, attempt_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(event.document_id)
    .bind(event.event_type)
    .bind(event.editor_id)
    .bind(&event.comment)
    .bind(&event.additional_message)
    .bind(version_number)
    .bind(Json(&event.recipients))
    .bind(Json(&event.attachments))
    .bind(event.attempt_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert event", e))?;

    sqlx::query(
        "UPDATE documents SET last_event_id = $2, status = $3, last_updated = NOW() \
         WHERE id = $1",
    )
    .bind(event.document_id)
    .bind(stored.id)
    .bind(status)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to refresh last event", e))?;

    Ok(stored)
}

/// PostgreSQL event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn append(&self, event: &NewEvent, status: DocumentStatus) -> AppResult<DocumentEvent> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let stored = insert_event(&mut tx, event, status).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit event append", e)
        })?;
        Ok(stored)
    }

    async fn delete_by_attempt(&self, attempt_id: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let removed: Vec<(DocumentId, EventId)> = sqlx::query_as(
            "DELETE FROM document_events WHERE attempt_id = $1 RETURNING document_id, id",
        )
        .bind(attempt_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete event attempt", e)
        })?;

        for (document_id, _) in &removed {
            sqlx::query(
                "UPDATE documents SET \
                 last_event_id = (SELECT MAX(id) FROM document_events WHERE document_id = $1), \
                 status = COALESCE(( \
                     SELECT event_type::text::document_status FROM document_events \
                     WHERE document_id = $1 ORDER BY id DESC LIMIT 1), 'CREATED') \
                 WHERE id = $1",
            )
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to restore last event", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit attempt cleanup", e)
        })?;
        Ok(removed.len() as u64)
    }

    async fn find_by_document(&self, document_id: DocumentId) -> AppResult<Vec<DocumentEvent>> {
        sqlx::query_as::<_, DocumentEvent>(
            "SELECT * FROM document_events WHERE document_id = $1 ORDER BY id",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list events", e))
    }
}
