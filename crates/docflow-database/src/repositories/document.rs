//! Document repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;
use uuid::Uuid;

use docflow_core::error::{AppError, ErrorKind};
use docflow_core::result::AppResult;
use docflow_core::types::{DocumentId, FilterGroup, PageRequest, PageResponse, PersonId};
use docflow_entity::document::{
    ContentLocation, Document, DocumentRecord, DocumentRow, DocumentStatus, GeneratedDocument,
    NewDocument,
};
use docflow_entity::event::{DocumentEvent, NewEvent};
use docflow_entity::reference::{CaseRef, OfferRef, ProjectRef, Recipient};

use super::event::insert_event;
use super::reference::{CASE_COLUMNS, CaseRow};
use crate::filter::push_filter_groups;

/// Persistence of document rows and their case/recipient associations.
#[async_trait]
pub trait DocumentRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a row with its associations and return the new id.
    ///
    /// Outgoing rows inserted without a number get `number = id` in the
    /// same transaction.
    async fn insert(&self, new: &NewDocument) -> AppResult<DocumentId>;

    /// Insert a row together with the CREATED event of `attempt_id`, in
    /// one transaction.
    async fn insert_created(
        &self,
        new: &NewDocument,
        attempt_id: Uuid,
    ) -> AppResult<(DocumentId, DocumentEvent)>;

    /// Store the materialized content of a row inserted by
    /// [`insert`](Self::insert) and append its CREATED event, in one
    /// transaction.
    async fn complete_creation(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
        editor_id: Option<PersonId>,
        attempt_id: Uuid,
    ) -> AppResult<DocumentEvent>;

    /// Load a row with its associations and latest event.
    async fn find_record(&self, id: DocumentId) -> AppResult<Option<DocumentRecord>>;

    /// Overwrite the content columns, and the generated-document columns
    /// when `generated` is given.
    async fn update_content(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
    ) -> AppResult<()>;

    /// Persist the editable fields and associations of `document`.
    async fn update_details(&self, document: &Document) -> AppResult<()>;

    /// Delete a row. Returns whether a row was removed.
    async fn delete(&self, id: DocumentId) -> AppResult<bool>;

    /// Ids of rows matching `groups`, newest first.
    async fn search(
        &self,
        groups: &[FilterGroup],
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentId>>;
}

#[derive(Debug, FromRow)]
struct RecipientRow {
    #[sqlx(flatten)]
    recipient: Recipient,
    role: String,
}

const ROLE_MAIN: &str = "main";
const ROLE_CC: &str = "cc";

/// PostgreSQL document repository.
#[derive(Debug, Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    async fn insert_row(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewDocument,
    ) -> AppResult<DocumentId> {
        let (document_id, folder_id, attachment_count) = new.content.to_columns();
        let parent = new.variant.parent();
        let generated = new.variant.generated();
        let is_outgoing = new.variant.tag().is_outgoing();

        let id: DocumentId = sqlx::query_scalar(
            "INSERT INTO documents (is_outgoing, number, description, creation_date, \
             registration_date, document_id, folder_id, attachment_count, project_id, offer_id, \
             template_id, generated_document_id, editor_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING id",
        )
        .bind(is_outgoing)
        .bind(&new.number)
        .bind(&new.description)
        .bind(new.creation_date)
        .bind(new.registration_date)
        .bind(document_id)
        .bind(folder_id)
        .bind(attachment_count)
        .bind(parent.project_id())
        .bind(parent.offer_id())
        .bind(generated.and_then(|g| g.template_id.clone()))
        .bind(generated.and_then(|g| g.document_id.clone()))
        .bind(new.editor_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert document", e))?;

        if is_outgoing && new.number.is_none() {
            sqlx::query("UPDATE documents SET number = id::text WHERE id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to assign number", e)
                })?;
        }

        Self::write_associations(
            tx,
            id,
            &new.cases,
            &new.main_recipients,
            &new.cc_recipients,
        )
        .await?;
        Ok(id)
    }

    async fn write_content(
        tx: &mut Transaction<'_, Postgres>,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
    ) -> AppResult<()> {
        let (document_id, folder_id, attachment_count) = content.to_columns();
        let result = match generated {
            Some(generated) => sqlx::query(
                "UPDATE documents SET document_id = $2, folder_id = $3, attachment_count = $4, \
                 template_id = $5, generated_document_id = $6, last_updated = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(document_id)
            .bind(folder_id)
            .bind(attachment_count)
            .bind(&generated.template_id)
            .bind(&generated.document_id)
            .execute(&mut **tx)
            .await,
            None => sqlx::query(
                "UPDATE documents SET document_id = $2, folder_id = $3, attachment_count = $4, \
                 last_updated = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(document_id)
            .bind(folder_id)
            .bind(attachment_count)
            .execute(&mut **tx)
            .await,
        }
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update content", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Document {id} not found")));
        }
        Ok(())
    }

    async fn write_associations(
        tx: &mut Transaction<'_, Postgres>,
        id: DocumentId,
        cases: &[CaseRef],
        main: &[Recipient],
        cc: &[Recipient],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM document_cases WHERE document_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear cases", e))?;
        sqlx::query("DELETE FROM document_recipients WHERE document_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear recipients", e)
            })?;

        let case_ids: Vec<i64> = cases.iter().map(|c| c.id.get()).collect();
        sqlx::query(
            "INSERT INTO document_cases (document_id, case_id) \
             SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(case_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to link cases", e))?;

        for (role, recipients) in [(ROLE_MAIN, main), (ROLE_CC, cc)] {
            let entity_ids: Vec<i64> = recipients.iter().map(|r| r.id.get()).collect();
            sqlx::query(
                "INSERT INTO document_recipients (document_id, entity_id, role, position) \
                 SELECT $1, t.entity_id, $2, (t.ord - 1)::int \
                 FROM UNNEST($3::bigint[]) WITH ORDINALITY AS t(entity_id, ord) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(role)
            .bind(entity_ids)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to link recipients", e)
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, new: &NewDocument) -> AppResult<DocumentId> {
        let mut tx = self.begin().await?;
        let id = Self::insert_row(&mut tx, new).await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit document insert", e)
        })?;

        debug!(document_id = %id, "Inserted document row");
        Ok(id)
    }

    async fn insert_created(
        &self,
        new: &NewDocument,
        attempt_id: Uuid,
    ) -> AppResult<(DocumentId, DocumentEvent)> {
        let mut tx = self.begin().await?;
        let id = Self::insert_row(&mut tx, new).await?;
        let event = insert_event(
            &mut tx,
            &NewEvent::created(id, new.editor_id, attempt_id),
            DocumentStatus::Created,
        )
        .await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit document insert", e)
        })?;

        debug!(
            document_id = %id,
            event_id = %event.id,
            "Inserted document row with its CREATED event"
        );
        Ok((id, event))
    }

    async fn complete_creation(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
        editor_id: Option<PersonId>,
        attempt_id: Uuid,
    ) -> AppResult<DocumentEvent> {
        let mut tx = self.begin().await?;
        Self::write_content(&mut tx, id, content, generated).await?;
        let event = insert_event(
            &mut tx,
            &NewEvent::created(id, editor_id, attempt_id),
            DocumentStatus::Created,
        )
        .await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit document creation", e)
        })?;

        debug!(document_id = %id, event_id = %event.id, "Completed document creation");
        Ok(event)
    }

    async fn find_record(&self, id: DocumentId) -> AppResult<Option<DocumentRecord>> {
        let Some(row) = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))?
        else {
            return Ok(None);
        };

        let project = match row.project_id {
            Some(project_id) => sqlx::query_as::<_, ProjectRef>(
                "SELECT id, our_id, letters_folder_id FROM projects WHERE id = $1",
            )
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load project", e))?,
            None => None,
        };

        let offer = match row.offer_id {
            Some(offer_id) => sqlx::query_as::<_, OfferRef>(
                "SELECT id, description, folder_id FROM offers WHERE id = $1",
            )
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load offer", e))?,
            None => None,
        };

        let cases = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM document_cases dc \
             JOIN cases c ON c.id = dc.case_id \
             LEFT JOIN contracts k ON k.id = c.contract_id \
             WHERE dc.document_id = $1 ORDER BY c.id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load cases", e))?
        .into_iter()
        .map(CaseRef::from)
        .collect();

        let recipients = sqlx::query_as::<_, RecipientRow>(
            "SELECT e.id, e.name, e.email, e.address, r.role \
             FROM document_recipients r JOIN entities e ON e.id = r.entity_id \
             WHERE r.document_id = $1 ORDER BY r.position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load recipients", e))?;

        let (main_recipients, cc_recipients): (Vec<_>, Vec<_>) =
            recipients.into_iter().partition(|r| r.role == ROLE_MAIN);

        let last_event = sqlx::query_as::<_, DocumentEvent>(
            "SELECT * FROM document_events WHERE document_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load last event", e))?;

        Ok(Some(DocumentRecord {
            row,
            project,
            offer,
            cases,
            main_recipients: main_recipients.into_iter().map(|r| r.recipient).collect(),
            cc_recipients: cc_recipients.into_iter().map(|r| r.recipient).collect(),
            last_event,
        }))
    }

    async fn update_content(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
    ) -> AppResult<()> {
        let mut tx = self.begin().await?;
        Self::write_content(&mut tx, id, content, generated).await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit content update", e)
        })
    }

    async fn update_details(&self, document: &Document) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE documents SET number = $2, description = $3, creation_date = $4, \
             registration_date = $5, editor_id = $6, last_updated = NOW() WHERE id = $1",
        )
        .bind(document.id)
        .bind(&document.number)
        .bind(&document.description)
        .bind(document.creation_date)
        .bind(document.registration_date)
        .bind(document.editor_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update document", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Document {} not found",
                document.id
            )));
        }

        Self::write_associations(
            &mut tx,
            document.id,
            &document.cases,
            &document.main_recipients,
            &document.cc_recipients,
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit document update", e)
        })
    }

    async fn delete(&self, id: DocumentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(
        &self,
        groups: &[FilterGroup],
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentId>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents d WHERE ");
        push_filter_groups(&mut count, groups)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count documents", e)
            })?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT d.id FROM documents d WHERE ");
        push_filter_groups(&mut query, groups)?;
        query
            .push(" ORDER BY d.id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let ids: Vec<DocumentId> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search documents", e)
            })?;

        Ok(PageResponse::new(ids, page, total.max(0) as u64))
    }
}
