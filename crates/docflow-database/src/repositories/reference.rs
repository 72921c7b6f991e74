//! Read access to the reference data documents point at.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use docflow_core::error::{AppError, ErrorKind};
use docflow_core::result::AppResult;
use docflow_core::types::{CaseId, ContractId, EntityId, OfferId, ProjectId};
use docflow_entity::reference::{CaseRef, ContractRef, OfferRef, ProjectRef, Recipient};

/// Lookup of projects, offers, cases, and recipient entities.
#[async_trait]
pub trait ReferenceRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a project by id.
    async fn find_project(&self, id: ProjectId) -> AppResult<Option<ProjectRef>>;

    /// Find an offer by id.
    async fn find_offer(&self, id: OfferId) -> AppResult<Option<OfferRef>>;

    /// Load cases with their owning contracts. Unknown ids are skipped.
    async fn find_cases(&self, ids: &[CaseId]) -> AppResult<Vec<CaseRef>>;

    /// Load recipients in the order of `ids`. Unknown ids are skipped.
    async fn find_recipients(&self, ids: &[EntityId]) -> AppResult<Vec<Recipient>>;
}

/// A case joined with its (optional) contract.
#[derive(Debug, FromRow)]
pub(crate) struct CaseRow {
    id: CaseId,
    number: String,
    name: String,
    contract_id: Option<ContractId>,
    contract_number: Option<String>,
    contract_our_id: Option<String>,
    contract_alias: Option<String>,
}

impl From<CaseRow> for CaseRef {
    fn from(row: CaseRow) -> Self {
        let contract = match (row.contract_id, row.contract_number) {
            (Some(id), Some(number)) => Some(ContractRef {
                id,
                number,
                our_id: row.contract_our_id,
                alias: row.contract_alias,
            }),
            _ => None,
        };
        CaseRef {
            id: row.id,
            number: row.number,
            name: row.name,
            contract,
        }
    }
}

pub(crate) const CASE_COLUMNS: &str = "c.id, c.number, c.name, \
     k.id AS contract_id, k.number AS contract_number, \
     k.our_id AS contract_our_id, k.alias AS contract_alias";

/// PostgreSQL reference repository.
#[derive(Debug, Clone)]
pub struct PgReferenceRepository {
    pool: PgPool,
}

impl PgReferenceRepository {
    /// Create a new reference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for PgReferenceRepository {
    async fn find_project(&self, id: ProjectId) -> AppResult<Option<ProjectRef>> {
        sqlx::query_as::<_, ProjectRef>(
            "SELECT id, our_id, letters_folder_id FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    async fn find_offer(&self, id: OfferId) -> AppResult<Option<OfferRef>> {
        sqlx::query_as::<_, OfferRef>("SELECT id, description, folder_id FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find offer", e))
    }

    async fn find_cases(&self, ids: &[CaseId]) -> AppResult<Vec<CaseRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases c \
             LEFT JOIN contracts k ON k.id = c.contract_id \
             WHERE c.id = ANY($1) ORDER BY c.id"
        ))
        .bind(raw)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load cases", e))?;
        Ok(rows.into_iter().map(CaseRef::from).collect())
    }

    async fn find_recipients(&self, ids: &[EntityId]) -> AppResult<Vec<Recipient>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let found = sqlx::query_as::<_, Recipient>(
            "SELECT id, name, email, address FROM entities WHERE id = ANY($1)",
        )
        .bind(raw)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load recipients", e))?;

        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|r| r.id == *id).cloned())
            .collect())
    }
}
