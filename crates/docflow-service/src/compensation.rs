//! Compensating transaction coordinator.
//!
//! Multi-step flows record an undo step in a [`CompensationScope`] after
//! every effect that succeeded. When a later step fails the coordinator
//! replays the recorded steps in reverse. The external store has no
//! transactions, so an undo that fails leaves an orphan behind; such
//! failures are logged separately from the error that triggered the
//! rollback.

use std::sync::Arc;

use tracing::{error, info, warn};

use docflow_core::error::{AppError, ErrorKind};
use docflow_core::result::AppResult;
use docflow_core::traits::DocumentStore;
use docflow_core::types::{DocumentId, ExternalId};
use docflow_database::repositories::DocumentRepository;

/// One reversible effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoStep {
    /// A file or folder was created; trash it.
    Trash(ExternalId),
    /// A file was moved out of `parent`; move it back.
    MoveBack {
        file: ExternalId,
        parent: ExternalId,
    },
    /// A row was inserted; delete it.
    DeleteRow(DocumentId),
}

/// Undo steps recorded by one flow, in the order the effects happened.
#[derive(Debug, Default)]
pub struct CompensationScope {
    steps: Vec<UndoStep>,
}

impl CompensationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created store artifact.
    pub fn record_trash(&mut self, id: ExternalId) {
        self.steps.push(UndoStep::Trash(id));
    }

    /// Record a file moved away from `parent`.
    pub fn record_move(&mut self, file: ExternalId, parent: ExternalId) {
        self.steps.push(UndoStep::MoveBack { file, parent });
    }

    /// Record an inserted row.
    pub fn record_row(&mut self, id: DocumentId) {
        self.steps.push(UndoStep::DeleteRow(id));
    }

    /// Forget every recorded step.
    ///
    /// Called once the effects are attributed to the document; a failure
    /// after this point must not remove content the row already points at.
    pub fn commit(&mut self) {
        self.steps.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Recorded steps, oldest first.
    pub fn steps(&self) -> &[UndoStep] {
        &self.steps
    }
}

/// Replays undo steps after a failed flow.
#[derive(Debug, Clone)]
pub struct CompensationCoordinator {
    store: Arc<dyn DocumentStore>,
    documents: Arc<dyn DocumentRepository>,
}

impl CompensationCoordinator {
    /// Creates a new compensation coordinator.
    pub fn new(store: Arc<dyn DocumentStore>, documents: Arc<dyn DocumentRepository>) -> Self {
        Self { store, documents }
    }

    /// Undo everything in `scope` and return the error to surface.
    ///
    /// The original error is returned when every step was undone. If any
    /// step failed the result is a `CompensationFailure` whose source is
    /// the original error.
    pub async fn compensate(&self, scope: CompensationScope, cause: AppError) -> AppError {
        if cause.kind == ErrorKind::MissingExternalId {
            warn!(
                error = %cause,
                "Store reported no id; any artifact it created is orphaned"
            );
        }
        if scope.is_empty() {
            return cause;
        }

        info!(steps = scope.steps.len(), error = %cause, "Compensating failed flow");
        let mut failed = Vec::new();
        for step in scope.steps.into_iter().rev() {
            if let Err(e) = self.undo(&step).await {
                match &step {
                    UndoStep::DeleteRow(id) => error!(
                        document_id = %id,
                        error = %e,
                        "Compensation failed; document row left behind"
                    ),
                    UndoStep::Trash(id) => error!(
                        external_id = %id,
                        error = %e,
                        "Compensation failed; external artifact orphaned"
                    ),
                    UndoStep::MoveBack { file, parent } => error!(
                        external_id = %file,
                        parent_id = %parent,
                        error = %e,
                        "Compensation failed; external artifact orphaned"
                    ),
                }
                failed.push(step);
            }
        }

        if failed.is_empty() {
            cause
        } else {
            AppError::with_source(
                ErrorKind::CompensationFailure,
                format!(
                    "Rollback incomplete ({} of the undo steps failed) after: {}",
                    failed.len(),
                    cause.message
                ),
                cause,
            )
        }
    }

    async fn undo(&self, step: &UndoStep) -> AppResult<()> {
        match step {
            UndoStep::Trash(id) => self.store.trash(id).await,
            UndoStep::MoveBack { file, parent } => self.store.move_file(file, parent).await,
            UndoStep::DeleteRow(id) => self.documents.delete(*id).await.map(|_| ()),
        }
    }
}
