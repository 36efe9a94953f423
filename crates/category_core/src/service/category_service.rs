//! Category use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete entry points for one family.
//! - Normalize caller input before it reaches the repository.
//! - Translate repository error kinds into caller-facing outcomes.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Only `update_with_retry` ever retries, and only on version conflicts.
//! - Service layer remains storage-agnostic.

use crate::logging::error_chain;
use crate::model::category::{
    Category, CategoryDraft, CategoryId, CategoryKind, CategoryValidationError,
};
use crate::repo::category_repo::{CategoryRepository, RepoError};
use log::{info, warn};
use thiserror::Error;

/// Caller-facing outcome of a failed category use-case.
#[derive(Debug, Error)]
pub enum CategoryServiceError {
    /// Input rejected before any storage access.
    #[error(transparent)]
    Invalid(CategoryValidationError),
    /// Target category does not exist.
    #[error("{kind} category not found: {id}")]
    NotFound { kind: CategoryKind, id: CategoryId },
    /// Target changed since the caller read it; re-fetch and retry.
    #[error("{kind} category {id} changed since version {expected_version}; re-fetch and retry")]
    Conflict {
        kind: CategoryKind,
        id: CategoryId,
        expected_version: i64,
    },
    /// Any other persistence failure, with the storage cause preserved.
    #[error("category storage failure")]
    Internal(#[source] RepoError),
}

impl CategoryServiceError {
    /// Stable machine-readable code for this outcome.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_input",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "version_conflict",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<RepoError> for CategoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Invalid(err),
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::VersionConflict {
                kind,
                id,
                expected_version,
            } => Self::Conflict {
                kind,
                id,
                expected_version,
            },
            other => Self::Internal(other),
        }
    }
}

impl From<CategoryValidationError> for CategoryServiceError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Invalid(value)
    }
}

pub type ServiceResult<T> = Result<T, CategoryServiceError>;

/// Category service facade over repository implementations.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Family served by the underlying repository.
    pub fn kind(&self) -> CategoryKind {
        self.repo.kind()
    }

    /// Creates one category from trimmed caller input.
    pub fn create(&self, draft: &CategoryDraft) -> ServiceResult<Category> {
        let draft = draft.trimmed();
        draft.validate()?;
        let created = self
            .repo
            .create(&draft)
            .map_err(|err| self.failed("create", None, err))?;
        info!(
            "event=category_create module=service status=ok kind={} id={}",
            self.kind(),
            created.id
        );
        Ok(created)
    }

    pub fn get(&self, id: CategoryId) -> ServiceResult<Category> {
        self.repo
            .get_by_id(id)
            .map_err(|err| self.failed("get", Some(id), err))
    }

    /// Lists every category of this family in insertion order.
    pub fn list(&self) -> ServiceResult<Vec<Category>> {
        self.repo
            .get_all()
            .map_err(|err| self.failed("list", None, err))
    }

    /// Replaces name/description of `id` if it is still at `expected_version`.
    ///
    /// Returns the committed record with its bumped version.
    pub fn update(
        &self,
        id: CategoryId,
        expected_version: i64,
        draft: &CategoryDraft,
    ) -> ServiceResult<Category> {
        let draft = draft.trimmed();
        draft.validate()?;

        // Timestamps are overwritten by the committed row.
        let mut category = Category {
            id,
            name: draft.name,
            description: draft.description,
            version: expected_version,
            created_at: 0,
            updated_at: 0,
        };
        self.repo
            .update(&mut category)
            .map_err(|err| self.failed("update", Some(id), err))?;
        info!(
            "event=category_update module=service status=ok kind={} id={} version={}",
            self.kind(),
            id,
            category.version
        );
        Ok(category)
    }

    /// Re-reads `id`, applies `edit` and updates, retrying on version conflicts.
    ///
    /// Only safe when `edit` can be reapplied to whatever the latest state is.
    /// At most `max_attempts` writes are tried (at least one); the last
    /// conflict is returned when all of them lose.
    pub fn update_with_retry<F>(
        &self,
        id: CategoryId,
        max_attempts: u32,
        mut edit: F,
    ) -> ServiceResult<Category>
    where
        F: FnMut(&mut CategoryDraft),
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let current = self.get(id)?;
            let mut draft = CategoryDraft::from(&current);
            edit(&mut draft);

            match self.update(id, current.version, &draft) {
                Err(CategoryServiceError::Conflict { .. }) if attempt < max_attempts => {
                    info!(
                        "event=category_update module=service status=retry kind={} id={} attempt={}",
                        self.kind(),
                        id,
                        attempt
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// Hard-deletes one category.
    pub fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        self.repo
            .delete(id)
            .map_err(|err| self.failed("delete", Some(id), err))?;
        info!(
            "event=category_delete module=service status=ok kind={} id={}",
            self.kind(),
            id
        );
        Ok(())
    }

    fn failed(&self, op: &str, id: Option<CategoryId>, err: RepoError) -> CategoryServiceError {
        let err = CategoryServiceError::from(err);
        let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        match &err {
            CategoryServiceError::Internal(cause) => warn!(
                "event=category_{} module=service status=error kind={} id={} error_code={} error={}",
                op,
                self.kind(),
                id,
                err.code(),
                error_chain(cause)
            ),
            _ => info!(
                "event=category_{} module=service status=rejected kind={} id={} error_code={}",
                op,
                self.kind(),
                id,
                err.code()
            ),
        }
        err
    }
}
