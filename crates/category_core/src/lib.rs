//! Core domain logic for user and supplier categories.
//! This crate is the single source of truth for category invariants and for
//! the optimistic-concurrency update protocol.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions};
pub use logging::{
    default_log_level, error_chain, init_logging, logging_status, LoggingError,
};
pub use model::category::{
    validate_fields, Category, CategoryDraft, CategoryId, CategoryKind, CategoryValidationError,
    DESCRIPTION_MAX_CHARS, INITIAL_VERSION, NAME_MAX_CHARS,
};
pub use repo::category_repo::{
    CategoryRepository, RepoError, RepoResult, SqliteCategoryRepository,
};
pub use service::category_service::{CategoryService, CategoryServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
