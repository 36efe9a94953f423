//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `VersionConflict`)
//!   distinct from storage transport failures.

pub mod category_repo;
