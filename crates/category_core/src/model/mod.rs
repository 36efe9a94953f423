//! Domain model for user and supplier categories.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one record shape for every category family.
//!
//! # Invariants
//! - Every category is identified by a storage-assigned `CategoryId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod category;
