//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the per-family category tables.
//! - Own the optimistic update protocol: one conditional write keyed on
//!   `(id, version)`, followed by an existence probe only when it misses.
//! - Classify every storage outcome into a fixed set of `RepoError` kinds.
//!
//! # Invariants
//! - Write paths call `validate()` before any SQL mutation.
//! - `version` is bumped by exactly one per committed update, by the same
//!   statement that checks it. No in-process lock is involved.
//! - Timestamps come from the SQLite clock, never from the process clock.
//!   `updated_at` is clamped to `created_at` when that clock steps back.
//! - A row returned by a committed write is handed back as-is.
//! - The repository never retries; callers decide whether to re-read.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::category::{
    Category, CategoryDraft, CategoryId, CategoryKind, CategoryValidationError, INITIAL_VERSION,
};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Params, Row, Statement};
use thiserror::Error;

const CATEGORY_COLUMNS: &str = "id, name, description, version, created_at, updated_at";
const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "description",
    "version",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Classified outcome of a failed category persistence operation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] CategoryValidationError),
    #[error("{kind} category not found: {id}")]
    NotFound { kind: CategoryKind, id: CategoryId },
    /// The row exists but no longer carries the version the caller observed.
    #[error("{kind} category {id} was modified concurrently (expected version {expected_version})")]
    VersionConflict {
        kind: CategoryKind,
        id: CategoryId,
        expected_version: i64,
    },
    #[error("failed to create {kind} category")]
    CreateFailed {
        kind: CategoryKind,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to read {kind} categories")]
    ReadFailed {
        kind: CategoryKind,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to update {kind} category {id}")]
    UpdateFailed {
        kind: CategoryKind,
        id: CategoryId,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to delete {kind} category {id}")]
    DeleteFailed {
        kind: CategoryKind,
        id: CategoryId,
        #[source]
        source: rusqlite::Error,
    },
    #[error("invalid persisted category data: {0}")]
    InvalidData(String),
    #[error(
        "connection schema version {actual_version} does not match required version {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Repository interface for one category family.
pub trait CategoryRepository {
    /// Family this repository is bound to.
    fn kind(&self) -> CategoryKind;
    /// Inserts a category; storage assigns id, version and timestamps.
    fn create(&self, draft: &CategoryDraft) -> RepoResult<Category>;
    fn get_by_id(&self, id: CategoryId) -> RepoResult<Category>;
    /// Returns every category in insertion (id) order.
    fn get_all(&self) -> RepoResult<Vec<Category>>;
    /// Replaces name/description if `category.version` is still current.
    ///
    /// On success `category` is overwritten with the committed row, so its
    /// `version` and `updated_at` reflect the new state.
    ///
    /// A row already at `i64::MAX` cannot advance and reports
    /// `VersionConflict`.
    fn update(&self, category: &mut Category) -> RepoResult<()>;
    /// Hard-deletes one category.
    fn delete(&self, id: CategoryId) -> RepoResult<()>;
    /// Returns whether a row with `id` exists, regardless of version.
    fn exists(&self, id: CategoryId) -> RepoResult<bool>;
}

/// SQLite-backed category repository bound to one family table.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
    kind: CategoryKind,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema was
    ///   altered underneath the migration registry.
    pub fn try_new(conn: &'conn Connection, kind: CategoryKind) -> RepoResult<Self> {
        ensure_connection_ready(conn, kind)?;
        Ok(Self { conn, kind })
    }

    fn read_failed(&self, source: rusqlite::Error) -> RepoError {
        RepoError::ReadFailed {
            kind: self.kind,
            source,
        }
    }

    fn probe_exists(&self, id: CategoryId) -> rusqlite::Result<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                self.kind.table()
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn kind(&self) -> CategoryKind {
        self.kind
    }

    fn create(&self, draft: &CategoryDraft) -> RepoResult<Category> {
        draft.validate()?;
        let kind = self.kind;
        let create_failed = |source| RepoError::CreateFailed { kind, source };

        let sql = format!(
            "INSERT INTO {table} (name, description, version, created_at, updated_at)
             VALUES (?1, ?2, {initial}, {now}, {now})
             RETURNING {CATEGORY_COLUMNS};",
            table = kind.table(),
            initial = INITIAL_VERSION,
            now = NOW_EPOCH_MS_SQL,
        );
        let mut stmt = self.conn.prepare(&sql).map_err(create_failed)?;
        let created = query_returning_one(
            &mut stmt,
            params![draft.name.as_str(), draft.description.as_str()],
        )
        .map_err(create_failed)?
        .ok_or_else(|| {
            RepoError::InvalidData(format!("insert into {} returned no row", kind.table()))
        })?;

        debug!(
            "event=category_create module=repo status=ok kind={} id={}",
            kind, created.id
        );
        Ok(created)
    }

    fn get_by_id(&self, id: CategoryId) -> RepoResult<Category> {
        let category = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CATEGORY_COLUMNS} FROM {} WHERE id = ?1;",
                    self.kind.table()
                ),
                [id],
                category_from_row,
            )
            .optional()
            .map_err(|err| self.read_failed(err))?
            .ok_or(RepoError::NotFound {
                kind: self.kind,
                id,
            })?;

        check_persisted(category)
    }

    fn get_all(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM {} ORDER BY id ASC;",
                self.kind.table()
            ))
            .map_err(|err| self.read_failed(err))?;
        let rows = stmt
            .query_map([], category_from_row)
            .map_err(|err| self.read_failed(err))?;

        let mut categories = Vec::new();
        for row in rows {
            let category = row.map_err(|err| self.read_failed(err))?;
            categories.push(check_persisted(category)?);
        }
        Ok(categories)
    }

    fn update(&self, category: &mut Category) -> RepoResult<()> {
        category.validate()?;
        let kind = self.kind;
        let id = category.id;
        let expected_version = category.version;
        let update_failed = |source| RepoError::UpdateFailed { kind, id, source };

        // Compare-and-swap: the predicate and the bump run as one statement.
        let sql = format!(
            "UPDATE {table}
             SET
                name = ?1,
                description = ?2,
                updated_at = MAX(created_at, {now}),
                version = version + 1
             WHERE id = ?3
               AND version = ?4
               AND version < {max_version}
             RETURNING {CATEGORY_COLUMNS};",
            table = kind.table(),
            now = NOW_EPOCH_MS_SQL,
            max_version = i64::MAX,
        );
        let mut stmt = self.conn.prepare(&sql).map_err(update_failed)?;
        let committed = query_returning_one(
            &mut stmt,
            params![
                category.name.as_str(),
                category.description.as_str(),
                id,
                expected_version
            ],
        )
        .map_err(update_failed)?;

        if let Some(committed) = committed {
            debug!(
                "event=category_update module=repo status=ok kind={} id={} version={}",
                kind, id, committed.version
            );
            *category = committed;
            return Ok(());
        }

        // Zero rows matched: either the id is gone or the version moved on.
        if self.probe_exists(id).map_err(update_failed)? {
            warn!(
                "event=category_update module=repo status=conflict kind={} id={} expected_version={}",
                kind, id, expected_version
            );
            Err(RepoError::VersionConflict {
                kind,
                id,
                expected_version,
            })
        } else {
            Err(RepoError::NotFound { kind, id })
        }
    }

    fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let kind = self.kind;
        let changed = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1;", kind.table()),
                [id],
            )
            .map_err(|source| RepoError::DeleteFailed { kind, id, source })?;

        if changed == 0 {
            return Err(RepoError::NotFound { kind, id });
        }

        debug!(
            "event=category_delete module=repo status=ok kind={} id={}",
            kind, id
        );
        Ok(())
    }

    fn exists(&self, id: CategoryId) -> RepoResult<bool> {
        self.probe_exists(id).map_err(|err| self.read_failed(err))
    }
}

/// Runs a `RETURNING` statement expected to yield at most one row.
///
/// The statement is stepped to completion so a failing autocommit surfaces
/// here instead of being dropped with the statement.
fn query_returning_one<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> rusqlite::Result<Option<Category>> {
    let mut rows = stmt.query(params)?;
    let first = match rows.next()? {
        Some(row) => Some(category_from_row(row)?),
        None => None,
    };
    while rows.next()?.is_some() {}
    Ok(first)
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        version: row.get("version")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn check_persisted(category: Category) -> RepoResult<Category> {
    if category.version < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative version `{}` for category {}",
            category.version, category.id
        )));
    }
    category.validate().map_err(|err| {
        RepoError::InvalidData(format!("category {} failed validation: {err}", category.id))
    })?;
    Ok(category)
}

fn ensure_connection_ready(conn: &Connection, kind: CategoryKind) -> RepoResult<()> {
    let read_failed = |source| RepoError::ReadFailed { kind, source };

    let expected_version = latest_version();
    let actual_version = current_user_version(conn).map_err(read_failed)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table = kind.table();
    if !table_exists(conn, table).map_err(read_failed)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let columns = table_columns(conn, table).map_err(read_failed)?;
    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}
