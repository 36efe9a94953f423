use category_core::db::open_db_in_memory;
use category_core::{
    CategoryDraft, CategoryKind, CategoryService, CategoryServiceError, SqliteCategoryRepository,
};
use std::error::Error;

#[test]
fn create_trims_input_before_persisting() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::User).unwrap();
    let service = CategoryService::new(repo);

    let created = service
        .create(&CategoryDraft::new("  Eletrônicos  ", "  linha branca "))
        .unwrap();
    assert_eq!(created.name, "Eletrônicos");
    assert_eq!(created.description, "linha branca");
    assert_eq!(service.get(created.id).unwrap(), created);
}

#[test]
fn invalid_input_is_rejected_without_storage_access() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::Supplier).unwrap();
    let service = CategoryService::new(repo);

    let err = service
        .create(&CategoryDraft::new("x".repeat(101), ""))
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    match err {
        CategoryServiceError::Invalid(validation) => assert_eq!(validation.field, "name"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn update_returns_committed_record_and_maps_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::User).unwrap();
    let service = CategoryService::new(repo);

    let created = service
        .create(&CategoryDraft::new("Eletrônicos", ""))
        .unwrap();
    let updated = service
        .update(
            created.id,
            created.version,
            &CategoryDraft::new("Eletrônicos PJ", "empresas"),
        )
        .unwrap();
    assert_eq!(updated.version, created.version + 1);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.description, "empresas");

    let err = service
        .update(created.id, created.version, &CategoryDraft::new("X", ""))
        .unwrap_err();
    assert_eq!(err.code(), "version_conflict");
    assert!(matches!(
        err,
        CategoryServiceError::Conflict {
            expected_version: 0,
            ..
        }
    ));
}

#[test]
fn missing_targets_map_to_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::Supplier).unwrap();
    let service = CategoryService::new(repo);

    assert_eq!(service.get(5).unwrap_err().code(), "not_found");
    assert_eq!(service.delete(5).unwrap_err().code(), "not_found");
    assert_eq!(
        service
            .update(5, 0, &CategoryDraft::new("ghost", ""))
            .unwrap_err()
            .code(),
        "not_found"
    );
    assert_eq!(
        service
            .update_with_retry(5, 3, |draft| draft.name.push('!'))
            .unwrap_err()
            .code(),
        "not_found"
    );
}

#[test]
fn storage_failures_map_to_internal_with_cause_chain() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::User).unwrap();
    let service = CategoryService::new(repo);

    conn.execute_batch("DROP TABLE user_categories;").unwrap();

    let err = service.list().unwrap_err();
    assert_eq!(err.code(), "internal");
    let repo_err = err.source().expect("internal errors keep the repository error");
    let sqlite_err = repo_err.source().expect("repository errors keep the sqlite cause");
    assert!(sqlite_err.to_string().contains("no such table"));
}

#[test]
fn delete_then_list_reflects_hard_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::Supplier).unwrap();
    let service = CategoryService::new(repo);

    let kept = service.create(&CategoryDraft::new("Kept", "")).unwrap();
    let dropped = service.create(&CategoryDraft::new("Dropped", "")).unwrap();
    service.delete(dropped.id).unwrap();

    let listed = service.list().unwrap();
    assert_eq!(listed, vec![kept]);
    assert_eq!(service.kind(), CategoryKind::Supplier);
}

#[test]
fn category_serializes_with_camel_case_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn, CategoryKind::User).unwrap();
    let service = CategoryService::new(repo);
    let created = service.create(&CategoryDraft::new("Varejo", "")).unwrap();

    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["id"], created.id);
    assert_eq!(value["version"], 0);
    assert_eq!(value["createdAt"], created.created_at);
    assert_eq!(value["updatedAt"], created.updated_at);
    assert!(value.get("created_at").is_none());
}
