#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `RemoteAccountRepository` against the in-memory backend.

use std::sync::Arc;

use serde_json::json;

use contas_app::adapters::{RemoteAccountRepository, TABLE};
use contas_app::AppStateBuilder;
use contas_backend::{BackendError, BackendOperation, InMemoryBackend};
use contas_core::error::{CoreError, WriteOperation};
use contas_core::traits::AccountRepository;
use contas_core::types::{BankAccountPatch, NewBankAccount};

fn setup() -> (Arc<InMemoryBackend>, RemoteAccountRepository) {
    let backend = Arc::new(InMemoryBackend::new());
    let repo = RemoteAccountRepository::new(backend.clone());
    (backend, repo)
}

fn new_account(owner: &str, description: &str) -> NewBankAccount {
    NewBankAccount {
        account_bank_code: 10,
        owner_id: owner.to_string(),
        bank_code: 1,
        branch_code: 1234,
        description: description.to_string(),
        account_number: "12345-6".to_string(),
    }
}

// ===== Create / read =====

#[tokio::test]
async fn test_create_assigns_id_and_created_at() {
    let (backend, repo) = setup();

    let created = repo.create(new_account("u-1", "Conta Teste")).await.unwrap();

    assert!(created.id.is_some());
    assert!(created.created_at.is_some());
    assert!(created.updated_at.is_none());
    assert_eq!(created.description, "Conta Teste");
    assert_eq!(backend.row_count(TABLE).await, 1);
}

#[tokio::test]
async fn test_list_is_scoped_to_owner_and_newest_first() {
    let (_backend, repo) = setup();
    repo.create(new_account("u-1", "first")).await.unwrap();
    repo.create(new_account("u-2", "foreign")).await.unwrap();
    repo.create(new_account("u-1", "second")).await.unwrap();

    let listed = repo.list("u-1").await.unwrap();

    let names: Vec<_> = listed.iter().map(|a| a.description.as_str()).collect();
    assert_eq!(names, vec!["second", "first"]);
    assert!(listed.iter().all(|a| a.owner_id == "u-1"));
    assert!(repo.list("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_by_id() {
    let (_backend, repo) = setup();
    let created = repo.create(new_account("u-1", "Conta")).await.unwrap();

    let found = repo.find_by_id(created.id.unwrap()).await.unwrap();
    assert_eq!(found, Some(created));
    assert_eq!(repo.find_by_id(404).await.unwrap(), None);
}

#[tokio::test]
async fn test_malformed_row_is_a_decode_error() {
    let (backend, repo) = setup();
    let row = json!({
        "id": 1,
        "codigo_conta_banco": 10,
        "codigo_empresa": "u-1",
        "codigo_banco": "not a number",
        "codigo_agencia": 1234,
        "descricao": "Broken",
        "numero_conta": "1",
        "created_at": "2024-05-01T12:00:00Z"
    });
    backend
        .insert_raw_row(TABLE, row.as_object().cloned().unwrap())
        .await;

    let err = repo.list("u-1").await.unwrap_err();
    match err {
        CoreError::Decode(e) => assert_eq!(e.column, "codigo_banco"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_read_failure_is_remote_read() {
    let (backend, repo) = setup();
    backend
        .set_failure(
            BackendOperation::Select,
            Some(BackendError::Network {
                detail: "offline".to_string(),
            }),
        )
        .await;

    let err = repo.list("u-1").await.unwrap_err();
    assert!(matches!(err, CoreError::RemoteRead(BackendError::Network { .. })));
    assert!(!err.is_expected());
}

// ===== Update =====

#[tokio::test]
async fn test_partial_update_refreshes_updated_at() {
    let (_backend, repo) = setup();
    let created = repo.create(new_account("u-1", "Before")).await.unwrap();
    let id = created.id.unwrap();

    let patch = BankAccountPatch::new()
        .description("After")
        .expect_updated_at(created.updated_at);
    let updated = repo.update(id, patch).await.unwrap();

    assert_eq!(updated.description, "After");
    assert_eq!(updated.bank_code, created.bank_code);
    assert_eq!(updated.account_number, created.account_number);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at.is_some());

    // A second edit guarded by the fresh timestamp still goes through.
    let again = repo
        .update(
            id,
            BankAccountPatch::new()
                .branch_code(99)
                .expect_updated_at(updated.updated_at),
        )
        .await
        .unwrap();
    assert_eq!(again.branch_code, 99);
    assert!(again.updated_at > updated.updated_at);
}

#[tokio::test]
async fn test_stale_update_conflicts_and_leaves_row_unchanged() {
    let (_backend, repo) = setup();
    let created = repo.create(new_account("u-1", "Original")).await.unwrap();
    let id = created.id.unwrap();
    repo.update(id, BankAccountPatch::new().description("Theirs"))
        .await
        .unwrap();

    let err = repo
        .update(
            id,
            BankAccountPatch::new()
                .description("Mine")
                .expect_updated_at(created.updated_at),
        )
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.description, "Theirs");
}

#[tokio::test]
async fn test_update_of_missing_account_is_not_found() {
    let (_backend, repo) = setup();

    for patch in [
        BankAccountPatch::new().description("x"),
        BankAccountPatch::new().description("x").expect_updated_at(None),
    ] {
        let err = repo.update(77, patch).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RemoteWrite {
                operation: WriteOperation::Update,
                source: BackendError::NotFound { .. },
            }
        ));
    }
}

// ===== Delete =====

#[tokio::test]
async fn test_delete_removes_only_target() {
    let (backend, repo) = setup();
    let keep = repo.create(new_account("u-1", "keep")).await.unwrap();
    let drop = repo.create(new_account("u-1", "drop")).await.unwrap();

    repo.delete(drop.id.unwrap()).await.unwrap();

    assert_eq!(backend.row_count(TABLE).await, 1);
    assert_eq!(repo.list("u-1").await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn test_delete_of_missing_account_is_not_found() {
    let (backend, repo) = setup();
    repo.create(new_account("u-1", "stays")).await.unwrap();

    let err = repo.delete(12345).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::RemoteWrite {
            operation: WriteOperation::Delete,
            source: BackendError::NotFound { .. },
        }
    ));
    assert!(err.is_expected());
    assert_eq!(backend.row_count(TABLE).await, 1);
}

// ===== AppState wiring =====

#[tokio::test]
async fn test_app_state_builds_remote_repository_from_backend() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.register_user("ana@example.com", "secret").await;

    let state = AppStateBuilder::new().backend(backend).build().unwrap();
    let user = state
        .auth_service
        .sign_in("ana@example.com", "secret")
        .await
        .unwrap();
    assert!(state.session.is_signed_in());

    state
        .account_repository
        .create(new_account(&user.id, "Via state"))
        .await
        .unwrap();

    let screen = state.accounts_screen();
    screen.mount().await;
    let snapshot = screen.snapshot().await;
    assert_eq!(snapshot.accounts.len(), 1);
    assert_eq!(snapshot.accounts[0].description, "Via state");
    screen.dispose();
}

#[test]
fn test_builder_requires_adapters() {
    let err = AppStateBuilder::new().build().err().unwrap();
    match err {
        CoreError::Validation(errors) => assert!(errors.get("auth_client").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }

    let backend = Arc::new(InMemoryBackend::new());
    let err = AppStateBuilder::new()
        .auth_client(backend)
        .build()
        .err()
        .unwrap();
    match err {
        CoreError::Validation(errors) => assert!(errors.get("account_repository").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
}
