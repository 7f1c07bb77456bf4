use customs_docs::AppError;
use customs_docs::domain::repositories::TokenRepository;
use customs_docs::infrastructure::persistence::PgTokenRepository;
use sqlx::PgPool;
use std::sync::Arc;

#[sqlx::test]
async fn test_create_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.create("ops-team", "hash123").await;

    assert!(result.is_ok());
    let token = result.unwrap();
    assert_eq!(token.name, "ops-team");
    assert_eq!(token.token_hash, "hash123");
    assert!(token.last_used_at.is_none());
    assert!(!token.is_revoked());
}

#[sqlx::test]
async fn test_create_duplicate_name_conflicts(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create("ops-team", "hash123").await.unwrap();

    let result = repo.create("ops-team", "hash456").await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_find_active(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let created = repo.create("ops-team", "validhash").await.unwrap();

    let found = repo.find_active("validhash").await.unwrap();
    assert_eq!(found.map(|t| t.id), Some(created.id));

    assert!(repo.find_active("nonexistent").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_revoked_token_is_not_active(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo.create("revoked", "revokedhash").await.unwrap();
    repo.revoke(token.id).await.unwrap();

    assert!(repo.find_active("revokedhash").await.unwrap().is_none());

    let stored = repo.find_by_id(token.id).await.unwrap().unwrap();
    assert!(stored.is_revoked());
}

#[sqlx::test]
async fn test_revoke_twice_fails(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo.create("revoked", "revokedhash").await.unwrap();
    repo.revoke(token.id).await.unwrap();

    let result = repo.revoke(token.id).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_revoke_unknown_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    assert!(matches!(repo.revoke(42).await, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_touch_sets_last_used(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    let token = repo.create("ops-team", "hash123").await.unwrap();

    repo.touch(token.id).await.unwrap();

    let last_used: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar::<_, Option<chrono::DateTime<chrono::Utc>>>(
            "SELECT last_used_at FROM api_tokens WHERE id = $1",
        )
        .bind(token.id)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert!(last_used.is_some());
}

#[sqlx::test]
async fn test_list_and_lookup_by_name(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create("ops-team", "hash1").await.unwrap();
    let ci = repo.create("ci", "hash2").await.unwrap();

    let tokens = repo.list().await.unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().any(|t| t.name == "ops-team"));

    let found = repo.find_by_name("ci").await.unwrap().unwrap();
    assert_eq!(found.id, ci.id);

    assert!(repo.find_by_name("missing").await.unwrap().is_none());
    assert!(repo.find_by_id(ci.id + 100).await.unwrap().is_none());
}
