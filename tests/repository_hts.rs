use customs_docs::domain::entities::HtsRow;
use customs_docs::domain::repositories::HtsRepository;
use customs_docs::infrastructure::persistence::PgHtsRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn row(hts_number: &str, description: &str, general: &str) -> HtsRow {
    HtsRow {
        hts_number: hts_number.to_string(),
        description: description.to_string(),
        general_rate_of_duty: Some(general.to_string()),
        special_rate_of_duty: None,
        column_2_rate_of_duty: None,
        unit_of_quantity: vec!["kg".to_string()],
        additional_duties: None,
    }
}

fn schedule() -> Vec<HtsRow> {
    vec![
        row("0901.21.00.20", "Coffee, roasted, not decaffeinated", "Free"),
        row("0901.22.00.00", "Coffee, roasted, decaffeinated", "Free"),
        row("6109.10.00.12", "T-shirts, knitted, of cotton", "16.5%"),
    ]
}

#[sqlx::test]
async fn test_upsert_then_find_by_number(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    let written = repo.upsert_batch(schedule()).await.unwrap();
    assert_eq!(written, 3);

    let result = repo.find_by_number("6109.10.00.12").await;

    assert!(result.is_ok());
    let found = result.unwrap().unwrap();
    assert_eq!(found.description, "T-shirts, knitted, of cotton");
    assert_eq!(found.general_rate_of_duty.as_deref(), Some("16.5%"));
    assert_eq!(found.unit_of_quantity, vec!["kg"]);

    assert!(repo.find_by_number("6109.10.0012").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_upsert_replaces_existing_row(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    repo.upsert_batch(schedule()).await.unwrap();

    let mut updated = row("6109.10.00.12", "T-shirts, knitted, of cotton", "16.5%");
    updated.column_2_rate_of_duty = Some("90%".to_string());
    updated.additional_duties = Some("Section 301: 7.5%".to_string());
    repo.upsert_batch(vec![updated]).await.unwrap();

    let found = repo.find_by_number("6109.10.00.12").await.unwrap().unwrap();
    assert_eq!(found.column_2_rate_of_duty.as_deref(), Some("90%"));
    assert_eq!(found.additional_duties.as_deref(), Some("Section 301: 7.5%"));
    assert_eq!(repo.count().await.unwrap(), 3);
}

#[sqlx::test]
async fn test_upsert_empty_batch(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    assert_eq!(repo.upsert_batch(Vec::new()).await.unwrap(), 0);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[sqlx::test]
async fn test_find_by_prefix_returns_lowest_number(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    repo.upsert_batch(schedule()).await.unwrap();

    let found = repo.find_by_prefix("0901.2").await.unwrap().unwrap();
    assert_eq!(found.hts_number, "0901.21.00.20");

    assert!(repo.find_by_prefix("8471.30").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_find_by_prefix_treats_wildcards_literally(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    repo.upsert_batch(schedule()).await.unwrap();

    assert!(repo.find_by_prefix("0901.2_").await.unwrap().is_none());
    assert!(repo.find_by_prefix("%").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_search_by_description_requires_every_term(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    repo.upsert_batch(schedule()).await.unwrap();

    let terms = vec!["coffee".to_string(), "ROASTED".to_string()];
    let found = repo.search_by_description(&terms, 10).await.unwrap();
    let numbers: Vec<&str> = found.iter().map(|r| r.hts_number.as_str()).collect();
    assert_eq!(numbers, vec!["0901.21.00.20", "0901.22.00.00"]);

    let terms = vec!["coffee".to_string(), "decaffeinated".to_string()];
    let found = repo.search_by_description(&terms, 1).await.unwrap();
    assert_eq!(found.len(), 1);

    let terms = vec!["coffee".to_string(), "cotton".to_string()];
    assert!(repo.search_by_description(&terms, 10).await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_search_by_description_without_terms(pool: PgPool) {
    let repo = PgHtsRepository::new(Arc::new(pool));

    repo.upsert_batch(schedule()).await.unwrap();

    assert!(repo.search_by_description(&[], 10).await.unwrap().is_empty());

    let terms = vec!["%".to_string()];
    assert!(repo.search_by_description(&terms, 10).await.unwrap().is_empty());
}
