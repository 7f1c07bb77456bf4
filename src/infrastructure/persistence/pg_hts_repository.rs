//! PostgreSQL implementation of the HTS reference repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::HtsRow;
use crate::domain::repositories::HtsRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct HtsRecordRow {
    hts_number: String,
    description: String,
    general_rate_of_duty: Option<String>,
    special_rate_of_duty: Option<String>,
    column_2_rate_of_duty: Option<String>,
    unit_of_quantity: Vec<String>,
    additional_duties: Option<String>,
}

impl From<HtsRecordRow> for HtsRow {
    fn from(r: HtsRecordRow) -> Self {
        HtsRow {
            hts_number: r.hts_number,
            description: r.description,
            general_rate_of_duty: r.general_rate_of_duty,
            special_rate_of_duty: r.special_rate_of_duty,
            column_2_rate_of_duty: r.column_2_rate_of_duty,
            unit_of_quantity: r.unit_of_quantity,
            additional_duties: r.additional_duties,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT hts_number, description, general_rate_of_duty, special_rate_of_duty,
           column_2_rate_of_duty, unit_of_quantity, additional_duties
    FROM hts_codes
"#;

/// Escapes `LIKE` wildcards so the text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PostgreSQL repository over the `hts_codes` reference table.
pub struct PgHtsRepository {
    pool: Arc<PgPool>,
}

impl PgHtsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HtsRepository for PgHtsRepository {
    async fn find_by_number(&self, hts_number: &str) -> Result<Option<HtsRow>, AppError> {
        let row = sqlx::query_as::<_, HtsRecordRow>(&format!(
            "{SELECT_COLUMNS} WHERE hts_number = $1"
        ))
        .bind(hts_number)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(HtsRow::from))
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<HtsRow>, AppError> {
        let pattern = format!("{}%", escape_like(prefix));

        let row = sqlx::query_as::<_, HtsRecordRow>(&format!(
            "{SELECT_COLUMNS} WHERE hts_number LIKE $1 ORDER BY hts_number LIMIT 1"
        ))
        .bind(pattern)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(HtsRow::from))
    }

    async fn search_by_description(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<HtsRow>, AppError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_COLUMNS);
        builder.push(" WHERE ");
        {
            let mut conditions = builder.separated(" AND ");
            for term in terms {
                conditions.push("description ILIKE ");
                conditions.push_bind_unseparated(format!("%{}%", escape_like(term)));
            }
        }
        builder.push(" ORDER BY hts_number LIMIT ");
        builder.push_bind(limit);

        let rows = builder
            .build_query_as::<HtsRecordRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(HtsRow::from).collect())
    }

    async fn upsert_batch(&self, rows: Vec<HtsRow>) -> Result<u64, AppError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO hts_codes (hts_number, description, general_rate_of_duty, \
             special_rate_of_duty, column_2_rate_of_duty, unit_of_quantity, additional_duties) ",
        );

        builder.push_values(rows, |mut b, row| {
            b.push_bind(row.hts_number)
                .push_bind(row.description)
                .push_bind(row.general_rate_of_duty)
                .push_bind(row.special_rate_of_duty)
                .push_bind(row.column_2_rate_of_duty)
                .push_bind(row.unit_of_quantity)
                .push_bind(row.additional_duties);
        });

        builder.push(
            " ON CONFLICT (hts_number) DO UPDATE SET \
             description = EXCLUDED.description, \
             general_rate_of_duty = EXCLUDED.general_rate_of_duty, \
             special_rate_of_duty = EXCLUDED.special_rate_of_duty, \
             column_2_rate_of_duty = EXCLUDED.column_2_rate_of_duty, \
             unit_of_quantity = EXCLUDED.unit_of_quantity, \
             additional_duties = EXCLUDED.additional_duties, \
             updated_at = NOW()",
        );

        let result = builder.build().execute(self.pool.as_ref()).await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hts_codes")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
