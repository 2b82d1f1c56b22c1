//! Dynamic-table repository for site content records.
//!
//! Table names come only from the [`ContentTable`] allow-list and column
//! names must match the field-name pattern, so both are safe to splice into
//! SQL. Values always travel as a single JSONB parameter and are cast to
//! the table's row type by `jsonb_populate_record`. Records come back as
//! JSON objects via `to_jsonb`.

use folio_core::tables::{self, ContentTable, ID_FIELD};
use folio_core::types::{Record, RecordId};
use sqlx::types::Json;
use sqlx::PgPool;

/// Column maintained by the repository on every update.
const UPDATED_AT: &str = "updated_at";

/// Provides select/insert/update/delete over any allow-listed content table.
pub struct ContentRecordRepo;

impl ContentRecordRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        table: ContentTable,
        id: RecordId,
    ) -> Result<Option<Record>, sqlx::Error> {
        let query = format!("SELECT to_jsonb(t.*) FROM {table} t WHERE t.id = $1");
        let row: Option<Json<Record>> = sqlx::query_scalar(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|j| j.0))
    }

    /// Insert the given fields; the database assigns the id and defaults.
    pub async fn create(
        pool: &PgPool,
        table: ContentTable,
        fields: &Record,
    ) -> Result<Record, sqlx::Error> {
        let columns = column_list(fields)?;
        let query = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES RETURNING to_jsonb({table}.*)")
        } else {
            let joined = columns.join(", ");
            format!(
                "INSERT INTO {table} ({joined}) \
                 SELECT {joined} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING to_jsonb({table}.*)"
            )
        };
        let mut q = sqlx::query_scalar::<_, Json<Record>>(&query);
        if !columns.is_empty() {
            q = q.bind(Json(fields));
        }
        q.fetch_one(pool).await.map(|j| j.0)
    }

    /// Overwrite the given fields and bump `updated_at` unless it is among
    /// them. Returns `None` when no row has that id.
    pub async fn update(
        pool: &PgPool,
        table: ContentTable,
        id: RecordId,
        fields: &Record,
    ) -> Result<Option<Record>, sqlx::Error> {
        let columns = column_list(fields)?;
        let mut assignments: Vec<String> =
            columns.iter().map(|c| format!("{c} = r.{c}")).collect();
        if !fields.contains_key(UPDATED_AT) {
            assignments.push(format!("{UPDATED_AT} = now()"));
        }

        let query = format!(
            "UPDATE {table} AS t SET {} \
             FROM jsonb_populate_record(NULL::{table}, $2) AS r \
             WHERE t.id = $1 \
             RETURNING to_jsonb(t.*)",
            assignments.join(", ")
        );
        let row: Option<Json<Record>> = sqlx::query_scalar(&query)
            .bind(id)
            .bind(Json(fields))
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|j| j.0))
    }

    /// Delete a record. Returns `false` when no row has that id.
    pub async fn delete(pool: &PgPool, table: ContentTable, id: RecordId) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count(pool: &PgPool, table: ContentTable) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {table}");
        sqlx::query_scalar(&query).fetch_one(pool).await
    }

    /// Row counts grouped by the rendered value of `status_field`.
    pub async fn count_by_status(
        pool: &PgPool,
        table: ContentTable,
        status_field: &str,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        tables::validate_field_name(status_field)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let query = format!(
            "SELECT COALESCE({status_field}::text, 'null') AS status, COUNT(*) AS total \
             FROM {table} GROUP BY 1 ORDER BY 1"
        );
        sqlx::query_as(&query).fetch_all(pool).await
    }
}

/// Quoted column names for every field except `id`.
fn column_list(fields: &Record) -> Result<Vec<String>, sqlx::Error> {
    fields
        .keys()
        .filter(|name| name.as_str() != ID_FIELD)
        .map(|name| {
            tables::validate_field_name(name)
                .map(|_| format!("\"{name}\""))
                .map_err(|e| sqlx::Error::Protocol(e.to_string()))
        })
        .collect()
}
