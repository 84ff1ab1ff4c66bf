/// Upload metadata store
///
/// Runtime-built queries over the `uploads` table; this module owns every
/// SQL statement that touches upload rows.
use crate::error::ApiResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Row, SqlitePool};

/// Metadata row describing one stored file
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    pub id: String,
    pub filename: String,
    pub storage_key: String,
    pub mimetype: String,
    pub size: i64,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Listing row: the fields exposed to list/query responses
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// Optional predicates for metadata queries
#[derive(Debug, Clone, Default)]
pub struct UploadFilters {
    /// Substring match on the filename
    pub filename: Option<String>,
    /// Exact MIME type
    pub mimetype: Option<String>,
    pub size_min: Option<i64>,
    pub size_max: Option<i64>,
    /// Inclusive lower bound, YYYY-MM-DD
    pub after_date: Option<String>,
}

/// Typed access to upload metadata
#[derive(Clone)]
pub struct UploadStore {
    db: SqlitePool,
}

impl UploadStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a new upload row
    pub async fn insert(&self, record: &UploadRecord) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO uploads (id, filename, storage_key, mimetype, size, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.storage_key)
        .bind(&record.mimetype)
        .bind(record.size)
        .bind(&record.owner_id)
        .bind(record.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Fetch one row by id
    pub async fn get(&self, id: &str) -> ApiResult<Option<UploadRecord>> {
        let row = sqlx::query(
            "SELECT id, filename, storage_key, mimetype, size, owner_id, created_at
             FROM uploads WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|row| UploadRecord {
            id: row.get("id"),
            filename: row.get("filename"),
            storage_key: row.get("storage_key"),
            mimetype: row.get("mimetype"),
            size: row.get("size"),
            owner_id: row.get("owner_id"),
            created_at: row.get("created_at"),
        }))
    }

    /// Delete one row by id
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM uploads WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// All rows for one owner, newest first
    pub async fn list_for_owner(&self, owner_id: &str) -> ApiResult<Vec<UploadSummary>> {
        self.query_for_owner(owner_id, &UploadFilters::default())
            .await
    }

    /// Filtered rows for one owner, newest first
    pub async fn query_for_owner(
        &self,
        owner_id: &str,
        filters: &UploadFilters,
    ) -> ApiResult<Vec<UploadSummary>> {
        let mut query = QueryBuilder::new(
            "SELECT id, filename, mimetype, size, created_at FROM uploads WHERE owner_id = ",
        );
        query.push_bind(owner_id.to_string());

        if let Some(filename) = &filters.filename {
            query.push(" AND filename LIKE ");
            query.push_bind(format!("%{}%", filename));
        }
        if let Some(mimetype) = &filters.mimetype {
            query.push(" AND mimetype = ");
            query.push_bind(mimetype.clone());
        }
        if let Some(size_min) = filters.size_min {
            query.push(" AND size >= ");
            query.push_bind(size_min);
        }
        if let Some(size_max) = filters.size_max {
            query.push(" AND size <= ");
            query.push_bind(size_max);
        }
        if let Some(after_date) = &filters.after_date {
            // created_at is RFC 3339, so a date prefix compares correctly
            query.push(" AND created_at >= ");
            query.push_bind(after_date.clone());
        }

        query.push(" ORDER BY created_at DESC");

        let rows = query.build().fetch_all(&self.db).await?;

        Ok(rows
            .into_iter()
            .map(|row| UploadSummary {
                id: row.get("id"),
                filename: row.get("filename"),
                mimetype: row.get("mimetype"),
                size: row.get("size"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, DatabaseOptions};
    use std::path::Path;

    async fn store() -> UploadStore {
        let pool = create_pool(Path::new(":memory:"), DatabaseOptions::default())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        UploadStore::new(pool)
    }

    fn record(id: &str, owner: &str, filename: &str, size: i64) -> UploadRecord {
        UploadRecord {
            id: id.to_string(),
            filename: filename.to_string(),
            storage_key: format!("uploads/{}/{}.bin", owner, id),
            mimetype: "text/plain".to_string(),
            size,
            owner_id: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let store = store().await;
        let rec = record("f1", "u1", "a.txt", 10);

        store.insert(&rec).await.unwrap();

        let fetched = store.get("f1").await.unwrap().unwrap();
        assert_eq!(fetched.filename, "a.txt");
        assert_eq!(fetched.owner_id, "u1");
        assert_eq!(fetched.size, 10);

        store.delete("f1").await.unwrap();
        assert!(store.get("f1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = store().await;
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner() {
        let store = store().await;
        store.insert(&record("f1", "u1", "a.txt", 1)).await.unwrap();
        store.insert(&record("f2", "u1", "b.txt", 2)).await.unwrap();
        store.insert(&record("f3", "u2", "c.txt", 3)).await.unwrap();

        let mine = store.list_for_owner("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|s| s.id != "f3"));
    }

    #[tokio::test]
    async fn test_query_filters() {
        let store = store().await;
        store
            .insert(&record("f1", "u1", "report.pdf", 5000))
            .await
            .unwrap();
        store
            .insert(&record("f2", "u1", "notes.txt", 100))
            .await
            .unwrap();

        let by_name = store
            .query_for_owner(
                "u1",
                &UploadFilters {
                    filename: Some("report".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "f1");

        let by_size = store
            .query_for_owner(
                "u1",
                &UploadFilters {
                    size_min: Some(1000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_size.len(), 1);
        assert_eq!(by_size[0].id, "f1");

        let bounded = store
            .query_for_owner(
                "u1",
                &UploadFilters {
                    size_min: Some(50),
                    size_max: Some(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].id, "f2");

        let dated = store
            .query_for_owner(
                "u1",
                &UploadFilters {
                    after_date: Some("2000-01-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(dated.len(), 2);

        let future = store
            .query_for_owner(
                "u1",
                &UploadFilters {
                    after_date: Some("2999-01-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(future.is_empty());
    }
}
