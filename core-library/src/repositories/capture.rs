//! Capture repository trait and SQLite implementation

use crate::error::{LibraryError, Result};
use crate::models::{CaptureId, CaptureRecord, ProcessingStatus};
use crate::query::{BindValue, CapturePredicate, CaptureQuery};
use async_trait::async_trait;
use bridge_traits::media::MediaKind;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// Local capture store.
///
/// Every access is expressed as a [`CapturePredicate`]. Upserts are keyed by
/// capture id, so concurrent upserts of distinct records never conflict.
#[async_trait]
pub trait CaptureRepository: Send + Sync {
    /// Fetch every record matching `predicate`.
    async fn fetch(&self, predicate: &CapturePredicate) -> Result<Vec<CaptureRecord>>;

    /// Insert `record`, or replace the stored record with the same id.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the record fails validation.
    async fn upsert(&self, record: &CaptureRecord) -> Result<()>;

    /// Delete every record matching `predicate`.
    ///
    /// # Returns
    /// Number of records removed
    async fn delete(&self, predicate: &CapturePredicate) -> Result<u64>;

    /// Durably flush pending writes.
    async fn save(&self) -> Result<()>;

    /// Browse records with filter, sort and limit.
    async fn query(&self, query: &CaptureQuery) -> Result<Vec<CaptureRecord>>;

    /// Find a record by id
    async fn find_by_id(&self, id: CaptureId) -> Result<Option<CaptureRecord>>;

    /// Count records matching `predicate`.
    async fn count(&self, predicate: &CapturePredicate) -> Result<u64>;
}

/// SQLite implementation of CaptureRepository
pub struct SqliteCaptureRepository {
    pool: SqlitePool,
}

impl SqliteCaptureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn select(&self, predicate: &CapturePredicate, tail: &str) -> Result<Vec<CaptureRecord>> {
        let condition = predicate.to_sql();
        let sql = format!(
            "SELECT * FROM captures WHERE {}{}",
            condition.clause, tail
        );

        let rows = bind_all(sqlx::query(&sql), &condition.binds)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_capture).collect()
    }
}

#[async_trait]
impl CaptureRepository for SqliteCaptureRepository {
    async fn fetch(&self, predicate: &CapturePredicate) -> Result<Vec<CaptureRecord>> {
        self.select(predicate, "").await
    }

    async fn upsert(&self, record: &CaptureRecord) -> Result<()> {
        record.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "capture".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO captures (
                id, state, kind, is_favorite,
                created_at, modified_at,
                thumbnail_id, thumbnail_access_token,
                locally_downloaded, last_sync_date, processing_status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                kind = excluded.kind,
                is_favorite = excluded.is_favorite,
                created_at = excluded.created_at,
                modified_at = excluded.modified_at,
                thumbnail_id = excluded.thumbnail_id,
                thumbnail_access_token = excluded.thumbnail_access_token,
                locally_downloaded = excluded.locally_downloaded,
                last_sync_date = excluded.last_sync_date,
                processing_status = excluded.processing_status
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.state)
        .bind(record.kind.as_str())
        .bind(record.is_favorite)
        .bind(record.created_at.timestamp_millis())
        .bind(record.modified_at.timestamp_millis())
        .bind(record.thumbnail_id.to_string())
        .bind(&record.thumbnail_access_token)
        .bind(record.locally_downloaded)
        .bind(record.last_sync_date.map(|d| d.timestamp_millis()))
        .bind(record.processing_status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, predicate: &CapturePredicate) -> Result<u64> {
        let condition = predicate.to_sql();
        let sql = format!("DELETE FROM captures WHERE {}", condition.clause);

        let result = bind_all(sqlx::query(&sql), &condition.binds)
            .execute(&self.pool)
            .await?;

        debug!(deleted = result.rows_affected(), "Deleted capture records");
        Ok(result.rows_affected())
    }

    async fn save(&self) -> Result<()> {
        // Statements autocommit; fold the WAL back into the main file.
        sqlx::query("PRAGMA wal_checkpoint(PASSIVE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(&self, query: &CaptureQuery) -> Result<Vec<CaptureRecord>> {
        let mut tail = format!(" ORDER BY {}", query.order_by_sql());
        if let Some(limit) = query.limit {
            tail.push_str(&format!(" LIMIT {}", limit));
        }

        self.select(&query.filter.predicate(), &tail).await
    }

    async fn find_by_id(&self, id: CaptureId) -> Result<Option<CaptureRecord>> {
        let row = sqlx::query("SELECT * FROM captures WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_capture).transpose()
    }

    async fn count(&self, predicate: &CapturePredicate) -> Result<u64> {
        let condition = predicate.to_sql();
        let sql = format!("SELECT COUNT(*) FROM captures WHERE {}", condition.clause);

        let row = bind_all(sqlx::query(&sql), &condition.binds)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;

        Ok(count.max(0) as u64)
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &'q [BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in binds {
        query = match value {
            BindValue::Text(text) => query.bind(text.as_str()),
            BindValue::I64(number) => query.bind(*number),
        };
    }
    query
}

fn corrupt(field: &str, message: impl Into<String>) -> LibraryError {
    LibraryError::InvalidInput {
        field: field.to_string(),
        message: message.into(),
    }
}

fn millis_to_datetime(field: &str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| corrupt(field, format!("timestamp out of range: {}", millis)))
}

fn row_to_capture(row: &SqliteRow) -> Result<CaptureRecord> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let thumbnail_id: String = row.try_get("thumbnail_id")?;
    let status: String = row.try_get("processing_status")?;
    let last_sync: Option<i64> = row.try_get("last_sync_date")?;

    Ok(CaptureRecord {
        id: CaptureId::from_string(&id).map_err(|e| corrupt("id", e.to_string()))?,
        state: row.try_get("state")?,
        kind: MediaKind::parse(&kind)
            .ok_or_else(|| corrupt("kind", format!("unknown media kind '{}'", kind)))?,
        is_favorite: row.try_get("is_favorite")?,
        created_at: millis_to_datetime("created_at", row.try_get("created_at")?)?,
        modified_at: millis_to_datetime("modified_at", row.try_get("modified_at")?)?,
        thumbnail_id: Uuid::parse_str(&thumbnail_id)
            .map_err(|e| corrupt("thumbnail_id", e.to_string()))?,
        thumbnail_access_token: row.try_get("thumbnail_access_token")?,
        locally_downloaded: row.try_get("locally_downloaded")?,
        last_sync_date: last_sync
            .map(|millis| millis_to_datetime("last_sync_date", millis))
            .transpose()?,
        processing_status: ProcessingStatus::parse(&status)
            .ok_or_else(|| corrupt("processing_status", format!("unknown status '{}'", status)))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::query::{CaptureFilter, CaptureSort, SortOrder};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn create_test_capture(kind: MediaKind, created_millis: i64) -> CaptureRecord {
        CaptureRecord {
            id: CaptureId::new(),
            state: "PROCESSED".to_string(),
            kind,
            is_favorite: false,
            created_at: at(created_millis),
            modified_at: at(created_millis + 1_000),
            thumbnail_id: Uuid::new_v4(),
            thumbnail_access_token: "thumb-token".to_string(),
            locally_downloaded: false,
            last_sync_date: None,
            processing_status: ProcessingStatus::Pending,
        }
    }

    async fn repo() -> SqliteCaptureRepository {
        SqliteCaptureRepository::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_find_capture() {
        let repo = repo().await;
        let mut capture = create_test_capture(MediaKind::Video, 1_709_287_200_000);
        capture.last_sync_date = Some(at(1_709_300_000_123));

        repo.upsert(&capture).await.unwrap();

        let found = repo.find_by_id(capture.id).await.unwrap();
        assert_eq!(found, Some(capture));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_record() {
        let repo = repo().await;
        let mut capture = create_test_capture(MediaKind::Photo, 1_709_287_200_000);
        repo.upsert(&capture).await.unwrap();

        capture.locally_downloaded = true;
        capture.processing_status = ProcessingStatus::Completed;
        capture.is_favorite = true;
        repo.upsert(&capture).await.unwrap();

        assert_eq!(repo.count(&CapturePredicate::All).await.unwrap(), 1);
        let found = repo.find_by_id(capture.id).await.unwrap().unwrap();
        assert!(found.locally_downloaded);
        assert!(found.is_favorite);
        assert_eq!(found.processing_status, ProcessingStatus::Completed);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_record() {
        let repo = repo().await;
        let mut capture = create_test_capture(MediaKind::Photo, 1_709_287_200_000);
        capture.thumbnail_access_token.clear();

        let result = repo.upsert(&capture).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_fetch_by_id_set_and_flag() {
        let repo = repo().await;
        let a = create_test_capture(MediaKind::Photo, 1_000);
        let mut b = create_test_capture(MediaKind::Photo, 2_000);
        b.locally_downloaded = true;
        b.processing_status = ProcessingStatus::Completed;
        let c = create_test_capture(MediaKind::Video, 3_000);
        for capture in [&a, &b, &c] {
            repo.upsert(capture).await.unwrap();
        }

        let downloaded = repo
            .fetch(
                &CapturePredicate::IdIn(vec![a.id, b.id])
                    .and(CapturePredicate::LocallyDownloaded(true)),
            )
            .await
            .unwrap();

        assert_eq!(downloaded.len(), 1);
        assert_eq!(downloaded[0].id, b.id);
    }

    #[tokio::test]
    async fn test_delete_not_in_seen_set() {
        let repo = repo().await;
        let stale = create_test_capture(MediaKind::Photo, 1_000);
        let kept = create_test_capture(MediaKind::Video, 2_000);
        repo.upsert(&stale).await.unwrap();
        repo.upsert(&kept).await.unwrap();

        let deleted = repo
            .delete(&CapturePredicate::IdNotIn(vec![kept.id]))
            .await
            .unwrap();
        repo.save().await.unwrap();

        assert_eq!(deleted, 1);
        assert!(repo.find_by_id(stale.id).await.unwrap().is_none());
        assert!(repo.find_by_id(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_all_clears_store() {
        let repo = repo().await;
        for i in 0..5 {
            repo.upsert(&create_test_capture(MediaKind::Photo, i * 1_000))
                .await
                .unwrap();
        }

        assert_eq!(repo.delete(&CapturePredicate::All).await.unwrap(), 5);
        assert_eq!(repo.count(&CapturePredicate::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_limits() {
        let repo = repo().await;
        let old_photo = create_test_capture(MediaKind::Photo, 1_000);
        let mut new_photo = create_test_capture(MediaKind::Photo, 3_000);
        new_photo.is_favorite = true;
        let video = create_test_capture(MediaKind::Video, 2_000);
        for capture in [&old_photo, &new_photo, &video] {
            repo.upsert(capture).await.unwrap();
        }

        let all = repo.query(&CaptureQuery::new()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![new_photo.id, video.id, old_photo.id]);

        let photos = repo
            .query(
                &CaptureQuery::new()
                    .with_filter(CaptureFilter::Photos)
                    .with_sort(CaptureSort::CreatedAt, SortOrder::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, old_photo.id);

        let favorites = repo
            .query(&CaptureQuery::new().with_filter(CaptureFilter::Favorites))
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, new_photo.id);

        let recent = repo.query(&CaptureQuery::recent(1)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, new_photo.id);
    }

    #[tokio::test]
    async fn test_count_with_predicate() {
        let repo = repo().await;
        repo.upsert(&create_test_capture(MediaKind::Photo, 1_000))
            .await
            .unwrap();
        repo.upsert(&create_test_capture(MediaKind::Video, 2_000))
            .await
            .unwrap();

        assert_eq!(
            repo.count(&CapturePredicate::KindIs(MediaKind::Video))
                .await
                .unwrap(),
            1
        );
        assert_eq!(repo.count(&CapturePredicate::IdIn(vec![])).await.unwrap(), 0);
    }
}
