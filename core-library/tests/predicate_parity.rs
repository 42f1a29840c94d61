//! The SQL lowering of a predicate selects exactly the records that the
//! in-memory evaluation accepts.

use bridge_traits::media::MediaKind;
use chrono::DateTime;
use core_library::db::create_test_pool;
use core_library::{
    CaptureId, CapturePredicate, CaptureRecord, CaptureRepository, ProcessingStatus,
    SqliteCaptureRepository,
};
use std::collections::HashSet;
use uuid::Uuid;

fn capture(index: i64, kind: MediaKind, favorite: bool, downloaded: bool) -> CaptureRecord {
    CaptureRecord {
        id: CaptureId::new(),
        state: String::new(),
        kind,
        is_favorite: favorite,
        created_at: DateTime::from_timestamp_millis(index * 60_000).unwrap(),
        modified_at: DateTime::from_timestamp_millis(index * 60_000).unwrap(),
        thumbnail_id: Uuid::new_v4(),
        thumbnail_access_token: format!("token-{}", index),
        locally_downloaded: downloaded,
        last_sync_date: None,
        processing_status: if downloaded {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::Pending
        },
    }
}

#[tokio::test]
async fn sql_and_memory_evaluation_agree() {
    let repo = SqliteCaptureRepository::new(create_test_pool().await.unwrap());

    let records: Vec<CaptureRecord> = (0..12)
        .map(|i| {
            let kind = if i % 3 == 0 {
                MediaKind::Video
            } else {
                MediaKind::Photo
            };
            capture(i, kind, i % 2 == 0, i % 4 == 0)
        })
        .collect();
    for record in &records {
        repo.upsert(record).await.unwrap();
    }

    let some_ids: Vec<CaptureId> = records.iter().step_by(2).map(|r| r.id).collect();
    let predicates = vec![
        CapturePredicate::All,
        CapturePredicate::IdEquals(records[5].id),
        CapturePredicate::IdIn(some_ids.clone()),
        CapturePredicate::IdNotIn(some_ids.clone()),
        CapturePredicate::KindIs(MediaKind::Video),
        CapturePredicate::IsFavorite(true),
        CapturePredicate::LocallyDownloaded(false),
        CapturePredicate::IdIn(some_ids)
            .and(CapturePredicate::LocallyDownloaded(true))
            .and(CapturePredicate::KindIs(MediaKind::Photo)),
    ];

    for predicate in predicates {
        let from_sql: HashSet<CaptureId> = repo
            .fetch(&predicate)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        let from_memory: HashSet<CaptureId> = records
            .iter()
            .filter(|r| predicate.matches(r))
            .map(|r| r.id)
            .collect();

        assert_eq!(from_sql, from_memory, "mismatch for {:?}", predicate);
    }
}

#[tokio::test]
async fn large_id_sets_stay_within_variable_limits() {
    let repo = SqliteCaptureRepository::new(create_test_pool().await.unwrap());
    let kept = capture(1, MediaKind::Photo, false, false);
    repo.upsert(&kept).await.unwrap();

    let mut seen: Vec<CaptureId> = (0..5_000).map(|_| CaptureId::new()).collect();
    seen.push(kept.id);

    let deleted = repo.delete(&CapturePredicate::IdNotIn(seen)).await.unwrap();

    assert_eq!(deleted, 0);
    assert_eq!(repo.count(&CapturePredicate::All).await.unwrap(), 1);
}
