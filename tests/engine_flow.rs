//! End-to-end flows over a real (temp-dir) store: record sessions, then
//! observe statistics, review queue, learning history, deletion and export
//! all agreeing with each other.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{attempt, now, open_store};

use quiz_engine::store::documents::{local_day, Document, UserStats};
use quiz_engine::store::operations::stats;

#[test]
fn finance_scenario_end_to_end() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    store
        .record_session(vec![
            attempt("Finance", "q1", true, at),
            attempt("Finance", "q2", false, at),
            attempt("Finance", "q3", false, at),
        ])
        .expect("record session");

    let user_stats = store.get_user_stats();
    assert_eq!(user_stats.total_tests, 1);
    assert_eq!(user_stats.total_questions, 3);
    assert_eq!(user_stats.correct_answers, 1);
    assert!((user_stats.overall_accuracy - 100.0 / 3.0).abs() < 1e-9);
    assert!((user_stats.category_stats["Finance"].accuracy - 100.0 / 3.0).abs() < 1e-9);

    let queue = store.get_review_entries();
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|entry| entry.wrong_count == 1));

    let today = store.get_daily_record(local_day(at)).expect("daily record");
    assert_eq!(today.question_count, 3);
    assert!((today.correct_rate - 100.0 / 3.0).abs() < 1e-9);

    assert_eq!(store.consecutive_days_from(local_day(at)), 1);
}

#[test]
fn stored_stats_always_equal_recompute_from_log() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    let sessions = [
        vec![attempt("Finance", "q1", true, at)],
        vec![
            attempt("Legal", "q2", false, at),
            attempt("Legal", "q3", true, at),
        ],
        vec![attempt("Finance", "q1", false, at)],
    ];

    for batch in sessions {
        store.record_session(batch).expect("record session");

        let stored = store.get_user_stats();
        let folded = stats::fold_sessions(&store.get_sessions());
        assert_eq!(stored.total_tests, folded.total_tests);
        assert_eq!(stored.total_questions, folded.total_questions);
        assert_eq!(stored.correct_answers, folded.correct_answers);
        assert_eq!(stored.overall_accuracy, folded.overall_accuracy);
        for (category, bucket) in &stored.category_stats {
            let other = &folded.category_stats[category];
            assert_eq!(bucket.total_questions, other.total_questions);
            assert_eq!(bucket.correct_answers, other.correct_answers);
            assert_eq!(bucket.accuracy, other.accuracy);
        }
    }
}

#[test]
fn review_queue_tracks_most_recent_outcome_across_sessions() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    store
        .record_session(vec![attempt("Finance", "q1", false, at)])
        .expect("record session");
    store
        .record_session(vec![attempt("Finance", "q1", false, at + Duration::minutes(5))])
        .expect("record session");

    let queue = store.get_review_entries();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].wrong_count, 2);

    store
        .record_session(vec![attempt("Finance", "q1", true, at + Duration::minutes(10))])
        .expect("record session");
    assert!(store.get_review_entries().is_empty());
    assert!(store.get_incorrect_question_ids().is_empty());
}

#[test]
fn date_deletion_leaves_log_history_and_stats_consistent() {
    let handle = open_store();
    let store = &handle.store;

    let late = Utc.with_ymd_and_hms(2025, 4, 20, 12, 0, 0).unwrap();
    let early = late - Duration::days(3);
    let early_day = local_day(early);

    store
        .record_session(vec![
            attempt("Finance", "q1", true, early),
            attempt("Legal", "q2", false, late),
        ])
        .expect("record session");
    store
        .record_session(vec![attempt("Finance", "q3", false, early)])
        .expect("record session");

    let removed = store.delete_by_calendar_date(early_day).expect("delete");
    assert_eq!(removed, 2);

    assert!(store.get_attempts_by_calendar_date(early_day).is_empty());
    assert!(store.get_daily_record(early_day).is_none());
    // The untouched day survives.
    assert!(store.get_daily_record(local_day(late)).is_some());

    let stored = store.get_user_stats();
    let folded = stats::fold_sessions(&store.get_sessions());
    assert_eq!(stored.total_questions, folded.total_questions);
    assert_eq!(stored.overall_accuracy, folded.overall_accuracy);
    assert_eq!(stored.total_tests, folded.total_tests);
}

#[test]
fn corrupted_primary_is_restored_from_backup() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    store
        .record_session(vec![attempt("Finance", "q1", true, at)])
        .expect("record session");
    let before = store.get_user_stats();
    assert_eq!(before.total_questions, 1);
    assert!(store.last_backup_at().is_some());

    // Corrupt the primary copy directly in storage, bypassing safe_write.
    store
        .documents
        .insert(UserStats::KEY.as_bytes(), b"{not json".to_vec())
        .expect("inject corruption");

    let recovered = store.get_user_stats();
    assert_eq!(recovered.total_questions, before.total_questions);
    assert_eq!(recovered.overall_accuracy, before.overall_accuracy);

    // The read promoted the backup: the primary is clean again.
    let raw = store
        .documents
        .get(UserStats::KEY.as_bytes())
        .unwrap()
        .expect("primary present");
    assert!(serde_json::from_slice::<UserStats>(&raw).is_ok());
}

#[test]
fn shape_invalid_primary_falls_back_to_backup_then_default() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    store
        .record_session(vec![attempt("Finance", "q1", false, at)])
        .expect("record session");

    // Well-formed JSON with an impossible shape: correct > total.
    store
        .documents
        .insert(
            UserStats::KEY.as_bytes(),
            br#"{"totalTests":1,"totalQuestions":1,"correctAnswers":9,"overallAccuracy":0.0,"categoryStats":{},"lastTestDate":null}"#
                .to_vec(),
        )
        .expect("inject bad shape");
    assert_eq!(store.get_user_stats().total_questions, 1);

    // With primary and backup both gone, reads degrade to the default.
    store.documents.remove(UserStats::KEY.as_bytes()).unwrap();
    store.backups.remove(UserStats::KEY.as_bytes()).unwrap();
    let stats = store.get_user_stats();
    assert_eq!(stats.total_questions, 0);
    assert_eq!(stats.overall_accuracy, 0.0);
}

#[test]
fn wipe_then_reuse_starts_from_a_clean_slate() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    let user_id = store.get_or_create_user_id().expect("identity");
    store
        .record_session(vec![
            attempt("Finance", "q1", false, at),
            attempt("Legal", "q2", true, at),
        ])
        .expect("record session");

    let summary = store.wipe_all().expect("wipe");
    assert_eq!(summary.attempts, 2);

    // Identity survives a wipe; learner data does not.
    assert_eq!(store.get_or_create_user_id().expect("identity"), user_id);
    assert!(store.get_sessions().is_empty());

    store
        .record_session(vec![attempt("Finance", "q3", true, at)])
        .expect("record session");
    let stats = store.get_user_stats();
    assert_eq!(stats.total_tests, 1);
    assert_eq!(stats.overall_accuracy, 100.0);
}

#[test]
fn export_counts_rows_across_sessions() {
    let handle = open_store();
    let store = &handle.store;
    let at = now();

    store
        .record_session(vec![
            attempt("Finance", "q1", true, at),
            attempt("Finance", "q2", false, at),
            attempt("Finance", "q3", true, at),
            attempt("Legal", "q4", false, at),
        ])
        .expect("record session");
    store
        .record_session(vec![
            attempt("Safety", "q5", true, at),
            attempt("Safety", "q6", false, at),
            attempt("Safety", "q7", true, at),
        ])
        .expect("record session");

    let csv = store.export_csv();
    assert_eq!(csv.lines().count(), 1 + 7);
}
