use crate::store::documents::{Attempt, TestSession, UserStats};
use crate::store::{Store, StoreError};

/// `correct / total` as a 0–100 percentage; 0 when the denominator is 0.
pub fn percent(correct: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Pure incremental update for one attempt. Percentages are recomputed
/// from the updated counts, never carried forward.
pub fn apply_attempt(stats: &mut UserStats, attempt: &Attempt) {
    stats.total_questions += 1;
    if attempt.is_correct {
        stats.correct_answers += 1;
    }
    stats.overall_accuracy = percent(stats.correct_answers, stats.total_questions);

    let bucket = stats.category_stats.entry(attempt.category.clone()).or_default();
    bucket.total_questions += 1;
    if attempt.is_correct {
        bucket.correct_answers += 1;
    }
    bucket.accuracy = percent(bucket.correct_answers, bucket.total_questions);
}

/// Applies a whole session: one test taken, every attempt folded in.
pub fn apply_session(stats: &mut UserStats, session: &TestSession) {
    stats.total_tests += 1;
    for attempt in &session.results {
        apply_attempt(stats, attempt);
    }
    stats.last_test_date = Some(session.date);
}

/// Full rebuild from a session log in chronological (append) order. The
/// incremental path and this fold share `apply_attempt`, so the two can
/// only diverge if the log itself changes underneath them.
pub fn fold_sessions(sessions: &[TestSession]) -> UserStats {
    let mut stats = UserStats::default();
    for session in sessions {
        apply_session(&mut stats, session);
    }
    stats
}

impl Store {
    pub fn get_user_stats(&self) -> UserStats {
        self.safe_read()
    }

    /// Rebuilds the stats singleton from the session log and persists it.
    /// Run after any deletion; incremental decrement-on-delete is
    /// deliberately not implemented.
    pub fn recompute_stats_from_log(&self) -> Result<UserStats, StoreError> {
        let sessions: Vec<TestSession> = self.safe_read();
        let stats = fold_sessions(&sessions);
        self.write_or_err(&stats)?;
        Ok(stats)
    }
}
