use chrono::NaiveDate;
use sled::Transactional;

use crate::store::documents::{DailyRecord, ReviewEntry, TestSession};
use crate::store::{keys, Store, StoreError};

/// Counts removed by a full wipe, for the caller's confirmation summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeSummary {
    pub sessions: usize,
    pub attempts: usize,
    pub review_entries: usize,
    pub history_days: usize,
}

impl Store {
    /// Deletes the session log, statistics, review queue and learning
    /// history, including their backup slots. The engine trusts that the
    /// caller has already confirmed the operation with the user.
    pub fn wipe_all(&self) -> Result<WipeSummary, StoreError> {
        let sessions: Vec<TestSession> = self.safe_read();
        let review: Vec<ReviewEntry> = self.safe_read();
        let history: Vec<DailyRecord> = self.safe_read();
        let summary = WipeSummary {
            sessions: sessions.len(),
            attempts: sessions.iter().map(|s| s.results.len()).sum(),
            review_entries: review.len(),
            history_days: history.len(),
        };

        // All-or-nothing: every document and its backup slot go in one
        // transaction, so a storage error cannot leave a partial wipe.
        (&self.documents, &self.backups)
            .transaction(|(tx_documents, tx_backups)| {
                for key in keys::WIPED_DOCUMENTS {
                    tx_documents.remove(key.as_bytes())?;
                    tx_backups.remove(key.as_bytes())?;
                }
                Ok(())
            })
            .map_err(|error: sled::transaction::TransactionError<()>| match error {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(storage_error) => {
                    StoreError::Sled(storage_error)
                }
            })?;
        self.flush()?;

        tracing::info!(
            sessions = summary.sessions,
            attempts = summary.attempts,
            "Wiped all learner data"
        );
        Ok(summary)
    }

    /// Removes every attempt whose `test_date` falls on the given local
    /// day, drops sessions that end up empty, rescoring sessions that were
    /// split, deletes the day's learning record, and rebuilds the stats
    /// singleton from what remains. Returns the number of attempts
    /// removed; 0 means nothing matched and nothing was touched.
    pub fn delete_by_calendar_date(&self, day: NaiveDate) -> Result<usize, StoreError> {
        let mut sessions: Vec<TestSession> = self.safe_read();

        let mut removed = 0usize;
        for session in &mut sessions {
            let before = session.results.len();
            session.results.retain(|attempt| attempt.local_day() != day);
            if session.results.len() != before {
                removed += before - session.results.len();
                session.rescore();
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        sessions.retain(|session| !session.results.is_empty());

        self.write_or_err(&sessions)?;
        self.recompute_day(day)?;
        self.recompute_stats_from_log()?;

        tracing::info!(%day, removed, "Deleted attempts for calendar date");
        Ok(removed)
    }

    /// Renders the full result log as CSV: a header row plus one row per
    /// attempt, with the current overall accuracy repeated on every row.
    /// Pure projection, no side effects.
    pub fn export_csv(&self) -> String {
        const HEADER: &str = "userId,testDate,category,questionId,questionSummary,\
correctAnswer,userAnswer,result,timeSpentSecs,score,overallAccuracy";

        let stats = self.get_user_stats();
        let accuracy = format!("{:.1}%", stats.overall_accuracy);

        let mut rows = vec![HEADER.to_string()];
        for session in self.get_sessions() {
            for attempt in session.results {
                let fields = [
                    attempt.user_id,
                    attempt.test_date.to_rfc3339(),
                    attempt.category,
                    attempt.question_id,
                    attempt.question_summary,
                    attempt.correct_answer.to_string(),
                    attempt.user_answer.to_string(),
                    if attempt.is_correct { "correct" } else { "incorrect" }.to_string(),
                    attempt.time_spent_secs.to_string(),
                    attempt.score.to_string(),
                    accuracy.clone(),
                ];
                let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
                rows.push(row.join(","));
            }
        }
        rows.join("\n")
    }
}

/// Download name for an export taken on the given day.
pub fn export_filename(day: NaiveDate) -> String {
    format!("test-results_{}.csv", day.format("%Y-%m-%d"))
}

/// Double-quotes a field when it contains the delimiter, a quote, or a
/// line break; embedded quotes are doubled.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
