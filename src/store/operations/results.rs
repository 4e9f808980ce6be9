use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};

use crate::store::documents::{Attempt, TestSession, UserStats};
use crate::store::operations::stats;
use crate::store::{Store, StoreError};

impl Store {
    /// Records a completed quiz run: appends the session to the log, then
    /// updates aggregate statistics, the review queue, and the daily
    /// learning records touched by the session's attempts, in that order.
    pub fn record_session(&self, attempts: Vec<Attempt>) -> Result<TestSession, StoreError> {
        let session = TestSession::from_attempts(attempts, Utc::now());

        let mut sessions: Vec<TestSession> = self.safe_read();
        sessions.push(session.clone());
        self.write_or_err(&sessions)?;

        let mut user_stats: UserStats = self.safe_read();
        stats::apply_session(&mut user_stats, &session);
        self.write_or_err(&user_stats)?;

        self.update_review_for_attempts(&session.results)?;

        // A session can span midnight; each attempt's own timestamp decides
        // which day it belongs to.
        let days: BTreeSet<NaiveDate> = session.results.iter().map(Attempt::local_day).collect();
        for day in days {
            self.recompute_day(day)?;
        }

        tracing::info!(
            session_id = %session.id,
            total = session.total,
            score = session.score,
            "Recorded test session"
        );
        Ok(session)
    }

    pub fn get_sessions(&self) -> Vec<TestSession> {
        self.safe_read()
    }

    pub fn get_session_by_id(&self, id: &str) -> Option<TestSession> {
        self.get_sessions().into_iter().find(|s| s.id == id)
    }

    pub fn get_attempts_by_category(&self, category: &str) -> Vec<Attempt> {
        self.get_sessions()
            .into_iter()
            .flat_map(|s| s.results)
            .filter(|a| a.category == category)
            .collect()
    }

    /// All attempts whose own `test_date` falls on the given local day,
    /// across every session.
    pub fn get_attempts_by_calendar_date(&self, day: NaiveDate) -> Vec<Attempt> {
        self.get_sessions()
            .into_iter()
            .flat_map(|s| s.results)
            .filter(|a| a.local_day() == day)
            .collect()
    }
}
