//! Typed documents persisted by the engine, plus the shape validation the
//! safe accessor runs before trusting stored data.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::keys;

/// Points awarded for a correct answer.
pub const CORRECT_SCORE: u32 = 10;

/// A persisted document type: one fixed key in the store and a shape check
/// that decides whether stored bytes can be trusted.
pub trait Document: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;
    fn validate(&self) -> bool;
}

/// Calendar day of a timestamp in the local timezone. The single source of
/// day bucketing: result queries, daily records, streaks and date-scoped
/// deletion must all agree on it.
pub fn local_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// One recorded answer to one question. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub question_id: String,
    pub question_summary: String,
    /// 0-based option index. The canonical answer representation; call
    /// sites holding option ids must resolve them to indices first.
    pub user_answer: u32,
    pub correct_answer: u32,
    pub is_correct: bool,
    pub time_spent_secs: u32,
    pub score: u32,
    pub test_date: DateTime<Utc>,
}

impl Attempt {
    /// Builds an attempt with `is_correct` and `score` derived from the
    /// answer pair, so the stored flag can never disagree with them.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: &str,
        category: &str,
        question_id: &str,
        question_text: &str,
        user_answer: u32,
        correct_answer: u32,
        time_spent_secs: u32,
        test_date: DateTime<Utc>,
        summary_max_chars: usize,
    ) -> Self {
        let is_correct = user_answer == correct_answer;
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            question_id: question_id.to_string(),
            question_summary: truncate_chars(question_text, summary_max_chars),
            user_answer,
            correct_answer,
            is_correct,
            time_spent_secs,
            score: if is_correct { CORRECT_SCORE } else { 0 },
            test_date,
        }
    }

    pub fn local_day(&self) -> NaiveDate {
        local_day(self.test_date)
    }

    fn validate(&self) -> bool {
        !self.id.is_empty()
            && !self.question_id.is_empty()
            && !self.category.is_empty()
            && self.is_correct == (self.user_answer == self.correct_answer)
            && self.score == if self.is_correct { CORRECT_SCORE } else { 0 }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}…")
}

/// One completed quiz run, grouping the attempts it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub results: Vec<Attempt>,
    /// Count of correct attempts; always `results.filter(is_correct).len()`.
    pub score: u32,
    pub total: u32,
}

impl TestSession {
    pub fn from_attempts(results: Vec<Attempt>, date: DateTime<Utc>) -> Self {
        let score = results.iter().filter(|a| a.is_correct).count() as u32;
        let total = results.len() as u32;
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            results,
            score,
            total,
        }
    }

    /// Re-derives `score`/`total` from the remaining attempts. Used when a
    /// date-scoped deletion splits a session that spanned midnight.
    pub fn rescore(&mut self) {
        self.score = self.results.iter().filter(|a| a.is_correct).count() as u32;
        self.total = self.results.len() as u32;
    }

    fn validate(&self) -> bool {
        !self.id.is_empty()
            && self.total as usize == self.results.len()
            && self.score as usize == self.results.iter().filter(|a| a.is_correct).count()
            && self.results.iter().all(Attempt::validate)
    }
}

impl Document for Vec<TestSession> {
    const KEY: &'static str = keys::TEST_SESSIONS;

    fn validate(&self) -> bool {
        self.iter().all(TestSession::validate)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total_questions: u64,
    pub correct_answers: u64,
    pub accuracy: f64,
}

impl CategoryStats {
    fn validate(&self) -> bool {
        self.correct_answers <= self.total_questions && valid_percent(self.accuracy)
    }
}

/// Aggregate statistics singleton. Always reconstructible by folding every
/// attempt in the session log through `apply_attempt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_tests: u64,
    pub total_questions: u64,
    pub correct_answers: u64,
    pub overall_accuracy: f64,
    pub category_stats: BTreeMap<String, CategoryStats>,
    pub last_test_date: Option<DateTime<Utc>>,
}

impl Document for UserStats {
    const KEY: &'static str = keys::USER_STATS;

    fn validate(&self) -> bool {
        self.correct_answers <= self.total_questions
            && valid_percent(self.overall_accuracy)
            && self.category_stats.values().all(CategoryStats::validate)
    }
}

fn valid_percent(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// One currently-missed question, unique by `question_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub question_id: String,
    pub category: String,
    /// Question text kept for display without rejoining question data.
    pub question: String,
    pub wrong_count: u32,
    pub added_date: DateTime<Utc>,
    pub last_attempt_date: DateTime<Utc>,
}

impl ReviewEntry {
    fn validate(&self) -> bool {
        !self.question_id.is_empty() && !self.category.is_empty() && self.wrong_count >= 1
    }
}

impl Document for Vec<ReviewEntry> {
    const KEY: &'static str = keys::REVIEW_QUEUE;

    fn validate(&self) -> bool {
        self.iter().all(ReviewEntry::validate)
    }
}

/// Per-calendar-day rollup of activity; exists only for days with at least
/// one recorded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub categories: Vec<String>,
    pub question_count: u32,
    pub correct_count: u32,
    pub correct_rate: f64,
}

impl DailyRecord {
    fn validate(&self) -> bool {
        self.question_count >= 1
            && self.correct_count <= self.question_count
            && valid_percent(self.correct_rate)
    }
}

impl Document for Vec<DailyRecord> {
    const KEY: &'static str = keys::LEARNING_HISTORY;

    fn validate(&self) -> bool {
        self.iter().all(DailyRecord::validate)
    }
}

/// Stable per-install pseudo-identity, generated once and denormalized
/// onto every attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
}

impl UserIdentity {
    pub fn generate() -> Self {
        Self {
            user_id: format!("user_{}", Uuid::new_v4()),
        }
    }
}

impl Document for UserIdentity {
    const KEY: &'static str = keys::USER_IDENTITY;

    fn validate(&self) -> bool {
        !self.user_id.is_empty()
    }
}
