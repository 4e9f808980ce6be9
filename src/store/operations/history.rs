use std::collections::HashSet;

use chrono::{Local, NaiveDate};

use crate::store::documents::DailyRecord;
use crate::store::operations::stats;
use crate::store::{Store, StoreError};

impl Store {
    /// Rebuilds the daily record for one calendar day from the attempts in
    /// the session log. Counts are never hand-incremented independently of
    /// the log; that is what kept the original's rollups from drifting.
    /// A day left with no attempts loses its record.
    pub(crate) fn recompute_day(&self, day: NaiveDate) -> Result<(), StoreError> {
        let attempts = self.get_attempts_by_calendar_date(day);
        let mut history: Vec<DailyRecord> = self.safe_read();

        if attempts.is_empty() {
            history.retain(|record| record.date != day);
            return self.write_or_err(&history);
        }

        let mut categories: Vec<String> = Vec::new();
        for attempt in &attempts {
            if !categories.contains(&attempt.category) {
                categories.push(attempt.category.clone());
            }
        }
        let question_count = attempts.len() as u32;
        let correct_count = attempts.iter().filter(|a| a.is_correct).count() as u32;
        let record = DailyRecord {
            date: day,
            categories,
            question_count,
            correct_count,
            correct_rate: stats::percent(correct_count as u64, question_count as u64),
        };

        match history.iter_mut().find(|r| r.date == day) {
            Some(slot) => *slot = record,
            None => {
                history.push(record);
                history.sort_by_key(|r| r.date);
            }
        }
        self.write_or_err(&history)
    }

    pub fn get_learning_history(&self) -> Vec<DailyRecord> {
        self.safe_read()
    }

    pub fn get_daily_record(&self, day: NaiveDate) -> Option<DailyRecord> {
        self.get_learning_history()
            .into_iter()
            .find(|record| record.date == day)
    }

    /// Consecutive active days ending today. A day without activity today
    /// yields 0; the streak never silently skips today.
    pub fn get_consecutive_days(&self) -> u32 {
        self.consecutive_days_from(Local::now().date_naive())
    }

    /// Streak walk with an explicit reference day, so tests control the
    /// clock.
    pub fn consecutive_days_from(&self, today: NaiveDate) -> u32 {
        let active: HashSet<NaiveDate> = self
            .get_learning_history()
            .into_iter()
            .map(|record| record.date)
            .collect();

        let mut streak = 0;
        let mut cursor = today;
        while active.contains(&cursor) {
            streak += 1;
            match cursor.pred_opt() {
                Some(previous) => cursor = previous,
                None => break,
            }
        }
        streak
    }
}
