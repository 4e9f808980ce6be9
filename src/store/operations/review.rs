use crate::store::documents::{Attempt, ReviewEntry};
use crate::store::{Store, StoreError};

impl Store {
    /// Folds a batch of attempts into the review queue: a miss upserts the
    /// question (incrementing `wrong_count`), a hit deletes its entry
    /// outright. Mastery clears the debt, it does not decrement it.
    pub(crate) fn update_review_for_attempts(
        &self,
        attempts: &[Attempt],
    ) -> Result<(), StoreError> {
        let mut queue: Vec<ReviewEntry> = self.safe_read();

        for attempt in attempts {
            if attempt.is_correct {
                queue.retain(|entry| entry.question_id != attempt.question_id);
            } else if let Some(entry) = queue
                .iter_mut()
                .find(|entry| entry.question_id == attempt.question_id)
            {
                entry.wrong_count += 1;
                entry.last_attempt_date = attempt.test_date;
            } else {
                queue.push(ReviewEntry {
                    question_id: attempt.question_id.clone(),
                    category: attempt.category.clone(),
                    question: attempt.question_summary.clone(),
                    wrong_count: 1,
                    added_date: attempt.test_date,
                    last_attempt_date: attempt.test_date,
                });
            }
        }

        self.write_or_err(&queue)
    }

    /// Queue entries in display order: grouped by category, most recently
    /// missed first within a category, question id as the final tiebreak
    /// so the ordering is deterministic.
    pub fn get_review_entries(&self) -> Vec<ReviewEntry> {
        let mut queue: Vec<ReviewEntry> = self.safe_read();
        queue.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(b.last_attempt_date.cmp(&a.last_attempt_date))
                .then(a.question_id.cmp(&b.question_id))
        });
        queue
    }

    pub fn get_review_entries_by_category(&self, category: &str) -> Vec<ReviewEntry> {
        self.get_review_entries()
            .into_iter()
            .filter(|entry| entry.category == category)
            .collect()
    }

    /// User-initiated removal ("I don't need to review this anymore"),
    /// independent of correctness. Returns whether an entry existed.
    pub fn remove_review_entry(&self, question_id: &str) -> Result<bool, StoreError> {
        let mut queue: Vec<ReviewEntry> = self.safe_read();
        let before = queue.len();
        queue.retain(|entry| entry.question_id != question_id);
        if queue.len() == before {
            return Ok(false);
        }
        self.write_or_err(&queue)?;
        Ok(true)
    }

    /// Ids of every currently-missed question, in display order. Feeds the
    /// review-test mode's question selection.
    pub fn get_incorrect_question_ids(&self) -> Vec<String> {
        self.get_review_entries()
            .into_iter()
            .map(|entry| entry.question_id)
            .collect()
    }
}
