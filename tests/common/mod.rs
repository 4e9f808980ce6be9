#![allow(dead_code)] // not every test binary uses every fixture

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use quiz_engine::store::documents::Attempt;
use quiz_engine::store::Store;

pub struct TestStore {
    pub store: Store,
    // Held so the sled directory outlives the store handle.
    _dir: TempDir,
}

pub fn open_store() -> TestStore {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = Store::open(dir.path().join("quiz.sled").to_str().unwrap()).expect("open store");
    store.run_migrations().expect("run migrations");
    TestStore { store, _dir: dir }
}

pub fn attempt(category: &str, question_id: &str, correct: bool, at: DateTime<Utc>) -> Attempt {
    Attempt::new(
        "user_fixture",
        category,
        question_id,
        "Which of the following statements is accurate?",
        if correct { 0 } else { 1 },
        0,
        15,
        at,
        80,
    )
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
