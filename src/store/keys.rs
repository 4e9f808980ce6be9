//! Logical document keys. Each document type maps to exactly one key in
//! the `documents` tree; the backup snapshot for a key lives under the
//! same key in the `backups` tree.

pub const USER_IDENTITY: &str = "userIdentity";
pub const TEST_SESSIONS: &str = "testSessions";
pub const USER_STATS: &str = "userStats";
pub const REVIEW_QUEUE: &str = "reviewNotes";
pub const LEARNING_HISTORY: &str = "learningHistories";
pub const LAST_BACKUP_AT: &str = "lastBackupAt";

/// Document keys subject to `wipe_all`. The user identity survives a wipe:
/// it is a per-install pseudonym, not learner data.
pub const WIPED_DOCUMENTS: &[&str] = &[
    TEST_SESSIONS,
    USER_STATS,
    REVIEW_QUEUE,
    LEARNING_HISTORY,
];
