use crate::store::documents::{Document, TestSession, UserStats};
use crate::store::operations::stats;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![("001_backfill_user_stats", m001_backfill_user_stats)]
}

/// Runs all unapplied migrations. Every migration must be idempotent: a
/// crash between the migration and the version bump re-runs it on the next
/// start. The version only moves forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.documents.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("refusing to downgrade from version {current}"),
        });
    }
    store
        .documents
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

/// Installs predating the aggregate-statistics document have a session log
/// but no stats singleton. Rebuild it from the log once.
fn m001_backfill_user_stats(store: &Store) -> Result<(), StoreError> {
    let has_stats = store.documents.get(UserStats::KEY.as_bytes())?.is_some();
    if has_stats {
        return Ok(());
    }

    let sessions: Vec<TestSession> = store.safe_read();
    if sessions.is_empty() {
        return Ok(());
    }

    let rebuilt = stats::fold_sessions(&sessions);
    if !store.safe_write(&rebuilt) {
        return Err(StoreError::Migration {
            version: 1,
            message: "failed to persist backfilled user stats".to_string(),
        });
    }
    tracing::info!(
        sessions = sessions.len(),
        questions = rebuilt.total_questions,
        "Backfilled user stats from session log"
    );
    Ok(())
}
