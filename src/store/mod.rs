pub mod documents;
pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use thiserror::Error;

use crate::store::documents::Document;

/// Handle over the durable document store. One sled tree holds the primary
/// copy of every logical document; a second tree holds one shadow backup
/// per document, written before each overwrite and promoted back to the
/// primary when a read finds corrupted data.
#[derive(Debug)]
pub struct Store {
    db: Db,
    pub documents: sled::Tree,
    pub backups: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("write failed for document {key}")]
    WriteFailed { key: &'static str },
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

/// Wrapper persisted in the backup tree: the document value plus the time
/// the snapshot was taken.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupEnvelope {
    timestamp: DateTime<Utc>,
    data: serde_json::Value,
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let documents = db.open_tree(trees::DOCUMENTS)?;
        let backups = db.open_tree(trees::BACKUPS)?;

        Ok(Self {
            db,
            documents,
            backups,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Read a document, falling back to its backup and then to the empty
    /// default. Never errors past this boundary: the caller always gets
    /// either valid data or `T::default()`.
    pub fn safe_read<T: Document>(&self) -> T {
        match self.documents.get(T::KEY.as_bytes()) {
            Ok(Some(raw)) => match serde_json::from_slice::<T>(&raw) {
                Ok(doc) if doc.validate() => return doc,
                Ok(_) => {
                    tracing::warn!(key = T::KEY, "Document failed shape validation, trying backup")
                }
                Err(e) => {
                    tracing::warn!(key = T::KEY, error = %e, "Document failed to parse, trying backup")
                }
            },
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::error!(key = T::KEY, error = %e, "Storage read failed, trying backup")
            }
        }

        match self.restore_from_backup::<T>() {
            Some(doc) => doc,
            None => T::default(),
        }
    }

    /// Write a document, snapshotting the previous primary value first.
    /// All-or-nothing per key: a validation or storage failure leaves the
    /// primary untouched and returns `false`.
    pub fn safe_write<T: Document>(&self, value: &T) -> bool {
        if !value.validate() {
            tracing::error!(key = T::KEY, "Refusing to write document failing shape validation");
            return false;
        }

        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = T::KEY, error = %e, "Failed to serialize document, write aborted");
                return false;
            }
        };
        let bytes = match serde_json::to_vec(&json) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(key = T::KEY, error = %e, "Failed to serialize document, write aborted");
                return false;
            }
        };

        let now = Utc::now();
        self.snapshot_current(T::KEY, now);

        if let Err(e) = self.documents.insert(T::KEY.as_bytes(), bytes) {
            tracing::error!(key = T::KEY, error = %e, "Storage write failed");
            return false;
        }

        // Refresh the slot with the value just committed so recovery always
        // rolls forward to the last known-good write, then stamp the marker.
        self.store_backup(T::KEY, json, now);
        if let Err(e) = self
            .documents
            .insert(keys::LAST_BACKUP_AT.as_bytes(), now.to_rfc3339().into_bytes())
        {
            tracing::warn!(error = %e, "Failed to update last-backup marker");
        }

        true
    }

    /// `safe_write` lifted into the operations layer's error type.
    pub(crate) fn write_or_err<T: Document>(&self, value: &T) -> Result<(), StoreError> {
        if self.safe_write(value) {
            Ok(())
        } else {
            Err(StoreError::WriteFailed { key: T::KEY })
        }
    }

    /// Timestamp of the most recent successful document write, if any.
    pub fn last_backup_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.documents.get(keys::LAST_BACKUP_AT.as_bytes()).ok()??;
        let text = String::from_utf8(raw.to_vec()).ok()?;
        DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn snapshot_current(&self, key: &'static str, now: DateTime<Utc>) {
        let current = match self.documents.get(key.as_bytes()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read primary for backup snapshot");
                return;
            }
        };
        match serde_json::from_slice::<serde_json::Value>(&current) {
            Ok(data) => self.store_backup(key, data, now),
            // An unparseable primary is what the backup is there to replace;
            // never let it overwrite a good snapshot.
            Err(e) => {
                tracing::warn!(key, error = %e, "Primary is corrupt, keeping existing backup")
            }
        }
    }

    fn store_backup(&self, key: &'static str, data: serde_json::Value, timestamp: DateTime<Utc>) {
        let envelope = BackupEnvelope { timestamp, data };
        match serde_json::to_vec(&envelope) {
            Ok(bytes) => {
                if let Err(e) = self.backups.insert(key.as_bytes(), bytes) {
                    tracing::warn!(key, error = %e, "Failed to write backup snapshot");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "Failed to serialize backup snapshot"),
        }
    }

    fn restore_from_backup<T: Document>(&self) -> Option<T> {
        let raw = match self.backups.get(T::KEY.as_bytes()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(key = T::KEY, error = %e, "Backup read failed");
                return None;
            }
        };

        let envelope: BackupEnvelope = match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(key = T::KEY, error = %e, "Backup envelope failed to parse");
                return None;
            }
        };

        let doc: T = match serde_json::from_value(envelope.data) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(key = T::KEY, error = %e, "Backup payload failed to parse");
                return None;
            }
        };
        if !doc.validate() {
            tracing::warn!(key = T::KEY, "Backup payload failed shape validation");
            return None;
        }

        // Promote the backup to primary so subsequent reads are clean.
        match serde_json::to_vec(&doc) {
            Ok(bytes) => {
                if let Err(e) = self.documents.insert(T::KEY.as_bytes(), bytes) {
                    tracing::warn!(key = T::KEY, error = %e, "Failed to promote backup to primary");
                } else {
                    tracing::info!(
                        key = T::KEY,
                        snapshot_at = %envelope.timestamp,
                        "Restored document from backup"
                    );
                }
            }
            Err(e) => tracing::warn!(key = T::KEY, error = %e, "Failed to re-serialize backup"),
        }

        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::store::documents::UserStats;

    #[test]
    fn rejected_write_leaves_primary_untouched() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        let stats = UserStats {
            total_questions: 2,
            correct_answers: 1,
            overall_accuracy: 50.0,
            ..UserStats::default()
        };
        assert!(store.safe_write(&stats));

        // More correct answers than questions answered: fails the shape
        // check, so the write must abort without touching the primary.
        let mut bad = stats.clone();
        bad.correct_answers = 9;
        assert!(!store.safe_write(&bad));
        assert!(matches!(
            store.write_or_err(&bad),
            Err(StoreError::WriteFailed { key }) if key == UserStats::KEY
        ));

        let read: UserStats = store.safe_read();
        assert_eq!(read.total_questions, 2);
        assert_eq!(read.correct_answers, 1);
        assert_eq!(read.overall_accuracy, 50.0);
    }
}
