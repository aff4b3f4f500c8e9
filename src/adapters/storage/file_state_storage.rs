//! YAML files on disk, one per state record.
//!
//! Key segments map to directories: `conversation/abc/dialog` is stored at
//! `<root>/conversation/abc/dialog.yaml`. Each segment is escaped so that
//! distinct ids always land in distinct files.
//!
//! Writes are staged as temp files and renamed into place. A batch either
//! replaces every record or, if any rename fails, puts the previous records
//! back.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::StateKey;
use crate::ports::{StateStorage, StateStorageError};

/// Longest escaped segment kept as is. Longer ones are hashed to stay under
/// common file name limits.
const MAX_SEGMENT_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct FileStateStorage {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StateStorageError + '_ {
    move |e| StateStorageError::IoError(format!("{}: {}", path.display(), e))
}

/// Reversible escaping of one key segment.
///
/// `[A-Za-z0-9_-]` pass through and every other byte becomes `%XX`, so `.`
/// and `/` never survive and `%` itself is escaped. The empty segment is
/// `%`. Segments that escape to more than [`MAX_SEGMENT_LEN`] bytes become
/// `~` plus the SHA-256 of the raw segment; `~` never appears otherwise.
fn encode_segment(segment: &str) -> String {
    if segment.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => encoded.push(byte as char),
            _ => {
                encoded.push('%');
                encoded.push_str(&hex::encode_upper([byte]));
            }
        }
    }

    if encoded.len() > MAX_SEGMENT_LEN {
        format!("~{}", hex::encode(Sha256::digest(segment.as_bytes())))
    } else {
        encoded
    }
}

/// One record of a batch on its way to disk.
#[derive(Debug)]
struct Staged {
    target: PathBuf,
    staging: PathBuf,
    /// Where the previous record was moved, if there was one.
    backup: Option<PathBuf>,
    committed: bool,
}

impl Staged {
    fn new(target: PathBuf) -> Self {
        Self {
            staging: target.with_extension("yaml.tmp"),
            target,
            backup: None,
            committed: false,
        }
    }

    async fn write(&self, yaml: String) -> Result<(), StateStorageError> {
        if let Some(dir) = self.target.parent() {
            fs::create_dir_all(dir).await.map_err(io_error(dir))?;
        }
        fs::write(&self.staging, yaml)
            .await
            .map_err(io_error(&self.staging))
    }

    /// Refuses targets that exist but are not regular files.
    async fn check_target(&self) -> Result<(), StateStorageError> {
        match fs::metadata(&self.target).await {
            Ok(meta) if !meta.is_file() => Err(StateStorageError::IoError(format!(
                "{}: not a regular file",
                self.target.display()
            ))),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.target)(e)),
        }
    }

    async fn swap_in(&mut self) -> Result<(), StateStorageError> {
        if fs::metadata(&self.target).await.is_ok() {
            let backup = self.target.with_extension("yaml.bak");
            fs::rename(&self.target, &backup)
                .await
                .map_err(io_error(&self.target))?;
            self.backup = Some(backup);
        }
        fs::rename(&self.staging, &self.target)
            .await
            .map_err(io_error(&self.target))?;
        self.committed = true;
        Ok(())
    }

    /// Puts the previous record back and drops the staged one.
    async fn roll_back(&self) {
        let restored = match (&self.backup, self.committed) {
            (Some(backup), _) => fs::rename(backup, &self.target).await,
            (None, true) => fs::remove_file(&self.target).await,
            (None, false) => Ok(()),
        };
        if let Err(e) = restored {
            tracing::error!(path = %self.target.display(), error = %e, "Failed to restore state record");
        }
        self.discard().await;
    }

    async fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.staging).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.staging.display(), error = %e, "Failed to remove staged record");
            }
        }
    }

    async fn finish(&self) {
        if let Some(backup) = &self.backup {
            if let Err(e) = fs::remove_file(backup).await {
                tracing::warn!(path = %backup.display(), error = %e, "Failed to remove replaced record");
            }
        }
    }
}

impl FileStateStorage {
    /// The directory is created lazily on first save.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, key: &StateKey) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(key.as_str().split('/').map(encode_segment));
        path.set_extension("yaml");
        path
    }

    fn encode(key: &StateKey, state: &Value) -> Result<String, StateStorageError> {
        serde_yaml::to_string(state).map_err(|e| StateStorageError::SerializationFailed {
            key: key.clone(),
            reason: e.to_string(),
        })
    }

    async fn discard_all(staged: &[Staged]) {
        for record in staged {
            record.discard().await;
        }
    }

    /// Replaces every record or none of them.
    async fn commit(&self, records: Vec<(PathBuf, String)>) -> Result<(), StateStorageError> {
        let mut staged: Vec<Staged> = Vec::with_capacity(records.len());
        for (target, yaml) in records {
            let record = Staged::new(target);
            let written = record.write(yaml).await;
            staged.push(record);
            if let Err(e) = written {
                Self::discard_all(&staged).await;
                return Err(e);
            }
        }

        for record in &staged {
            if let Err(e) = record.check_target().await {
                Self::discard_all(&staged).await;
                return Err(e);
            }
        }

        for i in 0..staged.len() {
            let swapped = staged[i].swap_in().await;
            if let Err(e) = swapped {
                tracing::warn!(error = %e, "State batch failed, restoring previous records");
                for record in staged[..=i].iter().rev() {
                    record.roll_back().await;
                }
                Self::discard_all(&staged[i + 1..]).await;
                return Err(e);
            }
        }

        for record in &staged {
            record.finish().await;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    async fn load(&self, key: &StateKey) -> Result<Option<Value>, StateStorageError> {
        let path = self.record_path(key);
        let yaml = match fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };

        serde_yaml::from_str(&yaml)
            .map(Some)
            .map_err(|e| StateStorageError::DeserializationFailed {
                key: key.clone(),
                reason: e.to_string(),
            })
    }

    async fn save(&self, key: &StateKey, state: Value) -> Result<(), StateStorageError> {
        let yaml = Self::encode(key, &state)?;
        self.commit(vec![(self.record_path(key), yaml)]).await
    }

    /// Encodes every record before touching the disk, then commits them as
    /// one batch.
    async fn save_all(&self, entries: Vec<(StateKey, Value)>) -> Result<(), StateStorageError> {
        let records = entries
            .iter()
            .map(|(key, state)| Self::encode(key, state).map(|yaml| (self.record_path(key), yaml)))
            .collect::<Result<Vec<_>, StateStorageError>>()?;
        self.commit(records).await
    }

    async fn delete(&self, key: &StateKey) -> Result<(), StateStorageError> {
        let path = self.record_path(key);
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(&path)(e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConversationKey, UserKey};
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, FileStateStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStateStorage::new(dir.path());
        (dir, storage)
    }

    fn dialog_key(id: &str) -> StateKey {
        StateKey::dialog(&ConversationKey::new(id).unwrap())
    }

    #[tokio::test]
    async fn saved_record_reads_back() {
        let (_dir, storage) = fixture();
        let state = json!({"frames": [{"dialogId": "main", "stepIndex": 1}]});

        storage.save(&dialog_key("c1"), state.clone()).await.unwrap();

        assert_eq!(storage.load(&dialog_key("c1")).await.unwrap(), Some(state));
        assert_eq!(storage.load(&dialog_key("c2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn records_land_under_key_path() {
        let (dir, storage) = fixture();

        storage.save(&dialog_key("c1"), json!(1)).await.unwrap();

        let expected = dir.path().join("conversation/c1/dialog.yaml");
        assert!(expected.exists());
        assert!(!expected.with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn dot_dot_ids_stay_inside_root() {
        let (dir, storage) = fixture();
        let key = StateKey::user_feedback(&UserKey::new("..").unwrap());

        storage.save(&key, json!("x")).await.unwrap();

        let path = storage.record_path(&key);
        assert!(path.starts_with(dir.path()));
        assert!(!path.components().any(|c| c.as_os_str() == ".."));
        assert_eq!(storage.load(&key).await.unwrap(), Some(json!("x")));
    }

    #[tokio::test]
    async fn save_all_writes_each_record() {
        let (_dir, storage) = fixture();
        let conversation = ConversationKey::new("c1").unwrap();
        let feedback = StateKey::conversation_feedback(&conversation);

        storage
            .save_all(vec![
                (StateKey::dialog(&conversation), json!({"frames": []})),
                (feedback.clone(), json!({"negativeCount": 2})),
            ])
            .await
            .unwrap();

        assert_eq!(
            storage.load(&feedback).await.unwrap(),
            Some(json!({"negativeCount": 2}))
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = fixture();
        let key = dialog_key("c1");

        storage.save(&key, json!(1)).await.unwrap();
        storage.delete(&key).await.unwrap();
        storage.delete(&key).await.unwrap();

        assert_eq!(storage.load(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_yaml_is_reported() {
        let (_dir, storage) = fixture();
        let key = dialog_key("c1");
        let path = storage.record_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "frames: [unclosed").unwrap();

        let err = storage.load(&key).await.unwrap_err();

        assert!(matches!(err, StateStorageError::DeserializationFailed { .. }));
    }

    #[tokio::test]
    async fn ids_differing_in_escaped_characters_stay_apart() {
        let (_dir, storage) = fixture();
        let teams = StateKey::conversation_feedback(&ConversationKey::new("19:team@thread").unwrap());
        let lookalike =
            StateKey::conversation_feedback(&ConversationKey::new("19_team_thread").unwrap());

        storage
            .save(&teams, json!({"negativeCount": 2, "chats": [{"message": "only for 19:team"}]}))
            .await
            .unwrap();

        assert_ne!(storage.record_path(&teams), storage.record_path(&lookalike));
        assert_eq!(storage.load(&lookalike).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_batch_keeps_previous_records() {
        let (_dir, storage) = fixture();
        let conversation = ConversationKey::new("c1").unwrap();
        let dialog = StateKey::dialog(&conversation);
        let feedback = StateKey::conversation_feedback(&conversation);
        storage.save(&dialog, json!(["old-stack"])).await.unwrap();

        // A directory where the feedback file should go cannot be replaced.
        let blocked = storage.record_path(&feedback);
        std::fs::create_dir_all(blocked.join("occupied")).unwrap();

        let result = storage
            .save_all(vec![
                (dialog.clone(), json!(["new-stack"])),
                (feedback.clone(), json!({"negativeCount": 1})),
            ])
            .await;

        assert!(matches!(result, Err(StateStorageError::IoError(_))));
        assert_eq!(storage.load(&dialog).await.unwrap(), Some(json!(["old-stack"])));
        let leftovers: Vec<_> = std::fs::read_dir(blocked.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp") || name.ends_with(".bak"))
            .collect();
        assert!(leftovers.is_empty(), "left behind {leftovers:?}");
    }

    #[tokio::test]
    async fn rolled_back_batch_removes_new_records() {
        let (_dir, storage) = fixture();
        let conversation = ConversationKey::new("c1").unwrap();
        let dialog = StateKey::dialog(&conversation);
        let feedback = StateKey::conversation_feedback(&conversation);
        std::fs::create_dir_all(storage.record_path(&feedback).join("occupied")).unwrap();

        let result = storage
            .save_all(vec![(dialog.clone(), json!(["new-stack"])), (feedback, json!({}))])
            .await;

        assert!(result.is_err());
        assert_eq!(storage.load(&dialog).await.unwrap(), None);
    }

    #[test]
    fn segments_are_escaped_reversibly() {
        assert_eq!(encode_segment("abc-1_2"), "abc-1_2");
        assert_eq!(encode_segment("19:team@thread"), "19%3Ateam%40thread");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment(".."), "%2E%2E");
        assert_eq!(encode_segment("100%"), "100%25");
        assert_eq!(encode_segment(""), "%");
    }

    #[test]
    fn long_segments_are_hashed() {
        let long = "x:".repeat(100);
        let encoded = encode_segment(&long);

        assert!(encoded.starts_with('~'));
        assert_eq!(encoded.len(), 65);
        assert_ne!(encoded, encode_segment(&"x:".repeat(99)));
    }
}
