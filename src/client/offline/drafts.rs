//! # Draft Store
//!
//! One JSON file per draft in a single directory. File names carry the form
//! key and the save time so drafts can be listed without opening them:
//!
//! ```text
//! case_report-1717236900-9f2c41ab.json
//! ```
//!
//! The trailing hex suffix keeps apart two drafts of the same form saved in
//! the same second. Files written by older builds (`{form}-{secs}.json`)
//! are still listed and parsed.
//!
//! All operations take a store-wide lock, so a listing never observes a
//! half-written draft and a delete never races a concurrent save.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::storage;
use crate::shared::draft::{Draft, DraftSource, FailureReason};
use crate::shared::error::StorageError;

const DRAFT_EXTENSION: &str = "json";
const SUFFIX_LEN: usize = 8;

/// File name of a draft inside the store directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftId(String);

impl DraftId {
    /// Fresh id for a draft of `form` saved at `unix_secs`.
    ///
    /// The form key becomes part of a file name, so keys that would leave the
    /// store directory or hide the file from listing are refused.
    pub fn generate(form: &str, unix_secs: i64) -> Result<Self, StorageError> {
        if !is_plain_key(form) {
            return Err(StorageError::invalid_draft(
                form,
                "form key cannot be used in a file name",
            ));
        }
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(Self(format!(
            "{}-{}-{}.{}",
            form,
            unix_secs,
            &suffix[..SUFFIX_LEN],
            DRAFT_EXTENSION
        )))
    }

    /// Accept a bare file name ending in `.json`; anything path-like is refused.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".json")?;
        let path_like = name.contains(|c: char| c == '/' || c == '\\');
        if stem.is_empty() || stem.starts_with('.') || path_like {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form key encoded in the name, if it follows the naming scheme.
    pub fn form_key(&self) -> Option<&str> {
        self.parts().map(|(form, _)| form)
    }

    /// Save time in Unix seconds encoded in the name.
    pub fn saved_secs(&self) -> Option<i64> {
        self.parts().map(|(_, secs)| secs)
    }

    fn parts(&self) -> Option<(&str, i64)> {
        let stem = self.0.strip_suffix(".json")?;
        let (rest, last) = stem.rsplit_once('-')?;

        let is_suffix =
            last.len() == SUFFIX_LEN && last.chars().all(|c| c.is_ascii_hexdigit());
        if is_suffix {
            if let Some((form, secs)) = rest.rsplit_once('-') {
                if let Ok(secs) = secs.parse::<i64>() {
                    return Some((form, secs));
                }
            }
        }

        // Older names: {form}-{secs}.json
        let secs = last.parse::<i64>().ok()?;
        Some((rest, secs))
    }
}

fn is_plain_key(form: &str) -> bool {
    !form.starts_with('.') && !form.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a drafts screen shows per entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSummary {
    pub id: DraftId,
    pub form: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub source: Option<DraftSource>,
    pub error: Option<FailureReason>,
    /// The file exists but could not be decoded.
    pub unreadable: bool,
}

#[derive(Debug)]
pub struct DraftStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, id: &DraftId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    /// Every draft id, in directory order. A missing directory is empty.
    pub async fn list(&self) -> Result<Vec<DraftId>, StorageError> {
        let _guard = self.lock.lock().await;
        self.list_unlocked().await
    }

    async fn list_unlocked(&self) -> Result<Vec<DraftId>, StorageError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(DraftId::from_file_name) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub async fn read(&self, id: &DraftId) -> Result<Draft, StorageError> {
        let _guard = self.lock.lock().await;
        storage::read_json(&self.path_of(id)).await
    }

    /// Persist a new draft and return its id.
    pub async fn save(&self, draft: &Draft) -> Result<DraftId, StorageError> {
        let _guard = self.lock.lock().await;
        let id = DraftId::generate(&draft.form, draft.meta.saved_at.timestamp())?;
        let path = self.path_of(&id);
        storage::write_json_atomic(&path, draft).await?;
        tracing::info!("[DRAFTS] Draft saved: {}", path.display());
        Ok(id)
    }

    pub async fn delete(&self, id: &DraftId) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let path = self.path_of(id);
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!("[DRAFTS] Draft removed: {}", id);
        Ok(())
    }

    /// Most recent readable draft of `form`, for resuming an entry.
    pub async fn latest_for_form(
        &self,
        form: &str,
    ) -> Result<Option<(DraftId, Draft)>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut latest: Option<(DraftId, Draft)> = None;

        for id in self.list_unlocked().await? {
            if id.form_key() != Some(form) {
                continue;
            }
            let draft: Draft = match storage::read_json(&self.path_of(&id)).await {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::warn!("[DRAFTS] Skipping unreadable draft {}: {}", id, e);
                    continue;
                }
            };
            let newer = match &latest {
                None => true,
                Some((best_id, best)) => {
                    (id.saved_secs(), draft.meta.saved_at)
                        > (best_id.saved_secs(), best.meta.saved_at)
                }
            };
            if newer {
                latest = Some((id, draft));
            }
        }
        Ok(latest)
    }

    /// Summaries of every draft, newest first.
    pub async fn summaries(&self) -> Result<Vec<DraftSummary>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut summaries = Vec::new();

        for id in self.list_unlocked().await? {
            let summary = match storage::read_json::<Draft>(&self.path_of(&id)).await {
                Ok(draft) => DraftSummary {
                    form: draft.form,
                    saved_at: Some(draft.meta.saved_at),
                    source: Some(draft.meta.source),
                    error: draft.error,
                    unreadable: false,
                    id,
                },
                Err(_) => DraftSummary {
                    form: id.form_key().unwrap_or_default().to_string(),
                    saved_at: None,
                    source: None,
                    error: None,
                    unreadable: true,
                    id,
                },
            };
            summaries.push(summary);
        }

        summaries.sort_by(|a, b| {
            (b.id.saved_secs(), b.saved_at).cmp(&(a.id.saved_secs(), a.saved_at))
        });
        Ok(summaries)
    }
}
