//! One JSON file per interview under a store directory.
//!
//! Writes go to a temporary file that is renamed over the target, so a crash never
//! leaves a half-written document. An exclusive `fs2` lock on `.store.lock` serialises
//! read-modify-write cycles across processes.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::{DocumentStore, FieldUpdates, InterviewDocument, apply_updates};
use crate::errors::StoreError;

const LOCK_FILE: &str = ".store.lock";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document with the given id.
    pub fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidPath(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let dir = self.dir.clone();
        let lock_path = dir.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || {
            let _lock = acquire_lock(&lock_path)?;
            f(&dir)
        })
        .await
        .map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: std::io::Error::other(e),
        })?
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Lock held until the returned file is dropped.
fn acquire_lock(path: &Path) -> Result<File, StoreError> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(io_err(path))?;
    FileExt::lock_exclusive(&file).map_err(io_err(path))?;
    Ok(file)
}

fn read_document(path: &Path, id: &str) -> Result<Option<InterviewDocument>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path)(e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Serde {
            id: id.to_string(),
            source,
        })
}

fn write_document(path: &Path, id: &str, doc: &InterviewDocument) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Serde {
        id: id.to_string(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp).map_err(io_err(&tmp))?;
        file.write_all(json.as_bytes()).map_err(io_err(&tmp))?;
        file.sync_all().map_err(io_err(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(io_err(path))
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn create(&self, doc: &InterviewDocument) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = self.document_path(&id)?;
        let doc = doc.clone();
        let doc_id = id.clone();
        self.blocking(move |_| write_document(&path, &doc_id, &doc))
            .await?;
        tracing::debug!(id = %id, "created interview document");
        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Option<InterviewDocument>, StoreError> {
        let path = self.document_path(id)?;
        let id = id.to_string();
        self.blocking(move |_| read_document(&path, &id)).await
    }

    async fn update(&self, id: &str, updates: FieldUpdates) -> Result<(), StoreError> {
        let path = self.document_path(id)?;
        let id = id.to_string();
        self.blocking(move |_| {
            let current = read_document(&path, &id)?.ok_or_else(|| StoreError::NotFound {
                id: id.clone(),
            })?;
            let updated = apply_updates(&id, &current, &updates)?;
            write_document(&path, &id, &updated)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<(String, InterviewDocument)>, StoreError> {
        let mut docs = self
            .blocking(|dir| {
                let entries = fs::read_dir(dir).map_err(io_err(dir))?;
                let mut docs = Vec::new();
                for entry in entries {
                    let path = entry.map_err(io_err(dir))?.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match read_document(&path, id) {
                        Ok(Some(doc)) => docs.push((id.to_string(), doc)),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable interview"),
                    }
                }
                Ok(docs)
            })
            .await?;
        docs.sort_by(|a, b| b.1.last_updated.cmp(&a.1.last_updated));
        Ok(docs)
    }
}
