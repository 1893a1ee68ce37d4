//! Persisted interview documents.
//!
//! The engine talks to storage through [`DocumentStore`]: create a document, read it,
//! and apply partial updates addressed by dotted field paths such as `reports.phase1`.
//! Every update is one write; the store stamps `lastUpdated` on each.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::message::Message;
use crate::phase::Phase;
use crate::report::Report;

/// The interview record as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewDocument {
    pub brand_name: String,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub current_phase: Phase,
    /// Cached answered-question count. Always re-derivable from `messages`.
    #[serde(default)]
    pub question_count: usize,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub reports: BTreeMap<Phase, Report>,
}

impl InterviewDocument {
    pub fn new(brand_name: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            brand_name: brand_name.into(),
            conversation_id: conversation_id.into(),
            created_at: now,
            last_updated: now,
            current_phase: Phase::default(),
            question_count: 0,
            messages: Vec::new(),
            reports: BTreeMap::new(),
        }
    }
}

/// A set of field assignments applied in one write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    fields: Vec<(String, Value)>,
}

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` at a dotted path (e.g. `reports.phase2`).
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.fields.push((path.into(), value));
        self
    }

    pub fn current_phase(self, phase: Phase) -> Self {
        self.set("currentPhase", Value::String(phase.key().to_string()))
    }

    pub fn question_count(self, count: usize) -> Self {
        self.set("questionCount", Value::from(count))
    }

    /// Assign the JSON form of `value` at a dotted path.
    pub fn set_serialized<T: Serialize + ?Sized>(
        self,
        path: impl Into<String>,
        value: &T,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        match serde_json::to_value(value) {
            Ok(value) => Ok(self.set(path, value)),
            Err(source) => Err(StoreError::Encode {
                field: path,
                source,
            }),
        }
    }

    pub fn messages(self, messages: &[Message]) -> Result<Self, StoreError> {
        self.set_serialized("messages", messages)
    }

    pub fn report(self, report: &Report) -> Result<Self, StoreError> {
        self.set_serialized(format!("reports.{}", report.phase.key()), report)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(path, _)| path.as_str())
    }
}

/// Narrow read/update contract over the interview store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return its id.
    async fn create(&self, doc: &InterviewDocument) -> Result<String, StoreError>;

    async fn read(&self, id: &str) -> Result<Option<InterviewDocument>, StoreError>;

    /// Apply `updates` to an existing document. Fails with `NotFound` if it is missing.
    async fn update(&self, id: &str, updates: FieldUpdates) -> Result<(), StoreError>;

    /// All stored documents with their ids, most recently updated first.
    async fn list(&self) -> Result<Vec<(String, InterviewDocument)>, StoreError>;
}

/// Apply updates to a document through its JSON form and stamp `lastUpdated`.
pub(crate) fn apply_updates(
    id: &str,
    doc: &InterviewDocument,
    updates: &FieldUpdates,
) -> Result<InterviewDocument, StoreError> {
    let serde_err = |source| StoreError::Serde {
        id: id.to_string(),
        source,
    };
    let mut value = serde_json::to_value(doc).map_err(serde_err)?;
    for (path, field) in &updates.fields {
        set_path(&mut value, path, field.clone())?;
    }
    let mut updated: InterviewDocument = serde_json::from_value(value).map_err(serde_err)?;
    updated.last_updated = Utc::now();
    Ok(updated)
}

/// Set `new_value` at a dotted path, creating intermediate objects.
fn set_path(root: &mut Value, path: &str, new_value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

    let mut current = root;
    for segment in parents {
        let object = current
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let object = current
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
    object.insert(last.to_string(), new_value);
    Ok(())
}
