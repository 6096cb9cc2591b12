use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Opaque identifier for a [`FileRecord`]. Assigned by the registry,
/// never reused, stable for the record's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-record workflow state. Failure variants carry the error text so the
/// registry never has to smuggle errors through the suggestion field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Suggested,
    SuggestionFailed(String),
    Renamed,
    RenameFailed(String),
}

impl RecordStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pending",
            RecordStatus::Suggested => "Suggested",
            RecordStatus::SuggestionFailed(_) => "Suggestion failed",
            RecordStatus::Renamed => "Renamed",
            RecordStatus::RenameFailed(_) => "Rename failed",
        }
    }
}

/// One file under consideration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: RecordId,
    /// Filename currently present on disk. Updated after a successful rename
    /// so a later round still points at the real file.
    pub original_name: String,
    /// Text content used as generation input. Immutable after registration.
    pub content: String,
    /// Usable suggestion only; `None` until a suggestion succeeds.
    pub suggested_name: Option<String>,
    pub status: RecordStatus,
}

impl FileRecord {
    /// A record is eligible for the rename pass only while it carries a
    /// fresh, successful suggestion.
    pub fn rename_eligible(&self) -> bool {
        self.status == RecordStatus::Suggested && self.suggested_name.is_some()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no record with id {0}")]
    NotFound(RecordId),
}

/// Ordered collection of [`FileRecord`]s, keyed by [`RecordId`].
///
/// The registry itself has no concurrency; callers share it behind a mutex
/// (see [`SharedRegistry`]) and the orchestrator funnels all round updates
/// through a single coordinating task.
#[derive(Debug, Default)]
pub struct FileRegistry {
    records: Vec<FileRecord>,
    next_id: u64,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record in `Pending` state and returns its id.
    pub fn register(&mut self, original_name: impl Into<String>, content: impl Into<String>) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(FileRecord {
            id,
            original_name: original_name.into(),
            content: content.into(),
            suggested_name: None,
            status: RecordStatus::Pending,
        });
        id
    }

    /// Replaces the working set with a fresh batch of `(name, content)`
    /// pairs. Ids stay monotonic across resets; an id is never reused.
    pub fn reset<I, N, C>(&mut self, files: I)
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        self.records.clear();
        for (name, content) in files {
            self.register(name, content);
        }
    }

    /// Current records in insertion order.
    pub fn list_all(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Result<&FileRecord, RegistryError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(RegistryError::NotFound(id))
    }

    /// Applies a field-level change to exactly the record with `id`.
    pub fn update<F>(&mut self, id: RecordId, mutator: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut FileRecord),
    {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegistryError::NotFound(id))?;
        mutator(record);
        Ok(())
    }

    /// True if at least one record could be renamed right now. Gates the
    /// rename trigger in the UI.
    pub fn has_usable_suggestion(&self) -> bool {
        self.records.iter().any(FileRecord::rename_eligible)
    }
}

/// Registry handle shared between the UI thread and the orchestrator.
pub type SharedRegistry = Arc<Mutex<FileRegistry>>;

pub fn shared(registry: FileRegistry) -> SharedRegistry {
    Arc::new(Mutex::new(registry))
}

/// Locks the registry, recovering from poisoning. Every mutation through
/// [`FileRegistry::update`] is a single-record field write, so a panicked
/// holder cannot leave the container half-updated.
pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, FileRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
