use std::sync::Arc;

use druid::im::Vector;
use druid::{Data, Lens};

use crate::orchestrator::Orchestrator;
use crate::registry::{lock, RecordStatus, SharedRegistry};

const PREVIEW_CHARS: usize = 80;

/// One display row, projected from a registry record.
#[derive(Clone, Data, Lens)]
pub struct FileRow {
    pub name: String,
    pub content_preview: String,
    pub suggestion: String,
    pub status: String,
}

/// Whole-app state for the druid widget tree. The registry and orchestrator
/// are shared with background rounds and excluded from change detection;
/// `rows` is the snapshot the list actually renders.
#[derive(Clone, Data, Lens)]
pub struct AppState {
    pub selected_dir: String,
    pub rows: Vector<FileRow>,
    pub status_message: String,
    pub round_in_progress: bool,
    pub round_total: usize,
    pub round_done: usize,
    pub can_rename: bool,
    #[data(ignore)]
    pub registry: SharedRegistry,
    #[data(ignore)]
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(registry: SharedRegistry, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            selected_dir: String::new(),
            rows: Vector::new(),
            status_message: "Ready".to_string(),
            round_in_progress: false,
            round_total: 0,
            round_done: 0,
            can_rename: false,
            registry,
            orchestrator,
        }
    }

    /// Rebuilds the display rows from the current registry contents.
    pub fn refresh_rows(&mut self) {
        let reg = lock(&self.registry);
        self.rows = reg
            .list_all()
            .iter()
            .map(|record| {
                let suggestion = match &record.status {
                    RecordStatus::SuggestionFailed(message) => format!("Error: {}", message),
                    _ => record
                        .suggested_name
                        .clone()
                        .unwrap_or_else(|| "—".to_string()),
                };
                let status = match &record.status {
                    RecordStatus::RenameFailed(message) => format!("Rename failed: {}", message),
                    other => other.label().to_string(),
                };
                FileRow {
                    name: record.original_name.clone(),
                    content_preview: preview(&record.content),
                    suggestion,
                    status,
                }
            })
            .collect();
        self.can_rename = reg.has_usable_suggestion();
    }
}

fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("");
    let mut text: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || content.lines().count() > 1 {
        text.push('…');
    }
    text
}
