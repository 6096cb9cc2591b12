use std::path::{Path, PathBuf};
use std::sync::Arc;

use druid::{EventCtx, Target};
use tracing::error;

use crate::events::{RENAME_DONE, SUGGESTION_DONE, SUGGESTION_PROGRESS};
use crate::registry::{lock, RecordStatus};
use crate::scan;
use crate::state::AppState;

/// Folder picker for the Browse button.
pub fn choose_directory(data: &mut AppState) {
    if let Some(path) = rfd::FileDialog::new().pick_folder() {
        data.selected_dir = path.to_string_lossy().to_string();
        load_directory(data);
    }
}

/// Scans the selected directory and replaces the working set.
pub fn load_directory(data: &mut AppState) {
    match scan::load_text_files(Path::new(&data.selected_dir)) {
        Ok(files) => {
            let count = files.len();
            lock(&data.registry).reset(files);
            data.refresh_rows();
            data.round_total = 0;
            data.round_done = 0;
            data.status_message = format!("Loaded {} files", count);
        }
        Err(e) => {
            error!(error = %e, dir = %data.selected_dir, "directory scan failed");
            data.status_message = format!("Could not read directory: {}", e);
        }
    }
}

/// Kicks off one concurrent suggestion round on a background thread. The
/// thread owns a tokio runtime and reports back through druid commands, so
/// the UI stays responsive while the oracle works.
pub fn start_suggestion_round(ctx: &mut EventCtx, data: &mut AppState) {
    if data.round_in_progress {
        data.status_message = "A round is already running.".to_string();
        return;
    }
    let total = lock(&data.registry).len();
    if total == 0 {
        data.status_message = "No files loaded.".to_string();
        return;
    }

    data.round_in_progress = true;
    data.round_total = total;
    data.round_done = 0;
    data.status_message = "Suggesting names…".to_string();

    let event_sink = ctx.get_external_handle();
    let registry = Arc::clone(&data.registry);
    let orchestrator = Arc::clone(&data.orchestrator);
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "could not start suggestion runtime");
                let _ = event_sink.submit_command(
                    SUGGESTION_DONE,
                    format!("Could not start background runtime: {}", e),
                    Target::Global,
                );
                return;
            }
        };

        let progress_sink = event_sink.clone();
        let result = runtime.block_on(orchestrator.run_suggestion_round(
            &registry,
            move |done, total| {
                let _ =
                    progress_sink.submit_command(SUGGESTION_PROGRESS, (done, total), Target::Global);
            },
        ));

        let message = match result {
            Ok(()) => {
                let reg = lock(&registry);
                let succeeded = reg
                    .list_all()
                    .iter()
                    .filter(|r| r.status == RecordStatus::Suggested)
                    .count();
                format!("Suggested names for {} of {} files", succeeded, total)
            }
            Err(e) => e.to_string(),
        };
        let _ = event_sink.submit_command(SUGGESTION_DONE, message, Target::Global);
    });
}

/// Applies the current suggestions on a background thread, sequentially.
pub fn start_rename_round(ctx: &mut EventCtx, data: &mut AppState) {
    if data.round_in_progress {
        data.status_message = "A round is already running.".to_string();
        return;
    }
    if !lock(&data.registry).has_usable_suggestion() {
        data.status_message = "No usable suggestions to apply.".to_string();
        return;
    }

    data.round_in_progress = true;
    data.status_message = "Renaming files…".to_string();

    let dir = PathBuf::from(&data.selected_dir);
    let event_sink = ctx.get_external_handle();
    let registry = Arc::clone(&data.registry);
    let orchestrator = Arc::clone(&data.orchestrator);
    std::thread::spawn(move || {
        let outcome = orchestrator.run_rename_round(&registry, &dir);
        let msg = format!("Renamed {} files, {} errors", outcome.renamed, outcome.failed);
        let _ = event_sink.submit_command(RENAME_DONE, msg, Target::Global);
    });
}
