use std::path::Path;

use anyhow::{bail, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Content beyond this many characters adds prompt cost without improving
/// the suggestion; the oracle only needs the gist of the file.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Reads the text files directly inside `dir` as `(file name, content)`
/// pairs, in directory walk order. Unreadable or non-UTF-8 entries are
/// skipped; content is truncated on a char boundary.
pub fn load_text_files(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.path().file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                files.push((name.to_string(), truncate_content(&content)));
            }
            Err(e) => {
                debug!(file = %name, error = %e, "skipping unreadable file");
            }
        }
    }

    info!(dir = %dir.display(), files = files.len(), "scanned directory");
    Ok(files)
}

fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    content.chars().take(MAX_CONTENT_CHARS).collect()
}
