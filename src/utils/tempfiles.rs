use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::utils::config::PackagePaths;

/// Get the temporary path the CSV is written to before the final rename.
pub fn temp_path_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_else(|| PackagePaths::get().output_filename());
    output
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Prepare the temp path for a run: create the parent directory and remove a stale temp file
/// left by an interrupted run. Returns the temp path to write to.
pub fn prepare_output_work_path(output: &Path) -> Result<PathBuf> {
    let temp_path = temp_path_for(output);
    if let Some(parent) = temp_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    if temp_path.exists() {
        fs::remove_file(&temp_path)
            .with_context(|| format!("remove stale temp output at {}", temp_path.display()))?;
    }
    Ok(temp_path)
}

pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<()> {
    fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "atomic rename temp output to final path ({} -> {})",
            temp_path.display(),
            final_path.display()
        )
    })
}

/// Remove the temp file after a failed run. Missing file is not an error.
pub fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log::warn!("could not remove {}: {}", temp_path.display(), e);
    }
}
