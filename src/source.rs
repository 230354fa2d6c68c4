use std::fs;
use std::path::Path;

/// Load the target URLs from one batch file: one URL per line, trimmed,
/// skipping blank lines and `#` comments, preserving file order. A missing
/// file is an `Err` the caller logs and skips; it never aborts the run.
pub fn load_targets(path: &Path) -> std::io::Result<Vec<String>> {
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
