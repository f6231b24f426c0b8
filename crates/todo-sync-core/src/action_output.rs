use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Marker appended once a scan completed; its absence means the run did not finish.
pub const SCAN_COMPLETED_OUTPUT: &str = "scannedIssues=1";

/// Appends one `key=value` line to an action output file, creating it if needed.
pub fn append_action_output(path: &Path, line: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("output path cannot be empty");
    }
    if path.is_dir() {
        bail!("output path '{}' is a directory", path.display());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;
    writeln!(file, "{}", line.trim_end())
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
