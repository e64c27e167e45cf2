//! JSON report files

use crate::output::{OutputError, OutputResult};
use crate::report::SecurityReport;
use crate::url::url_slug;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Default file name for a report
///
/// Format: `report_<host-and-path>_<YYYYMMDD_HHMMSS>.json`, using the
/// report's capture time.
pub fn report_file_name(report: &SecurityReport) -> String {
    let slug = match Url::parse(&report.url) {
        Ok(url) => url_slug(&url),
        Err(_) => "unknown".to_string(),
    };

    format!(
        "report_{}_{}.json",
        slug,
        report.timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Writes the report as pretty-printed JSON
///
/// # Arguments
///
/// * `report` - The report to persist
/// * `directory` - Output directory (created if missing)
/// * `file_name` - Explicit file name; defaults to [`report_file_name`]
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - The directory or file could not be written
pub fn save_report(
    report: &SecurityReport,
    directory: &Path,
    file_name: Option<&str>,
) -> OutputResult<PathBuf> {
    let name = match file_name {
        Some(name) => validate_file_name(name)?,
        None => report_file_name(report),
    };

    fs::create_dir_all(directory)?;
    let path = directory.join(name);
    fs::write(&path, report.to_json_pretty()?)?;

    tracing::info!("Report saved to {}", path.display());
    Ok(path)
}

/// Accepts only a plain file name, never a path
fn validate_file_name(name: &str) -> OutputResult<String> {
    let trimmed = name.trim();
    let plain = Path::new(trimmed)
        .file_name()
        .is_some_and(|f| f == trimmed);

    if trimmed.is_empty() || !plain {
        return Err(OutputError::InvalidName(name.to_string()));
    }

    Ok(trimmed.to_string())
}
