// Report generation - best-effort call to an external report tool
//
// The results directory (summary JSON plus attached failure artifacts) is
// handed to `<report_command> generate <results> -o <report> --clean`.
// A missing tool is skipped; a failing tool is reported but never fails
// the suite.

use crate::config::Settings;
use crate::error::CleanupError;
use std::path::{Path, PathBuf};

/// Looks `command` up on `PATH`; an explicit path is checked directly.
pub fn find_executable(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        executable_names(command)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    })
}

#[cfg(windows)]
fn executable_names(command: &str) -> Vec<String> {
    ["", ".exe", ".cmd", ".bat"]
        .iter()
        .map(|ext| format!("{command}{ext}"))
        .collect()
}

#[cfg(not(windows))]
fn executable_names(command: &str) -> Vec<String> {
    vec![command.to_string()]
}

/// Runs the report generator over `settings.results_dir`.
///
/// Returns the report directory, or `None` when the tool is not installed.
pub async fn generate(settings: &Settings) -> Result<Option<PathBuf>, CleanupError> {
    let Some(tool) = find_executable(&settings.report_command) else {
        tracing::info!(
            command = %settings.report_command,
            "Report generator not found on PATH, skipping report"
        );
        return Ok(None);
    };

    tracing::info!(
        tool = %tool.display(),
        results = %settings.results_dir.display(),
        report = %settings.report_dir.display(),
        "Generating report"
    );

    let output = tokio::process::Command::new(&tool)
        .arg("generate")
        .arg(&settings.results_dir)
        .arg("-o")
        .arg(&settings.report_dir)
        .arg("--clean")
        .output()
        .await
        .map_err(|e| CleanupError::Command {
            command: settings.report_command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CleanupError::Command {
            command: settings.report_command.clone(),
            reason: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(Some(settings.report_dir.clone()))
}
