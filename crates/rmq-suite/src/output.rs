use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rmq_verify::SuiteReport;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
    pub report_path: Option<PathBuf>,
}

pub fn render_report(report: &SuiteReport, json: bool) -> Result<String> {
    if json {
        let mut rendered =
            serde_json::to_string_pretty(report).context("failed to encode suite report")?;
        rendered.push('\n');
        return Ok(rendered);
    }
    Ok(report.render_text())
}

pub fn write_report_file(report: &SuiteReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(report).context("failed to encode suite report")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write report {}", path.display()))
}

/// Prints the report to stdout and writes the optional JSON report file.
pub fn emit_report(report: &SuiteReport, config: &OutputConfig) -> Result<()> {
    print!("{}", render_report(report, config.json)?);
    if let Some(path) = &config.report_path {
        write_report_file(report, path)?;
        tracing::info!(path = %path.display(), "suite report written");
    }
    Ok(())
}
