//! JSON report, for scripts and CI.

use super::{Report, Reporter};
use crate::prune::Removal;
use serde::Serialize;
use std::io::{self, Write};

/// JSON reporter implementation.
pub struct JsonReporter;

#[derive(Serialize)]
struct JsonSummary {
    removed: usize,
    deleted: usize,
    files_changed: usize,
    failed: usize,
    rounds: usize,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    deleted: bool,
    removals: &'a [Removal],
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    path: String,
    error: &'a str,
}

/// Root JSON structure.
#[derive(Serialize)]
struct JsonReport<'a> {
    root: String,
    check: bool,
    summary: JsonSummary,
    files: Vec<JsonFile<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<JsonFailure<'a>>,
}

impl Reporter for JsonReporter {
    fn render<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        let files = report
            .files
            .iter()
            .map(|file| JsonFile {
                path: report.display_path(&file.path),
                deleted: file.deleted,
                removals: &file.removals,
            })
            .collect();

        let failures = report
            .failures
            .iter()
            .map(|(path, error)| JsonFailure {
                path: report.display_path(path),
                error,
            })
            .collect();

        let output = JsonReport {
            root: report.root.display().to_string(),
            check: report.check,
            summary: JsonSummary {
                removed: report.removed_count(),
                deleted: report.deleted_count(),
                files_changed: report.files.len(),
                failed: report.failures.len(),
                rounds: report.rounds,
            },
            files,
            failures,
        };

        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
