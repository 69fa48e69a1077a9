//! Rendering of a pruning run.
//!
//! A [`Report`] gathers the run summary and the per-file removals recorded by
//! a [`RecordingTracker`](crate::prune::RecordingTracker), and renders them as
//! plain text or JSON.

pub mod human;
pub mod json;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::prune::{FileEdits, RunSummary};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One block per edited file, then totals
    #[default]
    Human,
    /// Machine-readable, full data
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(ReportFormat::Human),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "Unknown report format: '{}'. Valid formats: human, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Human => write!(f, "human"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Everything a reporter needs about one run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Project root; file paths are shown relative to it.
    pub root: PathBuf,
    /// Whether the run was a dry run against a snapshot.
    pub check: bool,
    /// Edited files, in first-edit order.
    pub files: Vec<FileEdits>,
    /// Targets that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
    /// Outer rounds executed.
    pub rounds: usize,
}

impl Report {
    pub fn new(root: impl Into<PathBuf>, check: bool, summary: &RunSummary, files: Vec<FileEdits>) -> Self {
        Self {
            root: root.into(),
            check,
            files,
            failures: summary.failures.clone(),
            rounds: summary.rounds,
        }
    }

    /// Total exports removed across all files.
    pub fn removed_count(&self) -> usize {
        self.files.iter().map(|file| file.removals.len()).sum()
    }

    pub fn deleted_count(&self) -> usize {
        self.files.iter().filter(|file| file.deleted).count()
    }

    /// Whether anything was (or, in check mode, would be) changed.
    pub fn has_changes(&self) -> bool {
        !self.files.is_empty()
    }

    /// `path` relative to the project root, with forward slashes.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Trait for report renderers.
pub trait Reporter {
    /// Render the report to the given writer.
    fn render<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()>;
}

/// Render a report in the specified format.
pub fn render<W: Write>(format: ReportFormat, report: &Report, writer: &mut W) -> io::Result<()> {
    match format {
        ReportFormat::Human => human::HumanReporter.render(report, writer),
        ReportFormat::Json => json::JsonReporter.render(report, writer),
    }
}

/// Render a report to a string.
pub fn render_to_string(format: ReportFormat, report: &Report) -> io::Result<String> {
    let mut buffer = Vec::new();
    render(format, report, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::prune::{FileOutcome, Removal};

    pub(crate) fn sample_report(check: bool) -> Report {
        let summary = RunSummary {
            outcomes: vec![
                (
                    PathBuf::from("/app/src/util.ts"),
                    FileOutcome::Pruned {
                        removed: 2,
                        passes: 1,
                    },
                ),
                (PathBuf::from("/app/src/old.ts"), FileOutcome::Deleted),
            ],
            failures: vec![(
                PathBuf::from("/app/src/broken.ts"),
                "/app/src/broken.ts: syntax errors, refusing to edit".to_string(),
            )],
            rounds: 1,
        };
        let files = vec![
            FileEdits {
                path: PathBuf::from("/app/src/util.ts"),
                removals: vec![
                    Removal {
                        line: 1,
                        column: 1,
                        offset: 0,
                        code: "export ".to_string(),
                    },
                    Removal {
                        line: 4,
                        column: 10,
                        offset: 52,
                        code: "b".to_string(),
                    },
                ],
                deleted: false,
            },
            FileEdits {
                path: PathBuf::from("/app/src/old.ts"),
                removals: Vec::new(),
                deleted: true,
            },
        ];
        Report::new("/app", check, &summary, files)
    }

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("human".parse::<ReportFormat>().unwrap(), ReportFormat::Human);
        assert_eq!("TEXT".parse::<ReportFormat>().unwrap(), ReportFormat::Human);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_report_format_display() {
        assert_eq!(ReportFormat::Human.to_string(), "human");
        assert_eq!(ReportFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_report_counts() {
        let report = sample_report(false);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(report.deleted_count(), 1);
        assert!(report.has_changes());
        assert_eq!(report.display_path(Path::new("/app/src/util.ts")), "src/util.ts");
        assert_eq!(report.display_path(Path::new("/elsewhere/a.ts")), "/elsewhere/a.ts");
    }

    #[test]
    fn test_render_to_string() {
        let report = sample_report(false);
        let text = render_to_string(ReportFormat::Human, &report).unwrap();
        assert!(text.contains("src/util.ts"));
        let json = render_to_string(ReportFormat::Json, &report).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }
}
