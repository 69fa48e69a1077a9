//! Plain-text report.

use super::{Report, Reporter};
use std::io::{self, Write};

/// Human-readable reporter.
pub struct HumanReporter;

impl Reporter for HumanReporter {
    fn render<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        for file in &report.files {
            writeln!(writer, "{}", report.display_path(&file.path))?;
            for removal in &file.removals {
                writeln!(
                    writer,
                    "  {}:{}  {}",
                    removal.line,
                    removal.column,
                    first_line(&removal.code)
                )?;
            }
            if file.deleted {
                writeln!(writer, "  (file deleted)")?;
            }
        }

        if report.has_changes() {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", totals(report))?;

        if !report.failures.is_empty() {
            writeln!(writer)?;
            writeln!(
                writer,
                "Failed to process {}:",
                plural(report.failures.len(), "file")
            )?;
            for (path, error) in &report.failures {
                writeln!(writer, "  {}: {}", report.display_path(path), error)?;
            }
        }

        Ok(())
    }
}

fn totals(report: &Report) -> String {
    if !report.has_changes() {
        return "No unused exports found.".to_string();
    }

    let verb = if report.check { "Would remove" } else { "Removed" };
    let mut line = format!("{} {}", verb, plural(report.removed_count(), "export"));
    let deleted = report.deleted_count();
    if deleted > 0 {
        let verb = if report.check { "delete" } else { "deleted" };
        line.push_str(&format!(" and {} {}", verb, plural(deleted, "file")));
    }
    if report.rounds > 1 {
        line.push_str(&format!(" over {} rounds", report.rounds));
    }
    line.push('.');
    line
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn first_line(code: &str) -> &str {
    code.trim().lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;
    use crate::report::Report;
    use std::path::PathBuf;

    fn render(report: &Report) -> String {
        let mut output = Vec::new();
        HumanReporter.render(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_human_report() {
        let text = render(&sample_report(false));
        assert_eq!(
            text,
            "src/util.ts\n  1:1  export\n  4:10  b\nsrc/old.ts\n  (file deleted)\n\n\
             Removed 2 exports and deleted 1 file.\n\n\
             Failed to process 1 file:\n  src/broken.ts: /app/src/broken.ts: syntax errors, refusing to edit\n"
        );
    }

    #[test]
    fn test_check_mode_wording() {
        let text = render(&sample_report(true));
        assert!(text.contains("Would remove 2 exports and delete 1 file."));
    }

    #[test]
    fn test_nothing_found() {
        let report = Report {
            root: PathBuf::from("/app"),
            check: false,
            files: Vec::new(),
            failures: Vec::new(),
            rounds: 1,
        };
        assert_eq!(render(&report), "No unused exports found.\n");
    }
}
