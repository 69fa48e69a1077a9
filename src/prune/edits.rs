//! Text surgery for unused exports.
//!
//! [`plan_batch`] turns the unused candidates of one scan into a set of
//! non-overlapping [`TextChange`]s for
//! [`apply_changes`](crate::analysis::text::apply_changes) to splice into the
//! file text.

use std::path::Path;

use crate::analysis::syntax::line_column;
use crate::analysis::text::{line_extent, TextChange};
use crate::analysis::Span;

use super::candidates::{Candidate, CandidateKind, Clause};
use super::tracker::Removal;
use super::{PruneError, PruneResult};

/// One pass worth of edits for a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub changes: Vec<TextChange>,
    /// What was removed, located against the pre-edit text.
    pub removals: Vec<Removal>,
    /// Unused candidates left for a later pass.
    pub deferred: usize,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn remove(&mut self, text: &str, span: Span, code: Span) {
        self.changes.push(TextChange::delete(span));
        self.record(text, code);
    }

    fn record(&mut self, text: &str, code: Span) {
        let (line, column) = line_column(text, code.start);
        self.removals.push(Removal {
            line,
            column,
            offset: code.start,
            code: text.get(code.start..code.end).unwrap_or("").to_string(),
        });
    }
}

/// Plan the edits removing `unused` from `text`.
///
/// At most one clause is rewritten per batch; further clauses with a mix of
/// used and unused specifiers are deferred to the next pass, whose scan sees
/// the rewritten text.
pub fn plan_batch(path: &Path, text: &str, unused: &[&Candidate]) -> PruneResult<Batch> {
    let mut batch = Batch::default();
    let mut handled_clauses: Vec<Span> = Vec::new();
    let mut rewritten = false;

    for candidate in unused {
        match candidate.kind {
            CandidateKind::Specifier => {
                let clause = candidate
                    .clause
                    .as_ref()
                    .ok_or_else(|| PruneError::MissingClause {
                        path: path.to_path_buf(),
                        offset: candidate.node.start,
                    })?;
                if handled_clauses.contains(&clause.span) {
                    continue;
                }
                handled_clauses.push(clause.span);

                let siblings: Vec<&Candidate> = unused
                    .iter()
                    .copied()
                    .filter(|other| {
                        other.clause.as_ref().map(|c| c.span) == Some(clause.span)
                    })
                    .collect();

                if siblings.len() >= clause.specifiers.len() {
                    let statement = candidate.statement;
                    batch.remove(text, line_extent(text, statement), statement);
                } else if rewritten {
                    batch.deferred += siblings.len();
                } else {
                    rewritten = true;
                    let removed = |span: Span| siblings.iter().any(|s| s.node == span);
                    for cut in clause_cuts(text, clause, removed) {
                        batch.changes.push(TextChange::delete(cut));
                    }
                    for sibling in siblings {
                        batch.record(text, sibling.node);
                    }
                }
            }
            CandidateKind::ExportAssignment => {
                let statement = candidate.statement;
                batch.remove(text, line_extent(text, statement), statement);
            }
            _ => {
                let keyword =
                    candidate
                        .export_keyword
                        .ok_or_else(|| PruneError::MissingExportKeyword {
                            path: path.to_path_buf(),
                            offset: candidate.statement.start,
                        })?;
                let marker = Span::new(keyword.start, candidate.node.start);
                batch.remove(text, marker, marker);
            }
        }
    }

    Ok(batch)
}

/// Byte ranges that cut the specifiers `removed` accepts out of `clause`,
/// each with its separating comma. Comments and line breaks of the remaining
/// specifiers stay as they are.
fn clause_cuts(text: &str, clause: &Clause, removed: impl Fn(Span) -> bool) -> Vec<Span> {
    let specifiers = &clause.specifiers;
    let Some(last_kept) = specifiers.iter().rposition(|span| !removed(*span)) else {
        return Vec::new();
    };

    let mut cuts = Vec::new();
    for (i, &spec) in specifiers.iter().enumerate() {
        if !removed(spec) {
            continue;
        }
        let bound = specifiers.get(i + 1).map_or(clause.span.end, |next| next.start);
        let own_comma = clause
            .commas
            .iter()
            .find(|comma| comma.start >= spec.end && comma.end <= bound);

        match own_comma {
            Some(comma) => {
                let cut = Span::new(spec.start, comma.end);
                cuts.push(
                    own_line(text, cut)
                        .unwrap_or_else(|| Span::new(spec.start, skip_blanks(text, comma.end))),
                );
            }
            // last specifier without a trailing comma: the comma after the
            // last survivor goes instead
            None => {
                let line = own_line(text, spec);
                cuts.push(
                    line.unwrap_or_else(|| Span::new(skip_blanks_back(text, spec.start), spec.end)),
                );

                let kept_end = specifiers[last_kept].end;
                let comma = clause
                    .commas
                    .iter()
                    .find(|comma| comma.start >= kept_end && comma.end <= spec.start);
                if let Some(comma) = comma {
                    let end = if line.is_some() {
                        comma.end
                    } else {
                        skip_blanks(text, comma.end)
                    };
                    cuts.push(Span::new(comma.start, end));
                }
            }
        }
    }

    merge_spans(cuts)
}

/// The whole line around `span`, when nothing else shares it.
fn own_line(text: &str, span: Span) -> Option<Span> {
    let line = line_extent(text, span);
    let at_line_start = line.start == 0 || text.as_bytes()[line.start - 1] == b'\n';
    (at_line_start && line.end > span.end).then_some(line)
}

fn skip_blanks(text: &str, mut pos: usize) -> usize {
    let bytes = text.as_bytes();
    while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t') {
        pos += 1;
    }
    pos
}

fn skip_blanks_back(text: &str, mut pos: usize) -> usize {
    let bytes = text.as_bytes();
    while pos > 0 && matches!(bytes[pos - 1], b' ' | b'\t') {
        pos -= 1;
    }
    pos
}

fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}
