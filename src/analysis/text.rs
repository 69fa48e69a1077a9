//! Span-based text edits shared by the fixes and the pruner.

use super::Span;

/// Replace the text in `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub span: Span,
    pub replacement: String,
}

impl TextChange {
    pub fn delete(span: Span) -> Self {
        Self {
            span,
            replacement: String::new(),
        }
    }

    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Apply `changes` to `text`.
///
/// Changes are applied in span order; one overlapping an earlier change is
/// dropped.
pub fn apply_changes(text: &str, changes: &[TextChange]) -> String {
    let mut sorted: Vec<&TextChange> = changes.iter().collect();
    sorted.sort_unstable_by(|a, b| a.span.cmp(&b.span));

    let mut pos = 0;
    let mut result = String::with_capacity(text.len());
    for change in sorted {
        if change.span.start < pos || change.span.end > text.len() {
            continue;
        }
        result.push_str(&text[pos..change.span.start]);
        result.push_str(&change.replacement);
        pos = change.span.end;
    }
    result.push_str(&text[pos..]);
    result
}

/// Widen a statement span to whole lines: leading indentation, trailing
/// blanks and the line break are included when nothing else shares the line.
pub fn line_extent(text: &str, span: Span) -> Span {
    let bytes = text.as_bytes();

    let mut start = span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        start = span.start;
    }

    let mut end = span.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    } else if end < bytes.len() {
        end = span.end;
    }

    Span::new(start, end)
}
