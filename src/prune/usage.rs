//! Reference usage analysis.
//!
//! A candidate is unused when no file other than its own refers to it. For
//! specifiers forwarding a symbol from another module, references in the
//! files the symbol is forwarded through do not count.

use std::path::Path;

use tracing::{debug, trace};

use crate::analysis::{AnalysisError, AnalysisResult, LanguageService, Reference};
use crate::store::FileStore;

use super::ancestry::resolve_ancestry;
use super::candidates::Candidate;

/// Used or unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Used,
    Unused,
}

impl Verdict {
    pub fn is_unused(self) -> bool {
        self == Verdict::Unused
    }
}

/// Decide whether `candidate`, declared in `file`, is used.
///
/// A statement declaring several names is used as soon as one of them is.
pub fn classify(
    service: &mut dyn LanguageService,
    store: &dyn FileStore,
    file: &Path,
    candidate: &Candidate,
) -> AnalysisResult<Verdict> {
    for position in candidate.positions() {
        let refs = match service.find_references(store, file, position) {
            Ok(refs) => refs,
            Err(AnalysisError::NoSymbol { .. }) => {
                debug!(
                    file = %file.display(),
                    position,
                    candidate = %candidate.label(),
                    "no symbol at candidate position; keeping it"
                );
                return Ok(Verdict::Used);
            }
            Err(err) => return Err(err),
        };
        if name_is_used(service, store, file, candidate, &refs) {
            return Ok(Verdict::Used);
        }
    }
    trace!(file = %file.display(), candidate = %candidate.label(), "unused");
    Ok(Verdict::Unused)
}

fn name_is_used(
    service: &mut dyn LanguageService,
    store: &dyn FileStore,
    file: &Path,
    candidate: &Candidate,
    refs: &[Reference],
) -> bool {
    let mut external = refs.iter().filter(|r| r.file != file);

    let Some(module) = &candidate.module else {
        return external.next().is_some();
    };

    match resolve_ancestry(service, store, file, module, refs) {
        Some(ancestry) => external.any(|r| !ancestry.contains(&r.file)),
        None => true,
    }
}
