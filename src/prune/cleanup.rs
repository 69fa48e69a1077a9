//! Secondary code-fix pass.
//!
//! Once a file's exports are stable, declarations that lost their last user
//! (typically the ones whose `export` marker was just removed) and imports
//! they were the only users of can be dropped too.

use std::path::Path;

use tracing::debug;

use crate::analysis::{FixKind, LanguageService};
use crate::store::FileStore;

use super::PruneResult;

/// Upper bound on unused-declaration rounds for one file.
const MAX_DECLARATION_ROUNDS: usize = 64;

/// Run the fixes on `file`, persisting the result. Returns whether the file
/// changed.
pub fn run_cleanup(
    service: &mut dyn LanguageService,
    store: &mut dyn FileStore,
    file: &Path,
) -> PruneResult<bool> {
    let original = store.read(file)?;
    let mut current = original.clone();

    for round in 1..=MAX_DECLARATION_ROUNDS {
        let next = service.apply_fix(&*store, FixKind::UnusedDeclarations, file)?;
        if next == current {
            debug!(file = %file.display(), rounds = round - 1, "declarations stable");
            break;
        }
        store.write(file, &next)?;
        current = next;
    }

    let next = service.apply_fix(&*store, FixKind::UnusedImports, file)?;
    if next != current {
        store.write(file, &next)?;
        current = next;
    }

    Ok(current != original)
}
