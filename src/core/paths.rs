//! Shared path manipulation utilities.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{LedgerError, Result};

/// File name of the per-business ledger record.
pub const LEDGER_FILE_NAME: &str = "growth-ledger.json";

/// Resolve a path to an absolute, normalized path.
///
/// If `fs::canonicalize` succeeds (path exists), it is used to resolve symlinks
/// and normalize components.
///
/// If it fails (e.g. path does not exist), the path is made absolute relative
/// to CWD and `..`/`.` components are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    // Try filesystem resolution first (handles symlinks).
    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    // Fallback: syntactic normalization.
    normalize_syntactic(&absolute)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Check that a business id is usable as a single path component.
///
/// The id becomes a directory name under the data root, so anything that
/// could escape that directory (separators, `.`, `..`, NUL) is rejected.
pub fn validate_business_id(business: &str) -> Result<()> {
    let invalid = business.is_empty()
        || business == "."
        || business == ".."
        || business.contains(['/', '\\', '\0']);
    if invalid {
        return Err(LedgerError::InvalidBusinessId {
            business: business.to_string(),
        });
    }
    Ok(())
}

/// Path of the ledger record for `business` under `data_root`.
///
/// Layout: `<data_root>/<business>/growth-ledger.json`.
pub fn ledger_path(data_root: &Path, business: &str) -> Result<PathBuf> {
    validate_business_id(business)?;
    Ok(data_root.join(business).join(LEDGER_FILE_NAME))
}
