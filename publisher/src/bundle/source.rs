//! Source-directory resolution
//!
//! The configured subdirectory is resolved against the build workspace and
//! must stay inside it; `../`-style inputs that escape the workspace are
//! rejected before any packaging work starts.

use std::path::{Path, PathBuf};

use crate::errors::PublishError;

/// Resolve `subdirectory` inside `workspace_root`
pub fn resolve_source_dir(
    workspace_root: &Path,
    subdirectory: &str,
) -> Result<PathBuf, PublishError> {
    let workspace = workspace_root
        .canonicalize()
        .map_err(|_| PublishError::SourceNotFound(workspace_root.display().to_string()))?;

    let subdirectory = subdirectory.trim().trim_start_matches('/');
    let candidate = workspace.join(subdirectory);

    // Canonicalize to collapse any ".." components before the containment walk
    let resolved = candidate
        .canonicalize()
        .map_err(|_| PublishError::SourceNotFound(candidate.display().to_string()))?;

    if !resolved.is_dir() {
        return Err(PublishError::SourceNotFound(resolved.display().to_string()));
    }

    // Walk parent links upward; the workspace root must appear in the chain
    if !resolved.ancestors().any(|ancestor| ancestor == workspace) {
        return Err(PublishError::SourceOutsideWorkspace {
            path: resolved.display().to_string(),
            workspace: workspace.display().to_string(),
        });
    }

    Ok(resolved)
}
