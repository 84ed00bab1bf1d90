//! Writing finished documents

use std::io::Write;
use std::path::Path;

use ifc4d_core::GanttError;
use tracing::debug;

/// Write `contents` to `path`, replacing any existing file.
///
/// The document goes to a temporary file in the destination directory first
/// and is renamed over `path` once complete, so a failed run never leaves a
/// truncated file behind.
pub fn write_document(path: &Path, contents: &str) -> Result<(), GanttError> {
    let write_error = |source: std::io::Error| GanttError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".ifc4d-gantt-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    let mut file = builder.tempfile_in(dir).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote document");
    Ok(())
}
