//! Scratch directory for intermediate files.

use crate::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory that holds intermediate files (sampled frames,
/// cropped regions) for one video. Removed when dropped.
///
/// # Example
///
/// ```no_run
/// use scenescribe_av::Workspace;
///
/// let workspace = Workspace::new("frames")?;
/// let frame = workspace.temp_file("frame_000001.jpg");
/// assert!(frame.starts_with(workspace.dir()));
/// # Ok::<(), scenescribe_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace; `label` is used as the directory name prefix.
    pub fn new(label: &str) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("scenescribe-{label}-"))
            .tempdir()?;
        Ok(Self { temp_dir })
    }

    /// Get the workspace directory path.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file named `name` inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}
