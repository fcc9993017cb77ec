use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

/// Per-request scratch files for one render.
///
/// Files are removed by [`RenderJob::cleanup`] after a successful create only;
/// a failed request leaves them behind.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub template_path: PathBuf,
    pub document_path: PathBuf,
    pub content: Value,
}

impl RenderJob {
    pub fn new(scratch_dir: &Path, content: Value) -> Self {
        Self {
            template_path: scratch_dir.join(format!("template-{}.docx", uuid::Uuid::new_v4())),
            document_path: scratch_dir.join(format!("generated-{}.docx", uuid::Uuid::new_v4())),
            content,
        }
    }

    pub fn write_template(&self, bytes: &[u8]) -> Result<(), String> {
        fs::write(&self.template_path, bytes).map_err(|error| {
            format!(
                "failed to write template scratch file {}: {error}",
                self.template_path.display()
            )
        })
    }

    pub fn read_template(&self) -> Result<Vec<u8>, String> {
        fs::read(&self.template_path).map_err(|error| {
            format!(
                "failed to read template scratch file {}: {error}",
                self.template_path.display()
            )
        })
    }

    pub fn write_document(&self, bytes: &[u8]) -> Result<(), String> {
        fs::write(&self.document_path, bytes).map_err(|error| {
            format!(
                "failed to write document scratch file {}: {error}",
                self.document_path.display()
            )
        })
    }

    pub fn read_document(&self) -> Result<Vec<u8>, String> {
        fs::read(&self.document_path).map_err(|error| {
            format!(
                "failed to read document scratch file {}: {error}",
                self.document_path.display()
            )
        })
    }

    /// Removes both scratch files and returns how many could not be removed.
    /// Files that were never written are not counted.
    pub fn cleanup(&self) -> usize {
        [&self.template_path, &self.document_path]
            .into_iter()
            .filter(|path| match fs::remove_file(path) {
                Ok(()) => false,
                Err(error) if error.kind() == ErrorKind::NotFound => false,
                Err(error) => {
                    warn!(
                        component = "scratch",
                        path = %path.display(),
                        error = %error,
                        "scratch_cleanup_failed"
                    );
                    true
                }
            })
            .count()
    }
}
