//! File output for generation runs.
//!
//! Two files are written into a project: the generated artifact under
//! `api/generates/`, rewritten on every run, and the model stub under
//! `api/models/`, written once and never touched again.

use askama::Template;
use dbmgen_core::error::DbmError;
use dbmgen_core::provenance::InvocationRecord;
use dbmgen_core::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Directory of generated artifacts, relative to the project root
pub const GENERATES_DIR: &str = "api/generates";
/// Directory of hand-maintained models, relative to the project root
pub const MODELS_DIR: &str = "api/models";

/// Path of the generated artifact for a model file name
pub fn artifact_path(root: &Path, filename: &str) -> PathBuf {
    root.join(GENERATES_DIR).join(filename)
}

/// Path of the model stub for a model file name
pub fn model_path(root: &Path, filename: &str) -> PathBuf {
    root.join(MODELS_DIR).join(filename)
}

/// Model stub written when a project has no model for the table yet
#[derive(Template)]
#[template(path = "model.js", escape = "none")]
pub struct ModelTemplate<'a> {
    pub model_name: &'a str,
    pub file_name: &'a str,
    pub table: &'a str,
    pub provenance_line: String,
}

impl<'a> ModelTemplate<'a> {
    pub fn new(record: &'a InvocationRecord) -> Self {
        let model_name = Path::new(&record.filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&record.filename);
        Self {
            model_name,
            file_name: &record.filename,
            table: &record.table,
            provenance_line: record.provenance_line(),
        }
    }

    /// Renders the stub text.
    ///
    /// # Errors
    /// Returns a template error if rendering fails.
    pub fn to_source(&self) -> Result<String> {
        let mut source = self.render().map_err(|e| DbmError::Template {
            context: format!("model stub for {}", self.file_name),
            source: Box::new(e),
        })?;
        if !source.ends_with('\n') {
            source.push('\n');
        }
        Ok(source)
    }
}

/// Writes the generated artifact, creating its directory when missing.
///
/// Only a missing directory is recovered from, by one retry after creating
/// it; any other failure is returned.
///
/// # Errors
/// Returns an I/O error if the file cannot be written.
pub async fn write_artifact(path: &Path, content: &str) -> Result<()> {
    match tokio::fs::write(path, content).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                tracing::debug!("Creating directory {}", parent.display());
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DbmError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }
            tokio::fs::write(path, content)
                .await
                .map_err(|e| DbmError::io(format!("Failed to write to {}", path.display()), e))
        }
        Err(e) => Err(DbmError::io(
            format!("Failed to write to {}", path.display()),
            e,
        )),
    }
}

/// Reads an existing model file; `None` when there is none.
///
/// # Errors
/// Returns an I/O error for any failure other than a missing file.
pub async fn read_model(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(document) => Ok(Some(document)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DbmError::io(
            format!("Failed to read {}", path.display()),
            e,
        )),
    }
}

/// Creates the model stub. An existing file is never overwritten.
///
/// # Errors
/// Returns an I/O error if the file exists or cannot be written, and a
/// template error if the stub cannot be rendered.
pub async fn create_model(path: &Path, record: &InvocationRecord) -> Result<()> {
    let source = ModelTemplate::new(record).to_source()?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DbmError::io(format!("Failed to create {}", parent.display()), e))?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| DbmError::io(format!("Failed to create {}", path.display()), e))?;
    file.write_all(source.as_bytes())
        .await
        .map_err(|e| DbmError::io(format!("Failed to write to {}", path.display()), e))?;
    file.flush()
        .await
        .map_err(|e| DbmError::io(format!("Failed to write to {}", path.display()), e))?;

    Ok(())
}
