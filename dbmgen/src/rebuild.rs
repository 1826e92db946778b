//! Batch regeneration of a project's models and of a directory of projects.
//!
//! Models and projects are processed one after another. Models without a
//! recorded generation command are skipped; any other failure stops the
//! batch.

use crate::generate::{GenerationOutcome, regenerate};
use crate::output::MODELS_DIR;
use dbmgen_core::error::DbmError;
use dbmgen_core::{ConnectionOverrides, ConnectionRegistry, Result};
use std::path::{Path, PathBuf};

/// Counts of a finished batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildSummary {
    pub created: usize,
    pub up_to_date: usize,
    pub unverified: usize,
    /// Models without a recorded generation command
    pub skipped: usize,
}

impl RebuildSummary {
    fn record(&mut self, outcome: &GenerationOutcome) {
        match outcome {
            GenerationOutcome::Created { .. } => self.created += 1,
            GenerationOutcome::UpToDate { .. } => self.up_to_date += 1,
            GenerationOutcome::Unverified { .. } | GenerationOutcome::Preview => {
                self.unverified += 1;
            }
        }
    }

    fn merge(&mut self, other: Self) {
        self.created += other.created;
        self.up_to_date += other.up_to_date;
        self.unverified += other.unverified;
        self.skipped += other.skipped;
    }

    /// Models regenerated, skipped ones excluded
    pub fn total(&self) -> usize {
        self.created + self.up_to_date + self.unverified
    }
}

async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DbmError::io(format!("Failed to read {}", dir.display()), e))?;
    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| DbmError::io(format!("Failed to read {}", dir.display()), e))?
    {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn is_model_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| {
                !stem.is_empty() && stem.chars().all(|c| c.is_alphanumeric() || c == '_')
            })
}

/// Model files of a project, in name order
///
/// # Errors
/// Returns an I/O error if the models directory cannot be listed.
pub async fn model_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = sorted_entries(&root.join(MODELS_DIR)).await?;
    Ok(entries.into_iter().filter(|path| is_model_file(path)).collect())
}

/// Regenerates every model of the project at `root`.
///
/// Hand-written models that record no generation command are skipped with
/// a warning.
///
/// # Errors
/// Returns the first failing model's error.
pub async fn rebuild_project(
    root: &Path,
    overrides: &ConnectionOverrides,
    registry: &ConnectionRegistry,
) -> Result<RebuildSummary> {
    let mut summary = RebuildSummary::default();
    for model in model_files(root).await? {
        match regenerate(&model, Some(root), overrides, registry).await {
            Ok(outcome) => summary.record(&outcome),
            Err(DbmError::ProvenanceMissing { path }) => {
                tracing::warn!("Skipping {}: no generation command recorded", path);
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}

/// Regenerates every project below `dir` that has an `api/models` directory.
///
/// # Errors
/// Returns the first failing project's error.
pub async fn rebuild_projects(
    dir: &Path,
    overrides: &ConnectionOverrides,
    registry: &ConnectionRegistry,
) -> Result<RebuildSummary> {
    let mut summary = RebuildSummary::default();
    for project in sorted_entries(dir).await? {
        if !project.join(MODELS_DIR).is_dir() {
            tracing::debug!("Skipping {}: no {}", project.display(), MODELS_DIR);
            continue;
        }
        tracing::info!("start build project => {}", project.display());
        let built = rebuild_project(&project, overrides, registry)
            .await
            .inspect_err(|e| tracing::error!("build project error => {}: {}", project.display(), e))?;
        tracing::info!("project build done => {}", project.display());
        summary.merge(built);
    }
    Ok(summary)
}
