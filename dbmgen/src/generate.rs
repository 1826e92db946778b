//! Generation pipeline for a single table.
//!
//! resolve connection -> acquire pooled catalog connection -> describe table
//! -> build descriptor -> render -> write artifact -> model stub or
//! provenance check.

use crate::output;
use dbmgen_core::adapters::config::environment::{self, ShellKind};
use dbmgen_core::descriptor::{BuildOptions, build};
use dbmgen_core::error::DbmError;
use dbmgen_core::models::{ModelDescriptor, SchemaVersion, TimestampPolicy};
use dbmgen_core::provenance::{self, FlagToken, InvocationRecord, ProvenanceCheck};
use dbmgen_core::render::render_artifact;
use dbmgen_core::{ConnectionOverrides, ConnectionRegistry, Result};
use std::path::{Path, PathBuf};

/// Package manifest whose major version selects the descriptor schema
pub const SAILS_MANIFEST: &str = "node_modules/sails/package.json";

const FLAG_DATABASE: &str = "database";
const FLAG_AUTO_CREATED_AT: &str = "autoCreatedAt";
const FLAG_AUTO_UPDATED_AT: &str = "autoUpdatedAt";
const FLAG_TARGET_VERSION: &str = "target-version";

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Artifact written and a new model stub created
    Created { model: PathBuf },
    /// Artifact written; the existing model records the same invocation
    UpToDate { model: PathBuf },
    /// Artifact written; the existing model carries no provenance line
    Unverified { model: PathBuf },
    /// Nothing written; the rendered output went to stdout
    Preview,
}

/// What `--dry-run` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewFormat {
    #[default]
    Artifact,
    Json,
}

/// One generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Model file name, always with an extension
    pub filename: String,
    pub table: String,
    /// Connection settings given on the command line; `database` is recorded
    pub connection: ConnectionOverrides,
    pub auto_created_at: Option<bool>,
    pub auto_updated_at: Option<bool>,
    /// Overrides the version detected from the project
    pub target_version: Option<i64>,
    /// Recorded flags this tool does not interpret, replayed verbatim
    pub passthrough_flags: Vec<FlagToken>,
    pub root: PathBuf,
    /// Print `--save` guidance after writing
    pub save: bool,
    pub preview: Option<PreviewFormat>,
}

/// Appends `.js` to a model name without an extension.
///
/// # Errors
/// Returns an input error for an empty name.
pub fn normalize_filename(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbmError::input(
            "A model name is required: dbmgen generate <Name> --table <table>",
        ));
    }
    if Path::new(name).extension().is_some() {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.js", name))
    }
}

impl GenerateRequest {
    /// Creates a request for a model and table rooted at `root`.
    ///
    /// # Errors
    /// Returns an input error when the model name or table is empty.
    pub fn new(name: &str, table: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let table = table.trim();
        if table.is_empty() {
            return Err(DbmError::input(
                "A table name is required: dbmgen generate <Name> --table <table>",
            ));
        }
        Ok(Self {
            filename: normalize_filename(name)?,
            table: table.to_string(),
            root: root.into(),
            ..Self::default()
        })
    }

    /// Rebuilds a request from the invocation recorded in a model file.
    ///
    /// # Errors
    /// Returns an input error for an empty table or a non-numeric
    /// `--target-version`.
    pub fn from_record(record: &InvocationRecord, root: impl Into<PathBuf>) -> Result<Self> {
        let mut request = Self::new(&record.filename, &record.table, root)?;
        for flag in &record.flags {
            match (flag.name(), flag) {
                (FLAG_DATABASE, FlagToken::Valued { value, .. }) => {
                    request.connection.database = Some(value.clone());
                }
                (FLAG_AUTO_CREATED_AT, _) if flag.switch().is_some() => {
                    request.auto_created_at = flag.switch();
                }
                (FLAG_AUTO_UPDATED_AT, _) if flag.switch().is_some() => {
                    request.auto_updated_at = flag.switch();
                }
                (FLAG_TARGET_VERSION, FlagToken::Valued { value, .. }) => {
                    let version = value.parse().map_err(|_| {
                        DbmError::input(format!("Invalid recorded --target-version '{}'", value))
                    })?;
                    request.target_version = Some(version);
                }
                _ => {
                    tracing::warn!(
                        "Recorded flag --{} is not used by dbmgen and is kept as-is",
                        flag.name()
                    );
                    request.passthrough_flags.push(flag.clone());
                }
            }
        }
        Ok(request)
    }

    /// Flags explicitly given for this run, in recording order
    pub fn invocation_record(&self) -> InvocationRecord {
        let mut record = InvocationRecord::new(&self.filename, &self.table);
        if let Some(database) = &self.connection.database {
            record = record.with_flag(FlagToken::Valued {
                name: FLAG_DATABASE.to_string(),
                value: database.clone(),
            });
        }
        for (name, setting) in [
            (FLAG_AUTO_CREATED_AT, self.auto_created_at),
            (FLAG_AUTO_UPDATED_AT, self.auto_updated_at),
        ] {
            match setting {
                Some(true) => record = record.with_flag(FlagToken::Enabled(name.to_string())),
                Some(false) => record = record.with_flag(FlagToken::Disabled(name.to_string())),
                None => {}
            }
        }
        if let Some(version) = self.target_version {
            record = record.with_flag(FlagToken::Valued {
                name: FLAG_TARGET_VERSION.to_string(),
                value: version.to_string(),
            });
        }
        for flag in &self.passthrough_flags {
            record = record.with_flag(flag.clone());
        }
        record
    }

    fn build_options(&self, target_version: i64) -> BuildOptions {
        BuildOptions::new(SchemaVersion::from_target(target_version)).with_timestamps(
            TimestampPolicy::from_flag(self.auto_created_at),
            TimestampPolicy::from_flag(self.auto_updated_at),
        )
    }
}

/// Target version of a project: `--target-version` if given, else the major
/// version of the installed sails package, else 0.
pub async fn detect_target_version(root: &Path, explicit: Option<i64>) -> i64 {
    if let Some(version) = explicit {
        return version;
    }

    let manifest = root.join(SAILS_MANIFEST);
    let Ok(content) = tokio::fs::read_to_string(&manifest).await else {
        tracing::debug!("No {} found, targeting version 0", manifest.display());
        return 0;
    };

    let major = serde_json::from_str::<serde_json::Value>(&content)
        .ok()
        .and_then(|manifest| {
            manifest
                .get("version")
                .and_then(serde_json::Value::as_str)
                .and_then(|version| version.split('.').next())
                .and_then(|major| major.trim().parse::<i64>().ok())
        });

    major.unwrap_or_else(|| {
        tracing::warn!("Cannot read a version from {}, targeting version 0", manifest.display());
        0
    })
}

/// Reads the table catalog and builds its descriptor.
///
/// # Errors
/// Returns input errors for unresolved credentials, connection and query
/// errors from the catalog, and an empty-catalog error for unknown tables.
pub async fn describe(
    request: &GenerateRequest,
    registry: &ConnectionRegistry,
) -> Result<(ModelDescriptor, environment::ResolvedConnection)> {
    let resolved = environment::resolve(&request.connection)?;
    let target_version = detect_target_version(&request.root, request.target_version).await;

    let source = registry.acquire(&resolved.identity()).await?;
    let database = resolved.config.database_name();
    let table = source.describe_table(database, &request.table).await?;
    if table.columns.is_empty() {
        return Err(DbmError::EmptyCatalog {
            database: database.to_string(),
            table: request.table.clone(),
        });
    }

    tracing::debug!(
        "Table {}.{} has {} columns",
        database,
        request.table,
        table.columns.len()
    );
    let descriptor = build(&table, &request.build_options(target_version));
    tracing::info!(
        "update generated model({}) => {}",
        target_version,
        output::artifact_path(&request.root, &request.filename).display()
    );

    Ok((descriptor, resolved))
}

/// Runs one generation.
///
/// An existing model must record an equivalent invocation before anything
/// is written. The artifact is then rewritten and the model stub is created
/// only when absent.
///
/// # Errors
/// Returns every failure of [`describe`], I/O errors for the written files
/// and a provenance error when the existing model records a different
/// invocation. On a provenance error neither file is touched.
pub async fn generate(
    request: &GenerateRequest,
    registry: &ConnectionRegistry,
) -> Result<GenerationOutcome> {
    let (descriptor, resolved) = describe(request, registry).await?;

    if let Some(format) = request.preview {
        let text = match format {
            PreviewFormat::Artifact => render_artifact(&descriptor),
            PreviewFormat::Json => serde_json::to_string_pretty(&descriptor).map_err(|e| {
                DbmError::Template {
                    context: "descriptor JSON".to_string(),
                    source: Box::new(e),
                }
            })?,
        };
        println!("{}", text.trim_end());
        return Ok(GenerationOutcome::Preview);
    }

    let model = output::model_path(&request.root, &request.filename);
    let record = request.invocation_record();
    let existing = output::read_model(&model).await?;

    let outcome = match existing.as_deref().map(|doc| provenance::check(doc, &record)) {
        None => GenerationOutcome::Created {
            model: model.clone(),
        },
        Some(ProvenanceCheck::Match) => GenerationOutcome::UpToDate {
            model: model.clone(),
        },
        Some(ProvenanceCheck::Missing) => GenerationOutcome::Unverified {
            model: model.clone(),
        },
        Some(ProvenanceCheck::Mismatch { recorded, current }) => {
            tracing::error!(
                "The model was generated by a different command; delete {} and run again to replace it",
                model.display()
            );
            return Err(DbmError::ProvenanceMismatch {
                recorded: recorded.to_string(),
                current: current.to_string(),
            });
        }
    };

    let artifact = output::artifact_path(&request.root, &request.filename);
    output::write_artifact(&artifact, &render_artifact(&descriptor)).await?;

    if request.save {
        println!("{}", environment::save_guidance(&resolved, ShellKind::current())?);
    }

    match &outcome {
        GenerationOutcome::Created { .. } => {
            output::create_model(&model, &record).await?;
            tracing::info!("Created model {}", model.display());
        }
        GenerationOutcome::UpToDate { .. } => {
            tracing::info!("Model {} is already up to date", model.display());
        }
        GenerationOutcome::Unverified { .. } => {
            tracing::warn!(
                "Model {} records no generation command; it was left unchanged",
                model.display()
            );
        }
        GenerationOutcome::Preview => {}
    }
    Ok(outcome)
}

/// Project root of a model file at `<root>/api/models/<File>`
pub fn project_root_of(model: &Path) -> Option<PathBuf> {
    let models_dir = model.parent()?;
    let api_dir = models_dir.parent()?;
    let is_models_dir = models_dir.file_name().is_some_and(|name| name == "models")
        && api_dir.file_name().is_some_and(|name| name == "api");
    if is_models_dir {
        Some(api_dir.parent().map(Path::to_path_buf).unwrap_or_default())
    } else {
        None
    }
}

/// Regenerates a model from the invocation recorded in it.
///
/// `root` defaults to the project containing the model file. Connection
/// overrides supply settings the record never holds (host, credentials).
///
/// # Errors
/// Returns a provenance error when the model has no provenance line, plus
/// every failure of [`generate`].
pub async fn regenerate(
    model: &Path,
    root: Option<&Path>,
    overrides: &ConnectionOverrides,
    registry: &ConnectionRegistry,
) -> Result<GenerationOutcome> {
    let document = output::read_model(model).await?.ok_or_else(|| {
        DbmError::input(format!("Model file {} does not exist", model.display()))
    })?;
    let command =
        provenance::extract_command(&document).ok_or_else(|| DbmError::ProvenanceMissing {
            path: model.display().to_string(),
        })?;
    let record = InvocationRecord::parse(&command)?;

    let root = root
        .map(Path::to_path_buf)
        .or_else(|| project_root_of(model))
        .unwrap_or_else(|| PathBuf::from("."));
    let mut request = GenerateRequest::from_record(&record, root)?;

    let recorded_database = request.connection.database.take();
    request.connection = ConnectionOverrides {
        database: recorded_database,
        ..overrides.clone()
    };

    tracing::info!("Regenerating {} from `{}`", model.display(), command);
    generate(&request, registry).await
}
