//! Core library of dbmgen, a model descriptor generator for MySQL tables.
//!
//! Given one table, dbmgen reads its column catalog and synthesizes a
//! declarative model descriptor for a Sails/Waterline style ORM: inferred
//! attribute types, coerced defaults, keys and timestamp handling. The
//! descriptor is rendered as a generated JavaScript module, and a
//! hand-maintained model file records the invocation that created it.
//!
//! # Security Guarantees
//! - Catalog access is read-only (`information_schema` only)
//! - Credentials live in zeroizing containers and never reach logs or artifacts
//! - Credentials kept in environment variables are AES-GCM encoded
//!
//! # Architecture
//! - [`type_mapping`] and [`descriptor`] are pure transformations
//! - [`adapters`] owns catalog access behind the `Connector` seam
//! - [`render`] and [`provenance`] handle the files written into a project

pub mod adapters;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod models;
pub mod provenance;
pub mod render;
pub mod security;
pub mod type_mapping;

// Re-export commonly used types
pub use adapters::{
    CatalogSource, ConnectionConfig, ConnectionOverrides, ConnectionRegistry, Connector,
    ResolvedConnection,
};
pub use descriptor::{BuildOptions, build};
pub use error::{DbmError, Result};
pub use models::{
    AttributeDescriptor, AttributeEntry, CatalogTable, ColumnKey, ColumnMetadata, DefaultValue,
    LifecycleHook, ModelDescriptor, SchemaVersion, TargetType, TimestampPolicy,
};
pub use provenance::{FlagToken, InvocationRecord, ProvenanceCheck};
pub use render::render_artifact;
pub use type_mapping::map_type;
