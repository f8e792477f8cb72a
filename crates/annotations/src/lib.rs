//! Annotations - declarative field bindings for fillable documents
//!
//! This crate provides:
//! - The closed set of property annotations (value, joined value, split bool,
//!   split date, enum flags, list expansion, key/value)
//! - Flag mappings built from `"Key = 4"` specs or sequential powers of two
//! - Schema tables describing which annotations sit on which property
//! - The [`Fillable`] trait objects implement to expose their properties
//!
//! # Example
//!
//! ```ignore
//! use annotations::{Annotation, Fillable, Schema, Value};
//! use once_cell::sync::Lazy;
//!
//! static PERSON: Lazy<Schema> = Lazy::new(|| {
//!     Schema::builder("Person")
//!         .property("name", [Annotation::value("FullName")])
//!         .property("adult", [Annotation::split_bool("AdultYes", "AdultNo")])
//!         .build()
//! });
//!
//! impl Fillable for Person {
//!     fn schema(&self) -> &Schema {
//!         &PERSON
//!     }
//!
//!     fn property(&self, name: &str) -> Option<Value<'_>> {
//!         match name {
//!             "name" => Some(self.name.as_str().into()),
//!             "adult" => Some(self.adult.into()),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

mod annotation;
mod flags;
mod schema;
mod value;

pub use annotation::{resolve_field_name, Annotation, DEFAULT_JOINER, INDEX_TOKEN};
pub use flags::{FlagEnum, FlagMapping};
pub use schema::{Fillable, PropertyDef, Schema, SchemaBuilder};
pub use value::{FieldMap, FieldValue, Value, ZERO_DATE};

use thiserror::Error;

/// Errors raised while building annotation configuration
///
/// Flag spec parsing is tolerant: these are reported to an optional sink and
/// the offending entry is dropped, never returned as a hard failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Malformed flag spec: {0:?} (expected `Key = <digits>`)")]
    MalformedFlagSpec(String),

    #[error("Flag value out of range in spec: {0:?}")]
    FlagValueOutOfRange(String),

    #[error("Duplicate flag key: {0}")]
    DuplicateFlagKey(String),
}

/// Result type for annotation configuration
pub type Result<T> = std::result::Result<T, ConfigError>;
