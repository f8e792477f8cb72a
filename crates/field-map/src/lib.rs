//! Field Map - flatten annotated objects into document field maps
//!
//! This crate provides:
//! - [`flatten`] / [`flatten_as`]: resolve an object's annotated properties
//!   into a flat `field name -> value` map
//! - [`Flattener`]: the same pass with collected [`Diagnostic`]s and an
//!   optional diagnostic callback
//!
//! Flattening never fails. Properties whose value does not fit their
//! annotation are skipped and reported as diagnostics.
//!
//! # Example
//!
//! ```ignore
//! use field_map::{flatten, Flattener};
//!
//! let fields = flatten(&invoice);
//! assert_eq!(fields["Customer"].as_text(), Some("ACME"));
//!
//! let result = Flattener::new()
//!     .on_diagnostic(|d| eprintln!("warning: {d}"))
//!     .flatten(&invoice);
//! ```

mod flattener;
mod format;

pub use annotations::{FieldMap, FieldValue};
pub use flattener::{flatten, flatten_as, Flattened, Flattener};
pub use format::{format_date, format_flags};

use thiserror::Error;

/// Non-fatal problems found while flattening
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("{type_name}.{property}: {annotation} expects {expected}, found {found}")]
    TypeMismatch {
        type_name: String,
        property: String,
        annotation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{type_name}.{property}: property is declared but not exposed by the object")]
    UnknownProperty { type_name: String, property: String },

    #[error("{type_name}.{property}: enumFlags without a mapping needs a flag enum value")]
    MissingFlagVariants { type_name: String, property: String },
}
