//! Form Filler - fill PDF forms from annotated objects
//!
//! This crate ties the pieces together:
//! - Flattens a [`Fillable`] object into a field map
//! - Writes the field map into a PDF form ([`FormRenderer`])
//! - Reads objects from JSON through a [`FormBinding`]
//!
//! # Example
//!
//! ```ignore
//! use form_filler::{fill_document, FillOptions};
//!
//! let template = std::fs::read("invoice-template.pdf")?;
//! let pdf_bytes = fill_document(&invoice, &template, &FillOptions::default())?;
//! std::fs::write("invoice.pdf", pdf_bytes)?;
//! ```

pub mod json;
pub mod options;
pub mod parser;
mod renderer;

pub use json::{JsonObject, JsonType, PropertyKind};
pub use options::{FillOptions, ImageScale};
pub use parser::{parse_binding, FormBinding};
pub use renderer::{FailedField, FillReport, FormRenderer};

pub use annotations::{Fillable, Schema};
pub use field_map::Diagnostic;
pub use pdf_core::PdfForm;

use field_map::{Flattened, Flattener};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while filling a form
#[derive(Debug, Error)]
pub enum FillError {
    #[error("Failed to parse binding: {0}")]
    ParseError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for fill operations
pub type Result<T> = std::result::Result<T, FillError>;

/// Result of filling one object into a form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillOutcome {
    pub report: FillReport,
    /// Properties skipped while flattening
    pub diagnostics: Vec<Diagnostic>,
}

/// Fill an open form from an object's own schema
pub fn fill_form<T: Fillable + ?Sized>(
    obj: &T,
    form: &mut PdfForm,
    options: &FillOptions,
) -> Result<FillOutcome> {
    fill_form_as(obj.schema(), obj, form, options)
}

/// Fill an open form, flattening `obj` against `schema`
pub fn fill_form_as<T: Fillable + ?Sized>(
    schema: &Schema,
    obj: &T,
    form: &mut PdfForm,
    options: &FillOptions,
) -> Result<FillOutcome> {
    let Flattened {
        fields,
        diagnostics,
    } = Flattener::new().flatten_as(schema, obj, None);

    let report = FormRenderer::new(options).render(form, &fields)?;
    Ok(FillOutcome {
        report,
        diagnostics,
    })
}

/// Fill a template PDF and return the filled document
pub fn fill_document<T: Fillable + ?Sized>(
    obj: &T,
    template: &[u8],
    options: &FillOptions,
) -> Result<Vec<u8>> {
    fill_document_as(obj.schema(), obj, template, options)
}

/// Fill a template PDF, flattening `obj` against `schema`
pub fn fill_document_as<T: Fillable + ?Sized>(
    schema: &Schema,
    obj: &T,
    template: &[u8],
    options: &FillOptions,
) -> Result<Vec<u8>> {
    let mut form = PdfForm::open_from_bytes(template)?;
    fill_form_as(schema, obj, &mut form, options)?;
    Ok(form.to_bytes()?)
}

/// Fill the template at `source` and save the result to `destination`
pub fn write_document<T, P, Q>(
    obj: &T,
    source: P,
    destination: Q,
    options: &FillOptions,
) -> Result<FillOutcome>
where
    T: Fillable + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut form = PdfForm::open(source)?;
    let outcome = fill_form(obj, &mut form, options)?;
    form.save(destination)?;
    Ok(outcome)
}

/// Fill the binding's template with JSON data and save the result
pub fn write_json_document<Q: AsRef<Path>>(
    binding: &FormBinding,
    data: &serde_json::Value,
    destination: Q,
) -> Result<FillOutcome> {
    write_document(
        &binding.bind(data),
        &binding.template,
        destination,
        &binding.options,
    )
}
