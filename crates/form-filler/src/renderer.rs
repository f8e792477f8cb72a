//! Field map rendering

use crate::options::FillOptions;
use crate::Result;
use field_map::{FieldMap, FieldValue};
use pdf_core::{PdfError, PdfForm};
use std::collections::HashSet;

/// What happened to each entry of a field map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Fields that received a value
    pub filled: Vec<String>,
    /// Names with no matching field in the form
    pub missing: Vec<String>,
    /// Fields whose value could not be applied
    pub failed: Vec<FailedField>,
}

/// A field that exists but rejected its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedField {
    pub name: String,
    pub reason: String,
}

impl FillReport {
    /// Whether every entry was applied
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Applies a field map to an open form
pub struct FormRenderer<'a> {
    options: &'a FillOptions,
}

impl<'a> FormRenderer<'a> {
    pub fn new(options: &'a FillOptions) -> Self {
        Self { options }
    }

    /// Write every entry of `fields` into `form`
    ///
    /// Text goes to the field value, booleans toggle checkboxes and bytes are
    /// drawn as an image in the field rectangle. Names the form does not have
    /// are skipped.
    pub fn render(&self, form: &mut PdfForm, fields: &FieldMap) -> Result<FillReport> {
        let mut report = FillReport::default();

        if !form.has_form() {
            report.missing.extend(fields.keys().cloned());
            return Ok(report);
        }

        if self.options.need_appearances {
            form.set_need_appearances(true)?;
        }

        let known: HashSet<String> = form.field_names()?.into_iter().collect();

        for (name, value) in fields {
            if !known.contains(name) {
                report.missing.push(name.clone());
                continue;
            }

            let applied = match value {
                FieldValue::Text(text) => form.set_text(name, text),
                FieldValue::Bool(checked) => form.set_checked(name, *checked),
                FieldValue::Bytes(data) => form
                    .place_image(name, data, self.options.image_scale.into())
                    .map(|_| ()),
            };

            match applied {
                Ok(()) => report.filled.push(name.clone()),
                Err(
                    err @ (PdfError::FieldKindMismatch { .. }
                    | PdfError::ImageError(_)
                    | PdfError::InvalidField(..)),
                ) => report.failed.push(FailedField {
                    name: name.clone(),
                    reason: err.to_string(),
                }),
                Err(err) => return Err(err.into()),
            }
        }

        if self.options.lock_fields {
            form.lock_fields()?;
        }

        Ok(report)
    }
}
