//! PDF Core - Low-level AcroForm manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Listing the interactive fields of a fillable form
//! - Setting text field values and checkbox states
//! - Placing images (JPEG, PNG) inside a field's rectangle
//! - Locking every field against further edits
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{ImageScaleMode, PdfForm};
//!
//! let mut form = PdfForm::open("application.pdf")?;
//! form.set_need_appearances(true)?;
//! form.set_text("applicant.name", "Jane Doe")?;
//! form.set_checked("consent", true)?;
//! form.place_image("photo", &std::fs::read("photo.jpg")?, ImageScaleMode::FitBox)?;
//! form.lock_fields()?;
//! form.save("filled.pdf")?;
//! ```

mod fields;
mod form;
mod image;

pub use fields::{decode_text_string, encode_text_string, FieldKind, FormField, Rect};
pub use form::PdfForm;
pub use image::{fit_in_rect, ImageScaleMode, Placement};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Document has no interactive form")]
    NoAcroForm,

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field {name} is a {actual:?} field, expected {expected}")]
    FieldKindMismatch {
        name: String,
        expected: &'static str,
        actual: FieldKind,
    },

    #[error("Invalid field {0}: {1}")]
    InvalidField(String, String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Field flag bits (`/Ff`)
pub mod field_flags {
    /// Field cannot be changed by the user
    pub const READ_ONLY: i64 = 1; // bit 1
    /// Field must have a value when exported
    pub const REQUIRED: i64 = 1 << 1; // bit 2
    /// Field is not exported
    pub const NO_EXPORT: i64 = 1 << 2; // bit 3
    /// Button is a radio button
    pub const RADIO: i64 = 1 << 15; // bit 16
    /// Button is a push button
    pub const PUSHBUTTON: i64 = 1 << 16; // bit 17
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_flag_constants() {
        assert_eq!(field_flags::READ_ONLY, 1);
        assert_eq!(field_flags::RADIO, 32768);
        assert_eq!(field_flags::PUSHBUTTON, 65536);
    }

    #[test]
    fn test_kind_mismatch_message() {
        let err = PdfError::FieldKindMismatch {
            name: "agree".to_string(),
            expected: "checkbox",
            actual: FieldKind::Text,
        };
        assert_eq!(err.to_string(), "Field agree is a Text field, expected checkbox");
    }
}
