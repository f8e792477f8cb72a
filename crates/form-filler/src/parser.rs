//! Form binding JSON parsing

use crate::json::{JsonObject, JsonType};
use crate::options::FillOptions;
use crate::{FillError, Result};
use serde::Deserialize;

/// A template together with the type its data is read as
///
/// ```json
/// {
///   "template": "forms/application.pdf",
///   "options": { "lockFields": false },
///   "schema": { "typeName": "Application", "properties": [] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormBinding {
    /// Path to the template PDF
    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub options: FillOptions,

    /// Type of the data objects
    pub schema: JsonType,
}

impl FormBinding {
    /// View `data` as an object of the bound type
    pub fn bind<'a>(&'a self, data: &'a serde_json::Value) -> JsonObject<'a> {
        self.schema.bind(data)
    }
}

/// Parse a form binding from JSON string
pub fn parse_binding(json: &str) -> Result<FormBinding> {
    serde_json::from_str(json).map_err(|e| FillError::ParseError(e.to_string()))
}
