//! Annotation variants

use crate::flags::FlagMapping;
use serde::{Deserialize, Serialize};

/// Token replaced by the list index inside field names
pub const INDEX_TOKEN: &str = "{}";

/// Separator used by [`Annotation::JoinedValue`] when none is given
pub const DEFAULT_JOINER: &str = " & ";

fn default_joiner() -> String {
    DEFAULT_JOINER.to_string()
}

/// A declarative binding between one property and one or more document fields
///
/// Annotations hold configuration only. The flattening engine decides what
/// each variant contributes for a given property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Annotation {
    /// Write the property value under `field_name`
    ///
    /// Inside a list element every `{}` in the name becomes the element index.
    #[serde(rename_all = "camelCase")]
    Value { field_name: String },

    /// Like `Value`, but append to an existing entry separated by `joiner`
    #[serde(rename_all = "camelCase")]
    JoinedValue {
        field_name: String,
        #[serde(default = "default_joiner")]
        joiner: String,
    },

    /// Boolean property written to two checkbox fields
    #[serde(rename_all = "camelCase")]
    SplitBool {
        true_field: String,
        false_field: String,
    },

    /// Date property written as separate year, month and day fields
    #[serde(rename_all = "camelCase")]
    SplitDate {
        year_field: String,
        month_field: String,
        day_field: String,
    },

    /// Integer bitmask where each set bit checks one field
    ///
    /// Without a mapping the property's own [`FlagEnum`](crate::FlagEnum)
    /// variants are used.
    #[serde(rename_all = "camelCase")]
    EnumFlags {
        #[serde(default)]
        mapping: Option<FlagMapping>,
    },

    /// Sequence of sub-objects flattened with an increasing list index
    #[serde(rename_all = "camelCase")]
    List {
        #[serde(default)]
        initial_index: usize,
    },

    /// Property holding a single `(key, value)` pair
    KeyValue,
}

impl Annotation {
    /// Direct value binding
    pub fn value(field_name: impl Into<String>) -> Self {
        Self::Value {
            field_name: field_name.into(),
        }
    }

    /// Joined value binding using the default `" & "` joiner
    pub fn joined(field_name: impl Into<String>) -> Self {
        Self::joined_with(field_name, DEFAULT_JOINER)
    }

    /// Joined value binding with a custom joiner
    pub fn joined_with(field_name: impl Into<String>, joiner: impl Into<String>) -> Self {
        Self::JoinedValue {
            field_name: field_name.into(),
            joiner: joiner.into(),
        }
    }

    pub fn split_bool(true_field: impl Into<String>, false_field: impl Into<String>) -> Self {
        Self::SplitBool {
            true_field: true_field.into(),
            false_field: false_field.into(),
        }
    }

    pub fn split_date(
        year_field: impl Into<String>,
        month_field: impl Into<String>,
        day_field: impl Into<String>,
    ) -> Self {
        Self::SplitDate {
            year_field: year_field.into(),
            month_field: month_field.into(),
            day_field: day_field.into(),
        }
    }

    /// Flags resolved against the property's own enum variants
    pub fn enum_flags() -> Self {
        Self::EnumFlags { mapping: None }
    }

    /// Flags resolved against an explicit mapping
    pub fn enum_flags_with(mapping: FlagMapping) -> Self {
        Self::EnumFlags {
            mapping: Some(mapping),
        }
    }

    /// List expansion starting at index 0
    pub fn list() -> Self {
        Self::List { initial_index: 0 }
    }

    pub fn list_from(initial_index: usize) -> Self {
        Self::List { initial_index }
    }

    pub fn key_value() -> Self {
        Self::KeyValue
    }

    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value { .. } => "value",
            Self::JoinedValue { .. } => "joinedValue",
            Self::SplitBool { .. } => "splitBool",
            Self::SplitDate { .. } => "splitDate",
            Self::EnumFlags { .. } => "enumFlags",
            Self::List { .. } => "list",
            Self::KeyValue => "keyValue",
        }
    }
}

/// Substitute the list index into a field name template
///
/// Outside a list (`index == None`) the name is returned unchanged, so a
/// literal `{}` survives.
pub fn resolve_field_name(template: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => template.replace(INDEX_TOKEN, &i.to_string()),
        None => template.to_string(),
    }
}
