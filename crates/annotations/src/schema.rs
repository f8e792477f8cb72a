//! Schema tables: which annotations sit on which property

use crate::annotation::Annotation;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A type's declared properties, in declaration order
///
/// Declaration order matters: later properties overwrite fields written by
/// earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Type name, used in diagnostics
    pub type_name: String,

    /// Declared properties
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

/// One declared property and its annotations, in attachment order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,

    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Schema {
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                type_name: type_name.into(),
                properties: Vec::new(),
            },
        }
    }

    /// Look up a property definition by name
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Whether no property carries an annotation
    pub fn is_unannotated(&self) -> bool {
        self.properties.iter().all(|p| p.annotations.is_empty())
    }
}

/// Fluent builder for [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declare the next property with its annotations
    pub fn property<I>(mut self, name: impl Into<String>, annotations: I) -> Self
    where
        I: IntoIterator<Item = Annotation>,
    {
        self.schema.properties.push(PropertyDef {
            name: name.into(),
            annotations: annotations.into_iter().collect(),
        });
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

/// An object whose properties can be flattened into document fields
///
/// `schema` returns the schema of the object's own (runtime) type, which is
/// what list expansion uses for each element. `property` returns `None` only
/// for names the type does not have.
pub trait Fillable {
    fn schema(&self) -> &Schema;

    fn property(&self, name: &str) -> Option<Value<'_>>;
}

impl<T: Fillable + ?Sized> Fillable for &T {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn property(&self, name: &str) -> Option<Value<'_>> {
        (**self).property(name)
    }
}

impl<T: Fillable + ?Sized> Fillable for Box<T> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn property(&self, name: &str) -> Option<Value<'_>> {
        (**self).property(name)
    }
}
