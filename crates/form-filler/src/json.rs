//! Fillable objects backed by JSON data

use annotations::{Annotation, Fillable, PropertyDef, Schema, Value};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use std::borrow::Cow;

/// How a JSON property is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    /// Inferred from the JSON value
    #[default]
    Auto,
    Text,
    Bool,
    Int,
    Float,
    /// `YYYY-MM-DD` string
    Date,
    /// Array of byte values
    Bytes,
    /// `{ "key": .., "value": .. }`, a single-member object or a two-element array
    Pair,
    /// Array of objects read with the property's element type
    List,
    /// Integer bitmask
    Flags,
}

/// Type description for JSON objects: a schema plus per-property kinds
///
/// # Example
///
/// ```json
/// {
///   "typeName": "Order",
///   "properties": [
///     { "name": "customer", "annotations": [{ "value": { "fieldName": "Customer" } }] },
///     { "name": "placedOn", "kind": "date",
///       "annotations": [{ "splitDate": { "yearField": "Y", "monthField": "M", "dayField": "D" } }] },
///     { "name": "lines", "kind": "list", "annotations": [{ "list": { "initialIndex": 1 } }],
///       "elementType": { "typeName": "Line", "properties": [] } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JsonTypeDef")]
pub struct JsonType {
    schema: Schema,
    properties: IndexMap<String, PropertyType>,
}

#[derive(Debug, Clone, PartialEq)]
struct PropertyType {
    kind: PropertyKind,
    element: Option<Box<JsonType>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTypeDef {
    type_name: String,
    #[serde(default)]
    properties: Vec<JsonPropertyDef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonPropertyDef {
    name: String,
    #[serde(default)]
    kind: PropertyKind,
    #[serde(default)]
    element_type: Option<Box<JsonType>>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl TryFrom<JsonTypeDef> for JsonType {
    type Error = String;

    fn try_from(def: JsonTypeDef) -> Result<Self, Self::Error> {
        let mut properties = IndexMap::new();
        let mut schema = Schema {
            type_name: def.type_name,
            properties: Vec::with_capacity(def.properties.len()),
        };

        for property in def.properties {
            if property.kind == PropertyKind::List && property.element_type.is_none() {
                return Err(format!(
                    "{}.{}: list properties need an elementType",
                    schema.type_name, property.name
                ));
            }
            properties.insert(
                property.name.clone(),
                PropertyType {
                    kind: property.kind,
                    element: property.element_type,
                },
            );
            schema.properties.push(PropertyDef {
                name: property.name,
                annotations: property.annotations,
            });
        }

        Ok(Self { schema, properties })
    }
}

impl JsonType {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// View `data` as an object of this type
    pub fn bind<'a>(&'a self, data: &'a serde_json::Value) -> JsonObject<'a> {
        JsonObject { ty: self, data }
    }
}

/// A JSON value seen through a [`JsonType`]
///
/// Missing and `null` members read as null. Members that cannot be read as
/// their declared kind also read as null, so they are skipped.
#[derive(Debug, Clone, Copy)]
pub struct JsonObject<'a> {
    ty: &'a JsonType,
    data: &'a serde_json::Value,
}

impl Fillable for JsonObject<'_> {
    fn schema(&self) -> &Schema {
        &self.ty.schema
    }

    fn property(&self, name: &str) -> Option<Value<'_>> {
        let property = self.ty.properties.get(name)?;
        let value = match self.data.get(name) {
            None | Some(serde_json::Value::Null) => Value::Null,
            Some(json) => read(json, property),
        };
        Some(value)
    }
}

fn read<'a>(json: &'a serde_json::Value, property: &'a PropertyType) -> Value<'a> {
    use serde_json::Value as Json;

    let kind = match property.kind {
        PropertyKind::Auto => infer_kind(json, property),
        kind => kind,
    };

    match (kind, json) {
        (PropertyKind::Text, Json::String(s)) => Value::Text(Cow::Borrowed(s.as_str())),
        (PropertyKind::Text, other) => Value::Text(Cow::Owned(value_to_string(other))),

        (PropertyKind::Bool, Json::Bool(b)) => Value::Bool(*b),
        (PropertyKind::Bool, Json::String(s)) => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Null,
        },

        (PropertyKind::Int | PropertyKind::Flags, Json::Number(n)) => {
            n.as_i64().map(Value::Int).unwrap_or(Value::Null)
        }
        (PropertyKind::Int | PropertyKind::Flags, Json::String(s)) => {
            s.trim().parse().map(Value::Int).unwrap_or(Value::Null)
        }

        (PropertyKind::Float, Json::Number(n)) => {
            n.as_f64().map(Value::Float).unwrap_or(Value::Null)
        }
        (PropertyKind::Float, Json::String(s)) => {
            s.trim().parse().map(Value::Float).unwrap_or(Value::Null)
        }

        (PropertyKind::Date, Json::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or(Value::Null),

        (PropertyKind::Bytes, Json::Array(items)) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(|bytes| Value::Bytes(Cow::Owned(bytes)))
            .unwrap_or(Value::Null),

        (PropertyKind::Pair, Json::Object(map)) => match (map.get("key"), map.get("value")) {
            (Some(key), Some(value)) => {
                Value::pair(value_to_string(key), value_to_string(value))
            }
            _ if map.len() == 1 => match map.iter().next() {
                Some((key, value)) => Value::pair(key.clone(), value_to_string(value)),
                None => Value::Null,
            },
            _ => Value::Null,
        },
        (PropertyKind::Pair, Json::Array(items)) if items.len() == 2 => {
            Value::pair(value_to_string(&items[0]), value_to_string(&items[1]))
        }

        (PropertyKind::List, Json::Array(items)) => match &property.element {
            Some(element) => Value::List(
                items
                    .iter()
                    .map(|item| {
                        (!item.is_null())
                            .then(|| Box::new(element.bind(item)) as Box<dyn Fillable + 'a>)
                    })
                    .collect(),
            ),
            None => Value::Null,
        },

        _ => Value::Null,
    }
}

fn infer_kind(json: &serde_json::Value, property: &PropertyType) -> PropertyKind {
    use serde_json::Value as Json;

    match json {
        Json::Bool(_) => PropertyKind::Bool,
        Json::Number(n) if n.is_i64() => PropertyKind::Int,
        Json::Number(_) => PropertyKind::Float,
        Json::Array(_) if property.element.is_some() => PropertyKind::List,
        _ => PropertyKind::Text,
    }
}

/// Convert a JSON value to string for a text field
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => value.to_string(),
    }
}
