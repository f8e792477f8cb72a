//! The flattening pass

use crate::format::{date_parts, format_date, format_flags};
use crate::Diagnostic;
use annotations::{
    resolve_field_name, Annotation, FieldMap, FieldValue, Fillable, FlagMapping, Schema, Value,
    ZERO_DATE,
};

/// Flatten an object using its own schema
pub fn flatten<T: Fillable + ?Sized>(instance: &T) -> FieldMap {
    Flattener::new().flatten(instance).fields
}

/// Flatten an object against an explicit schema
///
/// `list_index` is the object's position when it is a list element; with
/// `None` a `{}` token in a field name is left as is.
pub fn flatten_as<T: Fillable + ?Sized>(
    schema: &Schema,
    instance: &T,
    list_index: Option<usize>,
) -> FieldMap {
    Flattener::new()
        .flatten_as(schema, instance, list_index)
        .fields
}

/// Result of a flattening pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    /// Resolved fields in resolution order
    pub fields: FieldMap,
    /// Properties or annotations that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

/// Flattening pass with diagnostics
///
/// # Example
///
/// ```ignore
/// let mut warnings = 0;
/// let result = Flattener::new()
///     .on_diagnostic(|_| warnings += 1)
///     .flatten(&order);
/// ```
#[derive(Default)]
pub struct Flattener<'s> {
    sink: Option<Box<dyn FnMut(&Diagnostic) + 's>>,
}

impl<'s> Flattener<'s> {
    pub fn new() -> Self {
        Self { sink: None }
    }

    /// Call `sink` for every diagnostic as it is found
    pub fn on_diagnostic<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&Diagnostic) + 's,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Flatten an object using its own schema
    pub fn flatten<T: Fillable + ?Sized>(&mut self, instance: &T) -> Flattened {
        self.flatten_as(instance.schema(), instance, None)
    }

    /// Flatten an object against an explicit schema
    pub fn flatten_as<T: Fillable + ?Sized>(
        &mut self,
        schema: &Schema,
        instance: &T,
        list_index: Option<usize>,
    ) -> Flattened {
        let mut pass = Pass {
            diagnostics: Vec::new(),
            sink: self.sink.as_deref_mut(),
        };
        let fields = pass.object(schema, &instance, list_index);

        Flattened {
            fields,
            diagnostics: pass.diagnostics,
        }
    }
}

/// State shared by one top-level call and its list recursion
struct Pass<'p, 's> {
    diagnostics: Vec<Diagnostic>,
    sink: Option<&'p mut (dyn FnMut(&Diagnostic) + 's)>,
}

/// Property currently being resolved, for diagnostics
struct Site<'a> {
    type_name: &'a str,
    property: &'a str,
    index: Option<usize>,
}

impl Pass<'_, '_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    fn mismatch(
        &mut self,
        site: &Site<'_>,
        annotation: &Annotation,
        expected: &'static str,
        value: &Value<'_>,
    ) {
        self.report(Diagnostic::TypeMismatch {
            type_name: site.type_name.to_string(),
            property: site.property.to_string(),
            annotation: annotation.kind(),
            expected,
            found: value.kind(),
        });
    }

    /// Flatten one object into a fresh map
    fn object(
        &mut self,
        schema: &Schema,
        instance: &dyn Fillable,
        index: Option<usize>,
    ) -> FieldMap {
        let mut fields = FieldMap::new();

        for property in &schema.properties {
            if property.annotations.is_empty() {
                continue;
            }

            let Some(value) = instance.property(&property.name) else {
                self.report(Diagnostic::UnknownProperty {
                    type_name: schema.type_name.clone(),
                    property: property.name.clone(),
                });
                continue;
            };

            if value.is_default() {
                continue;
            }

            let site = Site {
                type_name: &schema.type_name,
                property: &property.name,
                index,
            };

            for annotation in &property.annotations {
                self.apply(&mut fields, &site, annotation, &value);
            }
        }

        fields
    }

    fn apply(
        &mut self,
        fields: &mut FieldMap,
        site: &Site<'_>,
        annotation: &Annotation,
        value: &Value<'_>,
    ) {
        match annotation {
            Annotation::Value { field_name } => match field_value(value) {
                Some(resolved) => {
                    fields.insert(resolve_field_name(field_name, site.index), resolved);
                }
                None => self.mismatch(site, annotation, "scalar, text or bytes", value),
            },

            Annotation::JoinedValue { field_name, joiner } => {
                let key = resolve_field_name(field_name, site.index);
                let Some(resolved) = field_value(value) else {
                    self.mismatch(site, annotation, "scalar or text", value);
                    return;
                };

                match fields.get_mut(&key) {
                    None => {
                        fields.insert(key, resolved);
                    }
                    Some(existing) => match (join_text(existing), join_text(&resolved)) {
                        (Some(head), Some(tail)) => {
                            *existing = FieldValue::Text(format!("{head}{joiner}{tail}"));
                        }
                        _ => self.mismatch(site, annotation, "scalar or text", value),
                    },
                }
            }

            Annotation::SplitBool {
                true_field,
                false_field,
            } => match value {
                Value::Bool(b) => {
                    let index = site.index;
                    fields.insert(resolve_field_name(true_field, index), FieldValue::Bool(*b));
                    fields.insert(resolve_field_name(false_field, index), FieldValue::Bool(!*b));
                }
                _ => self.mismatch(site, annotation, "bool", value),
            },

            Annotation::SplitDate {
                year_field,
                month_field,
                day_field,
            } => match value {
                Value::Date(date) if *date == ZERO_DATE => {}
                Value::Date(date) => {
                    let index = site.index;
                    let [year, month, day] = date_parts(*date);
                    fields.insert(resolve_field_name(year_field, index), FieldValue::Text(year));
                    fields.insert(resolve_field_name(month_field, index), FieldValue::Text(month));
                    fields.insert(resolve_field_name(day_field, index), FieldValue::Text(day));
                }
                _ => self.mismatch(site, annotation, "date", value),
            },

            Annotation::EnumFlags { mapping } => {
                let bits = match value {
                    Value::Int(bits) | Value::Flags { bits, .. } => *bits,
                    _ => {
                        self.mismatch(site, annotation, "int or flags", value);
                        return;
                    }
                };

                let fallback;
                let mapping = match (mapping, value) {
                    (Some(mapping), _) => mapping,
                    (None, Value::Flags { variants, .. }) => {
                        fallback = FlagMapping::from(*variants);
                        &fallback
                    }
                    (None, _) => {
                        self.report(Diagnostic::MissingFlagVariants {
                            type_name: site.type_name.to_string(),
                            property: site.property.to_string(),
                        });
                        return;
                    }
                };

                for name in mapping.matching(bits) {
                    fields.insert(resolve_field_name(name, site.index), FieldValue::Bool(true));
                }
            }

            Annotation::List { initial_index } => {
                let Value::List(items) = value else {
                    self.mismatch(site, annotation, "list", value);
                    return;
                };

                // Null elements do not consume an index
                let mut index = *initial_index;
                for item in items.iter().flatten() {
                    let nested = self.object(item.schema(), item.as_ref(), Some(index));
                    fields.extend(nested);
                    index += 1;
                }
            }

            Annotation::KeyValue => match value {
                Value::Pair(key, text) => {
                    fields.insert(key.to_string(), FieldValue::Text(text.to_string()));
                }
                _ => self.mismatch(site, annotation, "pair", value),
            },
        }
    }
}

/// Field value for a direct binding; `None` for lists
fn field_value(value: &Value<'_>) -> Option<FieldValue> {
    let resolved = match value {
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Int(i) => FieldValue::Text(i.to_string()),
        Value::Float(x) => FieldValue::Text(x.to_string()),
        Value::Text(s) => FieldValue::Text(s.to_string()),
        Value::Date(d) => FieldValue::Text(format_date(*d)),
        Value::Bytes(b) => FieldValue::Bytes(b.to_vec()),
        Value::Flags { bits, variants } => FieldValue::Text(format_flags(*bits, variants)),
        Value::Pair(k, v) => FieldValue::Text(format!("[{k}, {v}]")),
        Value::Null | Value::List(_) => return None,
    };
    Some(resolved)
}

/// Text used when joining; image data cannot be joined
fn join_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Bool(b) => Some(b.to_string()),
        FieldValue::Bytes(_) => None,
    }
}
