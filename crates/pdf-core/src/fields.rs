//! AcroForm field tree

use crate::field_flags::{PUSHBUTTON, RADIO, READ_ONLY};
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Maximum nesting of the field tree (guards against reference cycles)
const MAX_FIELD_DEPTH: usize = 32;

/// Kind of an interactive field, from `/FT` and `/Ff`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_type(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & PUSHBUTTON != 0 => Self::PushButton,
            Some(b"Btn") if flags & RADIO != 0 => Self::Radio,
            Some(b"Btn") => Self::Checkbox,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

/// A terminal field of the form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (`parent.child`)
    pub name: String,
    /// The field dictionary
    pub id: ObjectId,
    pub kind: FieldKind,
    /// Effective `/Ff` value, inherited from ancestors when absent
    pub flags: i64,
    /// Widget annotations; the field itself when field and widget are merged
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    pub fn is_read_only(&self) -> bool {
        self.flags & READ_ONLY != 0
    }
}

/// Field rectangle in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Build a rectangle from two opposite corners
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Read a `/Rect` array
    pub(crate) fn from_array(array: &[Object]) -> Option<Self> {
        if array.len() < 4 {
            return None;
        }
        Some(Self::new(
            number(&array[0])?,
            number(&array[1])?,
            number(&array[2])?,
            number(&array[3])?,
        ))
    }
}

/// Numeric value of an Integer or Real object
pub(crate) fn number(obj: &Object) -> Option<f64> {
    obj.as_f32()
        .map(|v| v as f64)
        .ok()
        .or_else(|| obj.as_i64().ok().map(|v| v as f64))
}

/// Follow a reference to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise single-byte)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a PDF text string
///
/// ASCII stays a literal string; anything else becomes UTF-16BE with a BOM.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Id of the document catalog
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::ParseError("Missing document catalog".to_string()))
}

/// The `/AcroForm` dictionary, if the document has one
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>> {
    let catalog = doc.get_object(catalog_id(doc)?)?.as_dict()?;
    match catalog.get(b"AcroForm") {
        Ok(obj) => Ok(Some(resolve(doc, obj)?.as_dict()?)),
        Err(_) => Ok(None),
    }
}

/// Mutable `/AcroForm` dictionary, whether inline in the catalog or indirect
pub(crate) fn acroform_mut(doc: &mut Document) -> Result<&mut Dictionary> {
    let catalog_id = catalog_id(doc)?;
    let reference = match doc.get_object(catalog_id)?.as_dict()?.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(_) => None,
        Err(_) => return Err(PdfError::NoAcroForm),
    };

    let form = match reference {
        Some(id) => doc.get_object_mut(id)?,
        None => doc
            .get_object_mut(catalog_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?,
    };
    Ok(form.as_dict_mut()?)
}

/// Values inherited down the field tree
#[derive(Clone, Default)]
struct Inherited {
    field_type: Option<Vec<u8>>,
    flags: i64,
}

/// Collect every terminal field, in document order
pub(crate) fn collect_fields(doc: &Document) -> Result<Vec<FormField>> {
    let Some(form) = acroform(doc)? else {
        return Ok(Vec::new());
    };

    let roots = match form.get(b"Fields") {
        Ok(obj) => resolve(doc, obj)?.as_array()?.clone(),
        Err(_) => Vec::new(),
    };

    let mut fields = Vec::new();
    for root in &roots {
        if let Ok(id) = root.as_reference() {
            walk(doc, id, None, &Inherited::default(), &mut fields, 0)?;
        }
    }
    Ok(fields)
}

fn walk(
    doc: &Document,
    id: ObjectId,
    parent: Option<&str>,
    inherited: &Inherited,
    out: &mut Vec<FormField>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_FIELD_DEPTH {
        return Err(PdfError::ParseError(format!(
            "Field tree deeper than {MAX_FIELD_DEPTH} levels at {id:?}"
        )));
    }

    let dict = doc.get_object(id)?.as_dict()?;

    let name = match (parent, string_entry(dict, b"T")) {
        (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
        (None, Some(partial)) => partial,
        (parent, None) => parent.unwrap_or_default().to_string(),
    };

    let current = Inherited {
        field_type: match dict.get(b"FT") {
            Ok(Object::Name(ft)) => Some(ft.clone()),
            _ => inherited.field_type.clone(),
        },
        flags: dict
            .get(b"Ff")
            .and_then(Object::as_i64)
            .unwrap_or(inherited.flags),
    };

    let kids: Vec<ObjectId> = match dict.get(b"Kids") {
        Ok(obj) => resolve(doc, obj)?
            .as_array()?
            .iter()
            .filter_map(|kid| kid.as_reference().ok())
            .collect(),
        Err(_) => Vec::new(),
    };

    // Kids carrying a partial name are fields; the rest are widgets
    let mut child_fields = Vec::new();
    let mut widgets = Vec::new();
    for kid in kids {
        let has_name = doc
            .get_object(kid)
            .and_then(Object::as_dict)
            .map(|kid_dict| kid_dict.has(b"T"))
            .unwrap_or(false);
        if has_name {
            child_fields.push(kid);
        } else {
            widgets.push(kid);
        }
    }

    if !child_fields.is_empty() {
        for child in child_fields {
            walk(doc, child, Some(&name), &current, out, depth + 1)?;
        }
        return Ok(());
    }

    if widgets.is_empty() {
        widgets.push(id);
    }

    out.push(FormField {
        kind: FieldKind::from_type(current.field_type.as_deref(), current.flags),
        name,
        id,
        flags: current.flags,
        widgets,
    });
    Ok(())
}

/// Appearance state names a checkbox widget can show when checked
pub(crate) fn on_state(widget: &Dictionary, doc: &Document) -> Vec<u8> {
    let normal = widget
        .get(b"AP")
        .ok()
        .and_then(|ap| resolve(doc, ap).ok())
        .and_then(|ap| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| resolve(doc, n).ok())
        .and_then(|n| n.as_dict().ok());

    normal
        .and_then(|n| {
            n.iter()
                .map(|(key, _)| key)
                .find(|key| key.as_slice() != b"Off")
                .cloned()
        })
        .unwrap_or_else(|| b"Yes".to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_field_kind_from_type() {
        assert_eq!(FieldKind::from_type(Some(b"Tx"), 0), FieldKind::Text);
        assert_eq!(FieldKind::from_type(Some(b"Btn"), 0), FieldKind::Checkbox);
        assert_eq!(FieldKind::from_type(Some(b"Btn"), RADIO), FieldKind::Radio);
        assert_eq!(
            FieldKind::from_type(Some(b"Btn"), PUSHBUTTON),
            FieldKind::PushButton
        );
        assert_eq!(FieldKind::from_type(Some(b"Ch"), 0), FieldKind::Choice);
        assert_eq!(FieldKind::from_type(None, 0), FieldKind::Unknown);
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(200.0, 700.0, 100.0, 650.0);
        assert_eq!(rect, Rect::new(100.0, 650.0, 200.0, 700.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn test_rect_from_mixed_numbers() {
        let array = vec![
            Object::Integer(10),
            Object::Real(20.5),
            Object::Integer(110),
            Object::Real(60.5),
        ];
        let rect = Rect::from_array(&array).unwrap();
        assert_eq!(rect.x1, 10.0);
        assert_eq!(rect.height(), 40.0);
        assert!(Rect::from_array(&array[..3]).is_none());
    }

    #[test]
    fn test_text_string_round_trip_unicode() {
        let encoded = encode_text_string("Zoë");
        match &encoded {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(decode_text_string(bytes), "Zoë");
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_ascii_text_is_literal() {
        assert!(matches!(
            encode_text_string("Plain"),
            Object::String(bytes, StringFormat::Literal) if bytes == b"Plain"
        ));
    }

    #[test]
    fn test_on_state_from_appearance() {
        let doc = Document::new();
        let widget = dictionary! {
            "AP" => dictionary! {
                "N" => dictionary! {
                    "Off" => Object::Null,
                    "Checked" => Object::Null,
                },
            },
        };
        assert_eq!(on_state(&widget, &doc), b"Checked".to_vec());
        assert_eq!(on_state(&Dictionary::new(), &doc), b"Yes".to_vec());
    }
}
