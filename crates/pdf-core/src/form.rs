//! Fillable PDF form wrapper

use crate::field_flags::READ_ONLY;
use crate::fields::{self, collect_fields, encode_text_string, on_state, resolve, FormField, Rect};
use crate::image::{fit_in_rect, ImageScaleMode, ImageXObject, Placement};
use crate::{FieldKind, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Maximum number of `/Pages` levels searched for inherited resources
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// An AcroForm document opened for filling
pub struct PdfForm {
    /// The underlying lopdf document
    inner: Document,
    /// Embedded images (data hash -> PDF object ID and pixel size)
    embedded_images: HashMap<u64, (ObjectId, u32, u32)>,
    /// Page image resources (page number -> image name -> object ID)
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl PdfForm {
    /// Open a PDF form from a file path
    ///
    /// # Example
    /// ```ignore
    /// let form = PdfForm::open("template.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF form from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Wrap an already loaded document
    pub fn from_document(inner: Document) -> Self {
        Self {
            inner,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Whether the catalog carries an `/AcroForm`
    pub fn has_form(&self) -> bool {
        matches!(fields::acroform(&self.inner), Ok(Some(_)))
    }

    /// All terminal fields, in document order
    pub fn fields(&self) -> Result<Vec<FormField>> {
        collect_fields(&self.inner)
    }

    /// Fully qualified names of all terminal fields
    pub fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.fields()?.into_iter().map(|f| f.name).collect())
    }

    /// Look up a terminal field by its fully qualified name
    pub fn field(&self, name: &str) -> Result<FormField> {
        self.fields()?
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| PdfError::FieldNotFound(name.to_string()))
    }

    /// Ask viewers to regenerate field appearances from their values
    pub fn set_need_appearances(&mut self, need: bool) -> Result<()> {
        fields::acroform_mut(&mut self.inner)?.set("NeedAppearances", Object::Boolean(need));
        Ok(())
    }

    /// Current `/V` of a field as text, if it has one
    pub fn text_value(&self, name: &str) -> Result<Option<String>> {
        let field = self.field(name)?;
        let dict = self.inner.get_object(field.id)?.as_dict()?;
        Ok(match dict.get(b"V") {
            Ok(Object::String(bytes, _)) => Some(fields::decode_text_string(bytes)),
            Ok(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        })
    }

    /// Whether a checkbox is currently on
    pub fn is_checked(&self, name: &str) -> Result<bool> {
        let field = self.field(name)?;
        let dict = self.inner.get_object(field.id)?.as_dict()?;
        Ok(matches!(dict.get(b"V"), Ok(Object::Name(v)) if v.as_slice() != b"Off"))
    }

    /// Set a field's value
    ///
    /// The field is made editable again; appearance regeneration is left to
    /// the viewer (see [`PdfForm::set_need_appearances`]).
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<()> {
        let field = self.field(name)?;
        let dict = self.dict_mut(field.id)?;
        dict.set("V", encode_text_string(text));
        dict.set("Ff", Object::Integer(field.flags & !READ_ONLY));
        Ok(())
    }

    /// Check or uncheck a checkbox
    pub fn set_checked(&mut self, name: &str, checked: bool) -> Result<()> {
        let field = self.field(name)?;
        if field.kind != FieldKind::Checkbox {
            return Err(PdfError::FieldKindMismatch {
                name: field.name,
                expected: "checkbox",
                actual: field.kind,
            });
        }

        let mut value = b"Off".to_vec();
        for widget in &field.widgets {
            let state = if checked {
                let widget_dict = self.inner.get_object(*widget)?.as_dict()?;
                on_state(widget_dict, &self.inner)
            } else {
                b"Off".to_vec()
            };
            if checked && value.as_slice() == b"Off" {
                value = state.clone();
            }
            self.dict_mut(*widget)?.set("AS", Object::Name(state));
        }

        let dict = self.dict_mut(field.id)?;
        dict.set("V", Object::Name(value));
        dict.set("Ff", Object::Integer(field.flags & !READ_ONLY));
        Ok(())
    }

    /// Draw an image inside a field's rectangle
    ///
    /// # Arguments
    /// * `name` - Fully qualified field name
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `mode` - How the image is sized inside the rectangle
    pub fn place_image(
        &mut self,
        name: &str,
        data: &[u8],
        mode: ImageScaleMode,
    ) -> Result<Placement> {
        let field = self.field(name)?;
        let widget = *field
            .widgets
            .first()
            .ok_or_else(|| PdfError::InvalidField(field.name.clone(), "no widget".to_string()))?;

        let widget_dict = self.inner.get_object(widget)?.as_dict()?;
        let rect = widget_dict
            .get(b"Rect")
            .ok()
            .and_then(|r| resolve(&self.inner, r).ok())
            .and_then(|r| r.as_array().ok())
            .and_then(|r| Rect::from_array(r))
            .ok_or_else(|| {
                PdfError::InvalidField(field.name.clone(), "missing /Rect".to_string())
            })?;
        let page = self.widget_page(widget, widget_dict).ok_or_else(|| {
            PdfError::InvalidField(field.name.clone(), "not placed on any page".to_string())
        })?;

        let (image_resource_name, orig_width, orig_height) =
            self.get_or_create_image_ref(data, page)?;
        let placement = fit_in_rect(orig_width, orig_height, &rect, mode);

        self.buffer_content(page, &placement.draw(&image_resource_name));

        self.dict_mut(field.id)?
            .set("Ff", Object::Integer(field.flags & !READ_ONLY));
        Ok(placement)
    }

    /// Mark every field read-only
    pub fn lock_fields(&mut self) -> Result<()> {
        for field in self.fields()? {
            self.dict_mut(field.id)?
                .set("Ff", Object::Integer(field.flags | READ_ONLY));
        }
        Ok(())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get reference to inner lopdf Document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get mutable reference to inner lopdf Document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        Ok(self.inner.get_object_mut(id)?.as_dict_mut()?)
    }

    /// Page number (1-indexed) a widget sits on
    ///
    /// Uses the widget's `/P` entry, falling back to scanning page `/Annots`.
    fn widget_page(&self, widget: ObjectId, widget_dict: &Dictionary) -> Option<usize> {
        let pages = self.inner.get_pages();

        if let Ok(page_id) = widget_dict.get(b"P").and_then(Object::as_reference) {
            if let Some((number, _)) = pages.iter().find(|(_, id)| **id == page_id) {
                return Some(*number as usize);
            }
        }

        pages.iter().find_map(|(number, page_id)| {
            let page_dict = self.inner.get_object(*page_id).ok()?.as_dict().ok()?;
            let annots = resolve(&self.inner, page_dict.get(b"Annots").ok()?).ok()?;
            annots
                .as_array()
                .ok()?
                .iter()
                .any(|annot| annot.as_reference().ok() == Some(widget))
                .then_some(*number as usize)
        })
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// The existing content is wrapped in `q`/`Q` so its graphics state does
    /// not leak into the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let pages = self.inner.get_pages();
        let page_id = *pages
            .get(&(page as u32))
            .ok_or(PdfError::InvalidPage(page, pages.len()))?;

        let existing_content = {
            let page_dict = self
                .inner
                .get_object(page_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

            let decoded = |stream: &Stream| {
                stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone())
            };

            match page_dict.get(b"Contents") {
                Ok(Object::Stream(stream)) => decoded(stream),
                Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                    Ok(Object::Stream(stream)) => decoded(stream),
                    Ok(Object::Array(arr)) => self.concat_streams(arr, &decoded),
                    _ => Vec::new(),
                },
                Ok(Object::Array(arr)) => self.concat_streams(arr, &decoded),
                _ => Vec::new(),
            }
        };

        let mut new_content = Vec::with_capacity(existing_content.len() + content.len() + 8);
        if !existing_content.is_empty() {
            new_content.extend_from_slice(b"q\n");
            new_content.extend_from_slice(&existing_content);
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));
        self.dict_mut(page_id)?
            .set("Contents", Object::Reference(stream_id));

        Ok(())
    }

    fn concat_streams(&self, parts: &[Object], decoded: &dyn Fn(&Stream) -> Vec<u8>) -> Vec<u8> {
        let mut combined = Vec::new();
        for obj in parts {
            let stream = match obj {
                Object::Reference(ref_id) => match self.inner.get_object(*ref_id) {
                    Ok(Object::Stream(stream)) => stream,
                    _ => continue,
                },
                Object::Stream(stream) => stream,
                _ => continue,
            };
            combined.extend_from_slice(&decoded(stream));
            combined.push(b'\n');
        }
        combined
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name and original dimensions.
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let (object_id, width, height) = match self.embedded_images.get(&data_hash) {
            Some(embedded) => *embedded,
            None => {
                let xobject = ImageXObject::decode(data)?;
                let (width, height) = (xobject.width, xobject.height);
                let object_id = self.inner.add_object(xobject.into_stream());
                self.embedded_images
                    .insert(data_hash, (object_id, width, height));
                (object_id, width, height)
            }
        };

        if let Some(resources) = self.page_image_resources.get(&page) {
            if let Some((name, _)) = resources.iter().find(|(_, id)| **id == object_id) {
                return Ok((name.clone(), width, height));
            }
        }

        // Skip names the template already uses on this page
        let existing = self.page_xobject_names(page)?;
        let mut resource_name = format!("Im{}", self.next_image_resource);
        while existing.iter().any(|n| n.as_slice() == resource_name.as_bytes()) {
            self.next_image_resource += 1;
            resource_name = format!("Im{}", self.next_image_resource);
        }
        self.next_image_resource += 1;

        self.page_image_resources
            .entry(page)
            .or_default()
            .insert(resource_name.clone(), object_id);
        self.add_image_to_page_resources(page, &resource_name, object_id)?;

        Ok((resource_name, width, height))
    }

    /// The page's effective `/Resources`
    ///
    /// Pages without their own dictionary inherit the nearest one from the
    /// `/Pages` nodes above them.
    fn page_resources(&self, page: usize) -> Result<(ObjectId, Dictionary)> {
        let pages = self.inner.get_pages();
        let page_id = *pages
            .get(&(page as u32))
            .ok_or(PdfError::InvalidPage(page, pages.len()))?;

        let mut node_id = page_id;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let node = self.inner.get_object(node_id)?.as_dict().map_err(|_| {
                PdfError::ParseError(format!("Page node {node_id:?} is not a dictionary"))
            })?;

            if let Ok(resources) = node.get(b"Resources") {
                let resources = resolve(&self.inner, resources)?.as_dict().map_err(|_| {
                    PdfError::ParseError("/Resources is not a dictionary".to_string())
                })?;
                return Ok((page_id, resources.clone()));
            }

            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node_id = parent,
                Err(_) => break,
            }
        }

        Ok((page_id, Dictionary::new()))
    }

    fn page_xobject_names(&self, page: usize) -> Result<Vec<Vec<u8>>> {
        let (_, resources) = self.page_resources(page)?;
        Ok(resources
            .get(b"XObject")
            .ok()
            .and_then(|x| resolve(&self.inner, x).ok())
            .and_then(|x| x.as_dict().ok())
            .map(|x| x.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    /// Add image to a specific page's Resources dictionary
    ///
    /// Shared or inherited `/Resources` and `/XObject` dictionaries are copied
    /// inline into the page, leaving other pages untouched.
    fn add_image_to_page_resources(
        &mut self,
        page: usize,
        resource_name: &str,
        object_id: ObjectId,
    ) -> Result<()> {
        let (page_id, mut resources) = self.page_resources(page)?;

        let mut xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| resolve(&self.inner, x).ok())
            .and_then(|x| x.as_dict().ok())
            .cloned()
            .unwrap_or_default();

        xobjects.set(resource_name.as_bytes(), Object::Reference(object_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        self.dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        Ok(())
    }
}
