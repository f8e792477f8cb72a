//! Integration tests for pdf-core
//!
//! These tests fill an in-memory AcroForm and read the saved result back.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_core::{FieldKind, ImageScaleMode, PdfError, PdfForm, Placement};
use pretty_assertions::assert_eq;

fn appearance(doc: &mut Document) -> ObjectId {
    doc.add_object(Stream::new(dictionary! {}, b"0 g".to_vec()))
}

/// Create a one-page form
///
/// Fields:
/// - `customer`: text, field and widget merged, page via `/P`
/// - `address.street`, `address.city`: text kids inheriting `/FT` and read-only `/Ff`
/// - `agree`: checkbox with `/AP /N` states `Yes` and `Off`
/// - `newsletter`: checkbox with two widget kids, on-state `On`
/// - `photo`: push button reachable only through the page `/Annots`
fn create_test_form() -> Vec<u8> {
    let mut doc = Document::new();

    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let contents_id = doc.add_object(Stream::new(dictionary! {}, b"0.5 0 0 0.5 0 0 cm".to_vec()));

    let customer_id = doc.add_object(dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("customer"),
        "Rect" => vec![50.into(), 700.into(), 250.into(), 720.into()],
        "P" => page_id,
    });

    let address_id = doc.new_object_id();
    let street_id = doc.add_object(dictionary! {
        "T" => Object::string_literal("street"),
        "Parent" => address_id,
        "Rect" => vec![50.into(), 650.into(), 250.into(), 670.into()],
        "P" => page_id,
    });
    let city_id = doc.add_object(dictionary! {
        "T" => Object::string_literal("city"),
        "Parent" => address_id,
        "Rect" => vec![50.into(), 620.into(), 250.into(), 640.into()],
        "P" => page_id,
    });
    doc.objects.insert(
        address_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "Ff" => 1,
            "T" => Object::string_literal("address"),
            "Kids" => vec![street_id.into(), city_id.into()],
        }),
    );

    let agree_yes = appearance(&mut doc);
    let agree_off = appearance(&mut doc);
    let agree_id = doc.add_object(dictionary! {
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "Rect" => vec![50.into(), 580.into(), 62.into(), 592.into()],
        "P" => page_id,
        "AS" => "Off",
        "AP" => dictionary! {
            "N" => dictionary! {
                "Yes" => agree_yes,
                "Off" => agree_off,
            },
        },
    });

    let newsletter_id = doc.new_object_id();
    let mut newsletter_widgets = Vec::new();
    for y in [540, 520] {
        let on = appearance(&mut doc);
        let off = appearance(&mut doc);
        newsletter_widgets.push(doc.add_object(dictionary! {
            "Parent" => newsletter_id,
            "Rect" => vec![50.into(), y.into(), 62.into(), (y + 12).into()],
            "P" => page_id,
            "AP" => dictionary! {
                "N" => dictionary! {
                    "Off" => off,
                    "On" => on,
                },
            },
        }));
    }
    doc.objects.insert(
        newsletter_id,
        Object::Dictionary(dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("newsletter"),
            "Kids" => newsletter_widgets.iter().map(|id| Object::from(*id)).collect::<Vec<_>>(),
        }),
    );

    let photo_id = doc.add_object(dictionary! {
        "FT" => "Btn",
        "Ff" => 65536,
        "T" => Object::string_literal("photo"),
        "Rect" => vec![300.into(), 500.into(), 100.into(), 600.into()],
    });

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
            "Annots" => vec![photo_id.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );

    let acroform_id = doc.add_object(dictionary! {
        "Fields" => vec![
            customer_id.into(),
            address_id.into(),
            agree_id.into(),
            newsletter_id.into(),
            photo_id.into(),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a minimal PDF without an interactive form
fn create_plain_pdf() -> Vec<u8> {
    let mut doc = Document::new();
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a form whose page inherits `/Resources` from the `/Pages` node
///
/// The inherited dictionary holds font `F1`, used by the page content, and
/// an image `Im1`. Field `stamp` is a push button on that page.
fn create_inherited_resources_form() -> Vec<u8> {
    let mut doc = Document::new();

    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let logo_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0],
    ));
    let contents_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET".to_vec(),
    ));

    let stamp_id = doc.add_object(dictionary! {
        "FT" => "Btn",
        "Ff" => 65536,
        "T" => Object::string_literal("stamp"),
        "Rect" => vec![400.into(), 700.into(), 500.into(), 800.into()],
        "P" => page_id,
    });

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Contents" => contents_id,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => dictionary! { "Im1" => logo_id },
            },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! {
            "Fields" => vec![stamp_id.into()],
        },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a minimal JPEG image for testing
fn create_test_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI marker
        0xFF, 0xC0, // SOF0 marker (baseline DCT)
        0x00, 0x11, // Length (17 bytes)
        0x08, // Precision (8 bits)
        0x00, 0x10, // Height (16 pixels)
        0x00, 0x10, // Width (16 pixels)
        0x03, // Number of components (RGB)
        0x01, 0x22, 0x00, // Component 1
        0x02, 0x11, 0x01, // Component 2
        0x03, 0x11, 0x01, // Component 3
        0xFF, 0xD9, // EOI marker
    ]
}

/// Create a 32x16 grayscale PNG using the image crate
fn create_test_png() -> Vec<u8> {
    use image::{ImageBuffer, Luma};

    let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(32, 16);
    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Png,
    )
    .expect("Failed to create PNG");
    buffer
}

fn reopen(form: &mut PdfForm) -> PdfForm {
    let bytes = form.to_bytes().expect("Failed to save PDF");
    PdfForm::open_from_bytes(&bytes).expect("Failed to re-open PDF")
}

fn page_content(form: &PdfForm) -> String {
    let doc = form.inner();
    let page_id = doc.get_pages()[&1];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

fn page_xobjects(form: &PdfForm) -> Vec<String> {
    let doc = form.inner();
    let page_id = doc.get_pages()[&1];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    resources
        .get(b"XObject")
        .unwrap()
        .as_dict()
        .unwrap()
        .iter()
        .map(|(name, _)| String::from_utf8_lossy(name).into_owned())
        .collect()
}

#[test]
fn test_open_save_roundtrip() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).expect("Failed to open PDF");
    assert_eq!(form.page_count(), 1);
    assert!(form.has_form());

    let reopened = reopen(&mut form);
    assert_eq!(reopened.page_count(), 1);
}

#[test]
fn test_field_names_are_fully_qualified() {
    let form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    assert_eq!(
        form.field_names().unwrap(),
        vec![
            "customer",
            "address.street",
            "address.city",
            "agree",
            "newsletter",
            "photo"
        ]
    );
}

#[test]
fn test_field_kinds_and_inheritance() {
    let form = PdfForm::open_from_bytes(&create_test_form()).unwrap();

    let street = form.field("address.street").unwrap();
    assert_eq!(street.kind, FieldKind::Text);
    assert!(street.is_read_only());

    assert_eq!(form.field("agree").unwrap().kind, FieldKind::Checkbox);
    assert_eq!(form.field("photo").unwrap().kind, FieldKind::PushButton);
    assert_eq!(form.field("newsletter").unwrap().widgets.len(), 2);
}

#[test]
fn test_set_text_survives_save() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.set_text("customer", "ACME Corp").unwrap();
    form.set_text("address.city", "Zürich").unwrap();

    let reopened = reopen(&mut form);
    assert_eq!(
        reopened.text_value("customer").unwrap().as_deref(),
        Some("ACME Corp")
    );
    assert_eq!(
        reopened.text_value("address.city").unwrap().as_deref(),
        Some("Zürich")
    );
    assert!(!reopened.field("address.city").unwrap().is_read_only());
    assert!(reopened.field("address.street").unwrap().is_read_only());
}

#[test]
fn test_checkbox_uses_appearance_state() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.set_checked("agree", true).unwrap();
    form.set_checked("newsletter", true).unwrap();

    let reopened = reopen(&mut form);
    assert!(reopened.is_checked("agree").unwrap());
    assert_eq!(reopened.text_value("newsletter").unwrap().as_deref(), Some("On"));

    let doc = reopened.inner();
    for widget in reopened.field("newsletter").unwrap().widgets {
        let dict = doc.get_object(widget).unwrap().as_dict().unwrap();
        assert_eq!(dict.get(b"AS").unwrap().as_name().unwrap(), b"On");
    }
}

#[test]
fn test_uncheck_checkbox() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.set_checked("agree", true).unwrap();
    form.set_checked("agree", false).unwrap();

    assert!(!form.is_checked("agree").unwrap());
    assert_eq!(form.text_value("agree").unwrap().as_deref(), Some("Off"));
}

#[test]
fn test_checkbox_errors() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();

    match form.set_checked("customer", true) {
        Err(PdfError::FieldKindMismatch { name, actual, .. }) => {
            assert_eq!(name, "customer");
            assert_eq!(actual, FieldKind::Text);
        }
        other => panic!("Expected FieldKindMismatch, got {other:?}"),
    }

    assert!(matches!(
        form.set_checked("missing", true),
        Err(PdfError::FieldNotFound(_))
    ));
}

#[test]
fn test_place_image_jpeg_fit_box() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();

    // Widget found through the page /Annots; /Rect corners are reversed
    let placement = form
        .place_image("photo", &create_test_jpeg(), ImageScaleMode::FitBox)
        .expect("Failed to place JPEG image");
    assert_eq!(
        placement,
        Placement {
            x: 150.0,
            y: 500.0,
            width: 100.0,
            height: 100.0,
        }
    );

    let reopened = reopen(&mut form);
    assert_eq!(page_xobjects(&reopened), vec!["Im1"]);

    let content = page_content(&reopened);
    assert!(content.starts_with("q\n"));
    assert!(content.contains("100 0 0 100 150 500 cm"));
    assert!(content.contains("/Im1 Do"));
}

#[test]
fn test_place_image_png_natural() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();

    let placement = form
        .place_image("customer", &create_test_png(), ImageScaleMode::Natural)
        .expect("Failed to place PNG image");

    // Top-left corner of the image on the top-left corner of the field
    assert_eq!(placement.x, 50.0);
    assert_eq!(placement.y, 704.0);
    assert_eq!((placement.width, placement.height), (32.0, 16.0));
}

#[test]
fn test_image_deduplication() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    let jpeg = create_test_jpeg();

    form.place_image("photo", &jpeg, ImageScaleMode::Stretch)
        .unwrap();
    form.place_image("customer", &jpeg, ImageScaleMode::Stretch)
        .unwrap();

    let reopened = reopen(&mut form);
    assert_eq!(page_xobjects(&reopened).len(), 1);
    assert_eq!(page_content(&reopened).matches("/Im1 Do").count(), 2);
}

#[test]
fn test_place_image_keeps_inherited_resources() {
    let mut form = PdfForm::open_from_bytes(&create_inherited_resources_form()).unwrap();
    form.place_image("stamp", &create_test_jpeg(), ImageScaleMode::FitBox)
        .unwrap();

    let reopened = reopen(&mut form);
    let doc = reopened.inner();
    let page_id = doc.get_pages()[&1];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();

    // Font used by the original content is still reachable from the page
    let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
    assert!(fonts.get(b"F1").unwrap().as_reference().is_ok());

    // The new image name skips the inherited one
    assert_eq!(page_xobjects(&reopened), vec!["Im1", "Im2"]);

    let content = page_content(&reopened);
    assert!(content.contains("/F1 12 Tf"));
    assert!(content.contains("/Im2 Do"));
    assert!(!content.contains("/Im1 Do"));
}

#[test]
fn test_place_cmyk_jpeg() {
    let mut jpeg = create_test_jpeg();
    // Fourth component in the frame header
    jpeg[5] = 0x14;
    jpeg[11] = 0x04;
    jpeg.splice(21..21, [0x04, 0x11, 0x01]);

    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.place_image("photo", &jpeg, ImageScaleMode::FitBox)
        .unwrap();

    let reopened = reopen(&mut form);
    let doc = reopened.inner();
    let page_id = doc.get_pages()[&1];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let image_id = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|r| r.get(b"XObject"))
        .and_then(Object::as_dict)
        .and_then(|x| x.get(b"Im1"))
        .and_then(Object::as_reference)
        .unwrap();
    let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
    assert_eq!(
        image.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
        b"DeviceCMYK"
    );
}

#[test]
fn test_invalid_image_data() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    let result = form.place_image("photo", b"definitely not an image", ImageScaleMode::FitBox);
    assert!(matches!(result, Err(PdfError::ImageError(_))));
}

#[test]
fn test_lock_fields() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.set_text("address.street", "Main St 1").unwrap();
    form.lock_fields().unwrap();

    let reopened = reopen(&mut form);
    for field in reopened.fields().unwrap() {
        assert!(field.is_read_only(), "{} should be read-only", field.name);
    }
    assert_eq!(reopened.field("photo").unwrap().kind, FieldKind::PushButton);
}

#[test]
fn test_need_appearances_on_indirect_acroform() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    form.set_need_appearances(true).unwrap();

    let reopened = reopen(&mut form);
    let doc = reopened.inner();
    let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_object(catalog_id).unwrap().as_dict().unwrap();
    let acroform_id = catalog.get(b"AcroForm").unwrap().as_reference().unwrap();
    let acroform = doc.get_object(acroform_id).unwrap().as_dict().unwrap();
    assert!(acroform.get(b"NeedAppearances").unwrap().as_bool().unwrap());
}

#[test]
fn test_document_without_form() {
    let mut form = PdfForm::open_from_bytes(&create_plain_pdf()).unwrap();
    assert!(!form.has_form());
    assert!(form.field_names().unwrap().is_empty());
    assert!(matches!(
        form.set_need_appearances(true),
        Err(PdfError::NoAcroForm)
    ));
}

#[test]
fn test_open_invalid_bytes() {
    assert!(matches!(
        PdfForm::open_from_bytes(b"not a pdf"),
        Err(PdfError::OpenError(_))
    ));
}

#[test]
fn test_inner_document_access() {
    let mut form = PdfForm::open_from_bytes(&create_test_form()).unwrap();
    assert_eq!(form.inner().get_pages().len(), 1);
    assert_eq!(form.inner_mut().get_pages().len(), 1);
}
