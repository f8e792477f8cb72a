//! Fill Invoice - Demonstrates filling an AcroForm from an annotated object
//!
//! This example shows:
//! - Declaring a schema for a plain struct
//! - Indexed list fields (`Item{}`)
//! - Split booleans and split dates
//! - Reading the fill report and flattening diagnostics
//!
//! Run with: cargo run --example fill_invoice -p form-filler [output.pdf]

use annotations::{Annotation, Fillable, Schema, Value};
use chrono::NaiveDate;
use form_filler::{fill_form, FillOptions, PdfForm};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use once_cell::sync::Lazy;

struct Item {
    description: String,
    amount: f64,
}

impl Fillable for Item {
    fn schema(&self) -> &Schema {
        static SCHEMA: Lazy<Schema> = Lazy::new(|| {
            Schema::builder("Item")
                .property("description", [Annotation::value("Item{}")])
                .property("amount", [Annotation::value("Amount{}")])
                .build()
        });
        &SCHEMA
    }

    fn property(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "description" => Some((&self.description).into()),
            "amount" => Some(self.amount.into()),
            _ => None,
        }
    }
}

struct Invoice {
    customer: String,
    contact: String,
    items: Vec<Item>,
    paid: bool,
    due: NaiveDate,
}

impl Fillable for Invoice {
    fn schema(&self) -> &Schema {
        static SCHEMA: Lazy<Schema> = Lazy::new(|| {
            Schema::builder("Invoice")
                .property("customer", [Annotation::value("Customer")])
                .property("contact", [Annotation::joined_with("Customer", ", attn. ")])
                .property("items", [Annotation::list_from(1)])
                .property("paid", [Annotation::split_bool("PaidYes", "PaidNo")])
                .property("due", [Annotation::split_date("DueYear", "DueMonth", "DueDay")])
                .build()
        });
        &SCHEMA
    }

    fn property(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "customer" => Some((&self.customer).into()),
            "contact" => Some((&self.contact).into()),
            "items" => Some(Value::list(&self.items)),
            "paid" => Some(self.paid.into()),
            "due" => Some(self.due.into()),
            _ => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "output/invoice.pdf".to_string());
    if let Some(dir) = std::path::Path::new(&output).parent() {
        std::fs::create_dir_all(dir)?;
    }

    let invoice = Invoice {
        customer: "ACME Corp".to_string(),
        contact: "Wile E. Coyote".to_string(),
        items: vec![
            Item {
                description: "Anvil".to_string(),
                amount: 49.5,
            },
            Item {
                description: "Rocket skates".to_string(),
                amount: 71.0,
            },
        ],
        paid: false,
        due: NaiveDate::from_ymd_opt(2024, 3, 31)
            .ok_or_else(|| anyhow::anyhow!("invalid due date"))?,
    };

    let mut form = PdfForm::open_from_bytes(&create_invoice_template()?)?;
    let outcome = fill_form(&invoice, &mut form, &FillOptions::editable())?;

    eprintln!("Filled {} fields", outcome.report.filled.len());
    for name in &outcome.report.missing {
        eprintln!("  missing: {name}");
    }
    for failed in &outcome.report.failed {
        eprintln!("  failed: {} ({})", failed.name, failed.reason);
    }
    for diagnostic in &outcome.diagnostics {
        eprintln!("  skipped: {diagnostic}");
    }

    form.save(&output)?;
    println!("Saved {output}");
    Ok(())
}

/// Build a one-page invoice template with text fields and checkboxes
fn create_invoice_template() -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::new();
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let mut fields: Vec<ObjectId> = Vec::new();
    let text_fields = [
        ("Customer", 100, 750),
        ("Item1", 100, 700),
        ("Amount1", 400, 700),
        ("Item2", 100, 670),
        ("Amount2", 400, 670),
        ("Item3", 100, 640),
        ("Amount3", 400, 640),
        ("DueYear", 100, 580),
        ("DueMonth", 180, 580),
        ("DueDay", 260, 580),
    ];
    for (name, x, y) in text_fields {
        fields.push(doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(name),
            "Rect" => vec![x.into(), y.into(), (x + 150).into(), (y + 20).into()],
            "P" => page_id,
        }));
    }
    for (name, y) in [("PaidYes", 540), ("PaidNo", 520)] {
        let on = doc.add_object(Stream::new(dictionary! {}, b"0 g 2 2 8 8 re f".to_vec()));
        let off = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        fields.push(doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal(name),
            "Rect" => vec![100.into(), y.into(), 112.into(), (y + 12).into()],
            "P" => page_id,
            "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
        }));
    }

    let annots: Vec<Object> = fields.iter().copied().map(Object::from).collect();
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Annots" => annots.clone(),
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
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => annots },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
