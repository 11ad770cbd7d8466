//! In-memory lopdf documents shared by the unit tests, the integration
//! tests and the benches.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Height of every sample page, in points.
pub const SAMPLE_HEIGHT: i64 = 400;

/// A document with one page per entry of `widths`, each `widths[i]`
/// points wide and [`SAMPLE_HEIGHT`] points tall, carrying the text "Page i".
pub fn sample_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut kids = Vec::new();
    for (i, &w) in widths.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 20 20 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(w),
                Object::Integer(SAMPLE_HEIGHT),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save sample pdf");
    out
}

/// Page widths of a saved PDF, in page order. A MediaBox inherited from
/// a `/Pages` node counts.
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).expect("reload output");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let media_box = media_box(&doc, id).expect("page has a MediaBox");
            match &media_box[2] {
                Object::Integer(w) => *w,
                Object::Real(w) => f64::from(*w).round() as i64,
                other => panic!("unexpected MediaBox entry {other:?}"),
            }
        })
        .collect()
}

fn media_box(doc: &Document, page_id: ObjectId) -> Option<Vec<Object>> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    loop {
        if let Ok(found) = node.get(b"MediaBox") {
            let found = match found {
                Object::Reference(id) => doc.get_object(*id).ok()?,
                other => other,
            };
            return found.as_array().ok().cloned();
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
}
