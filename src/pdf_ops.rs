//! PDF mutation operations
//!
//! This module is the only place that touches the `lopdf` object model. It
//! provides the four document-level operations the tools are built from:
//!
//! - [`copy_pages`]: new document from a sequence of source pages
//! - [`merge_documents`]: concatenation of several documents
//! - [`overlay_images`]: stretch a raster over whole pages
//! - [`draw_text`]: draw text with the standard Helvetica font
//!
//! Every operation works on a clone of the loaded [`SourceDocument`] and
//! returns the saved bytes, so a failure never touches caller state.

use std::collections::{BTreeMap, HashSet};

use image::RgbaImage;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::color::Rgb;
use crate::document::SourceDocument;
use crate::error::{Error, Result};
use crate::geometry::{PageBox, TextAnchor};
use crate::order::PageIndex;

/// Value written to the `/Producer` entry of every output.
pub const PRODUCER: &str = concat!("pdfworks ", env!("CARGO_PKG_VERSION"));

/// Page attributes that may be inherited from `/Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 64;

/// Base font used for text drawing.
const TEXT_FONT: &str = "Helvetica";

/// Build a new document holding the pages of `source` in `pages` order.
///
/// Indices may repeat: each repetition becomes its own page object, so
/// the output has exactly `pages.len()` pages.
///
/// # Example
///
/// ```rust,no_run
/// use pdfworks::document::SourceDocument;
/// use pdfworks::pdf_ops;
///
/// let source = SourceDocument::open("input.pdf").expect("load");
/// // page 3 twice, then page 1
/// let bytes = pdf_ops::copy_pages(&source, &[2, 2, 0]).expect("copy");
/// std::fs::write("out.pdf", bytes).expect("write");
/// ```
///
/// # Errors
///
/// Fails if `pages` is empty, an index is out of range, or the page tree is
/// malformed.
pub fn copy_pages(source: &SourceDocument, pages: &[PageIndex]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(Error::EmptySelection);
    }
    for &page in pages {
        source.check_page(page)?;
    }
    let (mut doc, page_ids) = source.working_copy();
    let sequence: Vec<ObjectId> = pages.iter().map(|&p| page_ids[p]).collect();
    assemble_pages(&mut doc, &sequence)?;
    save(doc)
}

/// Concatenate every page of every document, in slice order.
///
/// # Errors
///
/// Fails with [`Error::NotEnoughFiles`] for fewer than two documents.
pub fn merge_documents(sources: &[&SourceDocument]) -> Result<Vec<u8>> {
    if sources.len() < 2 {
        return Err(Error::NotEnoughFiles(sources.len()));
    }
    let (mut merged, mut sequence) = sources[0].working_copy();
    for source in &sources[1..] {
        let (other, _) = source.working_copy();
        sequence.extend(absorb(&mut merged, other));
    }
    assemble_pages(&mut merged, &sequence)?;
    save(merged)
}

/// Stretch each raster over the full page box of its page.
///
/// The images keep their alpha channel as a soft mask so only the ink
/// covers the page content.
pub fn overlay_images(
    source: &SourceDocument,
    overlays: &BTreeMap<PageIndex, RgbaImage>,
) -> Result<Vec<u8>> {
    let (mut doc, page_ids) = source.working_copy();
    for (&page, image) in overlays {
        source.check_page(page)?;
        let page_id = page_ids[page];
        let bounds = source.page_box(page)?;
        let image_id = embed_rgba_image(&mut doc, image);
        let name = register_resource(&mut doc, page_id, "XObject", "Ink", image_id)?;
        let content = format!(
            "q {} 0 0 {} {} {} cm /{} Do Q\n",
            fmt_num(bounds.width),
            fmt_num(bounds.height),
            fmt_num(bounds.x),
            fmt_num(bounds.y),
            name
        );
        append_page_content(&mut doc, page_id, content.into_bytes())?;
        log::debug!(
            "overlay {}x{} px on page {}",
            image.width(),
            image.height(),
            page + 1
        );
    }
    save(doc)
}

/// Text positioned in page space, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub page: PageIndex,
    pub anchor: TextAnchor,
    pub color: Rgb,
    pub text: String,
}

/// Draw each text item with Helvetica at its anchor.
///
/// # Errors
///
/// Fails with [`Error::Unencodable`] when the text holds characters the
/// standard font encoding cannot represent.
pub fn draw_text(source: &SourceDocument, items: &[PlacedText]) -> Result<Vec<u8>> {
    let (mut doc, page_ids) = source.working_copy();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => TEXT_FONT,
        "Encoding" => "WinAnsiEncoding",
    });

    let mut by_page: BTreeMap<PageIndex, Vec<&PlacedText>> = BTreeMap::new();
    for item in items {
        source.check_page(item.page)?;
        by_page.entry(item.page).or_default().push(item);
    }

    for (page, items) in by_page {
        let page_id = page_ids[page];
        let font_name = register_resource(&mut doc, page_id, "Font", "Helv", font_id)?;
        let mut content = Vec::new();
        for item in items {
            content.extend(text_operations(&font_name, item)?);
        }
        append_page_content(&mut doc, page_id, content)?;
    }
    save(doc)
}

/// Content stream operators for one text item.
fn text_operations(font_name: &str, item: &PlacedText) -> Result<Vec<u8>> {
    let [r, g, b] = item.color.normalized();
    let size = fmt_num(item.anchor.size);
    let mut ops = format!(
        "BT\n/{} {} Tf\n{} TL\n{} {} {} rg\n{} {} Td\n",
        font_name,
        size,
        size,
        fmt_num(f64::from(r)),
        fmt_num(f64::from(g)),
        fmt_num(f64::from(b)),
        fmt_num(item.anchor.x),
        fmt_num(item.anchor.y),
    )
    .into_bytes();
    for (i, line) in item.text.split('\n').enumerate() {
        if i > 0 {
            ops.extend_from_slice(b"T*\n");
        }
        let encoded = encode_win_ansi(line.trim_end_matches('\r'))?;
        ops.extend(pdf_string_literal(&encoded));
        ops.extend_from_slice(b" Tj\n");
    }
    ops.extend_from_slice(b"ET\n");
    Ok(ops)
}

/// MediaBox of a page, following inheritance through the page tree.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    let raw = inherited(doc, page_id, b"MediaBox")?;
    let corners = resolve(doc, &raw).as_array().ok()?;
    if corners.len() != 4 {
        return None;
    }
    let n: Vec<f64> = corners
        .iter()
        .map(|o| number(resolve(doc, o)))
        .collect::<Option<_>>()?;
    let bounds = PageBox::from_corners(n[0], n[1], n[2], n[3]);
    (bounds.width > 0.0 && bounds.height > 0.0).then_some(bounds)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    None
}

/// Copy of a page dictionary with every inheritable attribute made local.
fn flattened_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|_| Error::PageTree(format!("page {page_id:?} is not a dictionary")))?
        .clone();
    for key in INHERITABLE {
        if !page.has(key) {
            if let Some(value) = inherited(doc, page_id, key) {
                page.set(key, value);
            }
        }
    }
    Ok(page)
}

/// Replace the page tree and catalog of `doc` with a flat tree holding
/// `sequence`. Repeated ids are cloned into new page objects.
fn assemble_pages(doc: &mut Document, sequence: &[ObjectId]) -> Result<()> {
    let pages_root = doc.new_object_id();
    let mut seen = HashSet::new();
    let mut kids = Vec::with_capacity(sequence.len());
    for &page_id in sequence {
        let mut page = flattened_page(doc, page_id)?;
        page.set("Parent", pages_root);
        let id = if seen.insert(page_id) {
            doc.objects.insert(page_id, Object::Dictionary(page));
            page_id
        } else {
            doc.add_object(page)
        };
        kids.push(Object::Reference(id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_root,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_root,
    });
    doc.trailer.set("Root", catalog);
    doc.trailer.remove(b"Info");
    Ok(())
}

/// Move every object of `other` into `base`, returning `other`'s pages in
/// order under their new ids.
fn absorb(base: &mut Document, mut other: Document) -> Vec<ObjectId> {
    other.renumber_objects_with(base.max_id + 1);
    let pages: Vec<ObjectId> = other.get_pages().into_values().collect();
    base.max_id = base.max_id.max(other.max_id);
    base.objects.extend(other.objects);
    pages
}

/// Embed an RGBA raster as an RGB image XObject with a soft mask.
fn embed_rgba_image(doc: &mut Document, image: &RgbaImage) -> ObjectId {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        alpha,
    ));
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => smask_id,
        },
        rgb,
    ))
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|_| Error::PageTree(format!("page {page_id:?} is not a dictionary")))
}

/// Add `target` to the page's `/Resources /<category>` under a fresh name
/// starting with `prefix`, and return that name.
///
/// The resource dictionaries are copied onto the page first, so pages that
/// shared them are left untouched.
fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    target: ObjectId,
) -> Result<String> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, &obj).as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);
    let mut entries = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);

    let name = (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());
    entries.set(name.clone(), Object::Reference(target));
    resources.set(category, Object::Dictionary(entries));
    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Draw `content` on top of the page. The existing content is wrapped in
/// `q`/`Q` so its graphics state cannot leak into the overlay.
fn append_page_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|_| Error::PageTree(format!("page {page_id:?} is not a dictionary")))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut body = b"\nQ\n".to_vec();
    body.extend(content);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));
    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

/// Stamp the producer, drop unreachable objects, compress and serialize.
fn save(mut doc: Document) -> Result<Vec<u8>> {
    let existing_info = doc
        .trailer
        .get(b"Info")
        .and_then(|o| o.as_reference())
        .ok();
    let stamped = existing_info
        .and_then(|id| doc.get_object_mut(id).and_then(|o| o.as_dict_mut()).ok())
        .map(|info| info.set("Producer", Object::string_literal(PRODUCER)))
        .is_some();
    if !stamped {
        let info_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        });
        doc.trailer.set("Info", info_id);
    }

    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        log::debug!("pruned {} unreachable objects", pruned.len());
    }
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::Save(e.to_string()))?;
    Ok(out)
}

/// Characters of Windows-1252 outside the Latin-1 ranges.
const WIN_ANSI_EXTRA: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

fn encode_win_ansi(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| match c as u32 {
            0x09 => Ok(b' '),
            code @ (0x20..=0x7E | 0xA0..=0xFF) => Ok(code as u8),
            _ => WIN_ANSI_EXTRA
                .iter()
                .find(|(ch, _)| *ch == c)
                .map(|&(_, byte)| byte)
                .ok_or(Error::Unencodable(c)),
        })
        .collect()
}

/// `(...)` literal with delimiters escaped and non-ASCII bytes in octal.
fn pdf_string_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            0x20..=0x7E => out.push(b),
            _ => out.extend(format!("\\{b:03o}").into_bytes()),
        }
    }
    out.push(b')');
    out
}

/// Compact decimal for content streams: at most four decimals, no
/// trailing zeros.
fn fmt_num(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_support::{page_widths, sample_pdf};

    fn three_pages() -> SourceDocument {
        SourceDocument::load("three.pdf", sample_pdf(&[200, 300, 400])).unwrap()
    }

    fn page_content(bytes: &[u8], page: u32) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let id = doc.get_pages()[&page];
        String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
    }

    #[test]
    fn test_copy_pages_with_duplicates() {
        let bytes = copy_pages(&three_pages(), &[2, 2, 0]).unwrap();
        assert_eq!(page_widths(&bytes), vec![400, 400, 200]);

        let doc = Document::load_mem(&bytes).unwrap();
        let ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        assert_ne!(ids[0], ids[1], "duplicates must be distinct page objects");
    }

    #[test]
    fn test_copy_pages_rejects_bad_input() {
        let source = three_pages();
        assert!(matches!(copy_pages(&source, &[]), Err(Error::EmptySelection)));
        assert!(matches!(
            copy_pages(&source, &[0, 3]),
            Err(Error::PageOutOfRange { page: 3, .. })
        ));
    }

    #[test]
    fn test_merge_keeps_document_order() {
        let a = SourceDocument::load("a.pdf", sample_pdf(&[100, 110])).unwrap();
        let b = SourceDocument::load("b.pdf", sample_pdf(&[500])).unwrap();
        let bytes = merge_documents(&[&b, &a]).unwrap();
        assert_eq!(page_widths(&bytes), vec![500, 100, 110]);
    }

    #[test]
    fn test_merge_needs_two() {
        let a = three_pages();
        assert!(matches!(merge_documents(&[&a]), Err(Error::NotEnoughFiles(1))));
    }

    #[test]
    fn test_overlay_registers_xobject_and_draws_full_page() {
        let source = three_pages();
        let mut overlays = BTreeMap::new();
        overlays.insert(1, RgbaImage::new(450, 600));
        let bytes = overlay_images(&source, &overlays).unwrap();

        let content = page_content(&bytes, 2);
        assert!(content.contains("300 0 0 400 0 0 cm /Ink1 Do"));
        assert!(content.trim_start().starts_with('q'));
        assert!(!page_content(&bytes, 1).contains("Do"));
    }

    #[test]
    fn test_draw_text_writes_operators() {
        let source = three_pages();
        let items = vec![PlacedText {
            page: 0,
            anchor: TextAnchor { x: 10.0, y: 350.5, size: 12.0 },
            color: Rgb::new(255, 0, 0),
            text: "Hi (there)".into(),
        }];
        let bytes = draw_text(&source, &items).unwrap();
        let content = page_content(&bytes, 1);
        assert!(content.contains("/Helv1 12 Tf"));
        assert!(content.contains("1 0 0 rg"));
        assert!(content.contains("10 350.5 Td"));
        assert!(content.contains("(Hi \\(there\\)) Tj"));
    }

    #[test]
    fn test_draw_text_rejects_unencodable() {
        let source = three_pages();
        let items = vec![PlacedText {
            page: 0,
            anchor: TextAnchor { x: 0.0, y: 0.0, size: 10.0 },
            color: Rgb::BLACK,
            text: "日本".into(),
        }];
        assert!(matches!(draw_text(&source, &items), Err(Error::Unencodable('日'))));
    }

    #[test]
    fn test_win_ansi_and_literal() {
        assert_eq!(encode_win_ansi("é€").unwrap(), vec![0xE9, 0x80]);
        assert_eq!(pdf_string_literal(&[b'a', 0xE9, b'\\']), b"(a\\351\\\\)".to_vec());
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.3333");
        assert_eq!(fmt_num(-0.00001), "0");
    }

    #[test]
    fn test_producer_stamped() {
        let bytes = copy_pages(&three_pages(), &[0]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.get(b"Producer").is_ok());
    }
}
