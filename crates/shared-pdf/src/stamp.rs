//! Signature stamping
//!
//! Every page gets the same block anchored at its bottom-left corner: one
//! line of attribution text at the bottom margin with the signature image
//! drawn above it. Existing page content is left untouched and wrapped in a
//! save/restore pair so the overlay is drawn in default user space.

use crate::error::StampError;
use crate::image::SignatureImage;
use crate::page::{self, PageBox};
use crate::text;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Placement of the signature block, in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampLayout {
    pub margin_left: f64,
    pub margin_bottom: f64,
    pub margin_right: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub image_gap: f64,
    pub image_width: f64,
    pub image_height: f64,
}

impl Default for StampLayout {
    fn default() -> Self {
        Self {
            margin_left: 50.0,
            margin_bottom: 40.0,
            margin_right: 40.0,
            font_size: 10.0,
            line_height: 14.0,
            image_gap: 8.0,
            image_width: 150.0,
            image_height: 50.0,
        }
    }
}

impl StampLayout {
    /// Widest the attribution line may render on a page of this width
    pub fn text_max_width(&self, page_width: f64) -> f64 {
        page_width - self.margin_left - self.margin_right
    }

    /// Baseline origin of the attribution line
    pub fn text_origin(&self, page: &PageBox) -> (f64, f64) {
        (
            page.x + self.margin_left,
            page.y + self.margin_bottom + (self.line_height - self.font_size),
        )
    }

    /// Lower-left corner of the signature image
    pub fn image_origin(&self, page: &PageBox) -> (f64, f64) {
        (
            page.x + self.margin_left,
            page.y + self.margin_bottom + self.line_height + self.image_gap,
        )
    }
}

/// Stamp `signature` and `attribution` onto every page of `source` with the default layout
pub fn stamp(
    source: &[u8],
    signature: &SignatureImage,
    attribution: &str,
) -> Result<Vec<u8>, StampError> {
    stamp_with_layout(source, signature, attribution, &StampLayout::default())
}

/// Stamp every page of `source`, returning the new document bytes
pub fn stamp_with_layout(
    source: &[u8],
    signature: &SignatureImage,
    attribution: &str,
    layout: &StampLayout,
) -> Result<Vec<u8>, StampError> {
    let mut doc =
        Document::load_mem(source).map_err(|e| StampError::SourceUnreadable(e.to_string()))?;

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    if pages.is_empty() {
        return Err(StampError::SourceUnreadable("document has no pages".into()));
    }
    debug!("Stamping {} pages", pages.len());

    let image_id = signature.embed(&mut doc)?;
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    for (page_num, page_id) in pages {
        let page_box = page::page_box(&doc, page_id);
        debug!(
            "Stamping page {} ({} x {} at {}, {})",
            page_num, page_box.width, page_box.height, page_box.x, page_box.y
        );

        let mut resources = page_resources(&doc, page_id);
        let image_name = register(&doc, &mut resources, b"XObject", "SigImg", image_id);
        let font_name = register(&doc, &mut resources, b"Font", "SigFont", font_id);

        let overlay = overlay_operations(layout, &page_box, &image_name, &font_name, attribution);
        install_overlay(&mut doc, page_id, resources, overlay)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| StampError::Write(e.to_string()))?;
    Ok(output)
}

/// Content operations drawing the signature block on one page
fn overlay_operations(
    layout: &StampLayout,
    page_box: &PageBox,
    image_name: &str,
    font_name: &str,
    attribution: &str,
) -> Vec<Operation> {
    let (text_x, text_y) = layout.text_origin(page_box);
    let (image_x, image_y) = layout.image_origin(page_box);
    let line = text::fit_to_width(
        attribution,
        layout.font_size,
        layout.text_max_width(page_box.width),
    );

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(layout.image_width),
                real(0.0),
                real(0.0),
                real(layout.image_height),
                real(image_x),
                real(image_y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ];

    if !line.is_empty() {
        ops.extend([
            Operation::new("q", vec![]),
            Operation::new("g", vec![real(0.0)]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_name.as_bytes().to_vec()),
                    real(layout.font_size),
                ],
            ),
            Operation::new("Td", vec![real(text_x), real(text_y)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    text::encode_win_ansi(&line),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    ops
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Copy of the page's effective resources, with inherited and referenced
/// dictionaries flattened so they can be extended per page
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    page::inherited(doc, page_id, b"Resources")
        .and_then(|obj| page::deref_dict(doc, obj))
        .cloned()
        .unwrap_or_default()
}

/// Add `target` under a fresh name in the `category` sub-dictionary, returning the name
fn register(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    base: &str,
    target: ObjectId,
) -> String {
    let mut entries = resources
        .get(category)
        .ok()
        .and_then(|obj| page::deref_dict(doc, obj))
        .cloned()
        .unwrap_or_default();

    let name = unique_name(&entries, base);
    entries.set(name.as_bytes().to_vec(), Object::Reference(target));
    resources.set(category.to_vec(), Object::Dictionary(entries));
    name
}

fn unique_name(entries: &Dictionary, base: &str) -> String {
    if !entries.has(base.as_bytes()) {
        return base.to_string();
    }
    (1u32..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| base.to_string())
}

/// Wrap the existing content in `q`/`Q` and append the overlay stream
fn install_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    resources: Dictionary,
    overlay: Vec<Operation>,
) -> Result<(), StampError> {
    let existing = existing_contents(doc, page_id);

    let mut overlay_bytes = Vec::new();
    if !existing.is_empty() {
        // Leading newline keeps the Q apart from a previous stream that lacks trailing whitespace
        overlay_bytes.extend_from_slice(b"\nQ\n");
    }
    overlay_bytes.extend(
        Content {
            operations: overlay,
        }
        .encode()
        .map_err(|e| StampError::Write(e.to_string()))?,
    );
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay_bytes));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
    }
    contents.push(Object::Reference(overlay_id));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| StampError::SourceUnreadable(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// The page's content stream references, whether stored singly, as an
/// array, or as a reference to an array
fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Some(contents) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok())
    else {
        return Vec::new();
    };

    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Object::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}
