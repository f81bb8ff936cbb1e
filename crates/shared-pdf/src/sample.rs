//! Placeholder documents for bootstrapping a fresh storage root

use crate::error::StampError;
use crate::text;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// Build a US Letter document with `page_count` pages, each showing `title`
/// and its page number. Page size and font are inherited from the page tree.
pub fn sample_document(title: &str, page_count: u32) -> Result<Vec<u8>, StampError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page in 1..=page_count.max(1) {
        let footer = format!("Page {} of {}", page, page_count.max(1));
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(18)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(text::encode_win_ansi(title), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(9)]),
                Operation::new("Td", vec![Object::Integer(500), Object::Integer(20)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(footer.into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| StampError::Write(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        kids.push(Object::Reference(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        })));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| StampError::Write(e.to_string()))?;
    Ok(buffer)
}
