//! Page geometry lookup

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Inheritance chains deeper than this are treated as malformed
const MAX_PARENT_DEPTH: usize = 32;

/// Visible page area in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// US Letter, used when a page carries no usable box
    pub const LETTER: PageBox = PageBox {
        x: 0.0,
        y: 0.0,
        width: 612.0,
        height: 792.0,
    };

    /// Build from a PDF rectangle `[llx lly urx ury]`, accepting corners in any order
    pub fn from_rect(rect: [f64; 4]) -> Self {
        let [x1, y1, x2, y2] = rect;
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }
}

/// Resolve the page's visible box: CropBox if present, else MediaBox.
///
/// Both keys are inheritable, so the `Parent` chain is walked for each.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .into_iter()
        .find_map(|key| inherited(doc, page_id, key).and_then(|obj| parse_rect(doc, obj)))
        .filter(|b| b.width > 0.0 && b.height > 0.0)
        .unwrap_or(PageBox::LETTER)
}

/// Look up `key` on the page, falling back through its ancestors
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a reference if `obj` is one
pub(crate) fn deref<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Resolve a dictionary value that may be stored inline or behind a reference
pub(crate) fn deref_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    deref(doc, obj).and_then(|o| o.as_dict().ok())
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn parse_rect(doc: &Document, obj: &Object) -> Option<PageBox> {
    let arr = deref(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        *slot = number(deref(doc, item)?)?;
    }
    Some(PageBox::from_rect(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_page(page: Dictionary, pages_extra: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut page = page;
        page.set("Type", "Page");
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(page);

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        };
        for (k, v) in pages_extra.iter() {
            pages.set(k.clone(), v.clone());
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        (doc, page_id)
    }

    #[test]
    fn test_media_box_on_page() {
        let (doc, page_id) = doc_with_page(
            dictionary! { "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()] },
            Dictionary::new(),
        );
        let b = page_box(&doc, page_id);
        assert_eq!(b.width, 595.0);
        assert_eq!(b.height, 842.0);
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let (doc, page_id) = doc_with_page(
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "CropBox" => vec![36.into(), 36.into(), 576.into(), 756.into()],
            },
            Dictionary::new(),
        );
        let b = page_box(&doc, page_id);
        assert_eq!((b.x, b.y, b.width, b.height), (36.0, 36.0, 540.0, 720.0));
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let (doc, page_id) = doc_with_page(
            Dictionary::new(),
            dictionary! { "MediaBox" => vec![0.into(), 0.into(), 400.into(), 300.into()] },
        );
        let b = page_box(&doc, page_id);
        assert_eq!((b.width, b.height), (400.0, 300.0));
    }

    #[test]
    fn test_missing_box_defaults_to_letter() {
        let (doc, page_id) = doc_with_page(Dictionary::new(), Dictionary::new());
        assert_eq!(page_box(&doc, page_id), PageBox::LETTER);
    }

    #[test]
    fn test_inverted_rect_is_normalized() {
        let b = PageBox::from_rect([612.0, 792.0, 0.0, 0.0]);
        assert_eq!(b, PageBox::LETTER);
    }
}
