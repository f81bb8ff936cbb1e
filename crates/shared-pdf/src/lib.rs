//! PDF stamping utilities
//!
//! Overlays a signature image and an attribution line onto every page of a
//! document, producing a new PDF. Also carries the small pieces the stamper
//! needs: page box lookup, Helvetica metrics and signature image embedding.

pub mod error;
pub mod image;
pub mod page;
pub mod sample;
pub mod stamp;
pub mod text;

pub use error::StampError;
pub use image::{ImageFormat, SignatureImage};
pub use page::PageBox;
pub use sample::sample_document;
pub use stamp::{stamp, stamp_with_layout, StampLayout};

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32, StampError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| StampError::SourceUnreadable(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
