//! Signature image loading and embedding
//!
//! PNG files are decoded to 8-bit samples and re-encoded as a Flate image
//! XObject, with any alpha channel split into a soft mask. JPEG files are
//! embedded unchanged with the `DCTDecode` filter.

use crate::error::StampError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};
use std::path::Path;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

#[derive(Debug, Clone)]
enum Samples {
    /// Decoded 8-bit samples, optionally with a separate alpha plane
    Raster {
        color: Vec<u8>,
        alpha: Option<Vec<u8>>,
        gray: bool,
    },
    /// Untouched JPEG stream
    Dct { data: Vec<u8>, components: u8 },
}

/// A decoded signature image ready to embed into a PDF
#[derive(Debug, Clone)]
pub struct SignatureImage {
    format: ImageFormat,
    width: u32,
    height: u32,
    samples: Samples,
}

impl SignatureImage {
    /// Read and decode the signature image at `path`
    pub fn load(path: &Path) -> Result<Self, StampError> {
        let bytes =
            std::fs::read(path).map_err(|_| StampError::SignatureAssetMissing(path.to_path_buf()))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a PNG or JPEG image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StampError> {
        if bytes.starts_with(PNG_SIGNATURE) {
            decode_png(bytes)
        } else if bytes.starts_with(JPEG_SOI) {
            decode_jpeg(bytes)
        } else {
            Err(StampError::UnsupportedImage(
                "expected PNG or JPEG data".into(),
            ))
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Pixel dimensions as `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self.samples, Samples::Raster { alpha: Some(_), .. })
    }

    /// Add the image (and its soft mask, if any) to `doc`, returning the XObject id
    pub(crate) fn embed(&self, doc: &mut Document) -> Result<ObjectId, StampError> {
        let width = i64::from(self.width);
        let height = i64::from(self.height);

        match &self.samples {
            Samples::Dct { data, components } => {
                let color_space = match components {
                    1 => "DeviceGray",
                    4 => "DeviceCMYK",
                    _ => "DeviceRGB",
                };
                Ok(doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => color_space,
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    data.clone(),
                )))
            }
            Samples::Raster { color, alpha, gray } => {
                let mut image = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => if *gray { "DeviceGray" } else { "DeviceRGB" },
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                };

                if let Some(alpha) = alpha {
                    let smask_id = doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => width,
                            "Height" => height,
                            "ColorSpace" => "DeviceGray",
                            "BitsPerComponent" => 8,
                            "Filter" => "FlateDecode",
                        },
                        deflate(alpha)?,
                    ));
                    image.set("SMask", Object::Reference(smask_id));
                }

                Ok(doc.add_object(Stream::new(image, deflate(color)?)))
            }
        }
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, StampError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| StampError::Write(e.to_string()))?;
    encoder.finish().map_err(|e| StampError::Write(e.to_string()))
}

fn decode_png(bytes: &[u8]) -> Result<SignatureImage, StampError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| StampError::UnsupportedImage(format!("PNG header: {}", e)))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| StampError::UnsupportedImage(format!("PNG data: {}", e)))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(StampError::UnsupportedImage(format!(
            "PNG bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let (color, alpha, gray) = match info.color_type {
        png::ColorType::Rgb => (buf, None, false),
        png::ColorType::Grayscale => (buf, None, true),
        png::ColorType::Rgba => split_alpha(&buf, 3),
        png::ColorType::GrayscaleAlpha => split_alpha(&buf, 1),
        png::ColorType::Indexed => {
            return Err(StampError::UnsupportedImage(
                "indexed PNG was not expanded".into(),
            ))
        }
    };

    // A fully opaque alpha plane adds nothing
    let alpha = alpha.filter(|a| a.iter().any(|&v| v != u8::MAX));

    Ok(SignatureImage {
        format: ImageFormat::Png,
        width: info.width,
        height: info.height,
        samples: Samples::Raster { color, alpha, gray },
    })
}

/// Split interleaved `channels + 1` samples into color and alpha planes
fn split_alpha(buf: &[u8], channels: usize) -> (Vec<u8>, Option<Vec<u8>>, bool) {
    let stride = channels + 1;
    let pixels = buf.len() / stride;
    let mut color = Vec::with_capacity(pixels * channels);
    let mut alpha = Vec::with_capacity(pixels);
    for px in buf.chunks_exact(stride) {
        color.extend_from_slice(&px[..channels]);
        alpha.push(px[channels]);
    }
    (color, Some(alpha), channels == 1)
}

/// Read dimensions and component count from the first start-of-frame marker
fn decode_jpeg(bytes: &[u8]) -> Result<SignatureImage, StampError> {
    let truncated = || StampError::UnsupportedImage("truncated JPEG".into());
    let mut pos = 2;

    loop {
        // Markers may be preceded by any number of 0xFF fill bytes
        while bytes.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or_else(truncated)?;
        pos += 1;

        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => {
                return Err(StampError::UnsupportedImage(
                    "JPEG has no frame header".into(),
                ))
            }
            _ => {}
        }

        let len_bytes = bytes.get(pos..pos + 2).ok_or_else(truncated)?;
        let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        if len < 2 {
            return Err(truncated());
        }

        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // length(2) precision(1) height(2) width(2) components(1)
            let seg = bytes.get(pos..pos + 8).ok_or_else(truncated)?;
            let height = u32::from(u16::from_be_bytes([seg[3], seg[4]]));
            let width = u32::from(u16::from_be_bytes([seg[5], seg[6]]));
            let components = seg[7];
            if width == 0 || height == 0 {
                return Err(StampError::UnsupportedImage(
                    "JPEG frame has zero size".into(),
                ));
            }
            return Ok(SignatureImage {
                format: ImageFormat::Jpeg,
                width,
                height,
                samples: Samples::Dct {
                    data: bytes.to_vec(),
                    components,
                },
            });
        }

        pos += len;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode an RGBA PNG with the given alpha for every pixel
    pub(crate) fn rgba_png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = (0..width * height)
                .flat_map(|i| [(i % 256) as u8, 20, 40, alpha])
                .collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    fn gray_png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&vec![128; (width * height) as usize])
                .unwrap();
        }
        out
    }

    /// Minimal JPEG prefix: SOI, an APP0 segment, then a baseline SOF0
    fn jpeg_header(width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[components, 0x01, 0x11, 0x00]);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    #[test]
    fn test_png_with_transparency_keeps_soft_mask() {
        let image = SignatureImage::from_bytes(&rgba_png(30, 10, 0)).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.dimensions(), (30, 10));
        assert!(image.has_alpha());
    }

    #[test]
    fn test_opaque_png_drops_soft_mask() {
        let image = SignatureImage::from_bytes(&rgba_png(4, 4, 255)).unwrap();
        assert!(!image.has_alpha());
    }

    #[test]
    fn test_grayscale_png_embeds_as_device_gray() {
        let image = SignatureImage::from_bytes(&gray_png(8, 2)).unwrap();
        let mut doc = Document::with_version("1.7");
        let id = image.embed(&mut doc).unwrap();

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceGray"
        );
        assert_eq!(stream.decompressed_content().unwrap().len(), 16);
    }

    #[test]
    fn test_embed_png_adds_smask_reference() {
        let image = SignatureImage::from_bytes(&rgba_png(6, 3, 100)).unwrap();
        let mut doc = Document::with_version("1.7");
        let id = image.embed(&mut doc).unwrap();

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        let smask = stream.dict.get(b"SMask").unwrap().as_reference().unwrap();
        let mask = doc.get_object(smask).unwrap().as_stream().unwrap();
        assert_eq!(mask.decompressed_content().unwrap(), vec![100; 18]);
        assert_eq!(stream.decompressed_content().unwrap().len(), 6 * 3 * 3);
    }

    #[test]
    fn test_jpeg_dimensions_from_frame_header() {
        let image = SignatureImage::from_bytes(&jpeg_header(320, 96, 3)).unwrap();
        assert_eq!(image.format(), ImageFormat::Jpeg);
        assert_eq!(image.dimensions(), (320, 96));

        let mut doc = Document::with_version("1.7");
        let id = image.embed(&mut doc).unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
    }

    #[test]
    fn test_jpeg_without_frame_is_rejected() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(
            SignatureImage::from_bytes(&bytes),
            Err(StampError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(matches!(
            SignatureImage::from_bytes(b"GIF89a......"),
            Err(StampError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_asset_missing() {
        let err = SignatureImage::load(Path::new("/nonexistent/signatures.png")).unwrap_err();
        assert!(matches!(err, StampError::SignatureAssetMissing(_)));
    }
}
