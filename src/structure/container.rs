//! Thin read-only view over a parsed PDF: info dictionary, page resources,
//! content operations and embedded image streams.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Parent chains longer than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

pub struct PdfContainer {
    doc: Document,
}

/// One image XObject as seen from a page's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub object_id: ObjectId,
}

pub fn format_object_id(id: ObjectId) -> String {
    format!("{} {} R", id.0, id.1)
}

impl PdfContainer {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).context("failed to parse PDF container")?;
        Ok(Self { doc })
    }

    /// Page numbers (1-based) to page object ids, in page order.
    pub fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    /// Text layer of every page, pages separated by newlines.
    pub fn text(&self) -> Result<String> {
        let numbers: Vec<u32> = self.pages().keys().copied().collect();
        if numbers.is_empty() {
            return Ok(String::new());
        }
        self.doc
            .extract_text(&numbers)
            .context("failed to extract PDF text layer")
    }

    /// A text entry of the trailer `Info` dictionary. `None` when the entry
    /// (or the dictionary) is absent.
    pub fn info_entry(&self, key: &str) -> Option<String> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let info = self.dict_of(info)?;
        match self.deref(info.get(key.as_bytes()).ok()?) {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }

    pub fn page_operations(&self, page_id: ObjectId) -> Result<Vec<Operation>> {
        let raw = self
            .doc
            .get_page_content(page_id)
            .with_context(|| format!("failed to read content of page {}", format_object_id(page_id)))?;
        let content = Content::decode(&raw)
            .with_context(|| format!("failed to decode content of page {}", format_object_id(page_id)))?;
        Ok(content.operations)
    }

    /// A resource category (`XObject`, `Font`, ...) of a page, following the
    /// `Parent` chain for inherited resources.
    pub fn page_resource(&self, page_id: ObjectId, category: &[u8]) -> Option<&Dictionary> {
        let mut node = self.doc.get_object(page_id).ok().and_then(|o| self.dict_of(o));
        for _ in 0..MAX_TREE_DEPTH {
            let dict = node?;
            if let Some(resources) = dict.get(b"Resources").ok().and_then(|r| self.dict_of(r)) {
                return resources.get(category).ok().and_then(|c| self.dict_of(c));
            }
            node = dict.get(b"Parent").ok().and_then(|p| self.dict_of(p));
        }
        None
    }

    /// Image XObjects a page can paint, by resource name.
    pub fn page_images(&self, page_id: ObjectId) -> Vec<ImageRef> {
        let Some(xobjects) = self.page_resource(page_id, b"XObject") else {
            return Vec::new();
        };
        xobjects
            .iter()
            .filter_map(|(name, object)| {
                let Object::Reference(id) = object else {
                    return None;
                };
                let stream = self.stream(*id)?;
                is_image(stream).then(|| ImageRef {
                    name: String::from_utf8_lossy(name).into_owned(),
                    object_id: *id,
                })
            })
            .collect()
    }

    /// Resource name to `(BaseFont, is_composite)` for a page.
    pub fn page_fonts(&self, page_id: ObjectId) -> BTreeMap<String, (String, bool)> {
        let Some(fonts) = self.page_resource(page_id, b"Font") else {
            return BTreeMap::new();
        };
        fonts
            .iter()
            .filter_map(|(name, object)| {
                let font = self.dict_of(object)?;
                let base = match font.get(b"BaseFont").ok().map(|o| self.deref(o)) {
                    Some(Object::Name(base)) => String::from_utf8_lossy(base).into_owned(),
                    _ => String::from_utf8_lossy(name).into_owned(),
                };
                let composite = matches!(
                    font.get(b"Subtype").ok().map(|o| self.deref(o)),
                    Some(Object::Name(subtype)) if subtype.as_slice() == b"Type0"
                );
                Some((String::from_utf8_lossy(name).into_owned(), (base, composite)))
            })
            .collect()
    }

    pub fn stream(&self, id: ObjectId) -> Option<&Stream> {
        match self.doc.get_object(id).ok()? {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Every distinct image object reachable from a page, in first-seen order.
    pub fn all_images(&self) -> Vec<ObjectId> {
        let mut seen = Vec::new();
        for page_id in self.pages().values() {
            for image in self.page_images(*page_id) {
                if !seen.contains(&image.object_id) {
                    seen.push(image.object_id);
                }
            }
        }
        seen
    }

    /// Width and height declared by an image stream.
    pub fn image_size(&self, id: ObjectId) -> Option<(u32, u32)> {
        let dict = &self.stream(id)?.dict;
        let width = self.integer(dict, b"Width")?;
        let height = self.integer(dict, b"Height")?;
        Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
    }

    pub fn is_jpeg(&self, id: ObjectId) -> bool {
        self.stream(id)
            .is_some_and(|stream| self.filters(&stream.dict).iter().any(|f| f == b"DCTDecode"))
    }

    /// Decode an image XObject. JPEG streams and 8-bit Flate/raw gray or RGB
    /// samples are supported.
    pub fn decode_image(&self, id: ObjectId) -> Result<DynamicImage> {
        let stream = self
            .stream(id)
            .ok_or_else(|| anyhow!("object {} is not a stream", format_object_id(id)))?;
        let filters = self.filters(&stream.dict);

        if filters.iter().any(|f| f == b"DCTDecode") {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .with_context(|| format!("failed to decode JPEG image {}", format_object_id(id)));
        }

        if filters.iter().any(|f| f != b"FlateDecode") {
            bail!("unsupported image filter on {}", format_object_id(id));
        }

        let (width, height) = self
            .image_size(id)
            .ok_or_else(|| anyhow!("image {} has no size", format_object_id(id)))?;
        if self.integer(&stream.dict, b"BitsPerComponent") != Some(8) {
            bail!("image {} is not 8 bits per component", format_object_id(id));
        }
        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .with_context(|| format!("failed to inflate image {}", format_object_id(id)))?
        };

        let color_space = match stream.dict.get(b"ColorSpace").ok().map(|o| self.deref(o)) {
            Some(Object::Name(name)) => name.clone(),
            _ => Vec::new(),
        };
        match color_space.as_slice() {
            b"DeviceRGB" => RgbImage::from_raw(width, height, samples)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| anyhow!("RGB sample count mismatch in {}", format_object_id(id))),
            b"DeviceGray" => GrayImage::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| anyhow!("gray sample count mismatch in {}", format_object_id(id))),
            other => bail!(
                "unsupported color space {} on {}",
                String::from_utf8_lossy(other),
                format_object_id(id)
            ),
        }
    }

    fn filters(&self, dict: &Dictionary) -> Vec<Vec<u8>> {
        match dict.get(b"Filter").ok().map(|o| self.deref(o)) {
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| match self.deref(item) {
                    Object::Name(name) => Some(name.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn integer(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        match self.deref(dict.get(key).ok()?) {
            Object::Integer(value) => Some(*value),
            Object::Real(value) => Some(*value as i64),
            _ => None,
        }
    }

    fn deref<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    fn dict_of<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match self.deref(object) {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }
}

fn is_image(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype.as_slice() == b"Image")
}

/// PDF text strings are UTF-16BE with a byte-order mark, or PDFDocEncoding,
/// which agrees with Latin-1 on every printable character used in practice.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => char::decode_utf16(
            rest.chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect(),
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Number of `%%EOF` markers in the raw file. Each incremental save
/// appends one.
pub fn count_eof_markers(bytes: &[u8]) -> u32 {
    const MARKER: &[u8] = b"%%EOF";
    let count = bytes.windows(MARKER.len()).filter(|w| *w == MARKER).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf16_and_latin1_strings() {
        let utf16 = [0xFE, 0xFF, 0x00, b'G', 0x00, 0xE9];
        assert_eq!(decode_text_string(&utf16), "Gé");
        assert_eq!(decode_text_string(b"Acrobat \xe9"), "Acrobat é");
    }

    #[test]
    fn counts_eof_markers() {
        assert_eq!(count_eof_markers(b"%PDF-1.4 ... %%EOF\n"), 1);
        assert_eq!(count_eof_markers(b"%PDF-1.4 %%EOF\n more %%EOF\n"), 2);
        assert_eq!(count_eof_markers(b"no marker"), 0);
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(PdfContainer::parse(b"definitely not a pdf").is_err());
    }
}
