//! Object-graph access over a parsed PDF
//!
//! `PdfDocument` owns the lopdf object table. Pages and resource sets only
//! hold object ids into that table, so several pages can point at the same
//! image object and all of them observe a replaced payload.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::codec::{ImageHints, PixelColor, SourceEncoding};
use crate::error::{CodecError, ImageError, ShrinkError};
use crate::flate::{decode_flate, PredictorParams};

/// Reference into the object table
pub type ObjectRef = ObjectId;

/// Page-tree nodes deeper than this are treated as malformed
const MAX_INHERITANCE_DEPTH: usize = 32;

/// One page of the document (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub id: ObjectId,
}

/// What an object-table entry turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Image,
    Other,
}

/// A named XObject entry of a page's resource dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    /// `None` for inline (direct) objects, which cannot be shared
    pub target: Option<ObjectRef>,
}

/// XObject resources visible to a page, in dictionary order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    entries: Vec<ResourceEntry>,
}

impl ResourceSet {
    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stored bytes of one image, ready for the codec
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub hints: ImageHints,
    /// Size of the stream as it sits in the file
    pub stored_len: usize,
}

/// Freshly encoded JPEG replacing an image payload
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color: PixelColor,
}

#[derive(Debug)]
pub struct PdfDocument {
    inner: Document,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, ShrinkError> {
        let inner =
            Document::load_mem(bytes).map_err(|e| ShrinkError::ParseError(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_document(inner: Document) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn into_inner(self) -> Document {
        self.inner
    }

    pub fn save(&mut self) -> Result<Vec<u8>, ShrinkError> {
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| ShrinkError::SerializeError(e.to_string()))?;
        Ok(buffer)
    }

    /// Pages in document order
    pub fn pages(&self) -> Vec<Page> {
        self.inner
            .get_pages()
            .into_iter()
            .map(|(number, id)| Page { number, id })
            .collect()
    }

    pub fn page_count(&self) -> u32 {
        self.inner.get_pages().len() as u32
    }

    /// XObject resources of a page, inherited from the page tree when the
    /// page itself has no `/Resources`
    pub fn resources(&self, page: Page) -> ResourceSet {
        let Some(resources) = self.page_resources(page.id) else {
            return ResourceSet::default();
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.as_dictionary(obj))
        else {
            return ResourceSet::default();
        };

        let entries = xobjects
            .iter()
            .map(|(name, value)| ResourceEntry {
                name: String::from_utf8_lossy(name).into_owned(),
                target: value.as_reference().ok(),
            })
            .collect();

        ResourceSet { entries }
    }

    /// Classify an object-table entry; `None` when the reference dangles
    pub fn resolve(&self, reference: ObjectRef) -> Option<ObjectKind> {
        match self.inner.get_object(reference).ok()? {
            Object::Stream(stream) if name_of(&stream.dict, b"Subtype") == Some(&b"Image"[..]) => {
                Some(ObjectKind::Image)
            }
            _ => Some(ObjectKind::Other),
        }
    }

    /// Read an image's stored bytes and the hints needed to decode them
    pub fn image_payload(&self, reference: ObjectRef) -> Result<ImagePayload, ImageError> {
        let stream = match self.inner.get_object(reference) {
            Ok(Object::Stream(stream)) => stream,
            _ => return Err(ImageError::Unresolvable(reference)),
        };
        if stream.content.is_empty() {
            return Err(ImageError::EmptyPayload(reference));
        }

        let dict = &stream.dict;
        if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
            return Err(CodecError::Unsupported("stencil image mask".into()).into());
        }

        let filters = filter_names(dict);
        let (encoding, bytes) = match filters.as_slice() {
            [] => (SourceEncoding::Raw, stream.content.clone()),
            [single] if is_dct(single) => (SourceEncoding::Dct, stream.content.clone()),
            [single] if is_flate(single) => {
                let params = self.predictor_params(dict);
                (SourceEncoding::Raw, decode_flate(&stream.content, &params)?)
            }
            other => {
                let names: Vec<String> = other
                    .iter()
                    .map(|n| String::from_utf8_lossy(n).into_owned())
                    .collect();
                return Err(CodecError::Unsupported(format!("filter {}", names.join(", "))).into());
            }
        };

        let components = match dict.get(b"ColorSpace") {
            Ok(color_space) => Some(
                self.color_components(color_space)
                    .ok_or_else(|| CodecError::Unsupported("color space".into()))?,
            ),
            Err(_) => None,
        };
        if matches!(components, Some(n) if n != 1 && n != 3) {
            return Err(CodecError::Unsupported("color space is not Gray or RGB".into()).into());
        }

        let bits_per_component = match dict.get(b"BitsPerComponent") {
            Ok(obj) => obj
                .as_i64()
                .ok()
                .and_then(|n| u8::try_from(n).ok())
                .filter(|&n| n > 0)
                .ok_or_else(|| CodecError::Unsupported("invalid /BitsPerComponent".into()))?,
            Err(_) => 8,
        };
        let hints = ImageHints {
            encoding,
            width: dimension(dict, b"Width")?,
            height: dimension(dict, b"Height")?,
            components,
            bits_per_component,
        };

        if bytes.is_empty() {
            return Err(ImageError::EmptyPayload(reference));
        }

        Ok(ImagePayload {
            bytes,
            hints,
            stored_len: stream.content.len(),
        })
    }

    /// Swap an image's payload and rewrite the dictionary so it describes
    /// the new JPEG bytes
    pub fn replace_image_payload(
        &mut self,
        reference: ObjectRef,
        encoded: EncodedImage,
    ) -> Result<(), ImageError> {
        let previous_components = match self.inner.get_object(reference) {
            Ok(Object::Stream(stream)) => stream
                .dict
                .get(b"ColorSpace")
                .ok()
                .and_then(|cs| self.color_components(cs)),
            _ => return Err(ImageError::Unresolvable(reference)),
        };

        let stream = self
            .inner
            .get_object_mut(reference)
            .and_then(Object::as_stream_mut)
            .map_err(|_| ImageError::Unresolvable(reference))?;

        let dict = &mut stream.dict;
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        dict.remove(b"DecodeParms");
        dict.set("Width", Object::Integer(encoded.width as i64));
        dict.set("Height", Object::Integer(encoded.height as i64));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set(
            "ColorSpace",
            Object::Name(encoded.color.pdf_color_space().to_vec()),
        );
        // A Decode array only stays meaningful if the component count held
        if previous_components != Some(encoded.color.channels() as u8) {
            dict.remove(b"Decode");
        }

        stream.set_content(encoded.bytes);
        stream.allows_compression = false;
        Ok(())
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.inner.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(resources) = node.get(b"Resources") {
                return self.as_dictionary(resources);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.inner.get_dictionary(parent).ok()?;
        }
        None
    }

    fn as_dictionary<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match object {
            Object::Dictionary(dict) => Some(dict),
            Object::Reference(id) => self.inner.get_dictionary(*id).ok(),
            _ => None,
        }
    }

    /// Predictor settings of a single Flate filter; a one-element array
    /// form is accepted as well
    fn predictor_params(&self, dict: &Dictionary) -> PredictorParams {
        let mut params = PredictorParams::default();
        let parms = match dict.get(b"DecodeParms") {
            Ok(Object::Array(items)) => items.first().and_then(|obj| self.as_dictionary(obj)),
            Ok(obj) => self.as_dictionary(obj),
            Err(_) => None,
        };
        let Some(parms) = parms else {
            return params;
        };

        if let Some(predictor) = integer_of(parms, b"Predictor") {
            params.predictor = predictor;
        }
        if let Some(colors) = count_of(parms, b"Colors") {
            params.colors = colors;
        }
        if let Some(bits) = count_of(parms, b"BitsPerComponent") {
            params.bits_per_component = bits;
        }
        if let Some(columns) = count_of(parms, b"Columns") {
            params.columns = columns;
        }
        params
    }

    /// Number of color components a color space declares, if it is one we
    /// can describe as Gray or RGB after re-encoding
    fn color_components(&self, color_space: &Object) -> Option<u8> {
        let color_space = match color_space {
            Object::Reference(id) => self.inner.get_object(*id).ok()?,
            other => other,
        };
        match color_space {
            Object::Name(name) => device_components(name),
            Object::Array(items) => {
                let family = items.first()?.as_name().ok()?;
                match family {
                    b"ICCBased" => {
                        let profile = items.get(1)?.as_reference().ok()?;
                        let stream = self.inner.get_object(profile).ok()?.as_stream().ok()?;
                        integer_of(&stream.dict, b"N").and_then(|n| u8::try_from(n).ok())
                    }
                    b"CalGray" => Some(1),
                    b"CalRGB" => Some(3),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn device_components(name: &[u8]) -> Option<u8> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(1),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(3),
        b"DeviceCMYK" | b"CMYK" => Some(4),
        _ => None,
    }
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    dict.get(key).ok().and_then(|obj| obj.as_name().ok())
}

fn integer_of(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|obj| obj.as_i64().ok())
}

fn count_of(dict: &Dictionary, key: &[u8]) -> Option<usize> {
    integer_of(dict, key).and_then(|n| usize::try_from(n).ok())
}

/// A required, positive image dimension
fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, CodecError> {
    integer_of(dict, key)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            CodecError::Unsupported(format!("invalid /{}", String::from_utf8_lossy(key)))
        })
}

fn filter_names(dict: &Dictionary) -> Vec<&[u8]> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

fn is_dct(name: &[u8]) -> bool {
    name == b"DCTDecode" || name == b"DCT"
}

fn is_flate(name: &[u8]) -> bool {
    name == b"FlateDecode" || name == b"Fl"
}
