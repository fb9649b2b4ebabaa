//! Synthetic PDFs for unit tests

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Noisy RGB pattern so JPEG size reacts to quality
pub(crate) fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_F491;
    RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state & 0x3F) as u8;
        image::Rgb([
            ((x * 7) as u8).wrapping_add(noise),
            ((y * 5) as u8).wrapping_add(noise / 2),
            ((x ^ y) as u8).wrapping_add(noise),
        ])
    })
}

pub(crate) fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&DynamicImage::ImageRgb8(noisy_rgb(width, height)))
        .unwrap();
    out
}

pub(crate) enum FixtureImage {
    Jpeg { width: u32, height: u32, quality: u8 },
    FlateGray { width: u32, height: u32 },
    /// Flate with PNG `Up` row filtering (`/Predictor 12`)
    FlateGrayUp { width: u32, height: u32 },
    RawRgb { width: u32, height: u32 },
    /// Declares DCTDecode but carries garbage
    Corrupt,
    Empty,
}

impl FixtureImage {
    pub(crate) fn jpeg(width: u32, height: u32) -> Self {
        FixtureImage::Jpeg {
            width,
            height,
            quality: 100,
        }
    }

    fn into_stream(self) -> Stream {
        let decode_parms = match self {
            FixtureImage::FlateGrayUp { width, .. } => Some(Dictionary::from_iter(vec![
                ("Predictor", Object::Integer(12)),
                ("Colors", Object::Integer(1)),
                ("Columns", Object::Integer(width as i64)),
            ])),
            _ => None,
        };
        let (width, height, color_space, filter, content) = match self {
            FixtureImage::Jpeg {
                width,
                height,
                quality,
            } => (
                width,
                height,
                "DeviceRGB",
                Some("DCTDecode"),
                jpeg_bytes(width, height, quality),
            ),
            FixtureImage::FlateGray { width, height } => (
                width,
                height,
                "DeviceGray",
                Some("FlateDecode"),
                zlib(&gray_samples(width, height)),
            ),
            FixtureImage::FlateGrayUp { width, height } => {
                let samples = gray_samples(width, height);
                let mut filtered = Vec::with_capacity(samples.len() + height as usize);
                let mut prev = vec![0u8; width as usize];
                for row in samples.chunks(width as usize) {
                    filtered.push(2);
                    filtered.extend(row.iter().zip(&prev).map(|(x, up)| x.wrapping_sub(*up)));
                    prev = row.to_vec();
                }
                (
                    width,
                    height,
                    "DeviceGray",
                    Some("FlateDecode"),
                    zlib(&filtered),
                )
            }
            FixtureImage::RawRgb { width, height } => (
                width,
                height,
                "DeviceRGB",
                None,
                noisy_rgb(width, height).into_raw(),
            ),
            FixtureImage::Corrupt => (
                64,
                64,
                "DeviceRGB",
                Some("DCTDecode"),
                b"\xFF\xD8\xFF\xE0 this is not really a jpeg".to_vec(),
            ),
            FixtureImage::Empty => (8, 8, "DeviceRGB", Some("DCTDecode"), Vec::new()),
        };

        let mut dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width as i64)),
            ("Height", Object::Integer(height as i64)),
            ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);
        if let Some(filter) = filter {
            dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
        }
        if let Some(parms) = decode_parms {
            dict.set("DecodeParms", Object::Dictionary(parms));
        }
        let mut stream = Stream::new(dict, content);
        stream.allows_compression = false;
        stream
    }
}

/// Gray ramp that Flate fixtures carry
pub(crate) fn gray_samples(width: u32, height: u32) -> Vec<u8> {
    (0..width * height).map(|i| (i * 37 % 251) as u8).collect()
}

pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builds a document page by page, with images that pages may share
pub(crate) struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    inherited: Option<Dictionary>,
}

impl PdfBuilder {
    pub(crate) fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            inherited: None,
        }
    }

    pub(crate) fn add_image(&mut self, image: FixtureImage) -> ObjectId {
        self.doc.add_object(image.into_stream())
    }

    /// An image stream with a hand-written dictionary
    pub(crate) fn add_image_stream(&mut self, dict: Dictionary, content: Vec<u8>) -> ObjectId {
        self.doc.add_object(Stream::new(dict, content))
    }

    /// A Form XObject (not an image)
    pub(crate) fn add_form(&mut self) -> ObjectId {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Form".to_vec())),
            (
                "BBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(10),
                    Object::Integer(10),
                ]),
            ),
        ]);
        self.doc.add_object(Stream::new(dict, b"0 0 10 10 re f".to_vec()))
    }

    pub(crate) fn add_page(&mut self, xobjects: &[ObjectId]) {
        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(xobject_dict(xobjects)),
        )]);
        self.push_page(Some(resources));
    }

    /// Page with an XObject entry that is a direct object, not a reference
    pub(crate) fn add_page_with_inline_xobject(&mut self) {
        let inline = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
        ]);
        let mut xobjects = Dictionary::new();
        xobjects.set("Inline", Object::Dictionary(inline));
        let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);
        self.push_page(Some(resources));
    }

    /// Page with no `/Resources`; its images live on the page-tree root
    pub(crate) fn add_page_inheriting(&mut self, xobjects: &[ObjectId]) {
        self.inherited = Some(Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(xobject_dict(xobjects)),
        )]));
        self.push_page(None);
    }

    fn push_page(&mut self, resources: Option<Dictionary>) {
        let number = self.page_ids.len() + 1;
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", number).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(resources) = resources {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let mut pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(
                    self.page_ids
                        .iter()
                        .map(|id| Object::Reference(*id))
                        .collect(),
                ),
            ),
        ]);
        if let Some(resources) = self.inherited.take() {
            pages.set("Resources", Object::Dictionary(resources));
        }
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

fn xobject_dict(xobjects: &[ObjectId]) -> Dictionary {
    let mut dict = Dictionary::new();
    for (i, id) in xobjects.iter().enumerate() {
        dict.set(format!("Im{}", i), Object::Reference(*id));
    }
    dict
}

/// Text-only PDF with N pages
pub(crate) fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for _ in 0..num_pages {
        builder.push_page(None);
    }
    builder.build()
}
