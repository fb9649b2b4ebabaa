//! Image decode/encode capability
//!
//! The engine only talks to [`ImageCodec`]. [`JpegCodec`] is the default
//! implementation: it reads DCT streams and raw 8-bit Gray/RGB samples, and
//! always writes baseline JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};

use crate::error::CodecError;
use crate::quality::QualityFactor;

/// Channel layout of a decoded pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelColor {
    Gray,
    Rgb,
}

impl PixelColor {
    pub fn channels(self) -> usize {
        match self {
            PixelColor::Gray => 1,
            PixelColor::Rgb => 3,
        }
    }

    /// Device color space name describing this layout
    pub fn pdf_color_space(self) -> &'static [u8] {
        match self {
            PixelColor::Gray => b"DeviceGray",
            PixelColor::Rgb => b"DeviceRGB",
        }
    }

    fn from_components(components: u8) -> Option<Self> {
        match components {
            1 => Some(PixelColor::Gray),
            3 => Some(PixelColor::Rgb),
            _ => None,
        }
    }
}

/// Decoded 8-bit pixels, row-major, no padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub color: PixelColor,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, color: PixelColor, data: Vec<u8>) -> Result<Self, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::Decode(format!(
                "invalid dimensions {}x{}",
                width, height
            )));
        }
        let expected = sample_len(width, height, color)?;
        if data.len() != expected {
            return Err(CodecError::Decode(format!(
                "expected {} bytes of pixel data, got {}",
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color,
            data,
        })
    }
}

/// How the stored bytes handed to [`ImageCodec::decode`] are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// A complete JPEG bitstream
    Dct,
    /// Bare samples, already stripped of any lossless stream filter
    Raw,
}

/// What the image dictionary declares about its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHints {
    pub encoding: SourceEncoding,
    pub width: u32,
    pub height: u32,
    /// Color components per sample, when the color space pins it down
    pub components: Option<u8>,
    pub bits_per_component: u8,
}

pub trait ImageCodec {
    fn decode(&self, bytes: &[u8], hints: &ImageHints) -> Result<PixelBuffer, CodecError>;

    fn encode(&self, pixels: &PixelBuffer, quality: QualityFactor) -> Result<Vec<u8>, CodecError>;
}

/// Default codec: any supported input, baseline JPEG output
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    fn decode(&self, bytes: &[u8], hints: &ImageHints) -> Result<PixelBuffer, CodecError> {
        match hints.encoding {
            SourceEncoding::Dct => decode_jpeg(bytes),
            SourceEncoding::Raw => decode_samples(bytes, hints),
        }
    }

    fn encode(&self, pixels: &PixelBuffer, quality: QualityFactor) -> Result<Vec<u8>, CodecError> {
        let color_type = match pixels.color {
            PixelColor::Gray => ColorType::L8,
            PixelColor::Rgb => ColorType::Rgb8,
        };

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut out), quality.encoder_quality())
            .write_image(&pixels.data, pixels.width, pixels.height, color_type.into())
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out)
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let (width, height, color, data) = if image.color().has_color() {
        let rgb = image.to_rgb8();
        let (w, h) = rgb.dimensions();
        (w, h, PixelColor::Rgb, rgb.into_raw())
    } else {
        let gray = image.to_luma8();
        let (w, h) = gray.dimensions();
        (w, h, PixelColor::Gray, gray.into_raw())
    };

    PixelBuffer::new(width, height, color, data)
}

/// Bytes of 8-bit samples for a `width` x `height` image
fn sample_len(width: u32, height: u32, color: PixelColor) -> Result<usize, CodecError> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|n| n.checked_mul(color.channels()))
        .ok_or_else(|| {
            CodecError::Decode(format!("image dimensions {}x{} overflow", width, height))
        })
}

fn decode_samples(bytes: &[u8], hints: &ImageHints) -> Result<PixelBuffer, CodecError> {
    if hints.bits_per_component != 8 {
        return Err(CodecError::Unsupported(format!(
            "{} bits per component",
            hints.bits_per_component
        )));
    }
    let color = hints
        .components
        .and_then(PixelColor::from_components)
        .ok_or_else(|| CodecError::Unsupported("color space is not Gray or RGB".into()))?;

    let expected = sample_len(hints.width, hints.height, color)?;
    if bytes.len() < expected {
        return Err(CodecError::Decode(format!(
            "sample data truncated: {} of {} bytes",
            bytes.len(),
            expected
        )));
    }

    PixelBuffer::new(hints.width, hints.height, color, bytes[..expected].to_vec())
}
