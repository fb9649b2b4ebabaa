//! Flate stream decoding for image samples
//!
//! lopdf refuses to decompress image streams, so the samples are inflated
//! here and any PNG row predictor named in `/DecodeParms` is undone.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::CodecError;

/// `/DecodeParms` entries that matter for undoing a predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

/// Inflate a zlib stream and undo its predictor
pub fn decode_flate(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>, CodecError> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut inflated)
        .map_err(|e| CodecError::Decode(format!("flate: {}", e)))?;

    match params.predictor {
        1 => Ok(inflated),
        10..=15 => undo_png_predictor(&inflated, params),
        other => Err(CodecError::Unsupported(format!("predictor {}", other))),
    }
}

fn undo_png_predictor(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>, CodecError> {
    let row_bytes = params
        .colors
        .checked_mul(params.columns)
        .and_then(|n| n.checked_mul(params.bits_per_component))
        .map(|bits| bits.div_ceil(8))
        .filter(|&n| n > 0)
        .ok_or_else(|| CodecError::Decode("invalid predictor row size".into()))?;
    let bpp = (params.colors * params.bits_per_component / 8).max(1);

    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];
    let mut row = vec![0u8; row_bytes];

    for chunk in data.chunks(row_bytes + 1) {
        // A short trailing row is padding
        if chunk.len() < row_bytes + 1 {
            break;
        }
        let (filter, encoded) = (chunk[0], &chunk[1..]);
        for i in 0..row_bytes {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(CodecError::Decode(format!("png row filter {}", other)));
                }
            };
            row[i] = encoded[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&row);
        std::mem::swap(&mut prev, &mut row);
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
