//! Image decoding for `Do` image XObjects and inline images.
//!
//! The interpreter never needs pixels itself: it emits a `DrawImage` with an
//! [`ImageRef`](pdfshapes_core::ImageRef) and attaches whatever the
//! [`ImageDecoder`] returns. [`RawImageDecoder`] covers uncompressed and
//! Flate-compressed samples in the common color spaces.

use std::fmt;

use lopdf::{Dictionary, Object, Stream};
use pdfshapes_core::DecodedImage;

use crate::color_space::ColorSpace;

/// Largest pixel count the default decoder will expand.
const MAX_DECODED_PIXELS: u64 = 1 << 26;

/// An image as found in the content stream.
#[derive(Debug, Clone, Copy)]
pub struct ImageSource<'a> {
    /// Image dictionary with inline-image abbreviations already expanded.
    pub dict: &'a Dictionary,
    /// Stream data, still encoded with the dictionary's `/Filter`.
    pub data: &'a [u8],
    /// Resolved `/ColorSpace`, absent for stencil masks.
    pub color_space: Option<&'a ColorSpace>,
}

/// Turns image samples into RGBA pixels.
pub trait ImageDecoder: Send + Sync + fmt::Debug {
    /// Decode `image`, or return `None` to emit it undecoded.
    fn decode(&self, image: &ImageSource<'_>) -> Option<DecodedImage>;
}

/// Decodes unfiltered and Flate-compressed samples at 1, 2, 4, 8 or 16 bits
/// per component. DCT, JPX, JBIG2 and CCITT data and stencil masks are left
/// undecoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawImageDecoder;

impl ImageDecoder for RawImageDecoder {
    fn decode(&self, image: &ImageSource<'_>) -> Option<DecodedImage> {
        let dict = image.dict;
        if dict_bool(dict, b"ImageMask") {
            return None;
        }
        let space = image.color_space?;
        let width = dict_u32(dict, b"Width")?;
        let height = dict_u32(dict, b"Height")?;
        let bpc = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);
        if width == 0 || height == 0 || !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
            return None;
        }
        if u64::from(width) * u64::from(height) > MAX_DECODED_PIXELS {
            return None;
        }
        let samples = decompress(dict, image.data)?;
        let components = space.component_count().max(1);
        let indexed = matches!(space, ColorSpace::Indexed { .. });
        let max = ((1u32 << bpc) - 1) as f32;

        // rows are padded to whole bytes
        let row_bits = width as usize * components * bpc as usize;
        let row_bytes = row_bits.div_ceil(8);
        if samples.len() < row_bytes * height as usize {
            return None;
        }

        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        let mut pixel = vec![0.0f32; components];
        for row in samples.chunks_exact(row_bytes).take(height as usize) {
            for x in 0..width as usize {
                for (c, value) in pixel.iter_mut().enumerate() {
                    let raw = read_sample(row, (x * components + c) * bpc as usize, bpc);
                    *value = if indexed { raw as f32 } else { raw as f32 / max };
                }
                let [r, g, b] = space.to_rgb(&pixel).to_rgb8();
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }

        Some(DecodedImage {
            width,
            height,
            rgba,
        })
    }
}

/// Undo the filter chain when lopdf supports it. Image-specific codecs are
/// left to richer decoders.
fn decompress(dict: &Dictionary, data: &[u8]) -> Option<Vec<u8>> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Some(data.to_vec());
    };
    let names: Vec<&[u8]> = match filter {
        Object::Name(n) => vec![n.as_slice()],
        Object::Array(arr) => arr.iter().filter_map(|o| o.as_name().ok()).collect(),
        _ => return None,
    };
    let supported = names
        .iter()
        .all(|n| matches!(*n, b"FlateDecode" | b"LZWDecode" | b"ASCIIHexDecode" | b"ASCII85Decode"));
    if !supported {
        return None;
    }
    Stream::new(dict.clone(), data.to_vec())
        .decompressed_content()
        .ok()
}

/// Read a `bpc`-bit big-endian sample starting at bit `offset` of `row`.
fn read_sample(row: &[u8], offset: usize, bpc: u32) -> u32 {
    match bpc {
        8 => u32::from(row[offset / 8]),
        16 => {
            let i = offset / 8;
            (u32::from(row[i]) << 8) | u32::from(row[i + 1])
        }
        _ => {
            let byte = row[offset / 8];
            let shift = 8 - (offset % 8) as u32 - bpc;
            (u32::from(byte) >> shift) & ((1 << bpc) - 1)
        }
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok()? {
        Object::Integer(i) => u32::try_from(*i).ok(),
        Object::Real(f) if *f >= 0.0 => Some(*f as u32),
        _ => None,
    }
}

fn dict_bool(dict: &Dictionary, key: &[u8]) -> bool {
    dict.get(key).ok().and_then(|o| o.as_bool().ok()).unwrap_or(false)
}

/// Expand an inline image dictionary key (`W` → `Width`).
pub fn expand_inline_key(key: &str) -> &str {
    match key {
        "W" => "Width",
        "H" => "Height",
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "F" => "Filter",
        "DP" => "DecodeParms",
        "D" => "Decode",
        "I" => "Interpolate",
        "IM" => "ImageMask",
        other => other,
    }
}

/// Expand an inline image color space or filter abbreviation.
pub fn expand_inline_name(name: &str) -> &str {
    match name {
        "G" => "DeviceGray",
        "RGB" => "DeviceRGB",
        "CMYK" => "DeviceCMYK",
        "I" => "Indexed",
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "LZW" => "LZWDecode",
        "Fl" => "FlateDecode",
        "RL" => "RunLengthDecode",
        "CCF" => "CCITTFaxDecode",
        "DCT" => "DCTDecode",
        other => other,
    }
}
