//! # Image Loading and Decoding
//!
//! Turns an image `src` into something the PDF writer can embed. Sources are
//! tried in order: a `data:image/...;base64,` URI, a file resolved against
//! the library's asset root, then raw base64. Remote URLs are refused; layout
//! never touches the network.
//!
//! JPEG bytes pass through untouched (DCTDecode). PNG and WebP are decoded
//! to RGB with a separate alpha plane for the SMask.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::error::AssetError;

/// A decoded image ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub data: ImageData,
}

impl LoadedImage {
    /// Natural size in points, assuming 96 px per inch.
    pub fn natural_size(&self) -> (f64, f64) {
        (
            self.pixel_width as f64 * 72.0 / 96.0,
            self.pixel_height as f64 * 72.0 / 96.0,
        )
    }

    /// Height over width.
    pub fn aspect(&self) -> f64 {
        if self.pixel_width == 0 {
            1.0
        } else {
            self.pixel_height as f64 / self.pixel_width as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Raw JPEG bytes, embedded with DCTDecode.
    Jpeg {
        bytes: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// width * height * 3 RGB bytes, plus one alpha byte per pixel when any
    /// pixel is not fully opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Resolves `src` strings for one library.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    root: Option<PathBuf>,
}

impl AssetResolver {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Stable identity of a source for caching. Files resolve to their full
    /// path so two libraries with different roots never collide.
    pub fn cache_identity(&self, src: &str) -> String {
        if is_remote(src) || src.starts_with("data:") {
            return src.to_string();
        }
        self.path_for(src).to_string_lossy().into_owned()
    }

    /// Where a local `src` would live on disk.
    pub fn path_for(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Check that a local media file exists without reading it. Remote URLs
    /// pass through; they are linked, not embedded.
    pub fn check_exists(&self, src: &str) -> Result<(), AssetError> {
        if is_remote(src) {
            return Ok(());
        }
        if self.path_for(src).is_file() {
            Ok(())
        } else {
            Err(AssetError::NotFound {
                src: src.to_string(),
            })
        }
    }

    pub fn load_image(&self, src: &str) -> Result<LoadedImage, AssetError> {
        let bytes = self.read_bytes(src)?;
        decode_image_bytes(src, &bytes)
    }

    fn read_bytes(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(AssetError::NotFound { src: String::new() });
        }
        if let Some(rest) = src.strip_prefix("data:") {
            let (_, payload) = rest.split_once(',').ok_or_else(|| AssetError::Decode {
                src: abbreviate(src),
                reason: "data URI is missing its comma".to_string(),
            })?;
            return base64_decode(src, payload);
        }
        if is_remote(src) {
            return Err(AssetError::Remote {
                src: src.to_string(),
            });
        }

        let path = self.path_for(src);
        if path.is_file() {
            log::trace!("reading image {}", path.display());
            return std::fs::read(&path).map_err(|source| AssetError::Read {
                src: src.to_string(),
                source,
            });
        }
        if looks_like_base64(src) {
            return base64_decode(src, src);
        }
        Err(AssetError::NotFound {
            src: src.to_string(),
        })
    }
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Raw base64 has no path separators we'd expect in a filename with an
/// extension, and is long enough to carry an image header.
fn looks_like_base64(src: &str) -> bool {
    src.len() >= 16
        && !src.contains('.')
        && src
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'\n' | b'\r'))
}

fn abbreviate(src: &str) -> String {
    if src.len() <= 48 {
        return src.to_string();
    }
    let mut end = 48;
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &src[..end])
}

fn base64_decode(src: &str, payload: &str) -> Result<Vec<u8>, AssetError> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| AssetError::Decode {
            src: abbreviate(src),
            reason: format!("invalid base64: {e}"),
        })
}

/// Sniff the format from magic bytes and decode accordingly.
pub fn decode_image_bytes(src: &str, data: &[u8]) -> Result<LoadedImage, AssetError> {
    let fail = |reason: String| AssetError::Decode {
        src: abbreviate(src),
        reason,
    };
    if data.len() < 4 {
        return Err(fail("image data too short".to_string()));
    }
    match image::guess_format(data) {
        Ok(image::ImageFormat::Jpeg) => decode_jpeg(data).map_err(fail),
        Ok(image::ImageFormat::Png) | Ok(image::ImageFormat::WebP) => {
            decode_to_rgb(data).map_err(fail)
        }
        Ok(other) => Err(fail(format!("unsupported image format {other:?}"))),
        Err(_) => Err(fail(
            "unrecognized image data (expected JPEG, PNG or WebP)".to_string(),
        )),
    }
}

/// Read the header only; the bytes are embedded as-is.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| format!("failed to read JPEG header: {e}"))?;
    Ok(LoadedImage {
        pixel_width: width,
        pixel_height: height,
        data: ImageData::Jpeg {
            bytes: data.to_vec(),
            color_space: jpeg_color_space(data),
        },
    })
}

/// Walk the JPEG markers to the start-of-frame and read its component count.
fn jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + len;
    }
    JpegColorSpace::DeviceRGB
}

fn decode_to_rgb(data: &[u8]) -> Result<LoadedImage, String> {
    let img = image::load_from_memory(data).map_err(|e| format!("decode failed: {e}"))?;
    Ok(from_rgba(img.to_rgba8()))
}

/// Split an RGBA buffer into the writer's RGB + optional alpha layout.
pub fn from_rgba(rgba: image::RgbaImage) -> LoadedImage {
    let (width, height) = rgba.dimensions();
    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    let mut translucent = false;
    for px in rgba.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px[3]);
        translucent |= px[3] != 255;
    }
    LoadedImage {
        pixel_width: width,
        pixel_height: height,
        data: ImageData::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
    }
}
