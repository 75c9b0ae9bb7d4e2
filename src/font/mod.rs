//! # Font Management
//!
//! A render uses exactly four faces, addressed by [`FontRole`]: regular,
//! italic, bold and monospace. Each role resolves to either one of the base-14
//! PDF fonts (no embedding needed) or a TrueType file measured with
//! ttf-parser and embedded whole by the PDF writer.
//!
//! Measurement always goes through the face's real advance widths. Nothing in
//! the engine assumes fixed-width characters except the Courier tables.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::FolioError;
use crate::style::FontConfig;

/// The four font handles every render carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Regular,
    Italic,
    Bold,
    Mono,
}

impl FontRole {
    pub const ALL: [FontRole; 4] = [
        FontRole::Regular,
        FontRole::Italic,
        FontRole::Bold,
        FontRole::Mono,
    ];

    /// Stable index, used for PDF resource names (`/F1`..`/F4`).
    pub fn index(self) -> usize {
        match self {
            FontRole::Regular => 0,
            FontRole::Italic => 1,
            FontRole::Bold => 2,
            FontRole::Mono => 3,
        }
    }
}

/// The base-14 faces we carry metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let font = match name {
            "Helvetica" | "Arial" | "sans-serif" => Self::Helvetica,
            "Helvetica-Bold" => Self::HelveticaBold,
            "Helvetica-Oblique" | "Helvetica-Italic" => Self::HelveticaOblique,
            "Helvetica-BoldOblique" => Self::HelveticaBoldOblique,
            "Courier" | "monospace" => Self::Courier,
            "Courier-Bold" => Self::CourierBold,
            "Courier-Oblique" => Self::CourierOblique,
            "Courier-BoldOblique" => Self::CourierBoldOblique,
            _ => return None,
        };
        Some(font)
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct TrueTypeMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    pub bbox: [i16; 4],
}

impl TrueTypeMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        let bbox = face.global_bounding_box();
        Some(TrueTypeMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or(face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
        })
    }
}

/// A TrueType face together with the bytes the PDF writer embeds.
#[derive(Debug)]
pub struct TrueTypeFont {
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: TrueTypeMetrics,
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the 14 standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType/OpenType font that is embedded.
    TrueType(Arc<TrueTypeFont>),
}

/// One resolved face: the "measure text width at size" side of the font
/// interface. The embedding side lives in the PDF writer.
#[derive(Debug, Clone)]
pub struct FontFace {
    data: FontData,
}

impl FontFace {
    pub fn standard(font: StandardFont) -> Self {
        Self {
            data: FontData::Standard(font),
        }
    }

    pub fn truetype(name: &str, bytes: Vec<u8>) -> Result<Self, FolioError> {
        let metrics = TrueTypeMetrics::from_font_data(&bytes)
            .ok_or_else(|| FolioError::Font(format!("'{name}' is not a parseable TrueType font")))?;
        Ok(Self {
            data: FontData::TrueType(Arc::new(TrueTypeFont {
                name: name.to_string(),
                data: bytes,
                metrics,
            })),
        })
    }

    pub fn data(&self) -> &FontData {
        &self.data
    }

    /// Width of a single character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        match &self.data {
            FontData::Standard(f) => f.metrics().char_width(ch, font_size),
            FontData::TrueType(tt) => tt.metrics.char_width(ch, font_size),
        }
    }

    /// Measure the width of a string in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        match &self.data {
            FontData::Standard(f) => f.metrics().measure_string(text, font_size),
            FontData::TrueType(tt) => text
                .chars()
                .map(|ch| tt.metrics.char_width(ch, font_size))
                .sum(),
        }
    }

    /// Distance from the top of the em box to the baseline, in points.
    pub fn ascent(&self, font_size: f64) -> f64 {
        match &self.data {
            FontData::Standard(f) => f.metrics().ascender as f64 / 1000.0 * font_size,
            FontData::TrueType(tt) => {
                tt.metrics.ascender as f64 / tt.metrics.units_per_em as f64 * font_size
            }
        }
    }

    /// Depth below the baseline, in points (positive).
    pub fn descent(&self, font_size: f64) -> f64 {
        match &self.data {
            FontData::Standard(f) => -(f.metrics().descender as f64) / 1000.0 * font_size,
            FontData::TrueType(tt) => {
                -(tt.metrics.descender as f64) / tt.metrics.units_per_em as f64 * font_size
            }
        }
    }
}

/// The font handles owned by one render.
#[derive(Debug, Clone)]
pub struct FontSet {
    faces: [FontFace; 4],
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            faces: [
                FontFace::standard(StandardFont::Helvetica),
                FontFace::standard(StandardFont::HelveticaOblique),
                FontFace::standard(StandardFont::HelveticaBold),
                FontFace::standard(StandardFont::Courier),
            ],
        }
    }
}

impl FontSet {
    /// Resolve every role of a [`FontConfig`]. Unknown family names fall back
    /// to the default face for that role with a warning; unreadable font
    /// files are an error.
    pub fn from_config(config: &FontConfig, asset_root: Option<&Path>) -> Result<Self, FolioError> {
        let defaults = FontSet::default();
        let mut faces = defaults.faces.clone();
        let sources = [&config.regular, &config.italic, &config.bold, &config.mono];
        for (slot, source) in faces.iter_mut().zip(sources) {
            if let Some(face) = resolve_source(source, asset_root)? {
                *slot = face;
            }
        }
        Ok(Self { faces })
    }

    pub fn get(&self, role: FontRole) -> &FontFace {
        &self.faces[role.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FontRole, &FontFace)> {
        FontRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

fn resolve_source(source: &str, asset_root: Option<&Path>) -> Result<Option<FontFace>, FolioError> {
    if let Some(std_font) = StandardFont::from_name(source) {
        return Ok(Some(FontFace::standard(std_font)));
    }
    let lower = source.to_ascii_lowercase();
    if lower.ends_with(".ttf") || lower.ends_with(".otf") {
        let path = match asset_root {
            Some(root) if Path::new(source).is_relative() => root.join(source),
            _ => Path::new(source).to_path_buf(),
        };
        let bytes = std::fs::read(&path)
            .map_err(|e| FolioError::Font(format!("failed to read '{}': {}", path.display(), e)))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded")
            .to_string();
        return FontFace::truetype(&name, bytes).map(Some);
    }
    log::warn!("unknown font '{}', keeping the default face", source);
    Ok(None)
}
