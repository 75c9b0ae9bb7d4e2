//! # Style and Configuration
//!
//! Value types shared by every layer (colors, edges, page sizes) and the
//! [`LayoutConfig`] that carries spacing and typography decisions. Per-block
//! theming is deliberately absent: renderers read a handful of numbers from
//! here and a small fixed palette, nothing more.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// 8-bit channels, used by the chart rasterizer.
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b), c(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Colors may be written as `"#1e40af"` or `{ "r": .., "g": .., "b": .. }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgb {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Hex(s) => Color::hex(&s),
            ColorRepr::Rgb { r, g, b, a } => Color { r, g, b, a },
        }
    }
}

/// The fixed palette renderers draw with.
pub mod palette {
    use super::Color;

    pub const TEXT: Color = Color::rgb(0.13, 0.14, 0.16);
    pub const MUTED: Color = Color::rgb(0.42, 0.44, 0.48);
    pub const BORDER: Color = Color::rgb(0.82, 0.84, 0.87);
    pub const SURFACE: Color = Color::rgb(0.96, 0.97, 0.98);
    pub const CODE_SURFACE: Color = Color::rgb(0.95, 0.96, 0.97);
    pub const HEADER_SURFACE: Color = Color::rgb(0.90, 0.92, 0.95);
    pub const ACCENT: Color = Color::rgb(0.15, 0.39, 0.92);
    pub const DARK: Color = Color::rgb(0.09, 0.10, 0.12);

    /// Series colors used when a chart dataset doesn't name one.
    pub const SERIES: [Color; 8] = [
        Color::rgb(0.23, 0.51, 0.96),
        Color::rgb(0.94, 0.27, 0.27),
        Color::rgb(0.13, 0.77, 0.37),
        Color::rgb(0.98, 0.75, 0.14),
        Color::rgb(0.55, 0.36, 0.96),
        Color::rgb(0.93, 0.29, 0.60),
        Color::rgb(0.08, 0.72, 0.65),
        Color::rgb(0.98, 0.45, 0.09),
    ];
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Page geometry for every page of one output document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub size: PageSize,

    /// Page margins in points (1/72 inch).
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(54.0) // ~0.75 inch
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}


/// Horizontal alignment inside the active region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Which face to use for each font role. Values are either a base-14 family
/// name (`"Helvetica-Bold"`, `"Courier"`) or a path to a `.ttf`/`.otf` file,
/// resolved against `assetRoot` when relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    #[serde(default = "default_regular")]
    pub regular: String,
    #[serde(default = "default_italic")]
    pub italic: String,
    #[serde(default = "default_bold")]
    pub bold: String,
    #[serde(default = "default_mono")]
    pub mono: String,
}

fn default_regular() -> String {
    "Helvetica".to_string()
}
fn default_italic() -> String {
    "Helvetica-Oblique".to_string()
}
fn default_bold() -> String {
    "Helvetica-Bold".to_string()
}
fn default_mono() -> String {
    "Courier".to_string()
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: default_regular(),
            italic: default_italic(),
            bold: default_bold(),
            mono: default_mono(),
        }
    }
}

/// Spacing and typography for one render. Every field has a default, so an
/// empty `"layout": {}` object is valid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page: PageConfig,
    pub fonts: FontConfig,
    /// Directory that relative image, audio and font paths resolve against.
    pub asset_root: Option<PathBuf>,

    pub base_font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Vertical gap after every non-title block.
    pub block_spacing: f64,

    /// Font sizes for title levels 1 through 6.
    pub title_sizes: [f64; 6],
    pub title_line_height: f64,
    pub title_top_spacing: f64,
    pub title_bottom_spacing: f64,
    /// Extra room a title demands below itself so it never ends a page alone.
    pub title_keep_with_next: f64,

    pub small_font_size: f64,

    pub table_font_size: f64,
    pub table_line_height: f64,
    pub table_cell_padding: f64,

    pub code_font_size: f64,
    pub code_line_height: f64,
    pub code_padding: f64,

    pub chart_height: f64,
    /// Raster pixels per point for charts.
    pub chart_scale: f64,

    pub grid_gap: f64,
    /// Height of the placeholder drawn for a block that failed to render.
    pub placeholder_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            fonts: FontConfig::default(),
            asset_root: None,
            base_font_size: 11.0,
            line_height: 1.45,
            block_spacing: 10.0,
            title_sizes: [24.0, 19.0, 16.0, 14.0, 12.5, 11.5],
            title_line_height: 1.25,
            title_top_spacing: 12.0,
            title_bottom_spacing: 6.0,
            title_keep_with_next: 32.0,
            small_font_size: 9.0,
            table_font_size: 10.0,
            table_line_height: 1.5,
            table_cell_padding: 5.0,
            code_font_size: 9.0,
            code_line_height: 1.4,
            code_padding: 8.0,
            chart_height: 200.0,
            chart_scale: 2.0,
            grid_gap: 8.0,
            placeholder_height: 48.0,
        }
    }
}

impl LayoutConfig {
    /// Font size for a title level; levels outside 1..=6 are clamped.
    pub fn title_size(&self, level: u8) -> f64 {
        let idx = level.clamp(1, 6) as usize - 1;
        self.title_sizes[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex_and_object() {
        let c: Color = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.0));
        let c: Color = serde_json::from_str(r#"{"r": 0, "g": 0.5, "b": 1}"#).unwrap();
        assert_eq!(c.a, 1.0);
        assert_eq!(c.g, 0.5);
    }

    #[test]
    fn short_hex() {
        assert_eq!(Color::hex("#fff"), Color::WHITE);
    }

    #[test]
    fn empty_layout_config_uses_defaults() {
        let cfg: LayoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, LayoutConfig::default());
    }

    #[test]
    fn partial_layout_config() {
        let cfg: LayoutConfig = serde_json::from_str(
            r#"{"page": {"size": "Letter"}, "blockSpacing": 4}"#,
        )
        .unwrap();
        assert_eq!(cfg.page.size, PageSize::Letter);
        assert_eq!(cfg.page.margin, Edges::uniform(54.0));
        assert_eq!(cfg.block_spacing, 4.0);
    }

    #[test]
    fn custom_page_size() {
        let cfg: PageConfig =
            serde_json::from_str(r#"{"size": {"Custom": {"width": 300, "height": 400}}}"#).unwrap();
        assert_eq!(cfg.size.dimensions(), (300.0, 400.0));
        assert_eq!(cfg.margin, Edges::uniform(54.0));
    }

    #[test]
    fn title_size_clamps_level() {
        let cfg = LayoutConfig::default();
        assert_eq!(cfg.title_size(0), 24.0);
        assert_eq!(cfg.title_size(9), 11.5);
    }
}
