//! Glyph advance widths for the base-14 faces we ship, taken from the Adobe
//! Core 14 AFM files. Widths are in 1/1000 em.
//!
//! Only the printable ASCII range is tabulated per face; a short list of
//! common WinAnsi punctuation follows, and everything else falls back to the
//! face's average advance.

use super::StandardFont;

/// Helvetica and Helvetica-Oblique, U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold and Helvetica-BoldOblique, U+0020..=U+007E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Metrics for one base-14 face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    ascii: Option<&'static [u16; 95]>,
    /// Used for every glyph of a fixed-pitch face.
    fixed: u16,
    fallback: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    /// Advance width of a character in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let Some(table) = self.ascii else {
            return self.fixed;
        };
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return table[(cp - 0x20) as usize];
        }
        match ch {
            '\u{00A0}' => table[0],
            '\u{2022}' => 350,
            '\u{00B7}' => 278,
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2018}' | '\u{2019}' | '\u{201A}' => 222,
            '\u{201C}' | '\u{201D}' | '\u{201E}' => 333,
            '\u{00D7}' | '\u{00F7}' | '\u{00B1}' => 584,
            '\u{00B9}' | '\u{00B2}' | '\u{00B3}' => 333,
            '\u{00A9}' | '\u{00AE}' => 737,
            '\u{00B0}' => 400,
            _ => self.fallback,
        }
    }

    /// Width of a single character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

impl StandardFont {
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => StandardFontMetrics {
                ascii: Some(&HELVETICA),
                fixed: 0,
                fallback: 556,
                ascender: 718,
                descender: -207,
            },
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                StandardFontMetrics {
                    ascii: Some(&HELVETICA_BOLD),
                    fixed: 0,
                    fallback: 611,
                    ascender: 718,
                    descender: -207,
                }
            }
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierOblique
            | StandardFont::CourierBoldOblique => StandardFontMetrics {
                ascii: None,
                fixed: 600,
                fallback: 600,
                ascender: 629,
                descender: -157,
            },
        }
    }
}
