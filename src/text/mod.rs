//! # Text Measurement
//!
//! Line breaking and height measurement against real glyph advances.
//!
//! The algorithm is deliberately simple and predictable, because every
//! renderer measures before it reserves space and the measurement has to
//! match what is later drawn:
//!
//! 1. Split on explicit newlines. Every forced break is its own line, blank
//!    lines included.
//! 2. Inside a paragraph, greedily pack whitespace-delimited words while
//!    `width(line + " " + word) <= max_width`.
//! 3. A single token wider than `max_width` is cut at the longest character
//!    prefix that fits (binary search), repeatedly. A prefix of one character
//!    is always accepted, so a glyph wider than the line still terminates.

use crate::font::FontFace;

/// Result of wrapping a string.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Height of one line in points (`font_size * line_height`).
    pub line_height: f64,
    /// Total height in points (`lines.len() * line_height`).
    pub height: f64,
}

impl WrappedText {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Widest line as measured with the same face and size.
    pub fn max_width(&self, face: &FontFace, font_size: f64) -> f64 {
        self.lines
            .iter()
            .map(|l| face.measure(l, font_size))
            .fold(0.0, f64::max)
    }
}

/// Tolerance for floating-point comparison against `max_width`.
const EPSILON: f64 = 1e-9;

/// Wrap `text` to `max_width` and report the lines and total height.
///
/// `line_height` is a multiplier of `font_size`.
pub fn measure_and_wrap(
    text: &str,
    face: &FontFace,
    font_size: f64,
    max_width: f64,
    line_height: f64,
) -> WrappedText {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        wrap_paragraph(paragraph, face, font_size, max_width, &mut lines);
    }
    let per_line = font_size * line_height;
    WrappedText {
        height: lines.len() as f64 * per_line,
        line_height: per_line,
        lines,
    }
}

/// Wrap `text` without touching its whitespace: every newline is a break,
/// runs of spaces survive, and a line wider than `max_width` is cut at the
/// longest fitting character prefix. Used for code.
pub fn wrap_preformatted(
    text: &str,
    face: &FontFace,
    font_size: f64,
    max_width: f64,
    line_height: f64,
) -> WrappedText {
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let mut rest = line.strip_suffix('\r').unwrap_or(line);
        let mut was_cut = false;
        while !rest.is_empty() && face.measure(rest, font_size) > max_width + EPSILON {
            let cut = longest_fitting_prefix(rest, face, font_size, max_width);
            lines.push(rest[..cut].to_string());
            rest = &rest[cut..];
            was_cut = true;
        }
        if !(was_cut && rest.is_empty()) {
            lines.push(rest.to_string());
        }
    }
    let per_line = font_size * line_height;
    WrappedText {
        height: lines.len() as f64 * per_line,
        line_height: per_line,
        lines,
    }
}

fn wrap_paragraph(
    paragraph: &str,
    face: &FontFace,
    font_size: f64,
    max_width: f64,
    out: &mut Vec<String>,
) {
    let fits = |s: &str| face.measure(s, font_size) <= max_width + EPSILON;
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if !current.is_empty() {
            let candidate = format!("{current} {word}");
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            out.push(std::mem::take(&mut current));
        }

        // `current` is empty: the word starts a line, splitting if it must.
        let mut rest = word;
        while !rest.is_empty() && !fits(rest) {
            let cut = longest_fitting_prefix(rest, face, font_size, max_width);
            out.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        current.push_str(rest);
    }

    // A whitespace-only or empty paragraph still occupies one line.
    if !current.is_empty() || paragraph.split_whitespace().next().is_none() {
        out.push(current);
    }
}

/// Byte length of the longest prefix of `token` whose width fits, never less
/// than one character.
fn longest_fitting_prefix(token: &str, face: &FontFace, font_size: f64, max_width: f64) -> usize {
    let boundaries: Vec<usize> = token
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(token.len()))
        .collect();

    // boundaries[k] is the byte end of the first k+1 characters.
    let (mut lo, mut hi) = (0usize, boundaries.len() - 1);
    if face.measure(&token[..boundaries[0]], font_size) > max_width + EPSILON {
        return boundaries[0];
    }
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if face.measure(&token[..boundaries[mid]], font_size) <= max_width + EPSILON {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    boundaries[lo]
}
