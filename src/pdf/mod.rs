//! # PDF Serializer
//!
//! Takes the laid-out pages and writes a PDF 1.7 file. The writer is
//! hand-rolled: every object is formatted into a byte buffer, then the
//! serializer lays them out with a cross-reference table.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages...
//! xref                <- byte offset of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Text is encoded as WinAnsi. Standard fonts are referenced by name;
//! TrueType fonts are embedded whole as simple fonts with a WinAnsi width
//! table. Characters outside WinAnsi are written as `?`.

mod outline;

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::rc::Rc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::{FontData, FontRole, FontSet, TrueTypeFont};
use crate::image_loader::{ImageData, JpegColorSpace, LoadedImage};
use crate::layout::{LayoutPage, PageOp};
use crate::model::Metadata;
use crate::render::OutlineEntry;
use crate::style::Color;
use outline::OutlineTree;

/// Bezier control distance for a quarter circle.
const KAPPA: f64 = 0.5522847498;

/// Code points for WinAnsi bytes 0x80..=0x9F that differ from Latin-1.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Map a character to its WinAnsi byte.
pub fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    WINANSI_HIGH
        .iter()
        .find(|(_, c)| *c == ch)
        .map(|(b, _)| *b)
}

fn winansi_to_unicode(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        _ => WINANSI_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, c)| *c),
    }
}


/// Encode text for a literal string in a content stream.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match unicode_to_winansi(ch).unwrap_or(b'?') {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b if b >= 0x80 => {
                let _ = write!(out, "\\{b:03o}");
            }
            b => out.push(b as char),
        }
    }
    out
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// A text string for the document catalog: literal when ASCII, UTF-16BE
/// with a byte order mark otherwise.
fn pdf_text_string(s: &str) -> String {
    if s.is_ascii() {
        return format!("({})", escape_pdf_string(s));
    }
    let mut hex = String::from("<FEFF");
    for unit in s.encode_utf16() {
        let _ = write!(hex, "{unit:04X}");
    }
    hex.push('>');
    hex
}

fn rgb(c: Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

fn refs(ids: &[usize]) -> String {
    ids.iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A PDF name built from a font file name.
fn font_name(name: &str, role: FontRole) -> String {
    let clean: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let base = if clean.is_empty() { "Embedded" } else { clean.as_str() };
    format!("{}-{:?}", base, role)
}

fn write_rounded_rect(stream: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
    let r = radius.min(w / 2.0).min(h / 2.0);
    let k = r * KAPPA;
    let _ = writeln!(stream, "{:.2} {:.2} m", x + r, y);
    let _ = writeln!(stream, "{:.2} {:.2} l", x + w - r, y);
    let _ = writeln!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + w - r + k, y, x + w, y + r - k, x + w, y + r
    );
    let _ = writeln!(stream, "{:.2} {:.2} l", x + w, y + h - r);
    let _ = writeln!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h
    );
    let _ = writeln!(stream, "{:.2} {:.2} l", x + r, y + h);
    let _ = writeln!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + r - k, y + h, x, y + h - r + k, x, y + h - r
    );
    let _ = writeln!(stream, "{:.2} {:.2} l", x, y + r);
    let _ = writeln!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x, y + r - k, x + r - k, y, x + r, y
    );
    stream.push_str("h\n");
}

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Object id of each font, indexed by [`FontRole::index`].
    font_ids: [usize; 4],
    /// Image XObjects keyed by the shared allocation they came from.
    image_ids: HashMap<*const LoadedImage, usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict: &str, content: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict, content.len());
        data.extend_from_slice(content);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    /// Reserve an id for an object whose body is filled in later.
    fn reserve(&mut self) -> usize {
        self.push(Vec::new())
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        fonts: &FontSet,
        outline: &[OutlineEntry],
        metadata: &Metadata,
    ) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_ids: [0; 4],
            image_ids: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.reserve();
        builder.reserve();
        builder.reserve();

        for (role, face) in fonts.iter() {
            builder.font_ids[role.index()] = Self::write_font(&mut builder, role, face.data());
        }

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let images = Self::register_images(&mut builder, page);
            let content = Self::build_content_stream(page, &builder.image_ids);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let annots = Self::write_links(&mut builder, page);
            let annots_ref = if annots.is_empty() {
                String::new()
            } else {
                format!(" /Annots [{}]", refs(&annots))
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >>{} >>{} >>",
                page.width,
                page.height,
                content_id,
                Self::font_resources(&builder.font_ids),
                Self::xobject_resources(&images),
                annots_ref,
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        let outline_id = Self::write_outline(&mut builder, outline, &page_ids, pages);
        let mut catalog = String::from("<< /Type /Catalog /Pages 2 0 R");
        if let Some(id) = outline_id {
            let _ = write!(catalog, " /Outlines {id} 0 R /PageMode /UseOutlines");
        }
        catalog.push_str(" >>");
        builder.objects[1].data = catalog.into_bytes();
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            refs(&page_ids),
            page_ids.len()
        )
        .into_bytes();

        let info_id = Self::write_info(&mut builder, metadata);
        log::debug!(
            "wrote {} pages, {} objects, {} images",
            pages.len(),
            builder.objects.len() - 1,
            builder.image_ids.len()
        );
        self.serialize(&builder, info_id)
    }

    /// Build the content stream for one page.
    fn build_content_stream(page: &LayoutPage, images: &HashMap<*const LoadedImage, usize>) -> String {
        let mut stream = String::new();
        for op in &page.ops {
            match op {
                PageOp::Text {
                    x,
                    y,
                    font,
                    size,
                    color,
                    text,
                } => {
                    let _ = writeln!(
                        stream,
                        "BT /F{} {:.2} Tf {} rg {:.2} {:.2} Td ({}) Tj ET",
                        font.index() + 1,
                        size,
                        rgb(*color),
                        x,
                        y,
                        encode_text(text)
                    );
                }
                PageOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                    radius,
                } => {
                    if fill.is_none() && stroke.is_none() {
                        continue;
                    }
                    stream.push_str("q\n");
                    if let Some(fill) = fill {
                        let _ = writeln!(stream, "{} rg", rgb(*fill));
                    }
                    if let Some(stroke) = stroke {
                        let _ = writeln!(stream, "{:.2} w {} RG", stroke.width, rgb(stroke.color));
                    }
                    if *radius > 0.0 {
                        write_rounded_rect(&mut stream, *x, *y, *width, *height, *radius);
                    } else {
                        let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", x, y, width, height);
                    }
                    let paint = match (fill.is_some(), stroke.is_some()) {
                        (true, true) => "B",
                        (true, false) => "f",
                        _ => "S",
                    };
                    let _ = writeln!(stream, "{paint}\nQ");
                }
                PageOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                    dashed,
                } => {
                    let dash = if *dashed { "[3 2] 0 d " } else { "" };
                    let _ = writeln!(
                        stream,
                        "q {:.2} w {} RG {}{:.2} {:.2} m {:.2} {:.2} l S Q",
                        width,
                        rgb(*color),
                        dash,
                        x1,
                        y1,
                        x2,
                        y2
                    );
                }
                PageOp::Image {
                    x,
                    y,
                    width,
                    height,
                    image,
                } => {
                    if let Some(id) = images.get(&Rc::as_ptr(image)) {
                        let _ = writeln!(
                            stream,
                            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im{} Do Q",
                            width, height, x, y, id
                        );
                    }
                }
                PageOp::PushClip {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let _ = writeln!(stream, "q {:.2} {:.2} {:.2} {:.2} re W n", x, y, width, height);
                }
                PageOp::PopClip => stream.push_str("Q\n"),
                PageOp::Link { .. } => {}
            }
        }
        stream
    }

    /// Write one font role. Standard faces are a single dictionary; TrueType
    /// faces add the embedded file and a descriptor.
    fn write_font(builder: &mut PdfBuilder, role: FontRole, data: &FontData) -> usize {
        match data {
            FontData::Standard(font) => builder.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            ),
            FontData::TrueType(tt) => Self::write_truetype(builder, role, tt),
        }
    }

    fn write_truetype(builder: &mut PdfBuilder, role: FontRole, font: &TrueTypeFont) -> usize {
        let metrics = &font.metrics;
        let name = font_name(&font.name, role);
        let compressed = compress_to_vec_zlib(&font.data, 6);
        let file_id = builder.push_stream(
            &format!("/Filter /FlateDecode /Length1 {}", font.data.len()),
            &compressed,
        );

        let scale = 1000.0 / metrics.units_per_em.max(1) as f64;
        let units = |v: i16| (v as f64 * scale).round() as i32;
        let [x_min, y_min, x_max, y_max] = metrics.bbox;
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            name,
            units(x_min),
            units(y_min),
            units(x_max),
            units(y_max),
            if role == FontRole::Italic { -12 } else { 0 },
            units(metrics.ascender),
            units(metrics.descender),
            units(metrics.cap_height),
            if role == FontRole::Bold { 120 } else { 80 },
            file_id,
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        let default = metrics.default_advance as f64 * scale;
        let widths = (32u8..=255)
            .map(|b| {
                let w = winansi_to_unicode(b).map_or(default, |ch| metrics.char_width(ch, 1000.0));
                format!("{}", w.round() as i64)
            })
            .collect::<Vec<_>>()
            .join(" ");
        builder.push(
            format!(
                "<< /Type /Font /Subtype /TrueType /BaseFont /{} \
                 /FirstChar 32 /LastChar 255 /Widths [{}] \
                 /Encoding /WinAnsiEncoding /FontDescriptor {} 0 R >>",
                name, widths, descriptor_id
            )
            .into_bytes(),
        )
    }

    fn font_resources(font_ids: &[usize; 4]) -> String {
        FontRole::ALL
            .iter()
            .map(|role| format!("/F{} {} 0 R", role.index() + 1, font_ids[role.index()]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write XObjects for images first seen on this page and return the ids
    /// of every image the page draws.
    fn register_images(builder: &mut PdfBuilder, page: &LayoutPage) -> Vec<usize> {
        let mut used = Vec::new();
        for op in &page.ops {
            if let PageOp::Image { image, .. } = op {
                let key = Rc::as_ptr(image);
                let id = match builder.image_ids.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = Self::write_image_xobject(builder, image);
                        builder.image_ids.insert(key, id);
                        id
                    }
                };
                if !used.contains(&id) {
                    used.push(id);
                }
            }
        }
        used
    }

    fn xobject_resources(images: &[usize]) -> String {
        if images.is_empty() {
            return String::new();
        }
        let entries = images
            .iter()
            .map(|id| format!("/Im{id} {id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        format!(" /XObject << {entries} >>")
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.data {
            ImageData::Jpeg { bytes, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                        image.pixel_width, image.pixel_height, color_space
                    ),
                    bytes,
                )
            }
            ImageData::Decoded { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let id = builder.push_stream(
                        &format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                            image.pixel_width, image.pixel_height
                        ),
                        &compress_to_vec_zlib(alpha, 6),
                    );
                    format!(" /SMask {id} 0 R")
                });
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                        image.pixel_width,
                        image.pixel_height,
                        smask.unwrap_or_default()
                    ),
                    &compress_to_vec_zlib(rgb, 6),
                )
            }
        }
    }

    /// Write one URI annotation per link on the page.
    fn write_links(builder: &mut PdfBuilder, page: &LayoutPage) -> Vec<usize> {
        let mut ids = Vec::new();
        for op in &page.ops {
            if let PageOp::Link {
                x,
                y,
                width,
                height,
                uri,
            } = op
            {
                let annot = format!(
                    "<< /Type /Annot /Subtype /Link /Rect [{:.2} {:.2} {:.2} {:.2}] \
                     /Border [0 0 0] /A << /S /URI /URI ({}) >> >>",
                    x,
                    y,
                    x + width,
                    y + height,
                    escape_pdf_string(uri)
                );
                ids.push(builder.push(annot.into_bytes()));
            }
        }
        ids
    }

    /// Write the outline root and one item per entry. Returns the root id.
    fn write_outline(
        builder: &mut PdfBuilder,
        entries: &[OutlineEntry],
        page_ids: &[usize],
        pages: &[LayoutPage],
    ) -> Option<usize> {
        let tree = OutlineTree::build(entries);
        let (first, last) = (tree.first?, tree.last?);
        let root_id = builder.reserve();
        let item_id = |i: usize| root_id + 1 + i;

        for (i, (entry, node)) in entries.iter().zip(&tree.nodes).enumerate() {
            debug_assert_eq!(builder.objects.len(), item_id(i));
            let page = entry.page.min(pages.len().saturating_sub(1));
            let mut dict = format!(
                "<< /Title {} /Parent {} 0 R",
                pdf_text_string(&entry.title),
                node.parent.map_or(root_id, item_id)
            );
            if let Some(prev) = node.prev {
                let _ = write!(dict, " /Prev {} 0 R", item_id(prev));
            }
            if let Some(next) = node.next {
                let _ = write!(dict, " /Next {} 0 R", item_id(next));
            }
            if let (Some(f), Some(l)) = (node.first, node.last) {
                let _ = write!(
                    dict,
                    " /First {} 0 R /Last {} 0 R /Count {}",
                    item_id(f),
                    item_id(l),
                    node.count
                );
            }
            if let (Some(page_id), Some(layout)) = (page_ids.get(page), pages.get(page)) {
                let _ = write!(
                    dict,
                    " /Dest [{} 0 R /XYZ 0 {:.2} null]",
                    page_id,
                    layout.height - entry.y
                );
            }
            dict.push_str(" >>");
            builder.push(dict.into_bytes());
        }

        builder.objects[root_id].data = format!(
            "<< /Type /Outlines /First {} 0 R /Last {} 0 R /Count {} >>",
            item_id(first),
            item_id(last),
            entries.len()
        )
        .into_bytes();
        Some(root_id)
    }

    fn write_info(builder: &mut PdfBuilder, metadata: &Metadata) -> usize {
        let mut info = String::from("<< ");
        let fields = [
            ("Title", metadata.title.as_deref()),
            ("Author", metadata.author.as_deref()),
            ("Subject", metadata.subject.as_deref()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} {} ", key, pdf_text_string(value));
            }
        }
        let creator = metadata.creator.as_deref().unwrap_or("Folio");
        let _ = write!(
            info,
            "/Creator {} /Producer (Folio {}) >>",
            pdf_text_string(creator),
            env!("CARGO_PKG_VERSION")
        );
        builder.push(info.into_bytes())
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = writeln!(output, "{i} 0 obj");
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = writeln!(output, "{offset:010} 00000 n ");
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_id,
            xref_offset
        );
        output
    }
}
