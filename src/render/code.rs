//! Code listings.
//!
//! Each section is measured into visual rows first (source lines after tab
//! expansion, hard-wrapped to the body column). Rows are then cut into chunks
//! with [`chunk_ranges`]; every chunk is drawn as its own framed box, so a
//! long listing continues on the next page with its gutter intact.

use super::{truncate_to_width, RenderContext};
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::page_break::{chunk_ranges, BreakRules};
use crate::layout::{BoxStyle, DrawOptions, Placement, Rect, RuleStyle, TextStyle};
use crate::model::{CodeBlock, CodeSection};
use crate::style::{palette, Align};

const TAB: &str = "    ";
const SECTION_GAP: f64 = 6.0;

/// One visual row: a source line or one of its continuations.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    number: Option<usize>,
    text: String,
}

struct Frame {
    style: TextStyle,
    padding: f64,
    gutter: f64,
    body_width: f64,
    header: f64,
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &CodeBlock) -> Result<(), BlockError> {
    let sections = block.all_sections();
    if sections.is_empty() {
        return Err(BlockError::Malformed("code block has no code".to_string()));
    }
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            ctx.canvas.move_y(SECTION_GAP);
        }
        render_section(ctx, section, block.line_numbers)?;
    }
    Ok(())
}

fn expand_tabs(code: &str) -> String {
    code.replace('\t', TAB)
}

fn render_section(ctx: &mut RenderContext<'_>, section: &CodeSection, numbered: bool) -> Result<(), LayoutError> {
    let cfg = ctx.config;
    let style = TextStyle::new(FontRole::Mono, cfg.code_font_size, cfg.code_line_height)
        .color(palette::DARK)
        .preformatted();
    let code = expand_tabs(section.code.trim_end_matches('\n'));
    let source_lines = code.split('\n').count();

    let padding = cfg.code_padding;
    let gutter = if numbered {
        let digits = source_lines.to_string().len();
        ctx.text_width(&"0".repeat(digits), &style) + padding * 1.5
    } else {
        0.0
    };
    let has_header = section.filename.is_some() || section.language.is_some();
    let frame = Frame {
        style,
        padding,
        gutter,
        body_width: (ctx.canvas.content_width() - gutter - 2.0 * padding).max(style.size),
        header: if has_header { ctx.small_style().line_px() + 8.0 } else { 0.0 },
    };

    let rows = measure_rows(ctx, &code, &frame);
    let heights = vec![style.line_px(); rows.len()];
    let overhead = frame.header + 2.0 * padding;
    let total = overhead + heights.iter().sum::<f64>();
    let first_room = match ctx.canvas.ensure_block(total, false) {
        Placement::Split { available } => available,
        Placement::Fits | Placement::NewPage => ctx.canvas.remaining(),
    };
    let ranges = chunk_ranges(
        first_room,
        ctx.canvas.body_height(),
        overhead,
        &heights,
        BreakRules::default(),
    );
    if ranges.len() > 1 {
        log::debug!("code section of {} rows split into {} chunks", rows.len(), ranges.len());
    }

    let mut drawn = 0;
    for range in ranges {
        if range.is_empty() {
            ctx.canvas.break_page();
            continue;
        }
        if drawn > 0 {
            ctx.canvas.break_page();
        }
        let header = (drawn == 0).then_some(section);
        draw_chunk(ctx, &frame, &rows[range], header)?;
        drawn += 1;
    }
    Ok(())
}

fn measure_rows(ctx: &RenderContext<'_>, code: &str, frame: &Frame) -> Vec<Row> {
    let mut rows = Vec::new();
    for (i, line) in code.split('\n').enumerate() {
        let wrapped = ctx.measure(line, &frame.style, frame.body_width);
        for (k, text) in wrapped.lines.into_iter().enumerate() {
            rows.push(Row {
                number: (k == 0).then_some(i + 1),
                text,
            });
        }
    }
    rows
}

fn draw_chunk(
    ctx: &mut RenderContext<'_>,
    frame: &Frame,
    rows: &[Row],
    header: Option<&CodeSection>,
) -> Result<(), LayoutError> {
    let line = frame.style.line_px();
    let header_h = if header.is_some() { frame.header } else { 0.0 };
    let body_h = rows.len() as f64 * line + 2.0 * frame.padding;
    let height = header_h + body_h;

    ctx.canvas.ensure_block(height, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    let width = ctx.canvas.content_width();
    ctx.canvas.draw_box(
        height,
        BoxStyle::filled(palette::CODE_SURFACE)
            .stroke(palette::BORDER, 0.5)
            .radius(3.0),
        DrawOptions::reserved().no_advance(),
    )?;

    if let Some(section) = header.filter(|_| header_h > 0.0) {
        draw_header(ctx, section, top, header_h, frame.padding)?;
    }

    let body_top = top + header_h + frame.padding;
    let rows_h = rows.len() as f64 * line;
    if frame.gutter > 0.0 {
        ctx.canvas.draw_vline(
            frame.gutter,
            top + header_h,
            top + height,
            RuleStyle {
                thickness: 0.5,
                ..RuleStyle::default()
            },
        )?;
        let numbers = frame.style.color(palette::MUTED).align(Align::Right);
        let gutter = Rect::new(left, body_top, frame.gutter - frame.padding / 2.0, rows_h);
        ctx.with_region(gutter, |ctx| -> Result<(), LayoutError> {
            for row in rows {
                match row.number {
                    Some(n) => {
                        ctx.canvas
                            .draw_text(&n.to_string(), &numbers, DrawOptions::reserved())?;
                    }
                    None => ctx.canvas.move_y(line),
                }
            }
            Ok(())
        })??;
    }

    let body = Rect::new(
        left + frame.gutter + frame.padding,
        body_top,
        (width - frame.gutter - 2.0 * frame.padding).max(frame.style.size),
        rows_h,
    );
    ctx.with_region(body, |ctx| -> Result<(), LayoutError> {
        for row in rows {
            ctx.canvas
                .draw_text(&row.text, &frame.style, DrawOptions::reserved())?;
        }
        Ok(())
    })??;

    ctx.canvas.set_cursor_y(top + height);
    Ok(())
}

fn draw_header(
    ctx: &mut RenderContext<'_>,
    section: &CodeSection,
    top: f64,
    height: f64,
    padding: f64,
) -> Result<(), LayoutError> {
    ctx.canvas.draw_box(
        height,
        BoxStyle::filled(palette::HEADER_SURFACE).radius(3.0),
        DrawOptions::at(top),
    )?;
    let small = ctx.small_style();
    let y = top + (height - small.line_px()) / 2.0;
    let inner = ctx.canvas.content_width() - 2.0 * padding;
    if let Some(lang) = &section.language {
        ctx.canvas.draw_text(
            lang,
            &small.align(Align::Right),
            DrawOptions::at(y).offset(padding).width(inner),
        )?;
    }
    if let Some(name) = &section.filename {
        let bold = TextStyle::new(FontRole::Bold, small.size, small.line_height).color(palette::DARK);
        let room = inner * 0.75;
        let label = truncate_to_width(ctx, name, &bold, room);
        ctx.canvas
            .draw_text(&label, &bold, DrawOptions::at(y).offset(padding).width(room))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutPage, PageOp};
    use crate::render::tests::Harness;

    fn block(code: &str, numbered: bool) -> CodeBlock {
        CodeBlock {
            sections: Vec::new(),
            code: Some(code.to_string()),
            language: Some("rust".to_string()),
            filename: Some("main.rs".to_string()),
            line_numbers: numbered,
        }
    }

    fn texts(page: &LayoutPage) -> Vec<String> {
        page.texts().map(str::to_string).collect()
    }

    #[test]
    fn indentation_and_tabs_survive() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render(&mut ctx, &block("fn main() {\n\tprintln!();\n}", true)).unwrap();
        let (pages, _) = ctx.finish();
        let all = texts(&pages[0]);
        assert!(all.contains(&"    println!();".to_string()));
        assert!(all.contains(&"main.rs".to_string()));
        assert!(all.contains(&"rust".to_string()));
        for n in ["1", "2", "3"] {
            assert!(all.contains(&n.to_string()));
        }
    }

    #[test]
    fn continuation_rows_are_unnumbered() {
        let h = Harness::new();
        let ctx = h.ctx();
        let style = TextStyle::new(FontRole::Mono, 9.0, 1.4).preformatted();
        let frame = Frame {
            style,
            padding: 8.0,
            gutter: 20.0,
            body_width: 54.0,
            header: 0.0,
        };
        // 5.4pt per glyph: ten glyphs per row
        let rows = measure_rows(&ctx, "abcdefghijklmnopqrst\nx", &frame);
        let numbers: Vec<Option<usize>> = rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn long_listing_continues_across_pages() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        ctx.canvas.move_y(300.0);
        let code: Vec<String> = (1..=120).map(|i| format!("let x{i} = {i};")).collect();
        render(&mut ctx, &block(&code.join("\n"), true)).unwrap();
        let pages = ctx.finish().0;
        assert!(pages.len() >= 3);
        // every source line drawn exactly once, in order
        let mut seen = Vec::new();
        for page in &pages {
            for t in page.texts() {
                if let Some(rest) = t.strip_prefix("let x") {
                    seen.push(rest.split(' ').next().unwrap().parse::<usize>().unwrap());
                }
            }
        }
        assert_eq!(seen, (1..=120).collect::<Vec<_>>());
        // each page carries its own frame
        for page in &pages {
            assert!(page.ops.iter().any(|op| matches!(op, PageOp::Rect { .. })));
        }
    }

    #[test]
    fn listing_that_fits_stays_in_one_frame() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        ctx.canvas.move_y(100.0);
        render(&mut ctx, &block("a\nb\nc", true)).unwrap();
        let pages = ctx.finish().0;
        assert_eq!(pages.len(), 1);
        let texts = texts(&pages[0]);
        for line in ["a", "b", "c"] {
            assert!(texts.contains(&line.to_string()));
        }
        assert_eq!(texts.iter().filter(|t| t.contains("main.rs")).count(), 1);
    }

    #[test]
    fn chunk_that_cannot_start_here_moves_to_next_page() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        // room for the frame but not two rows
        ctx.canvas.move_y(500.0 - 30.0);
        render(&mut ctx, &block("a\nb\nc\nd", false)).unwrap();
        let pages = ctx.finish().0;
        assert_eq!(pages.len(), 2);
        assert!(texts(&pages[1]).contains(&"a".to_string()));
        assert!(pages[0].texts().next().is_none());
    }

    #[test]
    fn multiple_sections_render_in_order() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = CodeBlock {
            sections: vec![
                CodeSection {
                    filename: Some("a.toml".to_string()),
                    language: None,
                    code: "first".to_string(),
                },
                CodeSection {
                    filename: None,
                    language: None,
                    code: "second".to_string(),
                },
            ],
            code: None,
            language: None,
            filename: None,
            line_numbers: false,
        };
        render(&mut ctx, &block).unwrap();
        let (pages, _) = ctx.finish();
        let all = texts(&pages[0]);
        let first = all.iter().position(|t| t == "first").unwrap();
        let second = all.iter().position(|t| t == "second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_code_block_is_malformed() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = CodeBlock {
            sections: Vec::new(),
            code: None,
            language: None,
            filename: None,
            line_numbers: true,
        };
        assert!(matches!(render(&mut ctx, &block), Err(BlockError::Malformed(_))));
    }
}
