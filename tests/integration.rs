//! Integration tests for the Folio pipeline.
//!
//! These exercise the public path from JSON input through layout to PDF
//! bytes. They verify:
//! - libraries deserialize, including snake_case block aliases
//! - the walker visits categories and documents in canonical order
//! - tables, titles and image grids paginate as documented
//! - a bad block never aborts the walk
//! - the raster cache is shared across renders of one engine

use std::io::Cursor;

use base64::Engine as _;
use serde_json::{json, Value};

use folio::font::FontSet;
use folio::icons::IconSet;
use folio::layout::{LayoutPage, PageOp};
use folio::model::{Cell, ContentBlock, Library, TableBlock};
use folio::raster::RasterCache;
use folio::render::{render_block, RenderContext};
use folio::style::{Edges, LayoutConfig, PageConfig, PageSize};
use folio::{Engine, FolioError};

// ─── Helpers ────────────────────────────────────────────────────

/// 400 x 600 pages with 50pt margins: a 300 x 500 body.
fn small_layout() -> Value {
    json!({
        "page": {
            "size": { "Custom": { "width": 400.0, "height": 600.0 } },
            "margin": { "top": 50.0, "right": 50.0, "bottom": 50.0, "left": 50.0 }
        }
    })
}

fn small_config() -> LayoutConfig {
    LayoutConfig {
        page: PageConfig {
            size: PageSize::Custom {
                width: 400.0,
                height: 600.0,
            },
            margin: Edges::uniform(50.0),
        },
        ..LayoutConfig::default()
    }
}

fn library(value: Value) -> Library {
    folio::parse_library(&value.to_string()).unwrap()
}

fn doc(title: &str, blocks: Value) -> Value {
    json!({ "title": title, "blocks": blocks })
}

fn text(t: &str) -> Value {
    json!({ "type": "text", "text": t })
}

fn png_uri(width: u32, height: u32, shade: u8) -> String {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, 120, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    )
}

fn all_texts(pages: &[LayoutPage]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

fn contains(bytes: &[u8], needle: &str) -> bool {
    bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
}

// ─── Pipeline ───────────────────────────────────────────────────

#[test]
fn json_library_renders_to_pdf() {
    let input = json!({
        "metadata": { "title": "Field Guide" },
        "layout": small_layout(),
        "categories": [{
            "title": "Getting Started",
            "blocks": [text("Welcome.")],
            "documents": [doc("Install", json!([
                { "type": "list", "items": ["one", "two"] },
                { "type": "code", "code": "make install" },
                { "type": "divider", "dashed": true }
            ]))]
        }]
    });
    let pdf = folio::render_json(&input.to_string()).unwrap();
    assert!(pdf.starts_with(b"%PDF-1.7"));
    assert!(contains(&pdf, "%%EOF"));
    assert!(contains(&pdf, "/Title (Field Guide)"));
    assert!(contains(&pdf, "/Type /Outlines"));
    assert!(contains(&pdf, "/Title (Install)"));
}

#[test]
fn walker_visits_in_canonical_order() {
    let lib = library(json!({
        "layout": small_layout(),
        "categories": [
            {
                "title": "Guides",
                "blocks": [text("guides intro")],
                "documents": [doc("Install", json!([text("install body")]))],
                "categories": [{
                    "title": "Advanced",
                    "documents": [doc("Tuning", json!([text("tuning body")]))]
                }]
            },
            { "title": "Reference", "blocks": [text("reference intro")] }
        ],
        "documents": [doc("Changelog", json!([text("changes")]))]
    }));
    let output = Engine::new().layout(&lib).unwrap();

    let titles: Vec<(&str, u8)> = output
        .outline
        .iter()
        .map(|e| (e.title.as_str(), e.level))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Guides", 1),
            ("Install", 2),
            ("Advanced", 2),
            ("Tuning", 3),
            ("Reference", 1),
            ("Changelog", 1)
        ]
    );

    let body: Vec<String> = all_texts(&output.pages)
        .into_iter()
        .filter(|t| t.ends_with("intro") || t.ends_with("body") || t == "changes")
        .collect();
    assert_eq!(
        body,
        vec!["guides intro", "install body", "tuning body", "reference intro", "changes"]
    );
}

#[test]
fn outline_pages_follow_pagination() {
    let long: Vec<Value> = (0..40).map(|i| text(&format!("paragraph {i} ").repeat(8))).collect();
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [
            doc("First", Value::Array(long.clone())),
            doc("Second", Value::Array(long)),
            doc("Third", json!([text("end")]))
        ]
    }));
    let output = Engine::new().layout(&lib).unwrap();
    assert!(output.pages.len() > 3);
    let pages: Vec<usize> = output.outline.iter().map(|e| e.page).collect();
    assert!(pages.windows(2).all(|w| w[0] < w[1]));
    let third = output.outline.last().unwrap();
    assert!(output.pages[third.page].contains_text("Third"));
}

#[test]
fn unknown_block_does_not_abort_the_walk() {
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [doc("Mixed", json!([
            { "type": "hologram", "text": "?" },
            { "type": "image", "caption": "missing src" },
            text("after the bad blocks")
        ]))]
    }));
    let output = Engine::new().layout(&lib).unwrap();
    let page = &output.pages[0];
    assert!(page.contains_text("Unsupported block: hologram"));
    assert!(page.contains_text("Unsupported block: image"));
    assert!(page.contains_text("after the bad blocks"));
}

#[test]
fn missing_image_becomes_error_box() {
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [doc("Pictures", json!([
            { "type": "image", "src": "nowhere/diagram.png" },
            text("still rendered")
        ]))]
    }));
    let output = Engine::new().layout(&lib).unwrap();
    let texts = all_texts(&output.pages);
    assert!(texts.iter().any(|t| t.contains("Could not render image block")));
    assert!(texts.iter().any(|t| t == "still rendered"));
    assert_eq!(output.pages[0].images().count(), 0);
}

#[test]
fn empty_library_is_one_blank_page() {
    let output = Engine::new().layout(&Library::default()).unwrap();
    assert_eq!(output.pages.len(), 1);
    assert!(output.pages[0].ops.is_empty());

    let pdf = folio::render_json("{}").unwrap();
    assert!(contains(&pdf, "/Type /Pages /Kids [") && contains(&pdf, "/Count 1 >>"));
}

#[test]
fn snake_case_aliases_parse() {
    let lib = library(json!({
        "documents": [doc("Aliases", json!([
            { "type": "message_box", "variant": "success", "text": "ok" },
            { "type": "image_grid", "images": ["a.png"] },
            { "type": "image_compare", "before": "a.png", "after": "b.png", "mode": "side_by_side" },
            { "type": "chart", "chart_type": "line", "labels": ["a"], "datasets": [{ "data": [1] }] }
        ]))]
    }));
    let blocks = &lib.documents[0].blocks;
    assert!(matches!(blocks[0], ContentBlock::MessageBox(_)));
    assert!(matches!(blocks[1], ContentBlock::ImageGrid(_)));
    assert!(matches!(blocks[2], ContentBlock::ImageCompare(_)));
    assert!(matches!(blocks[3], ContentBlock::Chart(_)));
}

#[test]
fn parse_errors_carry_a_hint() {
    let err = folio::parse_library("{\"categories\": [}").unwrap_err();
    assert!(matches!(err, FolioError::Parse { .. }));
    assert!(err.to_string().contains("Hint"));
}

// ─── Pagination scenarios ───────────────────────────────────────

#[test]
fn level_one_title_on_empty_page() {
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [{ "title": "Setup Guide" }]
    }));
    let output = Engine::new().layout(&lib).unwrap();
    let cfg = LayoutConfig::default();
    let entry = &output.outline[0];
    assert_eq!(entry.page, 0);
    assert_eq!(entry.y, 50.0 + cfg.title_top_spacing);
}

#[test]
fn fifty_row_table_follows_the_page_formula() {
    let config = small_config();
    let icons = IconSet::default();
    let cache = RasterCache::new();
    let mut ctx = RenderContext::new(&config, FontSet::default(), &icons, &cache);
    ctx.canvas.move_y(300.0);
    assert_eq!(ctx.canvas.remaining(), 200.0);

    let row = |i: usize| vec![Cell(format!("row {i}")), Cell("1".into()), Cell("ok".into())];
    let table = ContentBlock::Table(TableBlock {
        headers: vec![Cell("Name".into()), Cell("Value".into()), Cell("Notes".into())],
        rows: (0..50).map(row).collect(),
        repeat_header: false,
        column_widths: Vec::new(),
    });
    render_block(&mut ctx, &table, 0).unwrap();

    let body = ctx.canvas.body_height();
    let expected = ((50.0 * 25.0 - 200.0) / body).ceil() as usize + 1;
    let pages = ctx.finish().0;
    assert_eq!(pages.len(), expected);

    let seen: Vec<String> = all_texts(&pages)
        .into_iter()
        .filter(|t| t.starts_with("row "))
        .collect();
    let want: Vec<String> = (0..50).map(|i| format!("row {i}")).collect();
    assert_eq!(seen, want);
}

#[test]
fn seven_image_grid_is_three_by_three() {
    let images: Vec<String> = (0..7).map(|i| png_uri(40, 30, i * 30)).collect();
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [doc("Gallery", json!([{ "type": "imageGrid", "images": images }]))]
    }));
    let output = Engine::new().layout(&lib).unwrap();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for op in output.pages.iter().flat_map(|p| p.images()) {
        if let PageOp::Image { x, y, .. } = op {
            xs.push(x.round() as i64);
            ys.push(y.round() as i64);
        }
    }
    assert_eq!(xs.len(), 7);
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();
    assert_eq!((xs.len(), ys.len()), (3, 3));
    assert_eq!(folio::render::grid_shape(7), (3, 3));
}

// ─── Engine state ───────────────────────────────────────────────

#[test]
fn raster_cache_is_shared_across_renders() {
    let chart = json!({
        "type": "chart",
        "chartType": "bar",
        "labels": ["a", "b"],
        "datasets": [{ "label": "s", "values": [1.0, 2.0] }]
    });
    let first = library(json!({
        "layout": small_layout(),
        "documents": [doc("One", json!([chart.clone()]))]
    }));
    let second = library(json!({
        "layout": small_layout(),
        "documents": [doc("Two", json!([text("intro"), chart]))]
    }));

    let engine = Engine::new();
    engine.render(&first).unwrap();
    let after_first = engine.cache_stats();
    assert_eq!((after_first.hits, after_first.misses), (0, 1));

    engine.render(&second).unwrap();
    let after_second = engine.cache_stats();
    assert_eq!((after_second.hits, after_second.misses, after_second.entries), (1, 1, 1));
}

#[test]
fn repeated_image_is_embedded_once() {
    let uri = png_uri(20, 20, 7);
    let lib = library(json!({
        "layout": small_layout(),
        "documents": [doc("Twice", json!([
            { "type": "image", "src": uri.clone() },
            { "type": "image", "src": uri }
        ]))]
    }));
    let engine = Engine::new();
    let pdf = engine.render(&lib).unwrap();
    let xobjects = pdf
        .windows(b"/Subtype /Image".len())
        .filter(|w| *w == b"/Subtype /Image")
        .count();
    assert_eq!(xobjects, 1);
    assert_eq!(engine.cache_stats().hits, 1);
}
