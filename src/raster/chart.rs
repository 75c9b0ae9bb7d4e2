//! Chart plot rasterization.
//!
//! Only the plot area is rasterized: bars, lines, areas, wedges and the
//! value grid. Titles, category labels, the value scale and the legend are
//! drawn as vector text by the chart renderer, which relies on the geometry
//! helpers here to line its labels up with the plot.

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::RasterError;
use crate::image_loader::{ImageData, LoadedImage};
use crate::model::{ChartBlock, ChartType};
use crate::style::{palette, Color};

/// Largest raster edge, in pixels.
pub const MAX_EDGE_PX: u32 = 8192;

/// Fraction of the plot height kept clear above and below the data.
pub const PLOT_PAD: f32 = 0.04;

/// Inner radius of a doughnut as a fraction of the outer.
const DOUGHNUT_HOLE: f32 = 0.55;

/// Color for dataset `i`: its own, else the default series palette.
pub fn series_color(chart: &ChartBlock, i: usize) -> Color {
    chart
        .datasets
        .get(i)
        .and_then(|d| d.color)
        .unwrap_or(palette::SERIES[i % palette::SERIES.len()])
}

/// Legend entries in drawing order. Pie and doughnut charts label slices;
/// everything else labels datasets.
pub fn legend(chart: &ChartBlock) -> Vec<(String, Color)> {
    if chart.chart_type.is_radial() {
        chart
            .labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), palette::SERIES[i % palette::SERIES.len()]))
            .collect()
    } else {
        chart
            .datasets
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.label.is_empty())
            .map(|(i, d)| (d.label.clone(), series_color(chart, i)))
            .collect()
    }
}

/// Number of categories along the x axis.
pub fn category_count(chart: &ChartBlock) -> usize {
    if chart.labels.is_empty() {
        chart.datasets.first().map_or(0, |d| d.values.len())
    } else {
        chart.labels.len()
    }
}

/// The plotted value range, always including zero.
pub fn value_range(chart: &ChartBlock) -> (f64, f64) {
    let values = chart.datasets.iter().flat_map(|d| d.values.iter().copied());
    let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi - lo < f64::EPSILON {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

/// Reject charts that can't be drawn meaningfully.
pub fn validate(chart: &ChartBlock) -> Result<(), RasterError> {
    if chart.datasets.iter().all(|d| d.values.is_empty()) {
        return Err(RasterError::EmptyData);
    }
    if chart
        .datasets
        .iter()
        .flat_map(|d| d.values.iter())
        .any(|v| !v.is_finite())
    {
        return Err(RasterError::NonFinite);
    }
    if chart.chart_type.is_radial() {
        let total: f64 = chart.datasets[0].values.iter().map(|v| v.max(0.0)).sum();
        if total <= 0.0 {
            return Err(RasterError::EmptyData);
        }
        return Ok(());
    }
    let expected = category_count(chart);
    for d in &chart.datasets {
        if d.values.len() != expected {
            return Err(RasterError::SeriesLength {
                dataset: d.label.clone(),
                expected,
                found: d.values.len(),
            });
        }
    }
    Ok(())
}

/// Render the plot area to a `width_px` x `height_px` opaque raster.
pub fn rasterize(chart: &ChartBlock, width_px: u32, height_px: u32) -> Result<LoadedImage, RasterError> {
    let invalid = RasterError::InvalidSize {
        width: width_px,
        height: height_px,
    };
    if width_px == 0 || height_px == 0 || width_px > MAX_EDGE_PX || height_px > MAX_EDGE_PX {
        return Err(invalid);
    }
    validate(chart)?;

    let mut pixmap = Pixmap::new(width_px, height_px).ok_or(invalid)?;
    pixmap.fill(tiny_skia::Color::WHITE);

    match chart.chart_type {
        ChartType::Bar => draw_bars(&mut pixmap, chart),
        ChartType::Line => draw_lines(&mut pixmap, chart, false),
        ChartType::Area => draw_lines(&mut pixmap, chart, true),
        ChartType::Pie => draw_wedges(&mut pixmap, chart, 0.0),
        ChartType::Doughnut => draw_wedges(&mut pixmap, chart, DOUGHNUT_HOLE),
    }

    Ok(to_image(&pixmap))
}

fn paint(color: Color, alpha: u8) -> Paint<'static> {
    let [r, g, b, _] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, alpha);
    paint.anti_alias = true;
    paint
}

/// Maps data values to pixel rows.
struct Scale {
    lo: f64,
    hi: f64,
    top: f32,
    height: f32,
}

impl Scale {
    fn new(chart: &ChartBlock, pixmap: &Pixmap) -> Self {
        let (lo, hi) = value_range(chart);
        let h = pixmap.height() as f32;
        Self {
            lo,
            hi,
            top: h * PLOT_PAD,
            height: h * (1.0 - 2.0 * PLOT_PAD),
        }
    }

    fn y(&self, v: f64) -> f32 {
        self.top + ((self.hi - v) / (self.hi - self.lo)) as f32 * self.height
    }
}

fn hline(pixmap: &mut Pixmap, y: f32, color: Color, width: f32) {
    let mut pb = PathBuilder::new();
    pb.move_to(0.0, y);
    pb.line_to(pixmap.width() as f32, y);
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(color, 255), &stroke, Transform::identity(), None);
    }
}

fn draw_grid(pixmap: &mut Pixmap, scale: &Scale) {
    let thin = (pixmap.height() as f32 / 400.0).max(1.0);
    for i in 0..=4 {
        let v = scale.lo + (scale.hi - scale.lo) * i as f64 / 4.0;
        hline(pixmap, scale.y(v), palette::BORDER, thin);
    }
    hline(pixmap, scale.y(0.0), palette::MUTED, thin * 1.5);
}

fn draw_bars(pixmap: &mut Pixmap, chart: &ChartBlock) {
    let scale = Scale::new(chart, pixmap);
    draw_grid(pixmap, &scale);

    let n = category_count(chart).max(1);
    let step = pixmap.width() as f32 / n as f32;
    let group = step * 0.7;
    let bar = group / chart.datasets.len().max(1) as f32;
    let base = scale.y(0.0);

    for (j, dataset) in chart.datasets.iter().enumerate() {
        let fill = paint(series_color(chart, j), 255);
        for (i, &v) in dataset.values.iter().enumerate() {
            let x = step * (i as f32 + 0.5) - group / 2.0 + bar * j as f32;
            let y = scale.y(v);
            let (top, h) = if y < base { (y, base - y) } else { (base, y - base) };
            if let Some(rect) = tiny_skia::Rect::from_xywh(x, top, bar * 0.9, h) {
                pixmap.fill_rect(rect, &fill, Transform::identity(), None);
            }
        }
    }
}

fn draw_lines(pixmap: &mut Pixmap, chart: &ChartBlock, filled: bool) {
    let scale = Scale::new(chart, pixmap);
    draw_grid(pixmap, &scale);

    let n = category_count(chart).max(1);
    let step = pixmap.width() as f32 / n as f32;
    let base = scale.y(0.0);
    let width = (pixmap.height() as f32 / 100.0).max(2.0);
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for (j, dataset) in chart.datasets.iter().enumerate() {
        let color = series_color(chart, j);
        let points: Vec<(f32, f32)> = dataset
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (step * (i as f32 + 0.5), scale.y(v)))
            .collect();
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            continue;
        };

        if filled {
            let mut pb = PathBuilder::new();
            pb.move_to(first.0, base);
            for &(x, y) in &points {
                pb.line_to(x, y);
            }
            pb.line_to(last.0, base);
            pb.close();
            if let Some(path) = pb.finish() {
                pixmap.fill_path(&path, &paint(color, 90), FillRule::Winding, Transform::identity(), None);
            }
        }

        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for &(x, y) in &points[1..] {
            pb.line_to(x, y);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint(color, 255), &stroke, Transform::identity(), None);
        }
        for &(x, y) in &points {
            if let Some(dot) = PathBuilder::from_circle(x, y, width * 1.4) {
                pixmap.fill_path(&dot, &paint(color, 255), FillRule::Winding, Transform::identity(), None);
            }
        }
    }
}

/// Polygonal arc from `start` to `end` radians.
fn arc_points(cx: f32, cy: f32, r: f32, start: f32, end: f32) -> Vec<(f32, f32)> {
    let segments = (((end - start).abs() / (2.0_f32.to_radians())).ceil() as usize).max(2);
    (0..=segments)
        .map(|k| {
            let a = start + (end - start) * k as f32 / segments as f32;
            (cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

fn wedge(cx: f32, cy: f32, outer: f32, inner: f32, start: f32, end: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let rim = arc_points(cx, cy, outer, start, end);
    if inner > 0.0 {
        let hole = arc_points(cx, cy, inner, end, start);
        let (x0, y0) = rim[0];
        pb.move_to(x0, y0);
        for &(x, y) in rim.iter().skip(1).chain(hole.iter()) {
            pb.line_to(x, y);
        }
    } else {
        pb.move_to(cx, cy);
        for &(x, y) in &rim {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

fn draw_wedges(pixmap: &mut Pixmap, chart: &ChartBlock, hole: f32) {
    let values: Vec<f64> = chart.datasets[0].values.iter().map(|v| v.max(0.0)).collect();
    let total: f64 = values.iter().sum();
    let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let outer = w.min(h) / 2.0 * (1.0 - 2.0 * PLOT_PAD);
    let inner = outer * hole;
    let separator = Stroke {
        width: (h / 200.0).max(1.0),
        ..Stroke::default()
    };

    let mut angle = -std::f32::consts::FRAC_PI_2;
    for (i, v) in values.iter().enumerate() {
        if *v <= 0.0 {
            continue;
        }
        let sweep = (*v / total) as f32 * std::f32::consts::TAU;
        if let Some(path) = wedge(cx, cy, outer, inner, angle, angle + sweep) {
            let color = palette::SERIES[i % palette::SERIES.len()];
            pixmap.fill_path(&path, &paint(color, 255), FillRule::Winding, Transform::identity(), None);
            pixmap.stroke_path(&path, &paint(Color::WHITE, 255), &separator, Transform::identity(), None);
        }
        angle += sweep;
    }
}

fn to_image(pixmap: &Pixmap) -> LoadedImage {
    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    LoadedImage {
        pixel_width: pixmap.width(),
        pixel_height: pixmap.height(),
        data: ImageData::Decoded { rgb, alpha: None },
    }
}
