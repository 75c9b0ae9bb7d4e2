//! Charts: a rasterized plot framed by vector text.
//!
//! The plot raster comes from the shared [`crate::raster::RasterCache`], so
//! the same chart at the same size is only drawn once per engine. A plot
//! that can't be rasterized leaves a placeholder in the space reserved for
//! it; the title and legend still render.

use super::{message, truncate_to_width, RenderContext};
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::{BoxStyle, DrawOptions, TextStyle};
use crate::model::ChartBlock;
use crate::raster::chart::{category_count, legend, value_range, PLOT_PAD};
use crate::style::{palette, Align, Color};

const SWATCH: f64 = 8.0;
const LEGEND_GAP: f64 = 12.0;
const GUTTER_PAD: f64 = 4.0;

/// Axis label for a value: integers without decimals, others to one place.
pub(crate) fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// Label, swatch color and total width of one legend entry.
type LegendItem = (String, Color, f64);

/// Legend entries packed into lines no wider than `width`.
fn legend_lines(
    ctx: &RenderContext<'_>,
    entries: &[(String, Color)],
    style: &TextStyle,
    width: f64,
) -> Vec<Vec<LegendItem>> {
    let mut lines: Vec<Vec<LegendItem>> = Vec::new();
    let mut used = 0.0;
    for (label, color) in entries {
        let text = truncate_to_width(ctx, label, style, (width - SWATCH - 4.0).max(style.size));
        let w = SWATCH + 4.0 + ctx.text_width(&text, style);
        match lines.last_mut() {
            Some(line) if used + LEGEND_GAP + w <= width => {
                used += LEGEND_GAP + w;
                line.push((text, *color, w));
            }
            _ => {
                used = w;
                lines.push(vec![(text, *color, w)]);
            }
        }
    }
    lines
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &ChartBlock) -> Result<(), BlockError> {
    let cfg = ctx.config;
    let content_w = ctx.canvas.content_width();
    let small = ctx.small_style();
    let title_style = TextStyle::new(FontRole::Bold, cfg.base_font_size, cfg.title_line_height)
        .color(palette::DARK)
        .align(Align::Center);

    let radial = block.chart_type.is_radial();
    let (lo, hi) = value_range(block);
    let scale_labels = [format_value(hi), format_value(lo)];
    let gutter = if radial {
        0.0
    } else {
        scale_labels
            .iter()
            .map(|l| ctx.text_width(l, &small))
            .fold(0.0, f64::max)
            + GUTTER_PAD
    };
    let plot_w = content_w - gutter;
    let plot_h = cfg.chart_height;
    if plot_w <= 0.0 {
        return Err(BlockError::Malformed("no room for the chart plot".to_string()));
    }

    let title = block.title.as_deref().filter(|t| !t.is_empty());
    let title_h = title.map_or(0.0, |t| ctx.measure(t, &title_style, content_w).height + 4.0);
    let categories = if radial { 0 } else { category_count(block) };
    let labels_h = if categories > 0 && !block.labels.is_empty() {
        small.line_px() + 2.0
    } else {
        0.0
    };
    let entries = legend(block);
    let lines = legend_lines(ctx, &entries, &small, content_w);
    let legend_h = if lines.is_empty() {
        0.0
    } else {
        6.0 + lines.len() as f64 * small.line_px()
    };

    ctx.canvas
        .ensure_block(title_h + plot_h + labels_h + legend_h, true);
    if let Some(t) = title {
        ctx.canvas.draw_text(t, &title_style, DrawOptions::reserved())?;
        ctx.canvas.move_y(4.0);
    }

    let plot_top = ctx.canvas.cursor_y();
    let w_px = (plot_w * cfg.chart_scale).round() as u32;
    let h_px = (plot_h * cfg.chart_scale).round() as u32;
    match ctx.cache.chart(block, w_px, h_px) {
        Ok(raster) => {
            ctx.canvas.draw_image(
                &raster,
                plot_w,
                plot_h,
                Align::Left,
                DrawOptions::reserved().offset(gutter),
            )?;
        }
        Err(e) => {
            log::warn!(
                "{} chart in {} could not be rasterized: {}",
                block.chart_type.name(),
                ctx.breadcrumb(),
                e
            );
            message::placeholder(ctx, gutter, plot_w, plot_h, &format!("Chart unavailable: {e}"))?;
            ctx.canvas.move_y(plot_h);
        }
    }

    if !radial {
        let pad = plot_h * PLOT_PAD as f64;
        let half = small.line_px() / 2.0;
        let right = small.align(Align::Right);
        let opts = |y: f64| DrawOptions::at(y).width(gutter - GUTTER_PAD);
        ctx.canvas
            .draw_text(&scale_labels[0], &right, opts(plot_top + pad - half))?;
        ctx.canvas
            .draw_text(&scale_labels[1], &right, opts(plot_top + plot_h - pad - half))?;
    }

    if labels_h > 0.0 {
        ctx.canvas.move_y(2.0);
        let y = ctx.canvas.cursor_y();
        let step = plot_w / categories as f64;
        let centered = small.align(Align::Center);
        for (i, label) in block.labels.iter().take(categories).enumerate() {
            let text = truncate_to_width(ctx, label, &centered, step - 2.0);
            ctx.canvas.draw_text(
                &text,
                &centered,
                DrawOptions::at(y).offset(gutter + i as f64 * step).width(step),
            )?;
        }
        ctx.canvas.move_y(small.line_px());
    }

    if !lines.is_empty() {
        ctx.canvas.move_y(6.0);
        draw_legend(ctx, &lines, &small)?;
    }
    Ok(())
}

fn draw_legend(
    ctx: &mut RenderContext<'_>,
    lines: &[Vec<LegendItem>],
    style: &TextStyle,
) -> Result<(), LayoutError> {
    let content_w = ctx.canvas.content_width();
    let line_h = style.line_px();
    for line in lines {
        let y = ctx.canvas.cursor_y();
        let total: f64 = line.iter().map(|(_, _, w)| w).sum::<f64>()
            + LEGEND_GAP * (line.len() - 1) as f64;
        let mut x = (content_w - total) / 2.0;
        for (text, color, w) in line {
            ctx.canvas.draw_box(
                SWATCH,
                BoxStyle::filled(*color).radius(1.5),
                DrawOptions::at(y + (line_h - SWATCH) / 2.0).offset(x).width(SWATCH),
            )?;
            ctx.canvas.draw_text(
                text,
                style,
                DrawOptions::at(y).offset(x + SWATCH + 4.0).width(w - SWATCH),
            )?;
            x += w + LEGEND_GAP;
        }
        ctx.canvas.set_cursor_y(y + line_h);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageOp;
    use crate::model::{ChartType, Dataset};
    use crate::render::tests::Harness;

    fn sales() -> ChartBlock {
        ChartBlock {
            chart_type: ChartType::Bar,
            title: Some("Quarterly sales".to_string()),
            labels: vec!["Q1".into(), "Q2".into(), "Q3".into(), "Q4".into()],
            datasets: vec![
                Dataset {
                    label: "2023".to_string(),
                    values: vec![10.0, 20.0, 15.0, 30.0],
                    color: None,
                },
                Dataset {
                    label: "2024".to_string(),
                    values: vec![12.0, 22.0, 18.0, 35.0],
                    color: None,
                },
            ],
        }
    }

    #[test]
    fn chart_draws_plot_labels_and_legend() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render(&mut ctx, &sales()).unwrap();
        let ops = ctx.canvas.current_ops();
        assert_eq!(ops.iter().filter(|op| matches!(op, PageOp::Image { .. })).count(), 1);
        let (pages, _) = ctx.finish();
        for text in ["Quarterly sales", "Q1", "Q4", "2023", "2024", "35", "0"] {
            assert!(pages[0].contains_text(text), "missing {text}");
        }
    }

    #[test]
    fn same_chart_twice_hits_the_cache() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render(&mut ctx, &sales()).unwrap();
        render(&mut ctx, &sales()).unwrap();
        let stats = h.cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        // the second chart doesn't fit under the first and starts page two
        let (pages, _) = ctx.finish();
        assert_eq!(pages.len(), 2);
        let images: Vec<_> = pages
            .iter()
            .flat_map(|page| page.images())
            .filter_map(|op| match op {
                PageOp::Image { image, .. } => Some(image.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 2);
        assert!(std::rc::Rc::ptr_eq(&images[0], &images[1]));
    }

    #[test]
    fn bad_data_leaves_placeholder_in_reserved_space() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let mut broken = sales();
        broken.datasets[1].values.pop();
        render(&mut ctx, &broken).unwrap();
        let mut good = h.ctx();
        render(&mut good, &sales()).unwrap();
        assert_eq!(ctx.canvas.cursor_y(), good.canvas.cursor_y());
        let (pages, _) = ctx.finish();
        assert_eq!(pages[0].images().count(), 0);
        assert!(pages[0].texts().any(|t| t.starts_with("Chart unavailable")));
    }

    #[test]
    fn pie_has_no_value_gutter() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let mut pie = sales();
        pie.chart_type = ChartType::Pie;
        render(&mut ctx, &pie).unwrap();
        let x = ctx.canvas.current_ops().iter().find_map(|op| match op {
            PageOp::Image { x, width, .. } => Some((*x, *width)),
            _ => None,
        });
        assert_eq!(x, Some((50.0, 300.0)));
    }

    #[test]
    fn values_format_compactly() {
        assert_eq!(format_value(35.0), "35");
        assert_eq!(format_value(-2.0), "-2");
        assert_eq!(format_value(2.44), "2.4");
    }
}
