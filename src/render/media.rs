//! Audio and video references.
//!
//! Neither can play on paper, so both render as cards that say what the
//! media is and link to it.

use super::{message, RenderContext};
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::{BoxStyle, DrawOptions, Rect, TextStyle};
use crate::model::{AudioBlock, YoutubeBlock};
use crate::style::{palette, Align, Color};

const PAD: f64 = 10.0;
const BADGE: f64 = 16.0;
const PLAY: f64 = 36.0;
const MAX_VIDEO_HEIGHT: f64 = 240.0;

const ID_LEN: usize = 11;

fn id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Extract an 11-character video id from a YouTube URL or a bare id.
pub fn video_id(input: &str) -> Option<String> {
    let s = input.trim();
    if s.len() == ID_LEN && s.chars().all(id_char) {
        return Some(s.to_string());
    }
    let markers = ["youtu.be/", "/embed/", "/shorts/", "?v=", "&v="];
    let rest = markers
        .iter()
        .find_map(|m| s.find(m).map(|i| &s[i + m.len()..]))?;
    let id: String = rest.chars().take_while(|c| id_char(*c)).collect();
    (id.len() == ID_LEN).then_some(id)
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Lines of a media card: a bold title, then optional muted lines.
struct CardText<'a> {
    title: &'a str,
    lines: Vec<(&'a str, TextStyle)>,
}

impl CardText<'_> {
    fn height(&self, ctx: &RenderContext<'_>, title: &TextStyle, width: f64) -> f64 {
        ctx.measure(self.title, title, width).height
            + self
                .lines
                .iter()
                .map(|(t, s)| ctx.measure(t, s, width).height)
                .sum::<f64>()
    }

    fn draw(&self, ctx: &mut RenderContext<'_>, title: &TextStyle) -> Result<(), LayoutError> {
        ctx.canvas.draw_text(self.title, title, DrawOptions::reserved())?;
        for (text, style) in &self.lines {
            ctx.canvas.draw_text(text, style, DrawOptions::reserved())?;
        }
        Ok(())
    }
}

pub(super) fn render_audio(ctx: &mut RenderContext<'_>, block: &AudioBlock) -> Result<(), BlockError> {
    ctx.assets.check_exists(&block.src)?;

    let icon = ctx.icons.by_name("audio");
    let title_style = TextStyle::new(FontRole::Bold, ctx.config.base_font_size, ctx.config.line_height)
        .color(palette::DARK);
    let caption = ctx.caption_style();
    let source = ctx.small_style().color(palette::ACCENT);
    let mut lines = Vec::new();
    if let Some(c) = block.caption.as_deref().filter(|c| !c.is_empty()) {
        lines.push((c, caption));
    }
    lines.push((block.src.as_str(), source));
    let text = CardText {
        title: block.title.as_deref().unwrap_or("Audio"),
        lines,
    };

    let inner_w = ctx.canvas.content_width() - 3.0 * PAD - BADGE;
    let height = text.height(ctx, &title_style, inner_w).max(BADGE) + 2.0 * PAD;
    ctx.canvas.ensure_block(height, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    ctx.canvas.draw_box(
        height,
        BoxStyle::filled(palette::SURFACE)
            .stroke(palette::BORDER, 0.75)
            .radius(4.0),
        DrawOptions::reserved().no_advance(),
    )?;
    message::draw_badge(ctx, icon, PAD, top + PAD)?;

    let area = Rect::new(left + 2.0 * PAD + BADGE, top + PAD, inner_w, height - 2.0 * PAD);
    ctx.with_region(area, |ctx| text.draw(ctx, &title_style))??;
    if is_remote(&block.src) {
        ctx.canvas
            .add_link(Rect::new(left, top, ctx.canvas.content_width(), height), &block.src);
    }
    ctx.canvas.set_cursor_y(top + height);
    Ok(())
}

pub(super) fn render_youtube(ctx: &mut RenderContext<'_>, block: &YoutubeBlock) -> Result<(), BlockError> {
    let id = block
        .id
        .as_deref()
        .and_then(video_id)
        .or_else(|| block.url.as_deref().and_then(video_id))
        .ok_or_else(|| BlockError::Malformed("youtube block has no recognizable video id".to_string()))?;
    let url = format!("https://www.youtube.com/watch?v={id}");

    let width = ctx.canvas.content_width();
    let video_h = (width * 9.0 / 16.0).min(MAX_VIDEO_HEIGHT);
    let title_style = TextStyle::new(FontRole::Bold, ctx.config.base_font_size, ctx.config.line_height)
        .color(palette::DARK);
    let mut lines = Vec::new();
    if let Some(c) = block.caption.as_deref().filter(|c| !c.is_empty()) {
        lines.push((c, ctx.caption_style()));
    }
    lines.push((url.as_str(), ctx.small_style().color(palette::ACCENT)));
    let text = CardText {
        title: block.title.as_deref().unwrap_or("Video"),
        lines,
    };
    let text_h = text.height(ctx, &title_style, width);

    ctx.canvas.ensure_block(video_h + 6.0 + text_h, true);
    let top = ctx.canvas.cursor_y();
    let frame = ctx.canvas.draw_box(
        video_h,
        BoxStyle::filled(palette::DARK).radius(4.0),
        DrawOptions::reserved(),
    )?;

    let play_x = (width - PLAY) / 2.0;
    let play_y = top + (video_h - PLAY) / 2.0;
    ctx.canvas.draw_box(
        PLAY,
        BoxStyle::filled(Color::rgb(0.86, 0.15, 0.15)).radius(PLAY / 2.0),
        DrawOptions::at(play_y).offset(play_x).width(PLAY),
    )?;
    let glyph = TextStyle::new(FontRole::Bold, 16.0, PLAY / 16.0)
        .color(Color::WHITE)
        .align(Align::Center);
    ctx.canvas
        .draw_text(">", &glyph, DrawOptions::at(play_y).offset(play_x).width(PLAY))?;
    ctx.canvas.add_link(frame, &url);

    ctx.canvas.move_y(6.0);
    text.draw(ctx, &title_style)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageOp;
    use crate::render::tests::Harness;

    #[test]
    fn ids_from_every_url_shape() {
        let id = Some("dQw4w9WgXcQ".to_string());
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(video_id(url), id, "{url}");
        }
        assert_eq!(video_id("https://example.com/video"), None);
        assert_eq!(video_id("short"), None);
        assert_eq!(video_id("https://youtu.be/tooShort"), None);
    }

    fn link_uris(ops: &[PageOp]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                PageOp::Link { uri, .. } => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn youtube_card_links_to_watch_page() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = YoutubeBlock {
            url: Some("https://youtu.be/dQw4w9WgXcQ".to_string()),
            id: None,
            title: Some("Walkthrough".to_string()),
            caption: None,
        };
        render_youtube(&mut ctx, &block).unwrap();
        assert_eq!(
            link_uris(ctx.canvas.current_ops()),
            vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()]
        );
        let (pages, _) = ctx.finish();
        assert!(pages[0].contains_text("Walkthrough"));
    }

    #[test]
    fn youtube_without_id_is_malformed() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = YoutubeBlock {
            url: Some("https://vimeo.com/123".to_string()),
            id: None,
            title: None,
            caption: None,
        };
        assert!(matches!(render_youtube(&mut ctx, &block), Err(BlockError::Malformed(_))));
    }

    #[test]
    fn missing_local_audio_is_an_asset_error() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = AudioBlock {
            src: "recordings/intro.mp3".to_string(),
            title: None,
            caption: None,
        };
        assert!(matches!(render_audio(&mut ctx, &block), Err(BlockError::Asset(_))));
    }

    #[test]
    fn remote_audio_gets_a_link() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = AudioBlock {
            src: "https://example.com/intro.mp3".to_string(),
            title: Some("Intro".to_string()),
            caption: Some("Narrated overview".to_string()),
        };
        render_audio(&mut ctx, &block).unwrap();
        assert_eq!(
            link_uris(ctx.canvas.current_ops()),
            vec!["https://example.com/intro.mp3".to_string()]
        );
        let (pages, _) = ctx.finish();
        assert!(pages[0].contains_text("Intro"));
        assert!(pages[0].contains_text("Narrated overview"));
    }

    #[test]
    fn local_audio_that_exists_has_no_link() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp3"), b"ID3").unwrap();
        let mut h = Harness::new();
        h.config.asset_root = Some(dir.path().to_path_buf());
        let mut ctx = h.ctx();
        let block = AudioBlock {
            src: "clip.mp3".to_string(),
            title: None,
            caption: None,
        };
        render_audio(&mut ctx, &block).unwrap();
        assert!(link_uris(ctx.canvas.current_ops()).is_empty());
        let (pages, _) = ctx.finish();
        assert!(pages[0].contains_text("clip.mp3"));
    }
}
