//! # Library Model
//!
//! The input representation: a library of root categories and standalone
//! documents. Categories nest; each carries its own blocks, its documents and
//! its child categories, in input order.
//!
//! Blocks are a closed set of fourteen kinds plus [`ContentBlock::Unknown`].
//! A block whose `type` is unrecognized, or whose fields don't fit its kind,
//! deserializes to `Unknown` rather than failing the whole library, so a
//! single bad block costs one warning box and nothing else.

use serde::{Deserialize, Deserializer};

use crate::style::{Align, Color, LayoutConfig};

/// A complete render input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Root categories, rendered first in this order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Documents not reachable from any category, rendered after the roots.
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Document metadata written to the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "content")]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, alias = "children")]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "content")]
    pub blocks: Vec<ContentBlock>,
}

/// One tagged content unit.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Title(TitleBlock),
    Text(TextBlock),
    List(ListBlock),
    Table(TableBlock),
    MessageBox(MessageBlock),
    Divider(DividerBlock),
    Image(ImageBlock),
    ImageCompare(ImageCompareBlock),
    ImageGrid(ImageGridBlock),
    Code(CodeBlock),
    Chart(ChartBlock),
    Math(MathBlock),
    Audio(AudioBlock),
    Youtube(YoutubeBlock),
    /// Anything that failed to deserialize as a known kind.
    Unknown { kind: String, reason: String },
}

impl ContentBlock {
    /// The block's `type` tag, for diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            ContentBlock::Title(_) => "title",
            ContentBlock::Text(_) => "text",
            ContentBlock::List(_) => "list",
            ContentBlock::Table(_) => "table",
            ContentBlock::MessageBox(_) => "messageBox",
            ContentBlock::Divider(_) => "divider",
            ContentBlock::Image(_) => "image",
            ContentBlock::ImageCompare(_) => "imageCompare",
            ContentBlock::ImageGrid(_) => "imageGrid",
            ContentBlock::Code(_) => "code",
            ContentBlock::Chart(_) => "chart",
            ContentBlock::Math(_) => "math",
            ContentBlock::Audio(_) => "audio",
            ContentBlock::Youtube(_) => "youtube",
            ContentBlock::Unknown { kind, .. } => kind,
        }
    }

    fn from_value(value: serde_json::Value) -> Self {
        let kind = match value.get("type") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(_) => "(non-string type)".to_string(),
            None => "(missing type)".to_string(),
        };
        match serde_json::from_value::<KnownBlock>(value) {
            Ok(block) => block.into(),
            Err(e) => ContentBlock::Unknown {
                kind,
                reason: e.to_string(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(ContentBlock::from_value(value))
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum KnownBlock {
    Title(TitleBlock),
    #[serde(alias = "paragraph")]
    Text(TextBlock),
    List(ListBlock),
    Table(TableBlock),
    #[serde(alias = "message_box", alias = "message")]
    MessageBox(MessageBlock),
    Divider(DividerBlock),
    Image(ImageBlock),
    #[serde(alias = "image_compare")]
    ImageCompare(ImageCompareBlock),
    #[serde(alias = "image_grid")]
    ImageGrid(ImageGridBlock),
    Code(CodeBlock),
    Chart(ChartBlock),
    Math(MathBlock),
    Audio(AudioBlock),
    #[serde(alias = "video")]
    Youtube(YoutubeBlock),
}

impl From<KnownBlock> for ContentBlock {
    fn from(block: KnownBlock) -> Self {
        match block {
            KnownBlock::Title(b) => ContentBlock::Title(b),
            KnownBlock::Text(b) => ContentBlock::Text(b),
            KnownBlock::List(b) => ContentBlock::List(b),
            KnownBlock::Table(b) => ContentBlock::Table(b),
            KnownBlock::MessageBox(b) => ContentBlock::MessageBox(b),
            KnownBlock::Divider(b) => ContentBlock::Divider(b),
            KnownBlock::Image(b) => ContentBlock::Image(b),
            KnownBlock::ImageCompare(b) => ContentBlock::ImageCompare(b),
            KnownBlock::ImageGrid(b) => ContentBlock::ImageGrid(b),
            KnownBlock::Code(b) => ContentBlock::Code(b),
            KnownBlock::Chart(b) => ContentBlock::Chart(b),
            KnownBlock::Math(b) => ContentBlock::Math(b),
            KnownBlock::Audio(b) => ContentBlock::Audio(b),
            KnownBlock::Youtube(b) => ContentBlock::Youtube(b),
        }
    }
}

fn default_level() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_half() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TitleBlock {
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default = "default_level")]
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBlock {
    #[serde(alias = "content")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlock {
    pub items: Vec<ListItem>,
    #[serde(default)]
    pub ordered: bool,
    /// First number of an ordered list.
    #[serde(default)]
    pub start: Option<u32>,
}

/// A list entry. Written either as a plain string or as
/// `{ "text": .., "children": [..] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ListItemRepr")]
pub struct ListItem {
    pub text: String,
    pub children: Vec<ListItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListItemRepr {
    Plain(String),
    Nested {
        #[serde(alias = "content")]
        text: String,
        #[serde(default, alias = "items")]
        children: Vec<ListItem>,
    },
}

impl From<ListItemRepr> for ListItem {
    fn from(repr: ListItemRepr) -> Self {
        match repr {
            ListItemRepr::Plain(text) => ListItem {
                text,
                children: Vec::new(),
            },
            ListItemRepr::Nested { text, children } => ListItem { text, children },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    #[serde(default)]
    pub headers: Vec<Cell>,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
    /// Draw the header row again at the top of each continuation page.
    #[serde(default)]
    pub repeat_header: bool,
    /// Relative column weights; missing or short lists share the rest evenly.
    #[serde(default)]
    pub column_widths: Vec<f64>,
}

impl TableBlock {
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

/// A table cell. Numbers and booleans are shown as written; `null` is empty.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct Cell(pub String);

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Cell(s),
            serde_json::Value::Null => Cell(String::new()),
            other => Cell(other.to_string()),
        }
    }
}

impl Cell {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageVariant {
    #[default]
    Info,
    Warning,
    Error,
    Success,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageBlock {
    #[serde(default, alias = "kind", alias = "severity")]
    pub variant: MessageVariant,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(alias = "content")]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DividerBlock {
    #[serde(default)]
    pub dashed: bool,
}

fn default_center() -> Align {
    Align::Center
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageBlock {
    pub src: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Fraction of the content width.
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default = "default_center")]
    pub align: Align,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareMode {
    #[default]
    Slider,
    #[serde(alias = "side_by_side")]
    SideBySide,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCompareBlock {
    pub before: String,
    pub after: String,
    #[serde(default)]
    pub mode: CompareMode,
    /// Slider split as a fraction of the width.
    #[serde(default = "default_half")]
    pub position: f64,
    #[serde(default)]
    pub before_label: Option<String>,
    #[serde(default)]
    pub after_label: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageGridBlock {
    pub images: Vec<GridImage>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// A grid entry: a bare `src` string or `{ "src": .., "caption": .. }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "GridImageRepr")]
pub struct GridImage {
    pub src: String,
    pub caption: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GridImageRepr {
    Plain(String),
    Full {
        src: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl From<GridImageRepr> for GridImage {
    fn from(repr: GridImageRepr) -> Self {
        match repr {
            GridImageRepr::Plain(src) => GridImage { src, caption: None },
            GridImageRepr::Full { src, caption } => GridImage { src, caption },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    #[serde(default)]
    pub sections: Vec<CodeSection>,
    /// Single-section shorthand.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodeSection {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(alias = "content")]
    pub code: String,
}

impl CodeBlock {
    /// Explicit sections, or the shorthand fields as a single section.
    pub fn all_sections(&self) -> Vec<CodeSection> {
        let mut sections = self.sections.clone();
        if let Some(code) = &self.code {
            sections.insert(
                0,
                CodeSection {
                    filename: self.filename.clone(),
                    language: self.language.clone(),
                    code: code.clone(),
                },
            );
        }
        sections
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Doughnut,
}

impl ChartType {
    pub fn name(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Doughnut => "doughnut",
        }
    }

    pub fn is_radial(self) -> bool {
        matches!(self, ChartType::Pie | ChartType::Doughnut)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBlock {
    #[serde(alias = "kind", alias = "chart_type")]
    pub chart_type: ChartType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    #[serde(alias = "data")]
    pub values: Vec<f64>,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MathBlock {
    #[serde(alias = "latex", alias = "content")]
    pub expression: String,
    /// Display math is centered on its own line; inline is left-aligned.
    #[serde(default = "default_true")]
    pub display: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioBlock {
    pub src: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeBlock {
    #[serde(default, alias = "src")]
    pub url: Option<String>,
    #[serde(default, alias = "videoId")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(json: &str) -> ContentBlock {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_known_kinds() {
        assert!(matches!(
            block(r#"{"type": "title", "text": "Setup Guide", "level": 2}"#),
            ContentBlock::Title(TitleBlock { level: 2, .. })
        ));
        assert!(matches!(
            block(r#"{"type": "messageBox", "variant": "warning", "text": "careful"}"#),
            ContentBlock::MessageBox(MessageBlock {
                variant: MessageVariant::Warning,
                ..
            })
        ));
        assert!(matches!(
            block(r#"{"type": "message_box", "text": "snake case"}"#),
            ContentBlock::MessageBox(_)
        ));
    }

    #[test]
    fn unknown_type_is_kept_not_fatal() {
        match block(r#"{"type": "hologram", "text": "x"}"#) {
            ContentBlock::Unknown { kind, .. } => assert_eq!(kind, "hologram"),
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn malformed_known_type_becomes_unknown() {
        match block(r#"{"type": "image", "caption": "no src"}"#) {
            ContentBlock::Unknown { kind, reason } => {
                assert_eq!(kind, "image");
                assert!(reason.contains("src"));
            }
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn missing_type_becomes_unknown() {
        assert!(matches!(block(r#"{"text": "x"}"#), ContentBlock::Unknown { .. }));
    }

    #[test]
    fn list_items_accept_strings_and_objects() {
        let b = block(
            r#"{"type": "list", "ordered": true, "items": ["a", {"text": "b", "children": ["b1"]}]}"#,
        );
        let ContentBlock::List(list) = b else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].children[0].text, "b1");
    }

    #[test]
    fn table_cells_stringify_scalars() {
        let ContentBlock::Table(table) =
            block(r#"{"type": "table", "headers": ["a", "b"], "rows": [[1, true, null]]}"#)
        else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0][0].as_str(), "1");
        assert_eq!(table.rows[0][1].as_str(), "true");
        assert_eq!(table.rows[0][2].as_str(), "");
        assert_eq!(table.column_count(), 3);
        assert!(!table.repeat_header);
    }

    #[test]
    fn code_shorthand_becomes_first_section() {
        let ContentBlock::Code(code) =
            block(r#"{"type": "code", "code": "fn main() {}", "language": "rust"}"#)
        else {
            panic!("expected code");
        };
        let sections = code.all_sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].language.as_deref(), Some("rust"));
        assert!(code.line_numbers);
    }

    #[test]
    fn chart_accepts_data_alias() {
        let ContentBlock::Chart(chart) = block(
            r##"{"type": "chart", "chartType": "bar", "labels": ["a"], "datasets": [{"label": "s", "data": [1], "color": "#ff0000"}]}"##,
        ) else {
            panic!("expected chart");
        };
        assert_eq!(chart.chart_type, ChartType::Bar);
        assert_eq!(chart.datasets[0].values, vec![1.0]);
    }

    #[test]
    fn category_tree_parses_with_aliases() {
        let lib: Library = serde_json::from_str(
            r#"{
                "categories": [{
                    "id": "c1", "title": "Guides",
                    "content": [{"type": "text", "text": "intro"}],
                    "documents": [{"id": "d1", "title": "Install", "blocks": []}],
                    "children": [{"id": "c2", "title": "Advanced"}]
                }],
                "documents": [{"id": "d2", "title": "FAQ"}]
            }"#,
        )
        .unwrap();
        assert_eq!(lib.categories[0].blocks.len(), 1);
        assert_eq!(lib.categories[0].categories[0].title, "Advanced");
        assert_eq!(lib.documents[0].id, "d2");
    }

    #[test]
    fn compare_defaults() {
        let ContentBlock::ImageCompare(cmp) =
            block(r#"{"type": "imageCompare", "before": "a.png", "after": "b.png"}"#)
        else {
            panic!("expected compare");
        };
        assert_eq!(cmp.mode, CompareMode::Slider);
        assert_eq!(cmp.position, 0.5);
    }
}
