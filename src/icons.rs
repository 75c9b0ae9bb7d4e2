//! Semantic icon lookup.
//!
//! Icons are drawn from primitives (a rounded badge with a glyph) so no
//! image assets ship with the engine. Renderers ask by key; an unknown key
//! falls back to `neutral`.

use std::str::FromStr;

use crate::model::MessageVariant;
use crate::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKey {
    Info,
    Warning,
    Error,
    Success,
    Neutral,
}

impl FromStr for IconKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(IconKey::Info),
            "warning" | "warn" => Ok(IconKey::Warning),
            "error" | "danger" => Ok(IconKey::Error),
            "success" | "ok" => Ok(IconKey::Success),
            "neutral" | "note" => Ok(IconKey::Neutral),
            _ => Err(()),
        }
    }
}

impl From<MessageVariant> for IconKey {
    fn from(variant: MessageVariant) -> Self {
        match variant {
            MessageVariant::Info => IconKey::Info,
            MessageVariant::Warning => IconKey::Warning,
            MessageVariant::Error => IconKey::Error,
            MessageVariant::Success => IconKey::Success,
            MessageVariant::Neutral => IconKey::Neutral,
        }
    }
}

/// How an icon is drawn, plus the tint used for its surrounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icon {
    pub glyph: &'static str,
    pub color: Color,
    pub tint: Color,
}

#[derive(Debug, Clone)]
pub struct IconSet {
    icons: [Icon; 5],
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            icons: [
                Icon {
                    glyph: "i",
                    color: Color::rgb(0.15, 0.39, 0.92),
                    tint: Color::rgb(0.93, 0.96, 1.0),
                },
                Icon {
                    glyph: "!",
                    color: Color::rgb(0.85, 0.47, 0.02),
                    tint: Color::rgb(1.0, 0.97, 0.90),
                },
                Icon {
                    glyph: "x",
                    color: Color::rgb(0.86, 0.15, 0.15),
                    tint: Color::rgb(1.0, 0.94, 0.94),
                },
                Icon {
                    glyph: "+",
                    color: Color::rgb(0.09, 0.64, 0.29),
                    tint: Color::rgb(0.94, 0.99, 0.95),
                },
                Icon {
                    glyph: "-",
                    color: Color::rgb(0.42, 0.44, 0.48),
                    tint: Color::rgb(0.96, 0.97, 0.98),
                },
            ],
        }
    }
}

impl IconSet {
    pub fn get(&self, key: IconKey) -> Icon {
        let idx = match key {
            IconKey::Info => 0,
            IconKey::Warning => 1,
            IconKey::Error => 2,
            IconKey::Success => 3,
            IconKey::Neutral => 4,
        };
        self.icons[idx]
    }

    /// Look up by name; unknown names get the neutral icon.
    pub fn by_name(&self, name: &str) -> Icon {
        self.get(name.parse().unwrap_or(IconKey::Neutral))
    }
}
