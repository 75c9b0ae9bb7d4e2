//! A small TeX-subset typesetter.
//!
//! Expressions become a single line of text in the body font: `\frac{a}{b}`
//! reads as `a/b`, squares and cubes use superscript digits, and operators
//! map to their Latin-1 symbols. Greek letters are spelled out (µ excepted)
//! since the standard fonts can't show them. Anything the typesetter doesn't
//! understand is an error, and the renderer leaves a placeholder instead of
//! guessing.

use std::iter::Peekable;
use std::str::Chars;

use super::{message, RenderContext};
use crate::error::{BlockError, RasterError};
use crate::font::FontRole;
use crate::layout::{DrawOptions, TextStyle};
use crate::model::MathBlock;
use crate::style::Align;

const PAD: f64 = 6.0;

/// Deepest group or command nesting the parser follows.
const MAX_DEPTH: usize = 64;

/// Longest expression echoed back in a placeholder label.
const LABEL_CHARS: usize = 60;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "nu", "xi", "pi", "varpi", "rho", "sigma", "tau",
    "upsilon", "phi", "varphi", "chi", "psi", "omega", "Gamma", "Delta", "Theta", "Lambda",
    "Xi", "Pi", "Sigma", "Phi", "Psi", "Omega",
];

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "exp", "lim", "max", "min", "sup", "inf", "det", "sum", "prod", "int",
    "oint",
];

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "times" => " \u{d7} ",
        "cdot" => " \u{b7} ",
        "pm" => " \u{b1} ",
        "mp" => " -/+ ",
        "div" => " \u{f7} ",
        "le" | "leq" => " <= ",
        "ge" | "geq" => " >= ",
        "ne" | "neq" => " != ",
        "approx" => " ~ ",
        "equiv" => " == ",
        "to" | "rightarrow" => " -> ",
        "leftarrow" | "gets" => " <- ",
        "Rightarrow" | "implies" => " => ",
        "infty" => "inf",
        "partial" => "d",
        "nabla" => "grad ",
        "degree" | "circ" => "\u{b0}",
        "mu" => "\u{b5}",
        "ldots" | "cdots" | "dots" => "...",
        "quad" | "qquad" => "  ",
        "in" => " in ",
        _ => return None,
    })
}

fn err(message: impl Into<String>) -> RasterError {
    RasterError::Math(message.into())
}

/// A group that reads unambiguously next to `/` or `^`.
fn is_atom(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '.')
}

fn wrap(s: &str) -> String {
    let s = s.trim();
    if is_atom(s) {
        s.to_string()
    } else {
        format!("({s})")
    }
}

fn superscript(arg: &str) -> String {
    match arg.trim() {
        "1" => "\u{b9}".to_string(),
        "2" => "\u{b2}".to_string(),
        "3" => "\u{b3}".to_string(),
        "\u{b0}" => "\u{b0}".to_string(),
        other => format!("^{}", wrap(other)),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<String, RasterError>,
    ) -> Result<String, RasterError> {
        if self.depth >= MAX_DEPTH {
            return Err(err("expression nested too deeply"));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    /// Read up to the matching `}` when `in_group`, else to the end.
    fn sequence(&mut self, in_group: bool) -> Result<String, RasterError> {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '}' if in_group => return Ok(out),
                '}' => return Err(err("unbalanced '}'")),
                '{' => out.push_str(&self.nested(|p| p.sequence(true))?),
                '\\' => out.push_str(&self.nested(Self::command)?),
                '^' => out.push_str(&superscript(&self.argument()?)),
                '_' => {
                    out.push('_');
                    out.push_str(&wrap(&self.argument()?));
                }
                c if c.is_whitespace() => {
                    if !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
                c => out.push(c),
            }
        }
        if in_group {
            Err(err("missing '}'"))
        } else {
            Ok(out)
        }
    }

    /// A braced group, a command, or a single character.
    fn argument(&mut self) -> Result<String, RasterError> {
        self.skip_ws();
        match self.chars.next() {
            None => Err(err("missing argument")),
            Some('{') => self.nested(|p| p.sequence(true)),
            Some('\\') => self.nested(Self::command),
            Some('}') => Err(err("unbalanced '}'")),
            Some(c) => Ok(c.to_string()),
        }
    }

    /// A spelled-out name, spaced from a directly following letter or digit.
    fn word(&mut self, name: &str) -> String {
        match self.chars.peek() {
            Some(c) if c.is_alphanumeric() || *c == '\\' => format!("{name} "),
            _ => name.to_string(),
        }
    }

    fn command(&mut self) -> Result<String, RasterError> {
        let mut name = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_alphabetic()) {
            name.push(c);
        }
        if name.is_empty() {
            let c = self.chars.next().ok_or_else(|| err("trailing backslash"))?;
            return match c {
                '{' | '}' | '%' | '$' | '&' | '#' | '_' => Ok(c.to_string()),
                ',' | ';' | ':' | ' ' | '\\' => Ok(" ".to_string()),
                '!' => Ok(String::new()),
                other => Err(err(format!("unknown command '\\{other}'"))),
            };
        }

        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.argument()?;
                let den = self.argument()?;
                Ok(format!("{}/{}", wrap(&num), wrap(&den)))
            }
            "sqrt" => {
                self.skip_ws();
                if self.chars.next_if_eq(&'[').is_some() {
                    let mut index = String::new();
                    loop {
                        match self.chars.next() {
                            Some(']') => break,
                            Some(c) => index.push(c),
                            None => return Err(err("missing ']'")),
                        }
                    }
                    let radicand = self.argument()?;
                    return Ok(format!("{}^(1/{})", wrap(&radicand), index.trim()));
                }
                Ok(format!("sqrt({})", self.argument()?.trim()))
            }
            "text" | "textrm" | "textbf" | "textit" | "mathrm" | "mathbf" | "mathit" | "mathsf"
            | "operatorname" => self.argument(),
            "left" | "right" | "big" | "Big" | "bigl" | "bigr" => {
                // the delimiter itself is read as ordinary input; `.` means none
                self.skip_ws();
                self.chars.next_if_eq(&'.');
                Ok(String::new())
            }
            other => {
                if let Some(s) = symbol(other) {
                    return Ok(s.to_string());
                }
                if GREEK.contains(&other) || FUNCTIONS.contains(&other) {
                    return Ok(self.word(other));
                }
                Err(err(format!("unknown command '\\{other}'")))
            }
        }
    }
}

/// Typeset a TeX-subset expression as a single line of text.
pub fn typeset(expression: &str) -> Result<String, RasterError> {
    let mut parser = Parser {
        chars: expression.chars().peekable(),
        depth: 0,
    };
    let raw = parser.sequence(false)?;
    Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &MathBlock) -> Result<(), BlockError> {
    if block.expression.trim().is_empty() {
        return Err(BlockError::Malformed("math block is empty".to_string()));
    }
    let align = if block.display { Align::Center } else { Align::Left };
    let size = ctx.config.base_font_size * if block.display { 1.15 } else { 1.0 };
    let style = TextStyle::new(FontRole::Italic, size, ctx.config.line_height).align(align);
    let width = ctx.canvas.content_width();

    match typeset(&block.expression) {
        Ok(text) => {
            let h = ctx.measure(&text, &style, width).height;
            ctx.canvas.ensure_block(h + 2.0 * PAD, true);
            ctx.canvas.move_y(PAD);
            ctx.canvas.draw_text(&text, &style, DrawOptions::reserved())?;
            ctx.canvas.move_y(PAD);
        }
        Err(e) => {
            log::warn!("math in {} could not be typeset: {}", ctx.breadcrumb(), e);
            let h = ctx.config.placeholder_height;
            ctx.canvas.ensure_block(h, true);
            let mut shown: String = block.expression.chars().take(LABEL_CHARS).collect();
            if shown.len() < block.expression.len() {
                shown.push_str("...");
            }
            message::placeholder(ctx, 0.0, width, h, &format!("Could not typeset: {shown}"))?;
            ctx.canvas.move_y(h);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentBlock, TextBlock};
    use crate::render::render_block;
    use crate::render::tests::Harness;

    #[test]
    fn fractions_and_powers() {
        assert_eq!(typeset(r"E = mc^2").unwrap(), "E = mc\u{b2}");
        assert_eq!(typeset(r"\frac{a+b}{2}").unwrap(), "(a+b)/2");
        assert_eq!(typeset(r"x^{n+1}").unwrap(), "x^(n+1)");
        assert_eq!(typeset(r"\sqrt{x^2 + y^2}").unwrap(), "sqrt(x\u{b2} + y\u{b2})");
        assert_eq!(typeset(r"\sqrt[3]{8}").unwrap(), "8^(1/3)");
    }

    #[test]
    fn symbols_and_names() {
        assert_eq!(typeset(r"a \times b \leq c").unwrap(), "a \u{d7} b <= c");
        assert_eq!(typeset(r"\alpha + \beta").unwrap(), "alpha + beta");
        assert_eq!(typeset(r"\sin x").unwrap(), "sin x");
        assert_eq!(typeset(r"5 \mu m").unwrap(), "5 \u{b5} m");
        assert_eq!(typeset(r"x_{i} \in S").unwrap(), "x_i in S");
    }

    #[test]
    fn text_and_delimiters() {
        assert_eq!(typeset(r"\left( x \right)").unwrap(), "( x )");
        assert_eq!(typeset(r"\text{rate} = 5").unwrap(), "rate = 5");
    }

    #[test]
    fn errors_are_reported() {
        assert!(matches!(typeset(r"\frac{a}{b"), Err(RasterError::Math(_))));
        assert!(matches!(typeset(r"a}"), Err(RasterError::Math(_))));
        let unknown = typeset(r"\hologram{x}").unwrap_err();
        assert!(unknown.to_string().contains("hologram"));
        assert!(typeset(r"x^").is_err());
    }

    #[test]
    fn failed_math_reserves_placeholder_space() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = MathBlock {
            expression: r"\bogus".to_string(),
            display: true,
        };
        render(&mut ctx, &block).unwrap();
        assert_eq!(ctx.canvas.cursor_y(), 50.0 + h.config.placeholder_height);
        let (pages, _) = ctx.finish();
        assert!(pages[0].contains_text("Could not typeset"));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let deep = "{".repeat(200_000);
        let e = typeset(&deep).unwrap_err();
        assert!(e.to_string().contains("nested too deeply"));
        assert!(typeset(&r"\frac".repeat(10_000)).is_err());
        let ok = format!("{}x{}", "{".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert_eq!(typeset(&ok).unwrap(), "x");
    }

    #[test]
    fn deeply_nested_math_does_not_stop_the_document() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let math = ContentBlock::Math(MathBlock {
            expression: "{".repeat(200_000),
            display: false,
        });
        let text = ContentBlock::Text(TextBlock {
            text: "After the formula".to_string(),
        });
        render_block(&mut ctx, &math, 0).unwrap();
        render_block(&mut ctx, &text, 1).unwrap();
        let (pages, _) = ctx.finish();
        assert!(pages.iter().any(|p| p.contains_text("Could not typeset")));
        assert!(pages.iter().any(|p| p.contains_text("After the formula")));
    }

    #[test]
    fn display_math_is_centered() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let block = MathBlock {
            expression: "x".to_string(),
            display: true,
        };
        render(&mut ctx, &block).unwrap();
        let x = ctx.canvas.current_ops().iter().find_map(|op| match op {
            crate::layout::PageOp::Text { x, .. } => Some(*x),
            _ => None,
        });
        assert!(x.unwrap() > 150.0);
    }
}
