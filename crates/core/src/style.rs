//! Settings → label presentation.
//!
//! The mapping is pure: the same `Settings` always yields the same
//! `LabelStyle`, which hosts apply as a list of CSS declarations.

use viewport_badge_protocol::{CssColor, Position, Settings};

/// Distance from each anchored viewport edge.
pub const EDGE_OFFSET_PX: u32 = 16;
/// Above ordinary page content.
pub const Z_INDEX: u32 = 9_999_999;

const PADDING: &str = "8px 12px";
const BORDER_RADIUS: &str = "4px";
const FONT_FAMILY: &str = r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif"#;
const TRANSITION: &str = "opacity 0.3s ease";

/// Offsets from the viewport edges. Exactly one vertical and one horizontal
/// edge is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub top: Option<u32>,
    pub right: Option<u32>,
    pub bottom: Option<u32>,
    pub left: Option<u32>,
}

impl Anchor {
    pub fn for_position(position: Position) -> Self {
        let edge = Some(EDGE_OFFSET_PX);
        let (top, bottom) = if position.is_top() { (edge, None) } else { (None, edge) };
        let (left, right) = if position.is_left() { (edge, None) } else { (None, edge) };
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Everything about the label's look that depends on settings, plus the
/// fixed parts (click-through, layering, fade transition).
///
/// Opacity and `display` are not part of the style; they belong to the
/// visibility state and are driven separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStyle {
    pub anchor: Anchor,
    pub font_size_px: u32,
    pub color: CssColor,
    /// `#RRGGBBAA`.
    pub background: String,
}

impl LabelStyle {
    /// CSS declarations in application order. Unused anchor edges are
    /// omitted entirely.
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut decls = vec![
            ("position", "fixed".to_string()),
            ("padding", PADDING.to_string()),
            ("border-radius", BORDER_RADIUS.to_string()),
            ("font-family", FONT_FAMILY.to_string()),
            ("z-index", Z_INDEX.to_string()),
            ("transition", TRANSITION.to_string()),
            ("pointer-events", "none".to_string()),
            ("color", self.color.to_string()),
            ("font-size", format!("{}px", self.font_size_px)),
            ("background-color", self.background.clone()),
        ];
        let edges = [
            ("top", self.anchor.top),
            ("right", self.anchor.right),
            ("bottom", self.anchor.bottom),
            ("left", self.anchor.left),
        ];
        for (name, offset) in edges {
            if let Some(px) = offset {
                decls.push((name, format!("{px}px")));
            }
        }
        decls
    }

    /// The declarations as an inline `style` attribute value.
    pub fn css_text(&self) -> String {
        let mut css = String::with_capacity(320);
        for (name, value) in self.declarations() {
            css.push_str(name);
            css.push_str(": ");
            css.push_str(&value);
            css.push_str("; ");
        }
        css.truncate(css.trim_end().len());
        css
    }
}

pub fn apply_style(settings: &Settings) -> LabelStyle {
    LabelStyle {
        anchor: Anchor::for_position(settings.position),
        font_size_px: settings.font_size.px(),
        color: settings.text_color.clone(),
        background: background_color(settings),
    }
}

/// Base color with the clamped background opacity appended as an alpha byte.
fn background_color(settings: &Settings) -> String {
    format!("{}{:02X}", settings.bg_color, settings.bg_alpha_byte())
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewport_badge_protocol::{FontSize, HexColor};

    #[test]
    fn background_alpha_suffix() {
        let settings = Settings {
            bg_color: HexColor::black(),
            bg_opacity: 0.7,
            ..Settings::default()
        };
        assert_eq!(apply_style(&settings).background, "#000000B3");
    }

    #[test]
    fn transparent_and_opaque_backgrounds() {
        let clear = Settings {
            bg_opacity: 0.0,
            ..Settings::default()
        };
        assert_eq!(apply_style(&clear).background, "#00000000");
        let solid = Settings {
            bg_color: HexColor::parse("#f0a").unwrap(),
            bg_opacity: 1.0,
            ..Settings::default()
        };
        assert_eq!(apply_style(&solid).background, "#FF00AAFF");
    }

    #[test]
    fn font_sizes() {
        let px = |font_size| {
            apply_style(&Settings {
                font_size,
                ..Settings::default()
            })
            .font_size_px
        };
        assert_eq!(px(FontSize::Small), 12);
        assert_eq!(px(FontSize::Medium), 14);
        assert_eq!(px(FontSize::Large), 16);
    }

    #[test]
    fn each_corner_sets_exactly_two_edges() {
        for position in Position::ALL {
            let anchor = Anchor::for_position(position);
            assert!(anchor.top.is_some() != anchor.bottom.is_some(), "{position}");
            assert!(anchor.left.is_some() != anchor.right.is_some(), "{position}");
        }
        let top_left = Anchor::for_position(Position::TopLeft);
        assert_eq!(top_left.top, Some(16));
        assert_eq!(top_left.left, Some(16));
    }

    #[test]
    fn declarations_are_click_through_and_topmost() {
        let decls = apply_style(&Settings::default()).declarations();
        let get = |name: &str| {
            decls
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("pointer-events"), Some("none"));
        assert_eq!(get("z-index"), Some("9999999"));
        assert_eq!(get("transition"), Some("opacity 0.3s ease"));
        assert_eq!(get("bottom"), Some("16px"));
        assert_eq!(get("right"), Some("16px"));
        assert_eq!(get("top"), None);
        assert_eq!(get("left"), None);
    }

    #[test]
    fn named_text_color_passes_through() {
        let settings = Settings {
            text_color: CssColor::parse("goldenrod").unwrap(),
            ..Settings::default()
        };
        let decls = apply_style(&settings).declarations();
        assert!(decls.contains(&("color", "goldenrod".to_string())));
    }

    #[test]
    fn css_text_has_no_trailing_space() {
        let css = apply_style(&Settings::default()).css_text();
        assert!(css.starts_with("position: fixed;"));
        assert!(css.ends_with("bottom: 16px;"));
    }
}
