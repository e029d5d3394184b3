use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Storage key under which the single settings record lives.
pub const STORAGE_KEY: &str = "viewportSettings";

pub const DEFAULT_BG_OPACITY: f64 = 0.7;
pub const DEFAULT_HIDE_AFTER_MS: u32 = 1000;

/// Corner of the viewport the label is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    pub fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }
}

/// Label text size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub const ALL: [FontSize; 3] = [FontSize::Small, FontSize::Medium, FontSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Pixel size used when rendering the label.
    pub fn px(self) -> u32 {
        match self {
            Self::Small => 12,
            Self::Medium => 14,
            Self::Large => 16,
        }
    }
}

/// Returned when a keyword does not name any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyword(pub String);

impl fmt::Display for UnknownKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown keyword: {:?}", self.0)
    }
}

impl std::error::Error for UnknownKeyword {}

impl FromStr for Position {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownKeyword(s.to_string()))
    }
}

impl FromStr for FontSize {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownKeyword(s.to_string()))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for FontSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An opaque `#RRGGBB` color.
///
/// Parsing accepts `#rgb` and `#rrggbb` in either case and normalizes to the
/// six-digit uppercase form, so two spellings of the same color compare equal
/// and an alpha byte can always be appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        Some(Self(format!("#{}", expanded.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn white() -> Self {
        Self("#FFFFFF".to_string())
    }

    pub fn black() -> Self {
        Self("#000000".to_string())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Any CSS color value, used where no alpha byte has to be appended.
///
/// Hex spellings normalize the same way as [`HexColor`]. Keywords and
/// functional forms (`rebeccapurple`, `rgb(0 0 0)`) are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssColor(String);

impl CssColor {
    /// Rejects empty values, malformed hex and anything that could end the
    /// declaration it is written into.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.contains([';', '{', '}', '!']) {
            return None;
        }
        if s.starts_with('#') {
            return HexColor::parse(s).map(Self::from);
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn white() -> Self {
        HexColor::white().into()
    }
}

impl From<HexColor> for CssColor {
    fn from(hex: HexColor) -> Self {
        Self(hex.0)
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CssColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The persisted overlay configuration.
///
/// There is exactly one logical instance per installation, stored under
/// [`STORAGE_KEY`]. Decoding never fails: missing, unknown or malformed fields
/// take their default value, and `bg_opacity` is clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub position: Position,
    pub font_size: FontSize,
    pub text_color: CssColor,
    pub bg_color: HexColor,
    pub bg_opacity: f64,
    pub always_show: bool,
    /// Auto-hide delay in milliseconds. Ignored while `always_show` is set.
    pub hide_after: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Position::default(),
            font_size: FontSize::default(),
            text_color: CssColor::white(),
            bg_color: HexColor::black(),
            bg_opacity: DEFAULT_BG_OPACITY,
            always_show: false,
            hide_after: DEFAULT_HIDE_AFTER_MS,
        }
    }
}

impl Settings {
    /// Decode a stored record, treating anything that is not an object as
    /// absent.
    pub fn from_value(value: &Value) -> Self {
        let mut settings = Self::default();
        let Some(obj) = value.as_object() else {
            return settings;
        };

        if let Some(v) = obj.get("enabled").and_then(Value::as_bool) {
            settings.enabled = v;
        }
        if let Some(v) = obj
            .get("position")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
        {
            settings.position = v;
        }
        if let Some(v) = obj
            .get("fontSize")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
        {
            settings.font_size = v;
        }
        if let Some(v) = obj.get("textColor").and_then(Value::as_str).and_then(CssColor::parse) {
            settings.text_color = v;
        }
        if let Some(v) = obj.get("bgColor").and_then(Value::as_str).and_then(HexColor::parse) {
            settings.bg_color = v;
        }
        if let Some(v) = obj.get("bgOpacity").and_then(lenient_f64) {
            settings.bg_opacity = clamp_opacity(v);
        }
        if let Some(v) = obj.get("alwaysShow").and_then(Value::as_bool) {
            settings.always_show = v;
        }
        if let Some(v) = obj.get("hideAfter").and_then(lenient_millis) {
            settings.hide_after = v;
        }
        settings
    }

    /// Decode an optional stored record; absence means defaults.
    pub fn from_stored(value: Option<&Value>) -> Self {
        value.map(Self::from_value).unwrap_or_default()
    }

    /// Delay before the label fades, or `None` when it stays visible.
    pub fn auto_hide_delay(&self) -> Option<u32> {
        (!self.always_show).then_some(self.hide_after)
    }

    /// Background alpha as a byte, clamping out-of-range opacity first.
    pub fn bg_alpha_byte(&self) -> u8 {
        (clamp_opacity(self.bg_opacity) * 255.0).round() as u8
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Clamp into `[0, 1]`; NaN falls back to the default opacity.
pub fn clamp_opacity(v: f64) -> f64 {
    if v.is_nan() {
        DEFAULT_BG_OPACITY
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Accept a JSON number or a numeric string, like a form field would hold.
pub fn lenient_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_float_prefix(s)?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Accept a non-negative integer of milliseconds. Fractions round, negatives
/// clamp to zero, numeric strings parse by their leading integer.
pub fn lenient_millis(value: &Value) -> Option<u32> {
    let v = match value {
        Value::Number(n) => n.as_f64()?.round(),
        Value::String(s) => parse_int_prefix(s)? as f64,
        _ => return None,
    };
    if !v.is_finite() {
        return None;
    }
    Some(v.clamp(0.0, f64::from(u32::MAX)) as u32)
}

/// Parse the longest leading decimal number, ignoring trailing garbage
/// (`"0.5abc"` → `0.5`).
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            c if c.is_ascii_digit() => seen_digit = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}

/// Parse the leading integer of a string (`"1500ms"` → `1500`).
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_record_uses_defaults() {
        let settings = Settings::from_stored(None);
        assert_eq!(settings, Settings::default());
        assert!(settings.enabled);
        assert_eq!(settings.position, Position::BottomRight);
        assert_eq!(settings.hide_after, 1000);
    }

    #[test]
    fn partial_record_fills_remaining_fields() {
        let settings = Settings::from_value(&json!({
            "position": "top-left",
            "alwaysShow": true,
        }));
        assert_eq!(settings.position, Position::TopLeft);
        assert!(settings.always_show);
        assert_eq!(settings.font_size, FontSize::Medium);
        assert_eq!(settings.bg_color.as_str(), "#000000");
    }

    #[test]
    fn unknown_keywords_fall_back() {
        let settings = Settings::from_value(&json!({
            "position": "center",
            "fontSize": "huge",
            "textColor": "",
        }));
        assert_eq!(settings.position, Position::BottomRight);
        assert_eq!(settings.font_size, FontSize::Medium);
        assert_eq!(settings.text_color, CssColor::white());
    }

    #[test]
    fn text_color_accepts_any_css_color() {
        let named = Settings::from_value(&json!({ "textColor": " rebeccapurple " }));
        assert_eq!(named.text_color.as_str(), "rebeccapurple");
        let functional = Settings::from_value(&json!({ "textColor": "rgb(255 0 0 / 50%)" }));
        assert_eq!(functional.text_color.as_str(), "rgb(255 0 0 / 50%)");
        let hex = Settings::from_value(&json!({ "textColor": "#abc" }));
        assert_eq!(hex.text_color.as_str(), "#AABBCC");

        assert_eq!(CssColor::parse("#12345"), None);
        assert_eq!(CssColor::parse("red; display: none"), None);
        // bgColor still needs hex for the alpha suffix.
        let bg = Settings::from_value(&json!({ "bgColor": "navy" }));
        assert_eq!(bg.bg_color, HexColor::black());
    }

    #[test]
    fn opacity_is_clamped_and_parsed() {
        let high = Settings::from_value(&json!({ "bgOpacity": 3.5 }));
        assert!((high.bg_opacity - 1.0).abs() < f64::EPSILON);
        let low = Settings::from_value(&json!({ "bgOpacity": -1 }));
        assert!(low.bg_opacity.abs() < f64::EPSILON);
        let text = Settings::from_value(&json!({ "bgOpacity": "0.25" }));
        assert!((text.bg_opacity - 0.25).abs() < f64::EPSILON);
        let junk = Settings::from_value(&json!({ "bgOpacity": "abc" }));
        assert!((junk.bg_opacity - DEFAULT_BG_OPACITY).abs() < f64::EPSILON);
    }

    #[test]
    fn hide_after_parses_leniently() {
        assert_eq!(Settings::from_value(&json!({ "hideAfter": "2500ms" })).hide_after, 2500);
        assert_eq!(Settings::from_value(&json!({ "hideAfter": -40 })).hide_after, 0);
        assert_eq!(Settings::from_value(&json!({ "hideAfter": 0 })).hide_after, 0);
        assert_eq!(Settings::from_value(&json!({ "hideAfter": 10.6 })).hide_after, 11);
        assert_eq!(Settings::from_value(&json!({ "hideAfter": null })).hide_after, 1000);
    }

    #[test]
    fn non_object_record_is_ignored() {
        assert_eq!(Settings::from_value(&json!("oops")), Settings::default());
        assert_eq!(Settings::from_value(&json!([1, 2])), Settings::default());
    }

    #[test]
    fn hex_colors_normalize() {
        assert_eq!(HexColor::parse("#fff"), Some(HexColor::white()));
        assert_eq!(HexColor::parse("#a1b2c3").map(|c| c.to_string()), Some("#A1B2C3".into()));
        assert_eq!(HexColor::parse("000000"), None);
        assert_eq!(HexColor::parse("#12345"), None);
        assert_eq!(HexColor::parse("#ggg"), None);
    }

    #[test]
    fn alpha_byte_rounds() {
        let settings = Settings::default();
        assert_eq!(settings.bg_alpha_byte(), 179);
        let opaque = Settings {
            bg_opacity: 1.0,
            ..Settings::default()
        };
        assert_eq!(opaque.bg_alpha_byte(), 255);
        let out_of_range = Settings {
            bg_opacity: 9.0,
            ..Settings::default()
        };
        assert_eq!(out_of_range.bg_alpha_byte(), 255);
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "enabled": true,
                "position": "bottom-right",
                "fontSize": "medium",
                "textColor": "#FFFFFF",
                "bgColor": "#000000",
                "bgOpacity": 0.7,
                "alwaysShow": false,
                "hideAfter": 1000,
            })
        );
        let back: Settings = serde_json::from_value(value).unwrap();
        assert_eq!(back, Settings::default());
    }

    #[test]
    fn auto_hide_delay_respects_always_show() {
        let mut settings = Settings::default();
        assert_eq!(settings.auto_hide_delay(), Some(1000));
        settings.always_show = true;
        assert_eq!(settings.auto_hide_delay(), None);
    }

    #[test]
    fn numeric_prefixes() {
        assert_eq!(parse_float_prefix("0.5abc"), Some(0.5));
        assert_eq!(parse_float_prefix("  .7"), Some(0.7));
        assert_eq!(parse_float_prefix("1."), Some(1.0));
        assert_eq!(parse_float_prefix("x"), None);
        assert_eq!(parse_int_prefix("1500ms"), Some(1500));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix(""), None);
    }
}
