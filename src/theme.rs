//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::grid::TileKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Built-in tile colours (One Dark family), in `TileKind::ALL` order.
const DEFAULT_TILES: [&str; 8] = [
    "#E06C75", // ruby
    "#D19A66", // amber
    "#E5C07B", // topaz
    "#98C379", // jade
    "#61AFEF", // sapphire
    "#C678DD", // amethyst
    "#DCDFE4", // pearl
    "#7F848E", // onyx
];

/// btop keys used when a theme has no `tileN` entry.
const BTOP_TILE_KEYS: [&str; 8] = [
    "cpu_end",
    "temp_mid",
    "title",
    "mem_box",
    "cpu_box",
    "net_box",
    "main_fg",
    "inactive_fg",
];

/// Tile and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// One colour per tile kind.
    pub tiles: [Color; 8],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, best).
    pub main_fg: Color,
    /// Titles and the shuffle button.
    pub title: Color,
    /// Help line and disabled button.
    pub inactive_fg: Color,
    /// Selection and keyboard cursor.
    pub highlight: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Tile colours come from `tile0`..`tile7`, else from the nearest btop key.
    /// No path means built-in colours.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_theme_file(&s)))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let fallback = |hex: &str| parse_hex(hex).unwrap_or(Color::Gray);
        let tiles = std::array::from_fn(|i| {
            get(&format!("tile{i}"))
                .or_else(|| get(BTOP_TILE_KEYS[i]))
                .unwrap_or_else(|| fallback(DEFAULT_TILES[i]))
        });
        Self {
            tiles,
            bg: get("meter_bg").unwrap_or_else(|| fallback("#31353F")),
            div_line: get("div_line").unwrap_or_else(|| fallback("#3F444F")),
            main_fg: get("main_fg").unwrap_or_else(|| fallback("#ABB2BF")),
            title: get("title").unwrap_or_else(|| fallback("#E5C07B")),
            inactive_fg: get("inactive_fg").unwrap_or_else(|| fallback("#5C6370")),
            highlight: get("hi_fg").unwrap_or_else(|| fallback("#FFFFFF")),
        }
    }

    #[inline]
    pub fn tile_color(&self, kind: TileKind) -> Color {
        self.tiles[kind.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
