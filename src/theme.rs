//! Built-in color themes.
//!
//! ```
//! use game_2048::theme::{theme, tile_color};
//!
//! let dark = theme("dark");
//! assert_eq!(tile_color(dark, 2).background, "#2d3a4f");
//! // Unknown ids fall back to the classic theme.
//! assert_eq!(theme("neon").id, "classic");
//! ```

use serde::Serialize;

use crate::engine::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileColor {
    pub background: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub board: &'static str,
    pub cell: &'static str,
    pub text: &'static str,
    pub tiles: &'static [(Tile, TileColor)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub colors: Palette,
}

/// Color for tiles past the end of a theme's table.
pub const FALLBACK_TILE: TileColor = TileColor { background: "#3c3a32", text: "#f9f6f2" };

const fn tc(background: &'static str, text: &'static str) -> TileColor {
    TileColor { background, text }
}

const CLASSIC_TILES: [(Tile, TileColor); 13] = [
    (2, tc("#eee4da", "#776e65")),
    (4, tc("#ede0c8", "#776e65")),
    (8, tc("#f2b179", "#f9f6f2")),
    (16, tc("#f59563", "#f9f6f2")),
    (32, tc("#f67c5f", "#f9f6f2")),
    (64, tc("#f65e3b", "#f9f6f2")),
    (128, tc("#edcf72", "#f9f6f2")),
    (256, tc("#edcc61", "#f9f6f2")),
    (512, tc("#edc850", "#f9f6f2")),
    (1024, tc("#edc53f", "#f9f6f2")),
    (2048, tc("#edc22e", "#f9f6f2")),
    (4096, tc("#3c3a32", "#f9f6f2")),
    (8192, tc("#3c3a32", "#f9f6f2")),
];

const DARK_TILES: [(Tile, TileColor); 13] = [
    (2, tc("#2d3a4f", "#eaeaea")),
    (4, tc("#3d4a5f", "#eaeaea")),
    (8, tc("#e94560", "#f9f6f2")),
    (16, tc("#ff6b6b", "#f9f6f2")),
    (32, tc("#feca57", "#1a1a2e")),
    (64, tc("#ff9ff3", "#1a1a2e")),
    (128, tc("#54a0ff", "#f9f6f2")),
    (256, tc("#5f27cd", "#f9f6f2")),
    (512, tc("#00d2d3", "#1a1a2e")),
    (1024, tc("#ff9f43", "#f9f6f2")),
    (2048, tc("#10ac84", "#f9f6f2")),
    (4096, tc("#ee5a24", "#f9f6f2")),
    (8192, tc("#0984e3", "#f9f6f2")),
];

const FOREST_TILES: [(Tile, TileColor); 13] = [
    (2, tc("#c8e6c9", "#1b5e20")),
    (4, tc("#a5d6a7", "#1b5e20")),
    (8, tc("#81c784", "#1b5e20")),
    (16, tc("#66bb6a", "#f9f6f2")),
    (32, tc("#4caf50", "#f9f6f2")),
    (64, tc("#43a047", "#f9f6f2")),
    (128, tc("#388e3c", "#f9f6f2")),
    (256, tc("#2e7d32", "#f9f6f2")),
    (512, tc("#1b5e20", "#f9f6f2")),
    (1024, tc("#d4e157", "#1b5e20")),
    (2048, tc("#afb42b", "#f9f6f2")),
    (4096, tc("#827717", "#f9f6f2")),
    (8192, tc("#33691e", "#f9f6f2")),
];

pub static THEMES: [Theme; 3] = [
    Theme {
        id: "classic",
        name: "Classic",
        colors: Palette {
            background: "#faf8ef",
            board: "#bbada0",
            cell: "rgba(238, 228, 218, 0.35)",
            text: "#776e65",
            tiles: &CLASSIC_TILES,
        },
    },
    Theme {
        id: "dark",
        name: "Dark",
        colors: Palette {
            background: "#1a1a2e",
            board: "#16213e",
            cell: "rgba(255, 255, 255, 0.05)",
            text: "#eaeaea",
            tiles: &DARK_TILES,
        },
    },
    Theme {
        id: "forest",
        name: "Forest",
        colors: Palette {
            background: "#e8f5e9",
            board: "#4caf50",
            cell: "rgba(255, 255, 255, 0.3)",
            text: "#1b5e20",
            tiles: &FOREST_TILES,
        },
    },
];

/// Theme by id, or the classic theme if none matches.
pub fn theme(id: &str) -> &'static Theme {
    THEMES.iter().find(|t| t.id == id).unwrap_or(&THEMES[0])
}

pub fn tile_color(theme: &Theme, value: Tile) -> TileColor {
    theme
        .colors
        .tiles
        .iter()
        .find(|(v, _)| *v == value)
        .map_or(FALLBACK_TILE, |(_, c)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_covers_2_through_8192() {
        for t in &THEMES {
            let values: Vec<Tile> = t.colors.tiles.iter().map(|(v, _)| *v).collect();
            let expected: Vec<Tile> = (1..=13).map(|p| 1 << p).collect();
            assert_eq!(values, expected, "{}", t.id);
        }
    }

    #[test]
    fn lookups_fall_back() {
        assert_eq!(theme("forest").name, "Forest");
        assert_eq!(theme("").id, "classic");
        assert_eq!(tile_color(theme("dark"), 16384), FALLBACK_TILE);
        assert_eq!(tile_color(theme("classic"), 3), FALLBACK_TILE);
        assert_eq!(tile_color(theme("forest"), 1024).text, "#1b5e20");
    }
}
