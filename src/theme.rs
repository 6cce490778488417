// Dark glass palette for the unlock card

use ratatui::style::Color;

pub struct Theme;

impl Theme {
    // Backgrounds
    pub const BASE: Color = Color::Rgb(8, 8, 18);
    pub const PANEL_BG: Color = Color::Rgb(14, 14, 28);
    pub const GLASS_1: Color = Color::Rgb(18, 18, 32);
    pub const GLASS_2: Color = Color::Rgb(22, 22, 38);

    // Text
    pub const TEXT: Color = Color::Rgb(255, 255, 255);
    pub const SUBTEXT1: Color = Color::Rgb(200, 210, 230);
    pub const SUBTEXT0: Color = Color::Rgb(160, 170, 200);
    pub const OVERLAY1: Color = Color::Rgb(80, 90, 120);
    pub const DIM: Color = Color::Rgb(50, 55, 75);

    // Accents
    pub const CYAN_NEON: Color = Color::Rgb(0, 255, 255);
    pub const GREEN_NEON: Color = Color::Rgb(80, 255, 150);
    pub const RED_NEON: Color = Color::Rgb(255, 80, 120);
    pub const YELLOW_NEON: Color = Color::Rgb(255, 220, 0);
    pub const PURPLE: Color = Color::Rgb(160, 100, 255);

    // Borders
    pub const BORDER_DIM: Color = Color::Rgb(40, 50, 70);
    pub const BORDER_GLOW: Color = Color::Rgb(0, 200, 255);

    /// Border of the focused card
    pub const fn active_border() -> Color {
        Self::BORDER_GLOW
    }

    pub const fn inactive_border() -> Color {
        Self::BORDER_DIM
    }

    /// Field message after the node accepted the password
    pub const fn success() -> Color {
        Self::GREEN_NEON
    }

    pub const fn error() -> Color {
        Self::RED_NEON
    }

    /// Focused input text
    pub const fn selection() -> Color {
        Self::YELLOW_NEON
    }

    pub const fn glass_panel() -> Color {
        Self::GLASS_1
    }

    pub const fn glass_elevated() -> Color {
        Self::GLASS_2
    }
}
