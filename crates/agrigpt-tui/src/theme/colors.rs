//! Green field palette, with a high-contrast fallback.

use ratatui::style::Color;

/// Theme color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    // Backgrounds
    pub base: Color,
    pub surface: Color,
    pub overlay: Color,

    // Foregrounds
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,

    // Accents
    pub primary: Color,
    pub secondary: Color,

    // Semantic
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Message attribution
    pub user: Color,
    pub assistant: Color,

    // Borders
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::field()
    }
}

impl Theme {
    /// Dark theme built around leaf green.
    pub fn field() -> Self {
        Self {
            base: Color::Rgb(20, 28, 22),
            surface: Color::Rgb(34, 46, 37),
            overlay: Color::Rgb(52, 68, 55),

            text: Color::Rgb(226, 236, 222),
            subtext: Color::Rgb(176, 192, 172),
            muted: Color::Rgb(116, 134, 114),

            primary: Color::Rgb(22, 163, 74),
            secondary: Color::Rgb(190, 214, 120),

            success: Color::Rgb(134, 239, 172),
            warning: Color::Rgb(250, 204, 21),
            error: Color::Rgb(248, 113, 113),
            info: Color::Rgb(125, 211, 252),

            user: Color::Rgb(134, 239, 172),
            assistant: Color::Rgb(226, 236, 222),

            border: Color::Rgb(52, 68, 55),
            border_focused: Color::Rgb(22, 163, 74),
        }
    }

    /// High contrast theme, also used when `NO_COLOR` is set.
    pub fn high_contrast() -> Self {
        Self {
            base: Color::Black,
            surface: Color::Black,
            overlay: Color::Rgb(40, 40, 40),

            text: Color::White,
            subtext: Color::Rgb(200, 200, 200),
            muted: Color::Rgb(150, 150, 150),

            primary: Color::Green,
            secondary: Color::Yellow,

            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,

            user: Color::LightGreen,
            assistant: Color::White,

            border: Color::White,
            border_focused: Color::Green,
        }
    }

    /// Pick a theme from the environment.
    pub fn detect() -> Self {
        Self::from_no_color(std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()))
    }

    fn from_no_color(no_color: bool) -> Self {
        if no_color {
            Self::high_contrast()
        } else {
            Self::field()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_field() {
        assert!(matches!(Theme::default().base, Color::Rgb(20, 28, 22)));
    }

    #[test]
    fn test_no_color_selects_high_contrast() {
        assert!(matches!(Theme::from_no_color(true).base, Color::Black));
        assert!(matches!(
            Theme::from_no_color(false).primary,
            Color::Rgb(22, 163, 74)
        ));
    }
}
