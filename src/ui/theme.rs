use serde::{Deserialize, Serialize};

use crate::style::{Color, ResolvedStyle, palette};

use super::scroll::ScrollSteps;

/// Default click dedup window in milliseconds.
pub const DEFAULT_CLICK_WINDOW_MS: u64 = 100;

/// Centralized visual style constants.
///
/// Widgets read from Theme at construction time instead of hardcoding
/// colors. Loadable from RON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    // -- Text --
    /// Default text color (sRGB RGBA).
    pub text_color: Color,
    /// Default font size in pixels.
    pub font_size: f32,

    // -- Button defaults --
    pub button_bg: Color,
    /// Background while the pointer is over the button.
    pub button_hover: Color,
    pub button_text: Color,

    // -- Panel defaults --
    pub panel_bg: Color,
    pub panel_border_color: Color,
    /// Panel border width in pixels.
    pub panel_border_width: f32,
    /// Panel padding in pixels.
    pub panel_padding: f32,

    // -- Scrollable text --
    pub scrollbar_color: Color,
    /// Scrollbar width in pixels.
    pub scrollbar_width: f32,
    /// Space between text and scrollbar in pixels.
    pub scrollbar_gutter: f32,
    /// Alpha of the scrollbar track behind the thumb.
    pub scrollbar_track_alpha: f32,
    pub scroll: ScrollSteps,

    // -- Portrait dialogue --
    /// Square portrait edge length in pixels.
    pub portrait_size: f32,
    /// Padding around portrait, name tag and text area.
    pub portrait_padding: f32,
    pub portrait_color: Color,
    pub name_tag_width: f32,
    pub name_tag_height: f32,
    pub name_tag_color: Color,
    pub name_color: Color,
    pub name_font_size: f32,
    pub dialogue_box_color: Color,
    pub dialogue_border_color: Color,
    pub dialogue_border_width: f32,

    // -- Input --
    /// Presses on the same widget within this window count as one click
    /// (milliseconds).
    pub click_window_ms: u64,
}

impl Theme {
    /// Load a theme from a RON file. Unreadable or malformed files log a
    /// warning and yield the defaults.
    pub fn load(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("failed to read {}: {}, using default theme", path, e);
                return Self::default();
            }
        };
        match ron::from_str::<Theme>(&content) {
            Ok(theme) => theme,
            Err(e) => {
                log::warn!("failed to parse RON {}: {}, using default theme", path, e);
                Self::default()
            }
        }
    }

    /// Base style for body text.
    pub fn text_style(&self) -> ResolvedStyle {
        ResolvedStyle::new(self.text_color, self.font_size)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_color: palette::BLACK,
            font_size: 20.0,

            button_bg: palette::LIGHT_GRAY,
            button_hover: palette::GRAY,
            button_text: palette::BLACK,

            panel_bg: palette::RAY_WHITE,
            panel_border_color: palette::DARK_GRAY,
            panel_border_width: 2.0,
            panel_padding: 10.0,

            scrollbar_color: palette::GRAY,
            scrollbar_width: 8.0,
            scrollbar_gutter: 5.0,
            scrollbar_track_alpha: 0.2,
            scroll: ScrollSteps::default(),

            portrait_size: 100.0,
            portrait_padding: 10.0,
            portrait_color: palette::LIGHT_GRAY,
            name_tag_width: 120.0,
            name_tag_height: 40.0,
            name_tag_color: palette::DARK_GRAY,
            name_color: palette::WHITE,
            name_font_size: 20.0,
            dialogue_box_color: palette::WHITE,
            dialogue_border_color: palette::DARK_GRAY,
            dialogue_border_width: 2.0,

            click_window_ms: DEFAULT_CLICK_WINDOW_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_stock_widgets() {
        let t = Theme::default();
        assert!((t.font_size - 20.0).abs() < 0.01);
        assert_eq!(t.button_bg, palette::LIGHT_GRAY);
        assert_eq!(t.button_hover, palette::GRAY);
        assert_eq!(t.panel_border_color, palette::DARK_GRAY);
        assert!((t.panel_border_width - 2.0).abs() < 0.01);
        assert!((t.panel_padding - 10.0).abs() < 0.01);
        assert!((t.scrollbar_width - 8.0).abs() < 0.01);
        assert!((t.portrait_size - 100.0).abs() < 0.01);
        assert!((t.scroll.wheel - 20.0).abs() < 0.01);
        assert!((t.scroll.key - 10.0).abs() < 0.01);
        assert_eq!(t.click_window_ms, 100);
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let theme: Theme =
            ron::from_str("(font_size: 24.0, scroll: (wheel: 40.0))").expect("valid RON");
        assert!((theme.font_size - 24.0).abs() < 0.01);
        assert!((theme.scroll.wheel - 40.0).abs() < 0.01);
        assert!((theme.scroll.key - 10.0).abs() < 0.01);
        assert_eq!(theme.button_bg, palette::LIGHT_GRAY);
    }

    #[test]
    fn load_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().expect("tempdir");

        let missing = dir.path().join("missing.ron");
        assert_eq!(Theme::load(&missing.to_string_lossy()), Theme::default());

        let broken = dir.path().join("broken.ron");
        std::fs::write(&broken, "(font_size: ").expect("write");
        assert_eq!(Theme::load(&broken.to_string_lossy()), Theme::default());

        let good = dir.path().join("good.ron");
        std::fs::write(&good, "(name_font_size: 18.0)").expect("write");
        let theme = Theme::load(&good.to_string_lossy());
        assert!((theme.name_font_size - 18.0).abs() < 0.01);
    }

    #[test]
    fn text_style_uses_theme() {
        let t = Theme::default();
        let style = t.text_style();
        assert_eq!(style.color, t.text_color);
        assert!((style.font_size - t.font_size).abs() < 0.01);
    }
}
