//! Style values for markup tags: named colors, size keywords, and the
//! flattening of a segment's tag list into concrete paint attributes.

use serde::{Deserialize, Serialize};

use crate::markup::{StyleTag, TagKind};

/// sRGB RGBA, each channel 0-1.
pub type Color = [f32; 4];

/// Convert an 8-bit sRGB triple to a [`Color`] with alpha 1.0.
pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Replace the alpha channel of `color`.
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], alpha]
}

/// Stock palette shared by the markup color table and the default theme.
pub mod palette {
    use super::{Color, rgb};

    pub const RED: Color = rgb(230, 41, 55);
    pub const GREEN: Color = rgb(0, 228, 48);
    pub const BLUE: Color = rgb(0, 121, 241);
    pub const YELLOW: Color = rgb(253, 249, 0);
    pub const PURPLE: Color = rgb(200, 122, 255);
    pub const ORANGE: Color = rgb(255, 161, 0);
    pub const WHITE: Color = rgb(255, 255, 255);
    pub const RAY_WHITE: Color = rgb(245, 245, 245);
    pub const BLACK: Color = rgb(0, 0, 0);
    pub const GRAY: Color = rgb(130, 130, 130);
    pub const DARK_GRAY: Color = rgb(80, 80, 80);
    pub const LIGHT_GRAY: Color = rgb(200, 200, 200);
}

/// Font-size multiplier for `[size=small]`.
pub const SIZE_SMALL: f32 = 0.8;
/// Font-size multiplier for `[size=large]`.
pub const SIZE_LARGE: f32 = 1.5;
/// Font-size multiplier for `[size=huge]`.
pub const SIZE_HUGE: f32 = 2.0;

/// Concrete paint attributes for one run of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    pub color: Color,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl ResolvedStyle {
    /// Plain style with the given color and size.
    pub const fn new(color: Color, font_size: f32) -> Self {
        Self {
            color,
            font_size,
            bold: false,
            italic: false,
        }
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::new(palette::BLACK, 20.0)
    }
}

/// Look up a markup color name. Case-sensitive; unknown names are black.
pub fn named_color(name: &str) -> Color {
    match name {
        "red" => palette::RED,
        "green" => palette::GREEN,
        "blue" => palette::BLUE,
        "yellow" => palette::YELLOW,
        "purple" => palette::PURPLE,
        "orange" => palette::ORANGE,
        "white" => palette::WHITE,
        "black" => palette::BLACK,
        "gray" | "grey" => palette::GRAY,
        "darkgray" => palette::DARK_GRAY,
        "lightgray" => palette::LIGHT_GRAY,
        _ => palette::BLACK,
    }
}

/// Resolve a `[size=...]` value against the base font size.
///
/// Keywords scale the base size, a plain number is an absolute size, and
/// anything else leaves the base size unchanged.
pub fn resolve_size(value: &str, base_size: f32) -> f32 {
    match value {
        "small" => base_size * SIZE_SMALL,
        "large" => base_size * SIZE_LARGE,
        "huge" => base_size * SIZE_HUGE,
        other => match other.trim().parse::<f32>() {
            Ok(size) if size.is_finite() && size > 0.0 => size,
            _ => base_size,
        },
    }
}

/// Flatten a tag list onto `base`. Tags apply left to right, so a later tag
/// of the same kind overrides an earlier one.
pub fn resolve(tags: &[StyleTag], base: &ResolvedStyle) -> ResolvedStyle {
    tags.iter().fold(*base, |mut style, tag| {
        match tag.kind {
            TagKind::Color => style.color = named_color(&tag.value),
            TagKind::Size => style.font_size = resolve_size(&tag.value, base.font_size),
            TagKind::Bold => style.bold = true,
            TagKind::Italic => style.italic = true,
        }
        style
    })
}
