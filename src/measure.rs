//! Text measurement supplied by the host renderer.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics as CosmicMetrics, Shaping, Style, Weight};

use crate::style::ResolvedStyle;

/// Width of a string at a given font size, in pixels.
///
/// Any `FnMut(&str, f32) -> f32` closure is a measurer, which keeps call
/// sites that only have a host callback free of wrapper types.
pub trait TextMeasure {
    fn measure(&mut self, text: &str, font_size: f32) -> f32;

    /// Measure with the full style. Backends that have bold/italic faces
    /// override this; the default only looks at the size.
    fn measure_styled(&mut self, text: &str, style: &ResolvedStyle) -> f32 {
        self.measure(text, style.font_size)
    }
}

impl<F> TextMeasure for F
where
    F: FnMut(&str, f32) -> f32,
{
    fn measure(&mut self, text: &str, font_size: f32) -> f32 {
        self(text, font_size)
    }
}

/// Fixed advance per character: `font_size * advance_ratio`.
/// Used headless and in tests where no font is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonoMeasure {
    pub advance_ratio: f32,
}

impl MonoMeasure {
    pub const fn new(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }
}

impl Default for MonoMeasure {
    fn default() -> Self {
        // Rough glyph width estimate for proportional fonts.
        Self::new(0.6)
    }
}

impl TextMeasure for MonoMeasure {
    fn measure(&mut self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance_ratio
    }
}

/// Shaped measurement through cosmic-text.
pub struct CosmicMeasure {
    font_system: FontSystem,
    family: Option<String>,
}

impl CosmicMeasure {
    pub fn new(font_system: FontSystem) -> Self {
        Self {
            font_system,
            family: None,
        }
    }

    /// Build a font system holding a single font file's data.
    pub fn from_font_data(data: Vec<u8>) -> Self {
        let mut db = cosmic_text::fontdb::Database::new();
        db.load_font_data(data);
        let font_system = FontSystem::new_with_locale_and_db("en-US".to_string(), db);
        Self::new(font_system)
    }

    /// Restrict shaping to a named family instead of the default sans-serif.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    fn shaped_width(&mut self, text: &str, style: &ResolvedStyle) -> f32 {
        if text.is_empty() || style.font_size <= 0.0 {
            return 0.0;
        }
        let metrics = CosmicMetrics::new(style.font_size, style.font_size * 1.5);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);

        let family = match &self.family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let mut attrs = Attrs::new().family(family);
        if style.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        if style.italic {
            attrs = attrs.style(Style::Italic);
        }
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);

        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0_f32, f32::max)
    }
}

impl TextMeasure for CosmicMeasure {
    fn measure(&mut self, text: &str, font_size: f32) -> f32 {
        let style = ResolvedStyle {
            font_size,
            ..ResolvedStyle::default()
        };
        self.shaped_width(text, &style)
    }

    fn measure_styled(&mut self, text: &str, style: &ResolvedStyle) -> f32 {
        self.shaped_width(text, style)
    }
}
