use crate::style::{Color, ResolvedStyle};

use super::Rect;

/// Filled rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct RectCommand {
    pub rect: Rect,
    pub color: Color,
}

/// Rectangle outline drawn inside `rect`.
#[derive(Debug, Clone, PartialEq)]
pub struct RectLinesCommand {
    pub rect: Rect,
    pub thickness: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineCommand {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub thickness: f32,
    pub color: Color,
}

/// Filled circle.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleCommand {
    pub center: (f32, f32),
    pub radius: f32,
    pub color: Color,
}

/// One run of text at a fixed position. `y` is the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    /// Clip region; the host must not draw outside it.
    pub scissor: Option<Rect>,
}

impl TextCommand {
    pub fn new(text: impl Into<String>, x: f32, y: f32, style: &ResolvedStyle) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size: style.font_size,
            color: style.color,
            bold: style.bold,
            italic: style.italic,
            scissor: None,
        }
    }

    pub fn clipped(mut self, scissor: Rect) -> Self {
        self.scissor = Some(scissor);
        self
    }
}

/// Collects draw commands from the widget tree.
/// Decouples widget logic from whatever renders them.
///
/// Commands of one kind keep emission order. Hosts draw `rects`, then
/// `rect_lines`, `circles`, `lines` and finally `texts`.
#[derive(Debug, Default)]
pub struct DrawList {
    pub rects: Vec<RectCommand>,
    pub rect_lines: Vec<RectLinesCommand>,
    pub lines: Vec<LineCommand>,
    pub circles: Vec<CircleCommand>,
    pub texts: Vec<TextCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.rect_lines.clear();
        self.lines.clear();
        self.circles.clear();
        self.texts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
            && self.rect_lines.is_empty()
            && self.lines.is_empty()
            && self.circles.is_empty()
            && self.texts.is_empty()
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.rects.push(RectCommand { rect, color });
    }

    pub fn rect_lines(&mut self, rect: Rect, thickness: f32, color: Color) {
        if thickness > 0.0 {
            self.rect_lines.push(RectLinesCommand {
                rect,
                thickness,
                color,
            });
        }
    }

    pub fn line(&mut self, start: (f32, f32), end: (f32, f32), thickness: f32, color: Color) {
        self.lines.push(LineCommand {
            start,
            end,
            thickness,
            color,
        });
    }

    pub fn circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.circles.push(CircleCommand {
            center,
            radius,
            color,
        });
    }

    pub fn text(&mut self, command: TextCommand) {
        self.texts.push(command);
    }
}
