use crate::markup::{self, TextSegment};
use crate::style::Color;

use super::scroll::ScrollState;
use super::theme::Theme;

/// Text held by a label or dialogue box.
#[derive(Debug, Clone, PartialEq)]
pub enum TextContent {
    Plain(String),
    /// Parsed markup; segments resolve against the widget's base style.
    Styled(Vec<TextSegment>),
}

impl TextContent {
    pub fn plain(text: impl Into<String>) -> Self {
        TextContent::Plain(text.into())
    }

    /// Parse bracket markup into styled segments.
    pub fn markup(text: &str) -> Self {
        TextContent::Styled(markup::parse(text))
    }

    /// The visible text without any styling.
    pub fn to_plain_string(&self) -> String {
        match self {
            TextContent::Plain(s) => s.clone(),
            TextContent::Styled(segments) => segments.iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent::Plain(String::new())
    }
}

/// Portrait expression drawn as a simple face. `None` on the widget leaves
/// the portrait as a flat colored square for the host to paint over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Neutral,
    Happy,
    Sad,
    Angry,
}

/// Flat enum widget identity.
/// Closed set: we know all widget types. No trait objects.
#[derive(Debug, Clone)]
pub enum Widget {
    /// Background rectangle with a border.
    Panel {
        bg_color: Color,
        border_color: Color,
        border_width: f32, // pixels
        padding: f32,      // pixels
    },

    /// Text clipped to the widget bounds; optionally wrapped and scrollable.
    Label {
        text: TextContent,
        color: Color,
        font_size: f32,
        wrap: bool,
        scrollable: bool,
        scroll: ScrollState,
        scrollbar_color: Color,
    },

    /// Clickable rectangle with centered text.
    Button {
        text: String,
        color: Color,
        bg_color: Color,
        hover_color: Color,
        font_size: f32,
    },

    /// Dialogue box with a portrait, optional speaker tag and scrollable text.
    PortraitDialogue {
        speaker: Option<String>,
        text: TextContent,
        portrait_color: Color,
        mood: Option<Mood>,
        show_on_right: bool,
        text_color: Color,
        font_size: f32,
        scroll: ScrollState,
    },
}

impl Widget {
    pub fn panel(theme: &Theme) -> Self {
        Widget::Panel {
            bg_color: theme.panel_bg,
            border_color: theme.panel_border_color,
            border_width: theme.panel_border_width,
            padding: theme.panel_padding,
        }
    }

    pub fn label(text: TextContent, wrap: bool, theme: &Theme) -> Self {
        Widget::Label {
            text,
            color: theme.text_color,
            font_size: theme.font_size,
            wrap,
            scrollable: true,
            scroll: ScrollState::with_steps(theme.scroll),
            scrollbar_color: theme.scrollbar_color,
        }
    }

    pub fn button(text: impl Into<String>, theme: &Theme) -> Self {
        Widget::Button {
            text: text.into(),
            color: theme.button_text,
            bg_color: theme.button_bg,
            hover_color: theme.button_hover,
            font_size: theme.font_size,
        }
    }

    pub fn portrait_dialogue(speaker: Option<&str>, text: TextContent, theme: &Theme) -> Self {
        Widget::PortraitDialogue {
            speaker: speaker.map(str::to_string),
            text,
            portrait_color: theme.portrait_color,
            mood: None,
            show_on_right: false,
            text_color: theme.text_color,
            font_size: theme.font_size,
            scroll: ScrollState::with_steps(theme.scroll),
        }
    }

    /// Text laid out inside the widget, if it has any.
    pub fn text_content(&self) -> Option<&TextContent> {
        match self {
            Widget::Label { text, .. } | Widget::PortraitDialogue { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn scroll(&self) -> Option<&ScrollState> {
        match self {
            Widget::Label {
                scroll, scrollable, ..
            } => scrollable.then_some(scroll),
            Widget::PortraitDialogue { scroll, .. } => Some(scroll),
            _ => None,
        }
    }

    pub fn scroll_mut(&mut self) -> Option<&mut ScrollState> {
        match self {
            Widget::Label {
                scroll, scrollable, ..
            } => scrollable.then_some(scroll),
            Widget::PortraitDialogue { scroll, .. } => Some(scroll),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_read_theme() {
        let theme = Theme::default();
        let Widget::Button {
            bg_color,
            hover_color,
            font_size,
            ..
        } = Widget::button("OK", &theme)
        else {
            panic!("expected button");
        };
        assert_eq!(bg_color, theme.button_bg);
        assert_eq!(hover_color, theme.button_hover);
        assert!((font_size - 20.0).abs() < 0.01);

        let dialogue = Widget::portrait_dialogue(Some("Ann"), TextContent::plain("hi"), &theme);
        let Widget::PortraitDialogue {
            speaker,
            show_on_right,
            ..
        } = &dialogue
        else {
            panic!("expected portrait dialogue");
        };
        assert_eq!(speaker.as_deref(), Some("Ann"));
        assert!(!show_on_right);
    }

    #[test]
    fn markup_content_strips_to_plain() {
        let text = TextContent::markup("Hello [color=red]world[/color]!");
        assert_eq!(text.to_plain_string(), "Hello world!");
        assert!(matches!(text, TextContent::Styled(ref s) if s.len() == 3));
    }

    #[test]
    fn scroll_only_when_scrollable() {
        let theme = Theme::default();
        let mut label = Widget::label(TextContent::plain("x"), true, &theme);
        assert!(label.scroll().is_some());
        if let Widget::Label { scrollable, .. } = &mut label {
            *scrollable = false;
        }
        assert!(label.scroll().is_none());
        assert!(Widget::panel(&theme).scroll().is_none());
    }
}
