//! Scroll offset bookkeeping for clipped text areas.
//!
//! Invariant: `0 <= offset <= max(0, content_height - viewport_height)`,
//! restored after every mutation.

use serde::{Deserialize, Serialize};

use super::Rect;

/// Directional scroll inputs, already mapped from key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Pixel distances for one scroll input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSteps {
    /// Pixels per wheel tick.
    pub wheel: f32,
    /// Pixels per frame while an arrow key is held.
    pub key: f32,
}

impl Default for ScrollSteps {
    fn default() -> Self {
        Self {
            wheel: 20.0,
            key: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    offset: f32,
    content_height: f32,
    pub steps: ScrollSteps,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(steps: ScrollSteps) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Largest valid offset for the given viewport; zero when content fits.
    pub fn max_offset(&self, viewport_height: f32) -> f32 {
        (self.content_height - viewport_height).max(0.0)
    }

    pub fn can_scroll(&self, viewport_height: f32) -> bool {
        self.content_height > viewport_height
    }

    /// Record a new content height (after relayout) and re-clamp.
    pub fn set_content_height(&mut self, content_height: f32, viewport_height: f32) {
        self.content_height = content_height.max(0.0);
        self.clamp(viewport_height);
    }

    pub fn set_offset(&mut self, offset: f32, viewport_height: f32) {
        self.offset = offset;
        self.clamp(viewport_height);
    }

    /// Positive ticks scroll towards the top of the content.
    pub fn apply_wheel(&mut self, ticks: f32, viewport_height: f32) {
        self.offset -= ticks * self.steps.wheel;
        self.clamp(viewport_height);
    }

    pub fn apply_key(&mut self, key: ScrollKey, viewport_height: f32) {
        match key {
            ScrollKey::Up => self.offset -= self.steps.key,
            ScrollKey::Down => self.offset += self.steps.key,
            ScrollKey::PageUp => self.offset -= viewport_height / 2.0,
            ScrollKey::PageDown => self.offset += viewport_height / 2.0,
            ScrollKey::Home => self.offset = 0.0,
            ScrollKey::End => self.offset = self.max_offset(viewport_height),
        }
        self.clamp(viewport_height);
    }

    pub fn clamp(&mut self, viewport_height: f32) {
        let max = self.max_offset(viewport_height);
        // NaN from a degenerate viewport collapses to the top.
        self.offset = if self.offset.is_nan() {
            0.0
        } else {
            self.offset.clamp(0.0, max)
        };
    }

    /// Back to the top, keeping the content height.
    pub fn reset(&mut self) {
        self.offset = 0.0;
    }
}

/// Scrollbar geometry in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scrollbar {
    pub track: Rect,
    pub thumb: Rect,
}

/// Scrollbar on the right edge of `viewport`, or `None` when nothing scrolls.
pub fn scrollbar(state: &ScrollState, viewport: Rect, width: f32) -> Option<Scrollbar> {
    let vh = viewport.height;
    let content = state.content_height();
    if vh <= 0.0 || content <= vh {
        return None;
    }

    let track = Rect {
        x: viewport.x + viewport.width - width,
        y: viewport.y,
        width,
        height: vh,
    };

    let thumb_h = vh * (vh / content);
    let thumb_y = (viewport.y + (state.offset() / content) * vh).min(viewport.y + vh - thumb_h);
    let thumb = Rect {
        x: track.x,
        y: thumb_y,
        width,
        height: thumb_h,
    };

    Some(Scrollbar { track, thumb })
}
