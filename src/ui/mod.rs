mod draw;
mod input;
mod keybindings;
pub mod scroll;
mod theme;
mod widget;

pub use draw::{CircleCommand, DrawList, LineCommand, RectCommand, RectLinesCommand, TextCommand};
pub use input::{FrameInput, InputDeduper, UiEvent, UiState};
pub use keybindings::{Action, KeyBindings, KeyCombo, ModifierFlags};
pub use scroll::{ScrollKey, ScrollState, ScrollSteps, Scrollbar};
pub use theme::Theme;
pub use widget::{Mood, TextContent, Widget};

use slotmap::{SlotMap, new_key_type};

use crate::layout::{self, LayoutConfig, TextLayout};
use crate::locale::Localizer;
use crate::measure::TextMeasure;
use crate::style::{self, Color, ResolvedStyle, palette};

new_key_type! {
    /// Handle into the widget arena. Stable across insertions/removals.
    pub struct WidgetId;
}

/// Click or enter/exit handler. The context is owned by the caller and
/// handed to every `update` and transition call.
pub type Callback<C> = Box<dyn FnMut(&mut C)>;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the point (px, py) is inside this rectangle.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Shrink by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f32) -> Rect {
        Rect {
            x: self.x + amount,
            y: self.y + amount,
            width: (self.width - 2.0 * amount).max(0.0),
            height: (self.height - 2.0 * amount).max(0.0),
        }
    }
}

/// Sub-rectangles of a portrait dialogue box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortraitLayout {
    pub portrait: Rect,
    /// Present only when the box has a speaker.
    pub name_tag: Option<Rect>,
    /// Clipped, scrollable text area.
    pub text: Rect,
}

/// Place portrait, name tag and text inside `bounds`.
///
/// The portrait sits in the top corner on its side; the name tag sits
/// beside it towards the middle and pushes the text area down.
pub fn portrait_layout(
    bounds: Rect,
    show_on_right: bool,
    has_speaker: bool,
    theme: &Theme,
) -> PortraitLayout {
    let size = theme.portrait_size;
    let pad = theme.portrait_padding;
    let name_h = if has_speaker {
        theme.name_tag_height
    } else {
        0.0
    };

    let portrait_x = if show_on_right {
        bounds.x + bounds.width - size - pad
    } else {
        bounds.x + pad
    };
    let portrait_y = bounds.y + pad;
    let portrait = Rect::new(portrait_x, portrait_y, size, size);

    let name_tag = has_speaker.then(|| {
        let x = if show_on_right {
            portrait_x - theme.name_tag_width
        } else {
            portrait_x + size
        };
        Rect::new(x, portrait_y, theme.name_tag_width, theme.name_tag_height)
    });

    let (text_x, text_w) = if show_on_right {
        (bounds.x + pad, portrait_x - bounds.x - 2.0 * pad)
    } else {
        let x = portrait_x + size + pad;
        (x, bounds.x + bounds.width - x - pad)
    };
    let text = Rect::new(
        text_x,
        portrait_y + name_h + pad,
        text_w.max(0.0),
        (bounds.height - name_h - 3.0 * pad).max(0.0),
    );

    PortraitLayout {
        portrait,
        name_tag,
        text,
    }
}

// ---------------------------------------------------------------------------
// Widget node (arena entry)
// ---------------------------------------------------------------------------

/// Translation keys a widget's text is bound to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleKeys {
    /// Label/button/dialogue text.
    pub text: Option<String>,
    /// Portrait dialogue speaker name.
    pub speaker: Option<String>,
}

/// Arena entry pairing a widget with tree and layout metadata.
pub struct WidgetNode<C> {
    pub widget: Widget,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    /// Screen-space bounds.
    pub bounds: Rect,
    /// Invisible widgets and their children neither update nor draw.
    pub visible: bool,
    /// Disabled widgets draw but ignore input.
    pub enabled: bool,
    /// Text layout must be rebuilt before the next draw.
    pub dirty: bool,
    pub(crate) layout: Option<TextLayout>,
    on_click: Option<Callback<C>>,
    pub locale_keys: Option<LocaleKeys>,
}

impl<C> WidgetNode<C> {
    fn new(widget: Widget, parent: Option<WidgetId>) -> Self {
        Self {
            widget,
            parent,
            children: Vec::new(),
            bounds: Rect::default(),
            visible: true,
            enabled: true,
            dirty: true,
            layout: None,
            on_click: None,
            locale_keys: None,
        }
    }

    /// Last text layout, if the widget holds text and has been laid out.
    pub fn text_layout(&self) -> Option<&TextLayout> {
        self.layout.as_ref()
    }

    pub fn has_on_click(&self) -> bool {
        self.on_click.is_some()
    }
}

// ---------------------------------------------------------------------------
// WidgetTree
// ---------------------------------------------------------------------------

/// Arena-backed retained widget tree. `C` is the callback context type.
pub struct WidgetTree<C> {
    arena: SlotMap<WidgetId, WidgetNode<C>>,
    roots: Vec<WidgetId>,
    theme: Theme,
}

impl<C> Default for WidgetTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> WidgetTree<C> {
    pub fn new() -> Self {
        Self::with_theme(Theme::default())
    }

    /// Tree whose structural metrics (portrait geometry, scrollbars, name
    /// tags) come from `theme`.
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            arena: SlotMap::with_key(),
            roots: Vec::new(),
            theme,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Insert a widget as a root (no parent).
    pub fn insert_root(&mut self, widget: Widget, bounds: Rect) -> WidgetId {
        let mut node = WidgetNode::new(widget, None);
        node.bounds = bounds;
        let id = self.arena.insert(node);
        self.roots.push(id);
        id
    }

    /// Insert a widget as the last child of `parent`. Returns the new
    /// widget's id, or `None` if `parent` does not exist.
    pub fn insert(&mut self, parent: WidgetId, widget: Widget, bounds: Rect) -> Option<WidgetId> {
        if !self.arena.contains_key(parent) {
            return None;
        }
        let mut node = WidgetNode::new(widget, Some(parent));
        node.bounds = bounds;
        let id = self.arena.insert(node);
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(id);
        }
        Some(id)
    }

    /// Remove a widget and all its descendants.
    pub fn remove(&mut self, id: WidgetId) {
        let mut to_remove = Vec::new();
        Self::collect_subtree(&self.arena, id, &mut to_remove);

        // Unlink from parent.
        if let Some(node) = self.arena.get(id)
            && let Some(parent_id) = node.parent
            && let Some(parent) = self.arena.get_mut(parent_id)
        {
            parent.children.retain(|c| *c != id);
        }

        self.roots.retain(|r| *r != id);

        for rid in to_remove {
            self.arena.remove(rid);
        }
    }

    fn collect_subtree(
        arena: &SlotMap<WidgetId, WidgetNode<C>>,
        id: WidgetId,
        out: &mut Vec<WidgetId>,
    ) {
        out.push(id);
        if let Some(node) = arena.get(id) {
            for &child in &node.children {
                Self::collect_subtree(arena, child, out);
            }
        }
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode<C>> {
        self.arena.get(id)
    }

    /// Mutable access to a node. Marks it dirty, since the caller may change
    /// anything that feeds the text layout.
    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode<C>> {
        let node = self.arena.get_mut(id)?;
        node.dirty = true;
        Some(node)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Root widget ids.
    pub fn roots(&self) -> &[WidgetId] {
        &self.roots
    }

    pub fn mark_dirty(&mut self, id: WidgetId) {
        if let Some(node) = self.arena.get_mut(id) {
            node.dirty = true;
        }
    }

    pub fn set_bounds(&mut self, id: WidgetId, bounds: Rect) {
        if let Some(node) = self.arena.get_mut(id)
            && node.bounds != bounds
        {
            node.bounds = bounds;
            node.dirty = true;
        }
    }

    pub fn set_visible(&mut self, id: WidgetId, visible: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.visible = visible;
        }
    }

    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.enabled = enabled;
        }
    }

    pub fn set_on_click(&mut self, id: WidgetId, callback: impl FnMut(&mut C) + 'static) {
        if let Some(node) = self.arena.get_mut(id) {
            node.on_click = Some(Box::new(callback));
        }
    }

    pub fn clear_on_click(&mut self, id: WidgetId) {
        if let Some(node) = self.arena.get_mut(id) {
            node.on_click = None;
        }
    }

    /// Replace the text of a label, button or dialogue box. Scroll position
    /// resets to the top.
    pub fn set_text(&mut self, id: WidgetId, content: TextContent) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        match &mut node.widget {
            Widget::Label { text, scroll, .. } | Widget::PortraitDialogue { text, scroll, .. } => {
                *text = content;
                scroll.reset();
            }
            Widget::Button { text, .. } => *text = content.to_plain_string(),
            Widget::Panel { .. } => return,
        }
        node.dirty = true;
    }

    pub fn set_portrait_speaker(&mut self, id: WidgetId, name: Option<&str>) {
        if let Some(node) = self.arena.get_mut(id)
            && let Widget::PortraitDialogue { speaker, .. } = &mut node.widget
        {
            *speaker = name.map(str::to_string);
            // Speaker presence moves the text area.
            node.dirty = true;
        }
    }

    pub fn set_portrait_color(&mut self, id: WidgetId, color: Color) {
        if let Some(node) = self.arena.get_mut(id)
            && let Widget::PortraitDialogue { portrait_color, .. } = &mut node.widget
        {
            *portrait_color = color;
        }
    }

    pub fn set_portrait_mood(&mut self, id: WidgetId, value: Option<Mood>) {
        if let Some(node) = self.arena.get_mut(id)
            && let Widget::PortraitDialogue { mood, .. } = &mut node.widget
        {
            *mood = value;
        }
    }

    pub fn set_portrait_side(&mut self, id: WidgetId, on_right: bool) {
        if let Some(node) = self.arena.get_mut(id)
            && let Widget::PortraitDialogue { show_on_right, .. } = &mut node.widget
            && *show_on_right != on_right
        {
            *show_on_right = on_right;
            node.dirty = true;
        }
    }

    /// Bind a widget's text to translation keys; applied by [`Self::relocalize`].
    pub fn set_locale_keys(&mut self, id: WidgetId, keys: LocaleKeys) {
        if let Some(node) = self.arena.get_mut(id) {
            node.locale_keys = Some(keys);
        }
    }

    /// Re-read every bound translation key from `localizer`, typically after
    /// a language switch. Styled widgets stay styled.
    pub fn relocalize(&mut self, localizer: &Localizer) {
        for node in self.arena.values_mut() {
            let Some(keys) = &node.locale_keys else {
                continue;
            };
            match &mut node.widget {
                Widget::Label { text, scroll, .. } | Widget::PortraitDialogue { text, scroll, .. } => {
                    if let Some(key) = &keys.text {
                        *text = match text {
                            TextContent::Plain(_) => TextContent::Plain(localizer.get(key).to_string()),
                            TextContent::Styled(_) => TextContent::Styled(localizer.get_styled(key)),
                        };
                        scroll.reset();
                    }
                }
                Widget::Button { text, .. } => {
                    if let Some(key) = &keys.text {
                        *text = localizer.get(key).to_string();
                    }
                }
                Widget::Panel { .. } => {}
            }
            if let Widget::PortraitDialogue { speaker, .. } = &mut node.widget
                && let Some(key) = &keys.speaker
            {
                *speaker = Some(localizer.get(key).to_string());
            }
            node.dirty = true;
        }
    }

    /// Panel bounds minus padding; the widget's bounds for anything else.
    pub fn content_rect(&self, id: WidgetId) -> Option<Rect> {
        let node = self.arena.get(id)?;
        Some(match &node.widget {
            Widget::Panel { padding, .. } => node.bounds.inset(*padding),
            _ => node.bounds,
        })
    }

    /// Area the widget's text scrolls inside.
    pub fn text_viewport(&self, id: WidgetId) -> Option<Rect> {
        let node = self.arena.get(id)?;
        match &node.widget {
            Widget::Label { .. } => Some(node.bounds),
            Widget::PortraitDialogue {
                speaker,
                show_on_right,
                ..
            } => Some(
                portrait_layout(node.bounds, *show_on_right, speaker.is_some(), &self.theme).text,
            ),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Hit testing
    // ------------------------------------------------------------------

    /// Find the topmost visible widget whose bounds contain (x, y).
    /// Walks back-to-front: last child / last root is topmost.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<WidgetId> {
        for &root in self.roots.iter().rev() {
            if let Some(hit) = self.hit_test_node(root, x, y) {
                return Some(hit);
            }
        }
        None
    }

    fn hit_test_node(&self, id: WidgetId, x: f32, y: f32) -> Option<WidgetId> {
        let node = self.arena.get(id)?;
        if !node.visible {
            return None;
        }
        // Children are drawn on top and may extend past the parent.
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test_node(child, x, y) {
                return Some(hit);
            }
        }
        node.bounds.contains(x, y).then_some(id)
    }

    /// Nearest widget at or above `id` that owns a scroll state and accepts
    /// input.
    pub fn scroll_target(&self, id: WidgetId) -> Option<WidgetId> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.arena.get(cid)?;
            if node.enabled && node.widget.scroll().is_some() {
                return Some(cid);
            }
            current = node.parent;
        }
        None
    }

    /// Run the click handler of `id`. Returns false for disabled widgets and
    /// widgets without a handler.
    pub fn fire_click(&mut self, id: WidgetId, ctx: &mut C) -> bool {
        let Some(node) = self.arena.get_mut(id) else {
            return false;
        };
        if !node.enabled {
            return false;
        }
        match node.on_click.as_mut() {
            Some(callback) => {
                callback(ctx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn scroll_mut(&mut self, id: WidgetId) -> Option<&mut ScrollState> {
        self.arena.get_mut(id)?.widget.scroll_mut()
    }

    // ------------------------------------------------------------------
    // Text layout
    // ------------------------------------------------------------------

    /// Rebuild text layouts of dirty widgets and re-clamp their scroll
    /// offsets against the new content height.
    pub fn layout_text<M: TextMeasure + ?Sized>(&mut self, measure: &mut M) {
        let theme = &self.theme;
        for node in self.arena.values_mut() {
            if !node.dirty {
                continue;
            }
            node.dirty = false;

            let bounds = node.bounds;
            let (content, base, area, wrap, gutter) = match &node.widget {
                Widget::Label {
                    text,
                    color,
                    font_size,
                    wrap,
                    scrollable,
                    ..
                } => {
                    let gutter = if *scrollable {
                        theme.scrollbar_width + theme.scrollbar_gutter
                    } else {
                        0.0
                    };
                    (text, ResolvedStyle::new(*color, *font_size), bounds, *wrap, gutter)
                }
                Widget::PortraitDialogue {
                    text,
                    text_color,
                    font_size,
                    speaker,
                    show_on_right,
                    ..
                } => {
                    let area = portrait_layout(bounds, *show_on_right, speaker.is_some(), theme).text;
                    let gutter = theme.scrollbar_width + theme.scrollbar_gutter;
                    (text, ResolvedStyle::new(*text_color, *font_size), area, true, gutter)
                }
                _ => {
                    node.layout = None;
                    continue;
                }
            };

            let config = if wrap {
                LayoutConfig::new((area.width - gutter).max(0.0))
            } else {
                // Only explicit newlines break unwrapped text.
                LayoutConfig::unbounded()
            };
            let text_layout = match content {
                TextContent::Plain(s) => layout::layout_plain(s, &base, &config, measure),
                TextContent::Styled(segments) => {
                    layout::layout_styled(segments, &base, &config, measure)
                }
            };

            let content_height = text_layout.content_height;
            if let Some(scroll) = node.widget.scroll_mut() {
                scroll.set_content_height(content_height, area.height);
            }
            node.layout = Some(text_layout);
        }
    }

    // ------------------------------------------------------------------
    // Draw
    // ------------------------------------------------------------------

    /// Lay out dirty text, then walk the tree and emit draw commands.
    /// `hovered` selects the hover color of buttons.
    pub fn draw<M: TextMeasure + ?Sized>(
        &mut self,
        draw_list: &mut DrawList,
        measure: &mut M,
        hovered: Option<WidgetId>,
    ) {
        self.layout_text(measure);
        for &root in &self.roots {
            self.draw_node(root, draw_list, measure, hovered);
        }
    }

    fn draw_node<M: TextMeasure + ?Sized>(
        &self,
        id: WidgetId,
        draw_list: &mut DrawList,
        measure: &mut M,
        hovered: Option<WidgetId>,
    ) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let bounds = node.bounds;

        match &node.widget {
            Widget::Panel {
                bg_color,
                border_color,
                border_width,
                ..
            } => {
                draw_list.rect(bounds, *bg_color);
                draw_list.rect_lines(bounds, *border_width, *border_color);
            }
            Widget::Label {
                scrollable,
                scroll,
                scrollbar_color,
                ..
            } => {
                if let Some(text_layout) = &node.layout {
                    emit_lines(draw_list, text_layout, bounds, scroll.offset());
                }
                if *scrollable {
                    self.emit_scrollbar(draw_list, scroll, bounds, *scrollbar_color);
                }
            }
            Widget::Button {
                text,
                color,
                bg_color,
                hover_color,
                font_size,
            } => {
                let fill = if hovered == Some(id) && node.enabled {
                    *hover_color
                } else {
                    *bg_color
                };
                draw_list.rect(bounds, fill);

                let text_w = measure.measure(text, *font_size);
                let style = ResolvedStyle::new(*color, *font_size);
                draw_list.text(TextCommand::new(
                    text.clone(),
                    bounds.x + (bounds.width - text_w) / 2.0,
                    bounds.y + (bounds.height - font_size) / 2.0,
                    &style,
                ));
            }
            Widget::PortraitDialogue {
                speaker,
                portrait_color,
                mood,
                show_on_right,
                scroll,
                ..
            } => {
                let theme = &self.theme;
                let parts = portrait_layout(bounds, *show_on_right, speaker.is_some(), theme);

                draw_list.rect(bounds, theme.dialogue_box_color);
                draw_list.rect_lines(bounds, theme.dialogue_border_width, theme.dialogue_border_color);

                draw_list.rect(parts.portrait, *portrait_color);
                if let Some(mood) = mood {
                    emit_face(draw_list, parts.portrait, *mood);
                }
                draw_list.rect_lines(
                    parts.portrait,
                    theme.dialogue_border_width,
                    theme.dialogue_border_color,
                );

                if let (Some(name), Some(tag)) = (speaker, parts.name_tag) {
                    draw_list.rect(tag, theme.name_tag_color);
                    let style = ResolvedStyle::new(theme.name_color, theme.name_font_size);
                    draw_list.text(
                        TextCommand::new(
                            name.clone(),
                            tag.x + theme.portrait_padding,
                            tag.y + (tag.height - theme.name_font_size) / 2.0,
                            &style,
                        )
                        .clipped(tag),
                    );
                }

                if let Some(text_layout) = &node.layout {
                    emit_lines(draw_list, text_layout, parts.text, scroll.offset());
                }
                self.emit_scrollbar(draw_list, scroll, parts.text, theme.scrollbar_color);
            }
        }

        for &child in &node.children {
            self.draw_node(child, draw_list, measure, hovered);
        }
    }

    fn emit_scrollbar(&self, draw_list: &mut DrawList, state: &ScrollState, viewport: Rect, color: Color) {
        if let Some(bar) = scroll::scrollbar(state, viewport, self.theme.scrollbar_width) {
            draw_list.rect(bar.track, style::with_alpha(color, self.theme.scrollbar_track_alpha));
            draw_list.rect(bar.thumb, color);
        }
    }
}

/// Emit the lines of `text_layout` that are visible inside `area`, clipped
/// to it.
fn emit_lines(draw_list: &mut DrawList, text_layout: &TextLayout, area: Rect, offset: f32) {
    for line in text_layout.visible_lines(offset, area.height) {
        let y = area.y + line.y - offset;
        for run in &line.runs {
            draw_list.text(TextCommand::new(run.text.clone(), area.x + run.x, y, &run.style).clipped(area));
        }
    }
}

fn mood_color(mood: Mood) -> Color {
    match mood {
        Mood::Neutral => palette::LIGHT_GRAY,
        Mood::Happy => palette::YELLOW,
        Mood::Sad => palette::BLUE,
        Mood::Angry => palette::RED,
    }
}

/// Simple face filling `r`: head, eyes, and a mouth shaped by `mood`.
fn emit_face(draw_list: &mut DrawList, r: Rect, mood: Mood) {
    let ink = palette::BLACK;
    let at = |fx: f32, fy: f32| (r.x + r.width * fx, r.y + r.height * fy);

    draw_list.circle(at(0.5, 0.5), r.width.min(r.height) / 2.2, mood_color(mood));
    draw_list.circle(at(1.0 / 3.0, 0.4), 5.0, ink);
    draw_list.circle(at(2.0 / 3.0, 0.4), 5.0, ink);

    match mood {
        Mood::Neutral => draw_list.line(at(1.0 / 3.0, 0.7), at(2.0 / 3.0, 0.7), 5.0, ink),
        Mood::Happy => {
            draw_list.line(at(1.0 / 3.0, 0.65), at(0.5, 0.75), 3.0, ink);
            draw_list.line(at(0.5, 0.75), at(2.0 / 3.0, 0.65), 3.0, ink);
        }
        Mood::Sad => {
            draw_list.line(at(1.0 / 3.0, 0.75), at(0.5, 0.65), 3.0, ink);
            draw_list.line(at(0.5, 0.65), at(2.0 / 3.0, 0.75), 3.0, ink);
        }
        Mood::Angry => {
            draw_list.line(at(0.25, 0.28), at(0.42, 0.34), 3.0, ink);
            draw_list.line(at(0.58, 0.34), at(0.75, 0.28), 3.0, ink);
            draw_list.line(at(1.0 / 3.0, 0.7), at(2.0 / 3.0, 0.7), 3.0, ink);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
