use std::time::{Duration, Instant};

use winit::keyboard::KeyCode;

use super::keybindings::{Action, KeyBindings, ModifierFlags};
use super::theme::{DEFAULT_CLICK_WINDOW_MS, Theme};
use super::{WidgetId, WidgetTree};

/// Pointer and keyboard state for one frame, filled in by the host.
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Cursor position in screen coords.
    pub cursor: (f32, f32),
    /// Left button went down this frame.
    pub left_pressed: bool,
    /// Left button went up this frame.
    pub left_released: bool,
    /// Wheel movement in ticks, positive away from the user.
    pub wheel: f32,
    /// Keys currently held.
    pub keys_down: Vec<KeyCode>,
    /// Keys that went down this frame.
    pub keys_pressed: Vec<KeyCode>,
    /// Modifiers held this frame; key bindings match them exactly.
    pub modifiers: ModifierFlags,
    /// Monotonic frame time.
    pub now: Instant,
}

impl FrameInput {
    /// Idle frame at `now` with the cursor at the origin.
    pub fn new(now: Instant) -> Self {
        Self {
            cursor: (0.0, 0.0),
            left_pressed: false,
            left_released: false,
            wheel: 0.0,
            keys_down: Vec::new(),
            keys_pressed: Vec::new(),
            modifiers: ModifierFlags::NONE,
            now,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.cursor = (x, y);
        self
    }

    pub fn click(mut self) -> Self {
        self.left_pressed = true;
        self
    }

    pub fn release(mut self) -> Self {
        self.left_released = true;
        self
    }

    pub fn wheel(mut self, ticks: f32) -> Self {
        self.wheel = ticks;
        self
    }

    /// Key pressed this frame (and therefore held).
    pub fn press(mut self, key: KeyCode) -> Self {
        self.keys_pressed.push(key);
        self.keys_down.push(key);
        self
    }

    /// Key held since an earlier frame.
    pub fn hold(mut self, key: KeyCode) -> Self {
        self.keys_down.push(key);
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl Into<ModifierFlags>) -> Self {
        self.modifiers = modifiers.into();
        self
    }

    fn actions<'a>(
        &'a self,
        keys: &'a [KeyCode],
        bindings: &'a KeyBindings,
    ) -> impl Iterator<Item = Action> + 'a {
        keys.iter()
            .filter_map(move |&k| bindings.lookup_with(self.modifiers, k))
    }
}

/// Drops repeated clicks on the same widget inside a short window.
/// Any release clears the memory, so deliberate double clicks still count.
#[derive(Debug, Clone)]
pub struct InputDeduper {
    window: Duration,
    last: Option<(WidgetId, Instant)>,
}

impl InputDeduper {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// True when a press on `id` at `now` counts as a new click.
    pub fn accept(&mut self, id: WidgetId, now: Instant) -> bool {
        if let Some((last_id, at)) = self.last
            && last_id == id
            && now.saturating_duration_since(at) < self.window
        {
            return false;
        }
        self.last = Some((id, now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for InputDeduper {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CLICK_WINDOW_MS))
    }
}

/// What happened during one update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// An enabled widget was clicked; its handler (if any) already ran.
    Click(WidgetId),
    /// A widget's scroll offset was driven by wheel or keys.
    Scrolled(WidgetId),
    /// The advance key was pressed.
    Advance,
}

/// Interaction state for a widget tree. Owned by the host, one per window.
pub struct UiState {
    /// Widget currently under the cursor.
    pub hovered: Option<WidgetId>,
    /// Last known cursor position (screen coords).
    pub cursor: (f32, f32),
    deduper: InputDeduper,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self::with_click_window(Duration::from_millis(DEFAULT_CLICK_WINDOW_MS))
    }

    /// State using the theme's click window.
    pub fn from_theme(theme: &Theme) -> Self {
        Self::with_click_window(Duration::from_millis(theme.click_window_ms))
    }

    pub fn with_click_window(window: Duration) -> Self {
        Self {
            hovered: None,
            cursor: (0.0, 0.0),
            deduper: InputDeduper::new(window),
        }
    }

    /// Run one frame of input against `tree`: hover tracking, clicks
    /// (handlers receive `ctx`), hover-gated scrolling and the advance key.
    pub fn update<C>(
        &mut self,
        tree: &mut WidgetTree<C>,
        input: &FrameInput,
        bindings: &KeyBindings,
        ctx: &mut C,
    ) -> Vec<UiEvent> {
        let mut events = Vec::new();

        self.cursor = input.cursor;
        self.hovered = tree.hit_test(input.cursor.0, input.cursor.1);

        if input.left_pressed
            && let Some(id) = self.hovered
            && tree.get(id).is_some_and(|n| n.enabled)
            && self.deduper.accept(id, input.now)
        {
            tree.fire_click(id, ctx);
            events.push(UiEvent::Click(id));
        }
        if input.left_released {
            self.deduper.reset();
        }

        if let Some(target) = self.hovered.and_then(|h| tree.scroll_target(h))
            && self.apply_scroll(tree, target, input, bindings)
        {
            events.push(UiEvent::Scrolled(target));
        }

        if input
            .actions(&input.keys_pressed, bindings)
            .any(|a| a == Action::Advance)
        {
            events.push(UiEvent::Advance);
        }

        events
    }

    /// Wheel first, then at most one key action: held keys take priority
    /// over single presses.
    fn apply_scroll<C>(
        &self,
        tree: &mut WidgetTree<C>,
        target: WidgetId,
        input: &FrameInput,
        bindings: &KeyBindings,
    ) -> bool {
        let Some(viewport) = tree.text_viewport(target) else {
            return false;
        };
        let Some(scroll) = tree.scroll_mut(target) else {
            return false;
        };
        let before = scroll.offset();

        if input.wheel != 0.0 {
            scroll.apply_wheel(input.wheel, viewport.height);
        }

        let held = input
            .actions(&input.keys_down, bindings)
            .find(|a| a.repeats_while_held());
        let pressed = input
            .actions(&input.keys_pressed, bindings)
            .find(|a| !a.repeats_while_held() && a.scroll_key().is_some());
        if let Some(key) = held.or(pressed).and_then(Action::scroll_key) {
            scroll.apply_key(key, viewport.height);
        }

        scroll.offset() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MonoMeasure;
    use crate::ui::{KeyCombo, Rect, TextContent, Widget};

    /// Panel (0,0)-(400,300) with a button at (50,50) 100x40 that counts
    /// clicks into the context.
    fn tree_with_button() -> (WidgetTree<u32>, WidgetId, WidgetId) {
        let theme = Theme::default();
        let mut tree = WidgetTree::new();
        let panel = tree.insert_root(Widget::panel(&theme), Rect::new(0.0, 0.0, 400.0, 300.0));
        let button = tree
            .insert(panel, Widget::button("Go", &theme), Rect::new(50.0, 50.0, 100.0, 40.0))
            .expect("panel exists");
        tree.set_on_click(button, |n: &mut u32| *n += 1);
        (tree, panel, button)
    }

    /// Scrollable label 200x90 holding 20 lines (600px of content).
    fn tree_with_label() -> (WidgetTree<()>, WidgetId) {
        let theme = Theme::default();
        let mut tree = WidgetTree::new();
        let text = (1..=20).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let label = tree.insert_root(
            Widget::label(TextContent::plain(text), true, &theme),
            Rect::new(0.0, 0.0, 200.0, 90.0),
        );
        tree.layout_text(&mut MonoMeasure::default());
        (tree, label)
    }

    fn offset(tree: &WidgetTree<()>, id: WidgetId) -> f32 {
        tree.get(id)
            .and_then(|n| n.widget.scroll())
            .map(|s| s.offset())
            .expect("scrollable")
    }

    #[test]
    fn hover_tracking() {
        let (mut tree, panel, button) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;
        let now = Instant::now();

        state.update(&mut tree, &FrameInput::new(now).at(60.0, 60.0), &kb, &mut clicks);
        assert_eq!(state.hovered, Some(button));

        state.update(&mut tree, &FrameInput::new(now).at(10.0, 10.0), &kb, &mut clicks);
        assert_eq!(state.hovered, Some(panel));

        state.update(&mut tree, &FrameInput::new(now).at(900.0, 900.0), &kb, &mut clicks);
        assert_eq!(state.hovered, None);
        assert_eq!(state.cursor, (900.0, 900.0));
    }

    #[test]
    fn press_fires_click_handler() {
        let (mut tree, _, button) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;

        let input = FrameInput::new(Instant::now()).at(60.0, 60.0).click();
        let events = state.update(&mut tree, &input, &kb, &mut clicks);
        assert_eq!(events, vec![UiEvent::Click(button)]);
        assert_eq!(clicks, 1);
    }

    #[test]
    fn click_outside_does_nothing() {
        let (mut tree, _, _) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;

        let input = FrameInput::new(Instant::now()).at(500.0, 500.0).click();
        assert!(state.update(&mut tree, &input, &kb, &mut clicks).is_empty());
        assert_eq!(clicks, 0);
    }

    #[test]
    fn repeated_press_within_window_is_dropped() {
        let (mut tree, _, _) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;
        let t0 = Instant::now();

        let press = |t| FrameInput::new(t).at(60.0, 60.0).click();
        state.update(&mut tree, &press(t0), &kb, &mut clicks);
        state.update(&mut tree, &press(t0 + Duration::from_millis(30)), &kb, &mut clicks);
        assert_eq!(clicks, 1);

        // Past the window the press counts again.
        state.update(&mut tree, &press(t0 + Duration::from_millis(150)), &kb, &mut clicks);
        assert_eq!(clicks, 2);
    }

    #[test]
    fn theme_click_window_controls_dedup() {
        let (mut tree, _, _) = tree_with_button();
        let kb = KeyBindings::defaults();
        let t0 = Instant::now();
        let press = |t| FrameInput::new(t).at(60.0, 60.0).click();

        // No window: every press counts.
        let theme: Theme = ron::from_str("(click_window_ms: 0)").expect("valid RON");
        let mut state = UiState::from_theme(&theme);
        let mut clicks = 0;
        state.update(&mut tree, &press(t0), &kb, &mut clicks);
        state.update(&mut tree, &press(t0 + Duration::from_millis(50)), &kb, &mut clicks);
        assert_eq!(clicks, 2);

        // A wide window swallows a press the default would accept.
        let theme = Theme {
            click_window_ms: 500,
            ..Theme::default()
        };
        let mut state = UiState::from_theme(&theme);
        let mut clicks = 0;
        state.update(&mut tree, &press(t0), &kb, &mut clicks);
        state.update(&mut tree, &press(t0 + Duration::from_millis(300)), &kb, &mut clicks);
        assert_eq!(clicks, 1);
    }

    #[test]
    fn release_resets_dedup() {
        let (mut tree, _, _) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;
        let t0 = Instant::now();

        state.update(&mut tree, &FrameInput::new(t0).at(60.0, 60.0).click(), &kb, &mut clicks);
        let up = FrameInput::new(t0 + Duration::from_millis(10))
            .at(60.0, 60.0)
            .release();
        state.update(&mut tree, &up, &kb, &mut clicks);
        let again = FrameInput::new(t0 + Duration::from_millis(20))
            .at(60.0, 60.0)
            .click();
        state.update(&mut tree, &again, &kb, &mut clicks);
        assert_eq!(clicks, 2);
    }

    #[test]
    fn disabled_button_ignores_click() {
        let (mut tree, _, button) = tree_with_button();
        tree.set_enabled(button, false);
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let mut clicks = 0;

        let input = FrameInput::new(Instant::now()).at(60.0, 60.0).click();
        let events = state.update(&mut tree, &input, &kb, &mut clicks);
        assert!(events.is_empty());
        assert_eq!(clicks, 0);
        // Still hovered, just inert.
        assert_eq!(state.hovered, Some(button));
    }

    #[test]
    fn wheel_scrolls_only_when_hovered() {
        let (mut tree, label) = tree_with_label();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let now = Instant::now();

        let outside = FrameInput::new(now).at(300.0, 10.0).wheel(-1.0);
        state.update(&mut tree, &outside, &kb, &mut ());
        assert!(offset(&tree, label).abs() < 0.01);

        let inside = FrameInput::new(now).at(10.0, 10.0).wheel(-2.0);
        let events = state.update(&mut tree, &inside, &kb, &mut ());
        assert_eq!(events, vec![UiEvent::Scrolled(label)]);
        assert!((offset(&tree, label) - 40.0).abs() < 0.01);
    }

    #[test]
    fn held_arrow_scrolls_every_frame() {
        let (mut tree, label) = tree_with_label();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let now = Instant::now();

        let first = FrameInput::new(now).at(10.0, 10.0).press(KeyCode::ArrowDown);
        state.update(&mut tree, &first, &kb, &mut ());
        for _ in 0..4 {
            let held = FrameInput::new(now).at(10.0, 10.0).hold(KeyCode::ArrowDown);
            state.update(&mut tree, &held, &kb, &mut ());
        }
        assert!((offset(&tree, label) - 50.0).abs() < 0.01);
    }

    #[test]
    fn page_keys_fire_once_per_press() {
        let (mut tree, label) = tree_with_label();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let now = Instant::now();

        let press = FrameInput::new(now).at(10.0, 10.0).press(KeyCode::PageDown);
        state.update(&mut tree, &press, &kb, &mut ());
        let held = FrameInput::new(now).at(10.0, 10.0).hold(KeyCode::PageDown);
        state.update(&mut tree, &held, &kb, &mut ());
        assert!((offset(&tree, label) - 45.0).abs() < 0.01);

        let end = FrameInput::new(now).at(10.0, 10.0).press(KeyCode::End);
        state.update(&mut tree, &end, &kb, &mut ());
        assert!((offset(&tree, label) - 510.0).abs() < 0.01);

        // Already at the bottom: no movement, no event.
        let events = state.update(&mut tree, &end, &kb, &mut ());
        assert!(events.is_empty());
    }

    #[test]
    fn advance_key_reported() {
        let (mut tree, _, _) = tree_with_button();
        let kb = KeyBindings::defaults();
        let mut state = UiState::new();
        let now = Instant::now();

        let events = state.update(
            &mut tree,
            &FrameInput::new(now).press(KeyCode::Enter),
            &kb,
            &mut 0,
        );
        assert_eq!(events, vec![UiEvent::Advance]);

        // Holding does not repeat.
        let events = state.update(
            &mut tree,
            &FrameInput::new(now).hold(KeyCode::Space),
            &kb,
            &mut 0,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn modified_binding_fires_only_with_modifiers() {
        let (mut tree, _, _) = tree_with_button();
        let mut kb = KeyBindings::defaults();
        kb.bind(KeyCombo::new(ModifierFlags::CTRL, KeyCode::KeyN), Action::Advance);
        let mut state = UiState::new();
        let now = Instant::now();

        let plain = FrameInput::new(now).press(KeyCode::KeyN);
        assert!(state.update(&mut tree, &plain, &kb, &mut 0).is_empty());

        let ctrl = FrameInput::new(now)
            .with_modifiers(ModifierFlags::CTRL)
            .press(KeyCode::KeyN);
        assert_eq!(state.update(&mut tree, &ctrl, &kb, &mut 0), vec![UiEvent::Advance]);

        // Ctrl+Enter is not the plain Enter binding.
        let ctrl_enter = FrameInput::new(now)
            .with_modifiers(ModifierFlags::CTRL)
            .press(KeyCode::Enter);
        assert!(state.update(&mut tree, &ctrl_enter, &kb, &mut 0).is_empty());
    }

    #[test]
    fn deduper_tracks_widget_identity() {
        let (_tree, panel, button) = tree_with_button();
        let mut dedup = InputDeduper::default();
        let t0 = Instant::now();
        assert!(dedup.accept(button, t0));
        assert!(!dedup.accept(button, t0 + Duration::from_millis(50)));
        // A different widget is never deduplicated.
        assert!(dedup.accept(panel, t0 + Duration::from_millis(60)));
    }
}
