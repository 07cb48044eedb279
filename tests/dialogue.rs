//! End-to-end dialogue tests: scripts, transitions, per-node widgets and
//! localization working together.

use std::time::Instant;

use talespin::dialogue::script::{load_script, parse_script};
use talespin::dialogue::{DialogueManager, DialogueTree, Transition};
use talespin::locale::Localizer;
use talespin::measure::MonoMeasure;
use talespin::ui::{
    DrawList, FrameInput, KeyBindings, LocaleKeys, Rect, TextContent, Theme, UiEvent, UiState,
    Widget, WidgetTree,
};
use winit::keyboard::KeyCode;

const SCRIPT: &str = r#"
node "root" text="greeting" {
    node "shop" text="wares" {
        node "buy" text="thanks"
    }
    node "bye" text="farewell"
}
"#;

fn localizer() -> Localizer {
    let mut loc = Localizer::new();
    loc.add_language("en", "English");
    loc.add_language("fr", "Français");
    for (key, en, fr) in [
        ("greeting", "Welcome", "Bienvenue"),
        ("wares", "Wares", "Marchandises"),
        ("thanks", "Thanks", "Merci"),
        ("farewell", "Goodbye", "Adieu"),
        ("merchant", "Merchant", "Marchand"),
    ] {
        loc.add_translation("en", key, en);
        loc.add_translation("fr", key, fr);
    }
    loc
}

/// Give every node a portrait dialogue bound to its text key.
fn attach_widgets(tree: &mut DialogueTree<Vec<String>>, loc: &Localizer) {
    let nodes: Vec<_> = tree.iter().collect();
    for node in nodes {
        let key = tree.get(node).map(|n| n.text.clone()).unwrap_or_default();
        let mut widgets = WidgetTree::new();
        let dialogue = Widget::portrait_dialogue(None, TextContent::plain(""), widgets.theme());
        let id = widgets.insert_root(dialogue, Rect::new(0.0, 0.0, 600.0, 200.0));
        widgets.set_locale_keys(
            id,
            LocaleKeys {
                text: Some(key),
                speaker: Some("merchant".into()),
            },
        );
        widgets.relocalize(loc);
        tree.set_widgets(node, widgets);
    }
}

fn drawn_texts(manager: &mut DialogueManager<Vec<String>>) -> Vec<String> {
    let mut dl = DrawList::new();
    manager.draw(&mut dl, &mut MonoMeasure::default(), None);
    dl.texts.into_iter().map(|t| t.text).collect()
}

#[test]
fn walk_script_with_callbacks() {
    let mut tree: DialogueTree<Vec<String>> = parse_script(SCRIPT).expect("valid script");
    for id in ["root", "shop", "buy"] {
        let node = tree.find(id).expect("node exists");
        let name = id.to_string();
        tree.set_on_enter(node, move |log: &mut Vec<String>| log.push(format!("+{name}")));
        let name = id.to_string();
        tree.set_on_exit(node, move |log: &mut Vec<String>| log.push(format!("-{name}")));
    }

    let mut manager = DialogueManager::new(tree);
    let mut log = Vec::new();

    manager.transition("shop", &mut log);
    manager.choose(0, &mut log);
    assert_eq!(manager.current_node().map(|n| n.id.as_str()), Some("buy"));
    assert_eq!(manager.transition("nonexistent", &mut log), Transition::FellBack);
    assert!(manager.is_at_root());
    assert_eq!(log, ["-root", "+shop", "-shop", "+buy", "-buy", "+root"]);
}

#[test]
fn localized_nodes_follow_language_switch() {
    let mut loc = localizer();
    let mut tree: DialogueTree<Vec<String>> = parse_script(SCRIPT).expect("valid script");
    attach_widgets(&mut tree, &loc);
    let mut manager = DialogueManager::new(tree);
    let mut log = Vec::new();

    let texts = drawn_texts(&mut manager);
    assert!(texts.contains(&"Welcome".to_string()));
    assert!(texts.contains(&"Merchant".to_string()));

    assert!(loc.set_current_language("fr"));
    manager.relocalize(&loc);
    let texts = drawn_texts(&mut manager);
    assert!(texts.contains(&"Bienvenue".to_string()));
    assert!(texts.contains(&"Marchand".to_string()));

    manager.transition("bye", &mut log);
    assert!(drawn_texts(&mut manager).contains(&"Adieu".to_string()));
}

#[test]
fn advance_key_reaches_host() {
    let loc = localizer();
    let mut tree: DialogueTree<Vec<String>> = parse_script(SCRIPT).expect("valid script");
    attach_widgets(&mut tree, &loc);
    let mut manager = DialogueManager::new(tree);
    let mut ui = UiState::from_theme(&Theme::load("data/theme.ron"));
    let bindings = KeyBindings::defaults();
    let mut log = Vec::new();

    let input = FrameInput::new(Instant::now()).at(300.0, 100.0).press(KeyCode::Enter);
    let events = manager.update(&mut ui, &input, &bindings, &mut log);
    assert!(events.contains(&UiEvent::Advance));
    if events.contains(&UiEvent::Advance) {
        manager.choose(0, &mut log);
    }
    assert_eq!(manager.current_node().map(|n| n.id.as_str()), Some("shop"));

    manager.set_active(false);
    assert!(manager.update(&mut ui, &input, &bindings, &mut log).is_empty());
}

#[test]
fn demo_script_loads() {
    let tree: DialogueTree<()> = load_script("data/demo.kdl").expect("demo script");
    for id in ["root", "ask", "friend", "merchant", "bribe", "threat", "fight", "leave"] {
        assert!(tree.find(id).is_some(), "missing {id}");
    }
}
