//! Terminal player for dialogue scripts.
//!
//! Usage: talespin [SCRIPT] [--locale FILE --lang CODE] [--theme THEME.ron] [--width PX]
//! Default script: data/demo.kdl
//!
//! With a locale file, node texts are treated as translation keys. Text is
//! wrapped with a monospace measure at the theme's font size.

use std::io::{BufRead, Write};

use talespin::dialogue::script::load_script;
use talespin::dialogue::{DialogueManager, Transition};
use talespin::layout::{self, LayoutConfig};
use talespin::locale::Localizer;
use talespin::markup::{self, TextSegment};
use talespin::measure::MonoMeasure;
use talespin::ui::Theme;

/// Callback context: what the player has seen so far.
#[derive(Default)]
struct Session {
    visited: Vec<String>,
}

struct Options {
    script: String,
    locale: Option<(String, String)>,
    theme: Option<String>,
    width: f32,
}

fn parse_args() -> Result<Options, String> {
    let mut opts = Options {
        script: "data/demo.kdl".into(),
        locale: None,
        theme: None,
        width: 480.0,
    };
    let mut locale_file = None;
    let mut lang = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--locale" => locale_file = Some(args.next().ok_or("--locale needs a file")?),
            "--lang" => lang = Some(args.next().ok_or("--lang needs a code")?),
            "--theme" => opts.theme = Some(args.next().ok_or("--theme needs a file")?),
            "--width" => {
                let value = args.next().ok_or("--width needs a number")?;
                opts.width = value
                    .parse()
                    .map_err(|_| format!("invalid width '{value}'"))?;
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option {arg}")),
            _ => opts.script = arg,
        }
    }

    opts.locale = match (locale_file, lang) {
        (Some(file), Some(code)) => Some((file, code)),
        (None, None) => None,
        _ => return Err("--locale and --lang go together".into()),
    };
    Ok(opts)
}

/// Node or choice text: a translation key when a localizer is loaded,
/// markup otherwise.
fn segments(text: &str, localizer: Option<&Localizer>) -> Vec<TextSegment> {
    match localizer {
        Some(loc) => loc.get_styled(text),
        None => markup::parse(text),
    }
}

fn print_wrapped(
    out: &mut impl Write,
    segs: &[TextSegment],
    theme: &Theme,
    width: f32,
    first: &str,
    indent: &str,
) -> std::io::Result<()> {
    let mut measure = MonoMeasure::default();
    let config = LayoutConfig::new(width);
    let laid = layout::layout_styled(segs, &theme.text_style(), &config, &mut measure);
    for (i, line) in laid.line_texts().iter().enumerate() {
        let prefix = if i == 0 { first } else { indent };
        writeln!(out, "{prefix}{line}")?;
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let opts = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("talespin: {e}");
            eprintln!("usage: talespin [SCRIPT] [--locale FILE --lang CODE] [--theme THEME.ron] [--width PX]");
            std::process::exit(2);
        }
    };

    let theme = opts.theme.as_deref().map(Theme::load).unwrap_or_default();

    let localizer = match &opts.locale {
        Some((file, code)) => {
            let mut loc = Localizer::new();
            loc.add_language(code, code);
            if let Err(e) = loc.load_from_file(code, file) {
                eprintln!("talespin: {e}");
                std::process::exit(1);
            }
            Some(loc)
        }
        None => None,
    };

    let mut tree = match load_script::<Session>(&opts.script) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("talespin: {}: {e}", opts.script);
            std::process::exit(1);
        }
    };
    let nodes: Vec<_> = tree.iter().collect();
    for node in nodes {
        let id = tree.get(node).map(|n| n.id.clone()).unwrap_or_default();
        tree.set_on_enter(node, move |s: &mut Session| s.visited.push(id.clone()));
    }

    let mut manager = DialogueManager::new(tree);
    let mut session = Session::default();
    manager.transition("root", &mut session);

    if let Err(e) = run(&mut manager, &mut session, localizer.as_ref(), &theme, opts.width) {
        eprintln!("talespin: {e}");
        std::process::exit(1);
    }
    println!("visited {} nodes", session.visited.len());
}

fn run(
    manager: &mut DialogueManager<Session>,
    session: &mut Session,
    localizer: Option<&Localizer>,
    theme: &Theme,
    width: f32,
) -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    let mut input = String::new();

    loop {
        let Some(node) = manager.current_node() else {
            return Ok(());
        };
        writeln!(stdout)?;
        print_wrapped(&mut stdout, &segments(&node.text, localizer), theme, width, "", "")?;

        let choices: Vec<String> = node
            .choices()
            .iter()
            .filter_map(|&c| manager.tree().get(c).map(|n| n.text.clone()))
            .collect();
        for (i, text) in choices.iter().enumerate() {
            let number = format!("  {}) ", i + 1);
            print_wrapped(&mut stdout, &segments(text, localizer), theme, width, &number, "     ")?;
        }
        if choices.is_empty() {
            write!(stdout, "[enter: back to start, q: quit] > ")?;
        } else {
            write!(stdout, "[1-{}, node id, q] > ", choices.len())?;
        }
        stdout.flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(());
        }
        let answer = input.trim();
        if answer == "q" {
            return Ok(());
        }
        if answer.is_empty() && choices.is_empty() {
            manager.transition("root", session);
            continue;
        }
        if let Ok(n) = answer.parse::<usize>()
            && n >= 1
            && manager.choose(n - 1, session).is_some()
        {
            continue;
        }
        if !answer.is_empty() && manager.transition(answer, session) == Transition::FellBack {
            writeln!(stdout, "(no node '{answer}', back to start)")?;
        }
    }
}
