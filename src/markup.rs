//! Bracket-tag markup: `[color=red]`, `[size=large]`, `[b]`, `[i]`.
//!
//! Parsing runs in two passes over string slices. The tokenizer splits the
//! input into literal text, opening tags and closing tags. The matcher pairs
//! every closing tag with the nearest unmatched opening tag of the same kind.
//! The emitter then walks the tokens with an explicit style stack and cuts a
//! new segment at every accepted tag. Anything that does not pair up is kept
//! as literal text, so parsing never fails.

use smallvec::SmallVec;

use crate::style::{self, ResolvedStyle};

/// Deepest tag nesting tracked by the parser. Opening tags beyond this depth
/// are kept as literal text along with their closing partner.
pub const MAX_TAG_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Color,
    Size,
    Bold,
    Italic,
}

impl TagKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "color" => Some(Self::Color),
            "size" => Some(Self::Size),
            "b" => Some(Self::Bold),
            "i" => Some(Self::Italic),
            _ => None,
        }
    }

    /// Tag name as written in markup.
    pub fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Size => "size",
            Self::Bold => "b",
            Self::Italic => "i",
        }
    }

    fn takes_value(self) -> bool {
        matches!(self, Self::Color | Self::Size)
    }
}

/// One opening tag as recorded on a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTag {
    pub kind: TagKind,
    /// Attribute text (`"red"`, `"large"`, `"24"`); empty for `b` and `i`.
    pub value: String,
}

impl StyleTag {
    pub fn new(kind: TagKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Tags enclosing a segment, outermost first.
pub type TagStack = SmallVec<[StyleTag; 4]>;

/// A run of text sharing one combination of open tags.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub styles: TagStack,
}

impl TextSegment {
    /// Untagged segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: TagStack::new(),
        }
    }

    /// Flatten this segment's tags onto `base`.
    pub fn resolve(&self, base: &ResolvedStyle) -> ResolvedStyle {
        style::resolve(&self.styles, base)
    }
}

/// Parsed segments together with the base style they resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    pub segments: Vec<TextSegment>,
    pub base: ResolvedStyle,
}

impl StyledText {
    /// Parse `markup` and keep `base` for later resolution.
    pub fn parse(markup: &str, base: ResolvedStyle) -> Self {
        Self {
            segments: parse(markup),
            base,
        }
    }

    /// Wrap `text` as a single untagged segment, without interpreting tags.
    pub fn plain(text: &str, base: ResolvedStyle) -> Self {
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![TextSegment::plain(text)]
        };
        Self { segments, base }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Each segment's text with its resolved style.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, ResolvedStyle)> + '_ {
        self.segments
            .iter()
            .map(|seg| (seg.text.as_str(), seg.resolve(&self.base)))
    }

    /// Concatenated text with all accepted tags removed.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Open {
        kind: TagKind,
        value: &'a str,
        raw: &'a str,
    },
    Close {
        kind: TagKind,
        raw: &'a str,
    },
}

impl Token<'_> {
    fn open_kind(&self) -> Option<TagKind> {
        match self {
            Token::Open { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

enum TagShape<'a> {
    Open(TagKind, &'a str),
    Close(TagKind),
}

/// Classify the text between `[` and `]`.
fn classify(inner: &str) -> Option<TagShape<'_>> {
    if let Some(name) = inner.strip_prefix('/') {
        return TagKind::from_name(name).map(TagShape::Close);
    }
    if let Some((name, value)) = inner.split_once('=') {
        let kind = TagKind::from_name(name)?;
        let value = value.trim();
        // A `[` in the value means the span swallowed the start of another tag.
        if !kind.takes_value() || value.is_empty() || value.contains('[') {
            return None;
        }
        return Some(TagShape::Open(kind, value));
    }
    match TagKind::from_name(inner)? {
        kind @ (TagKind::Bold | TagKind::Italic) => Some(TagShape::Open(kind, "")),
        // `[color]` and `[size]` without a value are literal.
        _ => None,
    }
}

fn tokenize(markup: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(rel) = markup[cursor..].find('[') {
        let open = cursor + rel;
        // No `]` left means no further tag can close either.
        let Some(rel_close) = markup[open + 1..].find(']') else {
            break;
        };
        let close = open + 1 + rel_close;
        let raw = &markup[open..=close];

        let token = match classify(&markup[open + 1..close]) {
            Some(TagShape::Open(kind, value)) => Token::Open { kind, value, raw },
            Some(TagShape::Close(kind)) => Token::Close { kind, raw },
            None => {
                // Literal `[`; a tag may still start inside this span.
                cursor = open + 1;
                continue;
            }
        };

        if open > text_start {
            tokens.push(Token::Text(&markup[text_start..open]));
        }
        tokens.push(token);
        cursor = close + 1;
        text_start = cursor;
    }

    if text_start < markup.len() {
        tokens.push(Token::Text(&markup[text_start..]));
    }
    tokens
}

/// Pair closing tags with the nearest unmatched opening tag of the same kind.
/// Returns the partner token index for every matched tag.
fn match_tags(tokens: &[Token<'_>]) -> Vec<Option<usize>> {
    let mut partner = vec![None; tokens.len()];
    let mut unmatched: Vec<usize> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Open { .. } => unmatched.push(idx),
            Token::Close { kind, .. } => {
                if let Some(pos) = unmatched
                    .iter()
                    .rposition(|&open| tokens[open].open_kind() == Some(*kind))
                {
                    let open = unmatched.remove(pos);
                    partner[open] = Some(idx);
                    partner[idx] = Some(open);
                }
            }
            Token::Text(_) => {}
        }
    }
    partner
}

/// Move the pending run into `segments`, merging with the previous segment
/// when the tag stack is unchanged.
fn flush(run: &mut String, stack: &[(usize, StyleTag)], segments: &mut Vec<TextSegment>) {
    if run.is_empty() {
        return;
    }
    let styles: TagStack = stack.iter().map(|(_, tag)| tag.clone()).collect();
    if let Some(last) = segments.last_mut()
        && last.styles == styles
    {
        last.text.push_str(run);
        run.clear();
        return;
    }
    segments.push(TextSegment {
        text: std::mem::take(run),
        styles,
    });
}

/// Parse markup into styled segments.
///
/// Unknown tags, malformed tags, tags without a partner and tags nested
/// deeper than [`MAX_TAG_DEPTH`] are kept verbatim in the text.
pub fn parse(markup: &str) -> Vec<TextSegment> {
    let tokens = tokenize(markup);
    let mut partner = match_tags(&tokens);

    // (opening token index, tag): the index identifies the frame when its
    // closing tag arrives, even if other frames were pushed after it.
    let mut stack: Vec<(usize, StyleTag)> = Vec::with_capacity(MAX_TAG_DEPTH);
    let mut segments = Vec::new();
    let mut run = String::new();

    for (idx, token) in tokens.iter().enumerate() {
        match *token {
            Token::Text(text) => run.push_str(text),
            Token::Open { kind, value, raw } => match partner[idx] {
                Some(_) if stack.len() < MAX_TAG_DEPTH => {
                    flush(&mut run, &stack, &mut segments);
                    stack.push((idx, StyleTag::new(kind, value)));
                }
                Some(close) => {
                    partner[close] = None;
                    run.push_str(raw);
                }
                None => run.push_str(raw),
            },
            Token::Close { raw, .. } => {
                let frame = partner[idx]
                    .and_then(|open| stack.iter().rposition(|(o, _)| *o == open));
                match frame {
                    Some(pos) => {
                        flush(&mut run, &stack, &mut segments);
                        stack.remove(pos);
                    }
                    None => run.push_str(raw),
                }
            }
        }
    }
    flush(&mut run, &stack, &mut segments);
    segments
}

/// Markup with every accepted tag removed.
pub fn strip_tags(markup: &str) -> String {
    parse(markup).into_iter().map(|s| s.text).collect()
}
