//! Greedy line layout for plain text and styled segments.
//!
//! Both modes feed words into a single line builder. A word is appended to
//! the open line when the projected line width still fits `max_width`;
//! otherwise the line is flushed first. Plain layout can additionally split
//! a word that is wider than the box on its own (hard break). Styled layout
//! never splits words, but runs from different segments share a line.
//!
//! **Y-axis goes down.** Line `y` values are relative to the top of the
//! content, before any scroll offset is applied.

use crate::markup::{StyledText, TextSegment};
use crate::measure::TextMeasure;
use crate::style::ResolvedStyle;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_SCALE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Box width available to each line, in pixels.
    pub max_width: f32,
    pub line_height_scale: f32,
    /// Split single words that are wider than `max_width` (plain mode only).
    pub hard_break: bool,
}

impl LayoutConfig {
    pub fn new(max_width: f32) -> Self {
        Self {
            max_width,
            line_height_scale: LINE_HEIGHT_SCALE,
            hard_break: true,
        }
    }

    /// No width limit: lines only end at explicit newlines.
    pub fn unbounded() -> Self {
        Self::new(f32::INFINITY)
    }

    pub fn with_hard_break(mut self, hard_break: bool) -> Self {
        self.hard_break = hard_break;
        self
    }
}

/// A positioned piece of text inside a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRun {
    pub text: String,
    pub style: ResolvedStyle,
    /// Offset from the left edge of the box.
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub runs: Vec<LayoutRun>,
    /// Top of the line relative to the top of the content.
    pub y: f32,
    pub height: f32,
    pub width: f32,
}

impl LayoutLine {
    /// The line's text with run boundaries removed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Output of a layout pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub lines: Vec<LayoutLine>,
    /// Sum of all line heights, visible or not.
    pub content_height: f32,
    /// Widest line.
    pub content_width: f32,
}

impl TextLayout {
    /// Lines that intersect the window `[offset, offset + viewport_height)`.
    pub fn visible_lines(
        &self,
        offset: f32,
        viewport_height: f32,
    ) -> impl Iterator<Item = &LayoutLine> + '_ {
        self.lines.iter().filter(move |line| {
            let top = line.y - offset;
            top + line.height > 0.0 && top < viewport_height
        })
    }

    pub fn line_texts(&self) -> Vec<String> {
        self.lines.iter().map(LayoutLine::text).collect()
    }
}

/// Lay out unstyled text with the uniform `base` style.
pub fn layout_plain<M: TextMeasure + ?Sized>(
    text: &str,
    base: &ResolvedStyle,
    config: &LayoutConfig,
    measure: &mut M,
) -> TextLayout {
    let mut builder = LineBuilder::new(measure, *config, *base, config.hard_break);
    let mut pending_space = false;
    builder.feed(text, *base, 0, &mut pending_space);
    builder.finish()
}

/// Lay out styled segments; each segment resolves against `base`.
pub fn layout_styled<M: TextMeasure + ?Sized>(
    segments: &[TextSegment],
    base: &ResolvedStyle,
    config: &LayoutConfig,
    measure: &mut M,
) -> TextLayout {
    let mut builder = LineBuilder::new(measure, *config, *base, false);
    let mut pending_space = false;
    for (source, segment) in segments.iter().enumerate() {
        let style = segment.resolve(base);
        builder.feed(&segment.text, style, source, &mut pending_space);
    }
    builder.finish()
}

/// [`layout_styled`] using the text's own base style.
pub fn layout_text<M: TextMeasure + ?Sized>(
    text: &StyledText,
    config: &LayoutConfig,
    measure: &mut M,
) -> TextLayout {
    layout_styled(&text.segments, &text.base, config, measure)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Piece<'a> {
    Word(&'a str),
    Space,
    Newline,
}

/// Split text into words, collapsed whitespace and explicit newlines.
fn pieces(text: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if !ch.is_whitespace() {
            if word_start.is_none() {
                word_start = Some(idx);
            }
            continue;
        }
        if let Some(start) = word_start.take() {
            out.push(Piece::Word(&text[start..idx]));
        }
        if ch == '\n' {
            out.push(Piece::Newline);
        } else if !matches!(out.last(), Some(Piece::Space)) {
            out.push(Piece::Space);
        }
    }
    if let Some(start) = word_start {
        out.push(Piece::Word(&text[start..]));
    }
    out
}

/// Run on the line being built; `source` is the segment index.
struct PendingRun {
    text: String,
    style: ResolvedStyle,
    source: usize,
    width: f32,
}

struct LineBuilder<'m, M: TextMeasure + ?Sized> {
    measure: &'m mut M,
    config: LayoutConfig,
    base: ResolvedStyle,
    hard_break: bool,
    runs: Vec<PendingRun>,
    width: f32,
    lines: Vec<LayoutLine>,
    cursor_y: f32,
    content_width: f32,
}

impl<'m, M: TextMeasure + ?Sized> LineBuilder<'m, M> {
    fn new(measure: &'m mut M, config: LayoutConfig, base: ResolvedStyle, hard_break: bool) -> Self {
        Self {
            measure,
            config,
            base,
            hard_break,
            runs: Vec::new(),
            width: 0.0,
            lines: Vec::new(),
            cursor_y: 0.0,
            content_width: 0.0,
        }
    }

    fn feed(&mut self, text: &str, style: ResolvedStyle, source: usize, pending_space: &mut bool) {
        for piece in pieces(text) {
            match piece {
                Piece::Word(word) => {
                    self.push_word(word, style, source, *pending_space);
                    *pending_space = false;
                }
                Piece::Space => *pending_space = true,
                Piece::Newline => {
                    self.break_line();
                    *pending_space = false;
                }
            }
        }
    }

    fn push_word(&mut self, word: &str, style: ResolvedStyle, source: usize, space_before: bool) {
        let max_width = self.config.max_width;

        if let Some(last) = self.runs.last() {
            let last_text = last.text.clone();
            let last_style = last.style;
            let last_width = last.width;
            let last_source = last.source;
            let others = self.width - last_width;

            if last_source == source {
                // Same segment: the word joins the open run.
                let text = if space_before {
                    format!("{last_text} {word}")
                } else {
                    format!("{last_text}{word}")
                };
                let run_width = self.measure.measure_styled(&text, &style);
                if others + run_width <= max_width {
                    self.replace_last(text, run_width);
                    return;
                }
            } else {
                // New segment: a separating space stays with the previous run.
                let (prev_text, prev_width) = if space_before {
                    let text = format!("{last_text} ");
                    let width = self.measure.measure_styled(&text, &last_style);
                    (text, width)
                } else {
                    (last_text, last_width)
                };
                let word_width = self.measure.measure_styled(word, &style);
                if others + prev_width + word_width <= max_width {
                    self.replace_last(prev_text, prev_width);
                    self.push_run(word.to_string(), style, source, word_width);
                    return;
                }
            }
            self.break_line();
        }

        self.start_line_with(word, style, source);
    }

    /// Place `word` on an empty line, hard-breaking it when allowed.
    fn start_line_with(&mut self, word: &str, style: ResolvedStyle, source: usize) {
        let max_width = self.config.max_width;
        let mut rest = word;

        loop {
            let width = self.measure.measure_styled(rest, &style);
            if width <= max_width || !self.hard_break {
                self.push_run(rest.to_string(), style, source, width);
                return;
            }

            let split = self.fitting_prefix(rest, &style);
            let (head, tail) = rest.split_at(split);
            let head_width = self.measure.measure_styled(head, &style);
            self.push_run(head.to_string(), style, source, head_width);
            // The last fragment stays open so following words or a newline
            // close it like any other line.
            if tail.is_empty() {
                return;
            }
            self.break_line();
            rest = tail;
        }
    }

    /// Byte length of the longest prefix of `text` that fits the box.
    /// Always at least one character, even if that character overflows.
    fn fitting_prefix(&mut self, text: &str, style: &ResolvedStyle) -> usize {
        let mut ends = text.char_indices().map(|(idx, ch)| idx + ch.len_utf8());
        let Some(mut best) = ends.next() else {
            return text.len();
        };
        for end in ends {
            if self.measure.measure_styled(&text[..end], style) > self.config.max_width {
                break;
            }
            best = end;
        }
        best
    }

    fn replace_last(&mut self, text: String, width: f32) {
        if let Some(last) = self.runs.last_mut() {
            self.width += width - last.width;
            last.text = text;
            last.width = width;
        }
    }

    fn push_run(&mut self, text: String, style: ResolvedStyle, source: usize, width: f32) {
        self.width += width;
        self.runs.push(PendingRun {
            text,
            style,
            source,
            width,
        });
    }

    /// Close the open line. An empty line still takes the base line height.
    fn break_line(&mut self) {
        let font_size = self
            .runs
            .iter()
            .map(|r| r.style.font_size)
            .reduce(f32::max)
            .unwrap_or(self.base.font_size);
        let height = font_size * self.config.line_height_scale;

        let mut x = 0.0;
        let runs = self
            .runs
            .drain(..)
            .map(|run| {
                let placed = LayoutRun {
                    text: run.text,
                    style: run.style,
                    x,
                    width: run.width,
                };
                x += run.width;
                placed
            })
            .collect();

        self.lines.push(LayoutLine {
            runs,
            y: self.cursor_y,
            height,
            width: self.width,
        });
        self.cursor_y += height;
        self.content_width = self.content_width.max(self.width);
        self.width = 0.0;
    }

    fn finish(mut self) -> TextLayout {
        if !self.runs.is_empty() {
            self.break_line();
        }
        TextLayout {
            lines: self.lines,
            content_height: self.cursor_y,
            content_width: self.content_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::measure::MonoMeasure;
    use crate::style::palette;

    /// 10px font with a 0.6 advance: every character is 6px wide.
    fn base() -> ResolvedStyle {
        ResolvedStyle::new(palette::BLACK, 10.0)
    }

    #[test]
    fn wraps_at_word_boundary() {
        let mut m = MonoMeasure::default();
        // "a b" = 18px, "a b c" = 30px.
        let layout = layout_plain("a b c", &base(), &LayoutConfig::new(25.0), &mut m);
        assert_eq!(layout.line_texts(), ["a b", "c"]);
        assert!((layout.content_height - 30.0).abs() < 0.001);
    }

    #[test]
    fn fits_on_one_line_when_wide() {
        let mut m = MonoMeasure::default();
        let layout = layout_plain("a b c", &base(), &LayoutConfig::new(100.0), &mut m);
        assert_eq!(layout.line_texts(), ["a b c"]);
        assert!((layout.content_width - 30.0).abs() < 0.001);
    }

    #[test]
    fn long_word_hard_breaks() {
        let mut m = MonoMeasure::default();
        let config = LayoutConfig::new(40.0);
        let layout = layout_plain("abcdefghijklmnopqrstuvwxyz", &base(), &config, &mut m);
        assert!(layout.lines.len() > 1);
        for line in &layout.lines {
            let w = m.measure(&line.text(), 10.0);
            assert!(w <= 40.0, "fragment {:?} is {w}px", line.text());
        }
        let joined: String = layout.line_texts().concat();
        assert_eq!(joined, "abcdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn hard_break_tail_keeps_accumulating() {
        let mut m = MonoMeasure::default();
        // Box fits 6 chars; "abcdefgh" splits into "abcdef" + "gh", and "ij" joins "gh".
        let layout = layout_plain("abcdefgh ij", &base(), &LayoutConfig::new(36.0), &mut m);
        assert_eq!(layout.line_texts(), ["abcdef", "gh ij"]);
    }

    #[test]
    fn hard_break_disabled_overflows() {
        let mut m = MonoMeasure::default();
        let config = LayoutConfig::new(20.0).with_hard_break(false);
        let layout = layout_plain("abcdefgh", &base(), &config, &mut m);
        assert_eq!(layout.line_texts(), ["abcdefgh"]);
    }

    #[test]
    fn narrower_than_one_char_still_progresses() {
        let mut m = MonoMeasure::default();
        let layout = layout_plain("abc", &base(), &LayoutConfig::new(2.0), &mut m);
        assert_eq!(layout.line_texts(), ["a", "b", "c"]);
    }

    #[test]
    fn overflowing_last_fragment_adds_no_blank_line() {
        let mut m = MonoMeasure::default();
        let config = LayoutConfig::new(0.0);
        let with_newline = layout_plain("ab\n", &base(), &config, &mut m);
        let without = layout_plain("ab", &base(), &config, &mut m);
        assert_eq!(with_newline.line_texts(), ["a", "b"]);
        assert_eq!(with_newline, without);
        assert!((with_newline.content_height - 30.0).abs() < 0.001);

        // A following word starts its own line after the overflowing fragment.
        let layout = layout_plain("ab c", &base(), &config, &mut m);
        assert_eq!(layout.line_texts(), ["a", "b", "c"]);
    }

    #[test]
    fn explicit_newlines_break_lines() {
        let mut m = MonoMeasure::default();
        let layout = layout_plain("one\n\ntwo\n", &base(), &LayoutConfig::new(500.0), &mut m);
        assert_eq!(layout.line_texts(), ["one", "", "two"]);
        // Blank line still takes a full line height.
        assert!((layout.content_height - 45.0).abs() < 0.001);
        assert!((layout.lines[2].y - 30.0).abs() < 0.001);
    }

    #[test]
    fn whitespace_collapses_and_leading_space_dropped() {
        let mut m = MonoMeasure::default();
        let layout = layout_plain("   a    b  ", &base(), &LayoutConfig::new(500.0), &mut m);
        assert_eq!(layout.line_texts(), ["a b"]);
    }

    #[test]
    fn empty_text_has_no_height() {
        let mut m = MonoMeasure::default();
        let layout = layout_plain("", &base(), &LayoutConfig::new(100.0), &mut m);
        assert!(layout.lines.is_empty());
        assert!(layout.content_height.abs() < 0.001);
    }

    #[test]
    fn layout_is_deterministic() {
        let mut m = MonoMeasure::default();
        let segs = markup::parse("The [color=red][b]dragon[/b][/color] sleeps [size=large]deep[/size] below");
        let config = LayoutConfig::new(70.0);
        let first = layout_styled(&segs, &base(), &config, &mut m);
        let second = layout_styled(&segs, &base(), &config, &mut m);
        assert_eq!(first, second);
    }

    #[test]
    fn styled_runs_share_a_line() {
        let mut m = MonoMeasure::default();
        let segs = markup::parse("Hello [color=red]world[/color]!");
        let layout = layout_styled(&segs, &base(), &LayoutConfig::new(500.0), &mut m);
        assert_eq!(layout.lines.len(), 1);

        let line = &layout.lines[0];
        let runs: Vec<&str> = line.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(runs, ["Hello ", "world", "!"]);
        assert_eq!(line.runs[1].style.color, palette::RED);
        assert!((line.runs[1].x - 36.0).abs() < 0.001);
        assert!((line.runs[2].x - 66.0).abs() < 0.001);
        assert_eq!(line.text(), "Hello world!");
    }

    #[test]
    fn styled_wraps_between_segments() {
        let mut m = MonoMeasure::default();
        // "Hello" = 30px, "Hello world" = 66px.
        let segs = markup::parse("Hello [color=blue]world[/color]");
        let layout = layout_styled(&segs, &base(), &LayoutConfig::new(50.0), &mut m);
        assert_eq!(layout.line_texts(), ["Hello", "world"]);
        assert_eq!(layout.lines[1].runs[0].style.color, palette::BLUE);
    }

    #[test]
    fn styled_never_splits_words() {
        let mut m = MonoMeasure::default();
        let segs = markup::parse("[b]incomprehensibilities[/b]");
        let layout = layout_styled(&segs, &base(), &LayoutConfig::new(30.0), &mut m);
        assert_eq!(layout.line_texts(), ["incomprehensibilities"]);
    }

    #[test]
    fn line_height_follows_largest_run() {
        let mut m = MonoMeasure::default();
        let segs = markup::parse("tiny [size=huge]BIG[/size]\nnext");
        let layout = layout_styled(&segs, &base(), &LayoutConfig::new(500.0), &mut m);
        assert_eq!(layout.lines.len(), 2);
        assert!((layout.lines[0].height - 30.0).abs() < 0.001); // 20 * 1.5
        assert!((layout.lines[1].height - 15.0).abs() < 0.001); // 10 * 1.5
        assert!((layout.content_height - 45.0).abs() < 0.001);
    }

    #[test]
    fn styled_measures_at_segment_size() {
        let mut m = MonoMeasure::default();
        // Large run: 15px font, 9px per char; "ab" = 18px, then " cd" at base.
        let segs = markup::parse("[size=large]ab[/size] cd");
        let layout = layout_styled(&segs, &base(), &LayoutConfig::new(500.0), &mut m);
        let line = &layout.lines[0];
        assert!((line.runs[0].width - 27.0).abs() < 0.001); // "ab " at 9px
        assert!((line.width - 39.0).abs() < 0.001);
    }

    #[test]
    fn visible_lines_clip_to_viewport() {
        let mut m = MonoMeasure::default();
        let text = "l1\nl2\nl3\nl4\nl5";
        let layout = layout_plain(text, &base(), &LayoutConfig::new(500.0), &mut m);
        // 15px per line, 75px total.
        assert!((layout.content_height - 75.0).abs() < 0.001);

        let visible: Vec<String> = layout.visible_lines(0.0, 30.0).map(LayoutLine::text).collect();
        assert_eq!(visible, ["l1", "l2"]);

        // Partially visible lines on both edges are kept.
        let visible: Vec<String> = layout.visible_lines(20.0, 30.0).map(LayoutLine::text).collect();
        assert_eq!(visible, ["l2", "l3", "l4"]);
    }

    #[test]
    fn closure_measure_works() {
        let mut measure = |text: &str, size: f32| text.chars().count() as f32 * size;
        let layout = layout_plain("aa bb", &base(), &LayoutConfig::new(30.0), &mut measure);
        assert_eq!(layout.line_texts(), ["aa", "bb"]);
    }
}
