//! Line numbering engine: inserts stable, addressable line-number markers
//! into motion HTML at a configurable column width, and strips them back out.
//!
//! A line begins at the start of the fragment's text flow, after every
//! block-element boundary, after every `<br>`, and after every `line_length`
//! visible units (a soft wrap). A visible unit is one HTML entity or one
//! extended grapheme cluster, so a wrap can never split a tag, an entity, or
//! a combining sequence. Markers are inserted as siblings at the exact split
//! point inside whatever element contains the text, which preserves tag
//! nesting by construction.
//!
//! Numbering restarts on every call; there is no cross-call state.

use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation as _;

use crate::error::Error;
use crate::html::{self, Element, HtmlNode};

/// CSS class carried by every line-number marker.
pub const LINE_NUMBER_CLASS: &str = "line-number";

/// CSS class carried by the `<br>` inserted at a soft wrap.
pub const LINE_BREAK_CLASS: &str = "line-break";

/// CSS class wrapping the text segments of a highlighted line.
pub const HIGHLIGHT_CLASS: &str = "highlight";

/// Insert line-number markers into a fragment, numbering from 1.
///
/// `highlight` wraps the text of that line in a highlight span.
/// A `line_length` of 0 disables soft wrapping; block and `<br>` boundaries
/// still start new lines. Stale markers, soft-wrap breaks, and highlight
/// wrappers already present in the input are dropped first, so re-numbering
/// is safe.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub fn insert_line_numbers(
    html_text: &str,
    line_length: usize,
    highlight: Option<u32>,
) -> Result<String, Error> {
    return insert_line_numbers_from(html_text, line_length, 1, highlight);
}

/// Same as [`insert_line_numbers`], but numbering starts at `first_line` —
/// used when an amendment paragraph keeps the lead motion's coordinates.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub fn insert_line_numbers_from(
    html_text: &str,
    line_length: usize,
    first_line: u32,
    highlight: Option<u32>,
) -> Result<String, Error> {
    let nodes = html::parse_fragment(html_text)?;
    let mut numberer = Numberer::new(line_length, first_line.max(1), highlight);
    let numbered = numberer.process_nodes(&nodes);
    Ok(html::serialize(&numbered))
}

/// Remove all markers, soft-wrap breaks, and highlight wrappers, re-merging
/// the text nodes that insertion split apart. Exact inverse of insertion for
/// canonical safe-subset input: `strip(insert(h, n)) == h`.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub fn strip_line_numbers(html_text: &str) -> Result<String, Error> {
    let nodes = html::parse_fragment(html_text)?;
    let stripped = html::merge_adjacent_text(strip_nodes(&nodes));
    Ok(html::serialize(&stripped))
}

/// The highest line number [`insert_line_numbers`] would assign, or 0 for
/// content with no visible text. Used to bound go-to-line validation.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub fn last_line_number(html_text: &str, line_length: usize) -> Result<u32, Error> {
    let nodes = html::parse_fragment(html_text)?;
    let mut numberer = Numberer::new(line_length, 1, None);
    let _ = numberer.process_nodes(&nodes);
    return Ok(numberer.next_line.saturating_sub(1));
}

/// The line number a marker element carries, if it is one.
pub(crate) fn marker_line_number(el: &Element) -> Option<u32> {
    if el.tag != "span" || !el.has_class(LINE_NUMBER_CLASS) {
        return None;
    }
    return el.attr("data-line-number")?.parse().ok();
}

/// Whether an element is a soft-wrap break inserted by this engine.
pub(crate) fn is_line_break(el: &Element) -> bool {
    return el.tag == "br" && el.has_class(LINE_BREAK_CLASS);
}

/// Whether an element is a highlight wrapper inserted by this engine.
pub(crate) fn is_highlight(el: &Element) -> bool {
    return el.tag == "span" && el.has_class(HIGHLIGHT_CLASS);
}

/// The first and last marker numbers present in a fragment, in document
/// order, or `None` if it carries no markers.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub(crate) fn marker_span(html_text: &str) -> Result<Option<(u32, u32)>, Error> {
    let nodes = html::parse_fragment(html_text)?;
    let mut numbers = Vec::new();
    collect_marker_numbers(&nodes, &mut numbers);
    let (Some(first), Some(last)) = (numbers.first(), numbers.last()) else {
        return Ok(None);
    };
    return Ok(Some((*first, *last)));
}

fn collect_marker_numbers(nodes: &[HtmlNode], numbers: &mut Vec<u32>) {
    for node in nodes {
        let HtmlNode::Element(el) = node else {
            continue;
        };
        if let Some(number) = marker_line_number(el) {
            numbers.push(number);
            continue;
        }
        collect_marker_numbers(&el.children, numbers);
    }
}

/// The marker element for one line:
/// `<span class="line-number line-number-N" data-line-number="N">&nbsp;</span>`.
fn marker_element(line: u32) -> HtmlNode {
    return HtmlNode::Element(Element {
        attrs: vec![
            (
                "class".to_string(),
                format!("{LINE_NUMBER_CLASS} {LINE_NUMBER_CLASS}-{line}"),
            ),
            ("data-line-number".to_string(), line.to_string()),
        ],
        children: vec![HtmlNode::Text("&nbsp;".to_string())],
        tag: "span".to_string(),
    });
}

fn line_break_element() -> HtmlNode {
    return HtmlNode::Element(Element {
        attrs: vec![("class".to_string(), LINE_BREAK_CLASS.to_string())],
        children: Vec::new(),
        tag: "br".to_string(),
    });
}

fn strip_nodes(nodes: &[HtmlNode]) -> Vec<HtmlNode> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push(HtmlNode::Text(text.clone())),
            HtmlNode::Element(el) => {
                if marker_line_number(el).is_some() || is_line_break(el) {
                    continue;
                }
                if is_highlight(el) {
                    out.extend(strip_nodes(&el.children));
                    continue;
                }
                out.push(HtmlNode::Element(Element {
                    attrs: el.attrs.clone(),
                    children: strip_nodes(&el.children),
                    tag: el.tag.clone(),
                }));
            },
        }
    }
    out
}

/// What is due before the next visible unit.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PendingBreak {
    /// A marker: start of flow, or a block/`<br>` boundary was crossed.
    Marker,
    /// A soft wrap: a line-break `<br>` plus a marker.
    WrapAndMarker,
}

/// Walk state for one numbering pass.
struct Numberer {
    /// Visible units emitted on the current line so far.
    column: usize,
    /// Line whose text gets wrapped in a highlight span, if any.
    highlight: Option<u32>,
    /// Soft-wrap width; 0 disables wrapping.
    line_length: usize,
    /// Number the next marker will carry.
    next_line: u32,
    /// Break due before the next visible unit, if any.
    pending: Option<PendingBreak>,
}

impl Numberer {
    fn new(line_length: usize, first_line: u32, highlight: Option<u32>) -> Self {
        return Self {
            column: 0,
            highlight,
            line_length,
            next_line: first_line,
            // The very first visible unit opens the first line.
            pending: Some(PendingBreak::Marker),
        };
    }

    fn process_nodes(&mut self, nodes: &[HtmlNode]) -> Vec<HtmlNode> {
        let mut out = Vec::new();
        for node in nodes {
            match node {
                HtmlNode::Text(text) => self.process_text(text, &mut out),
                HtmlNode::Element(el) => {
                    // Stale numbering artifacts are dropped, making
                    // re-numbering idempotent.
                    if marker_line_number(el).is_some() || is_line_break(el) {
                        continue;
                    }
                    if is_highlight(el) {
                        out.extend(self.process_nodes(&el.children));
                        continue;
                    }
                    if el.tag == "br" {
                        out.push(node.clone());
                        self.column = 0;
                        self.pending = Some(PendingBreak::Marker);
                        continue;
                    }
                    if el.is_block() {
                        self.column = 0;
                        self.pending = Some(PendingBreak::Marker);
                        let children = self.process_nodes(&el.children);
                        out.push(HtmlNode::Element(Element {
                            attrs: el.attrs.clone(),
                            children,
                            tag: el.tag.clone(),
                        }));
                        // Whatever follows the block starts a fresh line too.
                        self.column = 0;
                        self.pending = Some(PendingBreak::Marker);
                        continue;
                    }
                    let children = self.process_nodes(&el.children);
                    out.push(HtmlNode::Element(Element {
                        attrs: el.attrs.clone(),
                        children,
                        tag: el.tag.clone(),
                    }));
                },
            }
        }
        out
    }

    fn process_text(&mut self, text: &str, out: &mut Vec<HtmlNode>) {
        // Formatting whitespace at a line boundary (between blocks) is not
        // content; it passes through uncounted.
        if self.pending.is_some() && text.trim().is_empty() {
            if !text.is_empty() {
                out.push(HtmlNode::Text(text.to_string()));
            }
            return;
        }

        let mut buf = String::new();
        for unit in visible_units(text) {
            if let Some(kind) = self.pending.take() {
                self.flush_text(&mut buf, out);
                if kind == PendingBreak::WrapAndMarker {
                    out.push(line_break_element());
                }
                out.push(marker_element(self.next_line));
                self.next_line = self.next_line.saturating_add(1);
                self.column = 0;
            }
            buf.push_str(unit);
            self.column += 1;
            if self.line_length > 0 && self.column >= self.line_length {
                self.flush_text(&mut buf, out);
                self.pending = Some(PendingBreak::WrapAndMarker);
                self.column = 0;
            }
        }
        self.flush_text(&mut buf, out);
    }

    /// Emit the buffered text of the current line, wrapped in a highlight
    /// span when the current line is the highlighted one.
    fn flush_text(&mut self, buf: &mut String, out: &mut Vec<HtmlNode>) {
        if buf.is_empty() {
            return;
        }
        let text = HtmlNode::Text(std::mem::take(buf));
        let current_line = self.next_line.saturating_sub(1);
        if self.highlight == Some(current_line) {
            out.push(HtmlNode::Element(Element {
                attrs: vec![("class".to_string(), HIGHLIGHT_CLASS.to_string())],
                children: vec![text],
                tag: "span".to_string(),
            }));
        } else {
            out.push(text);
        }
    }
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    return PATTERN.get_or_init(|| {
        Regex::new("^&(?:#[0-9]+|#x[0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").expect("valid regex")
    });
}

/// Split raw text into visible units: one entity or one grapheme cluster per
/// unit.
fn visible_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with('&') {
            if let Some(found) = entity_pattern().find(rest) {
                units.push(&rest[..found.end()]);
                pos += found.end();
                continue;
            }
        }
        let Some(grapheme) = rest.graphemes(true).next() else {
            break;
        };
        units.push(grapheme);
        pos += grapheme.len();
    }
    units
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        insert_line_numbers, insert_line_numbers_from, last_line_number, marker_span,
        strip_line_numbers, visible_units,
    };

    #[test]
    fn first_line_marker_goes_inside_the_block() {
        let numbered = insert_line_numbers("<p>Hello world</p>", 80, None).unwrap();
        assert_eq!(
            numbered,
            "<p><span class=\"line-number line-number-1\" data-line-number=\"1\">&nbsp;</span>\
             Hello world</p>"
        );
    }

    #[test]
    fn soft_wrap_inserts_break_and_marker() {
        let numbered = insert_line_numbers("<p>abcdef</p>", 3, None).unwrap();
        assert!(numbered.contains("data-line-number=\"1\""));
        assert!(numbered.contains("<br class=\"line-break\">"));
        assert!(numbered.contains("data-line-number=\"2\""));
        assert_eq!(strip_line_numbers(&numbered).unwrap(), "<p>abcdef</p>");
    }

    #[test]
    fn wrap_point_can_fall_inside_inline_markup() {
        let numbered = insert_line_numbers("<p>ab<strong>cdef</strong></p>", 3, None).unwrap();
        // The break lands inside <strong>, keeping nesting balanced.
        assert!(numbered.contains("<strong>c<br class=\"line-break\">"));
        assert_eq!(
            strip_line_numbers(&numbered).unwrap(),
            "<p>ab<strong>cdef</strong></p>"
        );
    }

    #[test]
    fn block_boundaries_start_new_lines() {
        let numbered =
            insert_line_numbers("<p>one</p><ul><li>two</li><li>three</li></ul>", 80, None)
                .unwrap();
        assert_eq!(last_line_number("<p>one</p><ul><li>two</li><li>three</li></ul>", 80).unwrap(), 3);
        assert!(numbered.contains("data-line-number=\"3\""));
    }

    #[test]
    fn explicit_br_starts_a_new_line_without_wrap_break() {
        let numbered = insert_line_numbers("<p>one<br>two</p>", 80, None).unwrap();
        assert!(numbered.contains("<br><span class=\"line-number line-number-2\""));
        assert_eq!(strip_line_numbers(&numbered).unwrap(), "<p>one<br>two</p>");
    }

    #[test]
    fn entity_counts_as_one_unit_and_never_splits() {
        let numbered = insert_line_numbers("<p>ab&amp;cd</p>", 3, None).unwrap();
        // Wrap after 3 units: a, b, &amp; — the entity stays whole.
        assert!(numbered.contains("ab&amp;<br class=\"line-break\">"));
        assert_eq!(strip_line_numbers(&numbered).unwrap(), "<p>ab&amp;cd</p>");
    }

    #[test]
    fn exact_fill_leaves_no_trailing_empty_line() {
        assert_eq!(last_line_number("<p>abc</p>", 3).unwrap(), 1);
        assert_eq!(last_line_number("<p>abcd</p>", 3).unwrap(), 2);
    }

    #[test]
    fn empty_content_has_no_lines() {
        assert_eq!(last_line_number("<p></p>", 80).unwrap(), 0);
        assert_eq!(last_line_number("", 80).unwrap(), 0);
    }

    #[test]
    fn zero_line_length_disables_soft_wrapping() {
        let long = format!("<p>{}</p>", "x".repeat(500));
        assert_eq!(last_line_number(&long, 0).unwrap(), 1);
    }

    #[test]
    fn numbering_can_start_at_an_offset() {
        let numbered = insert_line_numbers_from("<p>text</p>", 80, 7, None).unwrap();
        assert!(numbered.contains("data-line-number=\"7\""));
        assert_eq!(marker_span(&numbered).unwrap(), Some((7, 7)));
    }

    #[test]
    fn renumbering_is_idempotent() {
        let once = insert_line_numbers("<p>abcdef</p>", 3, None).unwrap();
        let twice = insert_line_numbers(&once, 3, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn highlight_wraps_the_lines_text() {
        let numbered = insert_line_numbers("<p>abcdef</p>", 3, Some(2)).unwrap();
        assert!(numbered.contains("<span class=\"highlight\">def</span>"));
        assert_eq!(strip_line_numbers(&numbered).unwrap(), "<p>abcdef</p>");
    }

    #[test]
    fn whitespace_between_blocks_is_not_counted() {
        let numbered = insert_line_numbers("<p>a</p>\n<p>b</p>", 80, None).unwrap();
        assert_eq!(strip_line_numbers(&numbered).unwrap(), "<p>a</p>\n<p>b</p>");
        assert_eq!(last_line_number("<p>a</p>\n<p>b</p>", 80).unwrap(), 2);
    }

    #[test]
    fn grapheme_clusters_stay_whole() {
        // é as e + combining accent is one visible unit.
        let units = visible_units("ae\u{301}b");
        assert_eq!(units, vec!["a", "e\u{301}", "b"]);
    }

    proptest! {
        #[test]
        fn stripping_inverts_insertion(
            first in "[a-z ]{0,120}",
            second in "[a-z ]{0,120}",
            line_length in 1usize..40,
        ) {
            let html = format!("<p>{first}</p><p>{second}</p>");
            let numbered = insert_line_numbers(&html, line_length, None).unwrap();
            prop_assert_eq!(strip_line_numbers(&numbered).unwrap(), html);
        }

        #[test]
        fn line_count_shrinks_as_lines_grow(
            text in "[a-z ]{1,200}",
            shorter in 1usize..20,
            delta in 0usize..20,
        ) {
            let html = format!("<p>{text}</p>");
            let at_shorter = last_line_number(&html, shorter).unwrap();
            let at_longer = last_line_number(&html, shorter + delta).unwrap();
            prop_assert!(at_shorter >= at_longer);
        }
    }
}
