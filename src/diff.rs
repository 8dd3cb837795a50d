//! Diff engine: line-range extraction and splicing over numbered HTML, and
//! word-level paragraph diffing.
//!
//! Range operations work on a flattened event stream of the parsed fragment
//! (open tag, close tag, text, marker, soft break). Tracking the open-element
//! stack across the stream is what lets a splice close and reopen ancestor
//! tags at both boundary points, so a replacement starting mid-`<ul><li>`
//! still produces balanced markup. All coordinates refer to the markers
//! present in the input; splice output carries no markers, and the caller
//! re-numbers if needed.

use crate::error::Error;
use crate::html::{self, Element, HtmlNode};
use crate::linenumbering;
use crate::types::{LineRange, ParagraphDiff};

/// A line range extracted from numbered HTML, together with the ancestor
/// context needed to re-wrap a replacement with structurally valid markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRange {
    /// Tag names of the elements open at the start of the range, outermost
    /// first.
    pub ancestor_tags: Vec<String>,
    /// The range's content, re-wrapped with its ancestors' opening tags and
    /// balanced with closing tags — independently valid HTML, no markers.
    pub html: String,
    /// Closing-tag markup completing `outer_context_html`, e.g. `</li></ul>`.
    pub inner_context_html: String,
    /// Opening-tag markup of the ancestors, e.g. `<ul><li>`.
    pub outer_context_html: String,
}

/// Locate a line range in numbered HTML and return its content plus ancestor
/// context.
///
/// # Errors
///
/// Returns `Error::InvalidRange` for inverted ranges, ranges past the last
/// line, or input without markers; `Error::MalformedHtml` if the fragment
/// does not parse.
pub fn extract_range_by_line_numbers(
    numbered_html: &str,
    range: LineRange,
) -> Result<ExtractedRange, Error> {
    let nodes = html::parse_fragment(numbered_html)?;
    let mut stream = Vec::new();
    flatten(&nodes, &mut stream);
    let bounds = locate_range(&stream, range)?;

    let entry_stack = stack_at(&stream, bounds.from_marker);
    let mut fragment = String::new();
    for el in &entry_stack {
        fragment.push_str(&html::open_tag_markup(el));
    }
    let mut stack = entry_stack.clone();
    for item in &stream[bounds.from_marker..bounds.to_boundary] {
        match *item {
            StreamItem::Open(el) => {
                stack.push(el);
                fragment.push_str(&html::open_tag_markup(el));
            },
            StreamItem::Close(el) => {
                stack.pop();
                fragment.push_str(&html::close_tag_markup(el));
            },
            StreamItem::Text(text) => fragment.push_str(text),
            StreamItem::Void(el) => fragment.push_str(&html::open_tag_markup(el)),
            StreamItem::Marker(_) | StreamItem::LineBreak => {},
        }
    }
    for el in stack.iter().rev() {
        fragment.push_str(&html::close_tag_markup(el));
    }

    Ok(ExtractedRange {
        ancestor_tags: entry_stack.iter().map(|el| el.tag.clone()).collect(),
        html: fragment,
        inner_context_html: entry_stack
            .iter()
            .rev()
            .map(|el| html::close_tag_markup(el))
            .collect(),
        outer_context_html: entry_stack
            .iter()
            .map(|el| html::open_tag_markup(el))
            .collect(),
    })
}

/// Splice `new_html` over a line range of numbered HTML, closing and
/// reopening ancestor tags at both splice points. The result carries no
/// markers; re-number it if display needs them.
///
/// # Errors
///
/// Returns `Error::InvalidRange` if the range cannot be resolved,
/// `Error::MalformedHtml` if the fragment does not parse.
pub fn replace_lines(
    numbered_html: &str,
    new_html: &str,
    range: LineRange,
) -> Result<String, Error> {
    return splice_ranges(numbered_html, &[(range, new_html.to_string())]);
}

/// Splice several disjoint ranges in one left-to-right pass. Every range
/// addresses the input's original numbering, which is what keeps a merge
/// pass's coordinates consistent without re-numbering between splices.
///
/// # Errors
///
/// Returns `Error::InvalidRange` for unresolvable or overlapping ranges,
/// `Error::MalformedHtml` if the fragment does not parse.
pub(crate) fn splice_ranges(
    numbered_html: &str,
    replacements: &[(LineRange, String)],
) -> Result<String, Error> {
    let nodes = html::parse_fragment(numbered_html)?;
    let mut stream = Vec::new();
    flatten(&nodes, &mut stream);

    let mut spans = Vec::new();
    for (range, replacement) in replacements {
        let bounds = locate_range(&stream, *range)?;
        spans.push(Span {
            end: bounds.to_boundary,
            range: *range,
            replacement: replacement.as_str(),
            start: bounds.from_spliced,
        });
    }
    spans.sort_by_key(|span| span.start);
    for pair in spans.windows(2) {
        // Overlap detection is the merger's job; this guards the splice
        // itself against callers that skipped it.
        if pair[0].end > pair[1].start {
            let last_line = last_marker(&stream);
            return Err(Error::InvalidRange {
                last_line,
                range: pair[1].range,
            });
        }
    }

    let mut out = String::new();
    let mut stack: Vec<&Element> = Vec::new();
    let mut context_open = true;
    let mut next_span = 0;
    let mut skip_until: Option<usize> = None;

    for (pos, item) in stream.iter().enumerate() {
        if let Some(end) = skip_until {
            if pos < end {
                track_stack(item, &mut stack);
                continue;
            }
            skip_until = None;
            let chains_into_next = next_span < spans.len() && spans[next_span].start == pos;
            if !chains_into_next {
                for el in &stack {
                    out.push_str(&html::open_tag_markup(el));
                }
                context_open = true;
            }
        }
        if next_span < spans.len() && spans[next_span].start == pos {
            let span = &spans[next_span];
            next_span += 1;
            if context_open {
                for el in stack.iter().rev() {
                    out.push_str(&html::close_tag_markup(el));
                }
                context_open = false;
            }
            out.push_str(span.replacement);
            skip_until = Some(span.end);
            track_stack(item, &mut stack);
            continue;
        }
        match *item {
            StreamItem::Open(el) => {
                stack.push(el);
                out.push_str(&html::open_tag_markup(el));
            },
            StreamItem::Close(el) => {
                stack.pop();
                out.push_str(&html::close_tag_markup(el));
            },
            StreamItem::Text(text) => out.push_str(text),
            StreamItem::Void(el) => out.push_str(&html::open_tag_markup(el)),
            StreamItem::Marker(_) | StreamItem::LineBreak => {},
        }
    }

    Ok(out)
}

/// Word-level diff between two fragments, one [`ParagraphDiff`] per
/// paragraph that actually differs. Paragraphs pair by index; markers are
/// stripped before comparison so numbering noise never shows up as a change.
/// Line metadata comes from the markers present in `original` (0 when
/// un-numbered); `text_pre`/`text_post` carry one unchanged neighbour
/// paragraph of context. Identical inputs produce an empty list.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if either fragment does not parse.
pub fn diff_paragraphs(original: &str, changed: &str) -> Result<Vec<ParagraphDiff>, Error> {
    let original_paragraphs = html::split_paragraphs(original)?;
    let changed_paragraphs = html::split_paragraphs(changed)?;
    let count = original_paragraphs.len().max(changed_paragraphs.len());
    let mut diffs = Vec::new();

    for paragraph_no in 0..count {
        let old = original_paragraphs
            .get(paragraph_no)
            .map_or("", String::as_str);
        let new = changed_paragraphs
            .get(paragraph_no)
            .map_or("", String::as_str);
        let old_plain = strip_or_empty(old)?;
        let new_plain = strip_or_empty(new)?;
        if old_plain == new_plain {
            continue;
        }

        let text = diff_fragment(&old_plain, &new_plain);
        let (diff_line_from, diff_line_to) = match linenumbering::marker_span(old)? {
            Some((first, last)) => (first, last.saturating_add(1)),
            None => (0, 0),
        };
        let text_pre = paragraph_no
            .checked_sub(1)
            .and_then(|p| original_paragraphs.get(p))
            .cloned()
            .unwrap_or_default();
        let text_post = original_paragraphs
            .get(paragraph_no + 1)
            .cloned()
            .unwrap_or_default();
        diffs.push(ParagraphDiff {
            diff_line_from,
            diff_line_to,
            html: format!("{text_pre}{text}{text_post}"),
            paragraph_no,
            text,
            text_post,
            text_pre,
        });
    }
    Ok(diffs)
}

/// Word-diff two fragments into inline `<del>`/`<ins>` markup. Falls back to
/// marking the whole old/new fragments with `delete`/`insert` classes when a
/// change run would cut through tag structure.
pub(crate) fn diff_fragment(original: &str, changed: &str) -> String {
    let original_tokens = tokenize(original);
    let changed_tokens = tokenize(changed);
    let ops = diff_ops(&original_tokens, &changed_tokens);
    return match render_inline(&ops) {
        Some(rendered) => rendered,
        None => format!(
            "{}{}",
            mark_block(original, "delete"),
            mark_block(changed, "insert")
        ),
    };
}

// ── Event stream ───────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum StreamItem<'a> {
    /// Closing tag of an element.
    Close(&'a Element),
    /// A soft-wrap break inserted by the numbering engine.
    LineBreak,
    /// A line-number marker.
    Marker(u32),
    /// Opening tag of an element with children.
    Open(&'a Element),
    /// A text node.
    Text(&'a str),
    /// A void element (`<br>`).
    Void(&'a Element),
}

fn flatten<'a>(nodes: &'a [HtmlNode], out: &mut Vec<StreamItem<'a>>) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push(StreamItem::Text(text)),
            HtmlNode::Element(el) => {
                if let Some(number) = linenumbering::marker_line_number(el) {
                    out.push(StreamItem::Marker(number));
                } else if linenumbering::is_line_break(el) {
                    out.push(StreamItem::LineBreak);
                } else if el.tag == "br" {
                    out.push(StreamItem::Void(el));
                } else {
                    out.push(StreamItem::Open(el));
                    flatten(&el.children, out);
                    out.push(StreamItem::Close(el));
                }
            },
        }
    }
}

/// Resolved stream positions for one line range.
struct RangeBounds {
    /// Position of the range's start marker.
    from_marker: usize,
    /// Splice start: the start marker rewound over the opening tags and soft
    /// break directly before it, so a range starting at a block's first line
    /// swallows the block's opening tag instead of leaving it empty.
    from_spliced: usize,
    /// End boundary: the end marker rewound the same way, or the stream end
    /// for a range running to the last line.
    to_boundary: usize,
}

/// One resolved splice.
struct Span<'a> {
    end: usize,
    range: LineRange,
    replacement: &'a str,
    start: usize,
}

fn locate_range(stream: &[StreamItem<'_>], range: LineRange) -> Result<RangeBounds, Error> {
    let last_line = last_marker(stream);
    if !range.is_well_formed() || range.to > last_line.saturating_add(1) {
        return Err(Error::InvalidRange { last_line, range });
    }

    let Some(from_marker) = marker_position(stream, range.from) else {
        return Err(Error::InvalidRange { last_line, range });
    };
    let to_boundary = if range.to == last_line.saturating_add(1) {
        stream.len()
    } else {
        let Some(to_marker) = marker_position(stream, range.to) else {
            return Err(Error::InvalidRange { last_line, range });
        };
        rewind_over_opens(stream, to_marker)
    };

    Ok(RangeBounds {
        from_marker,
        from_spliced: rewind_over_opens(stream, from_marker),
        to_boundary,
    })
}

fn last_marker(stream: &[StreamItem<'_>]) -> u32 {
    return stream
        .iter()
        .filter_map(|item| match item {
            StreamItem::Marker(number) => Some(*number),
            _ => None,
        })
        .max()
        .unwrap_or(0);
}

fn marker_position(stream: &[StreamItem<'_>], line: u32) -> Option<usize> {
    return stream
        .iter()
        .position(|item| matches!(item, StreamItem::Marker(number) if *number == line));
}

/// Step back over the opening tags and soft break that directly precede a
/// marker — they belong to the line the marker starts, not the one before it.
fn rewind_over_opens(stream: &[StreamItem<'_>], pos: usize) -> usize {
    let mut boundary = pos;
    while boundary > 0
        && matches!(
            stream[boundary - 1],
            StreamItem::Open(_) | StreamItem::LineBreak
        )
    {
        boundary -= 1;
    }
    boundary
}

fn stack_at<'a>(stream: &[StreamItem<'a>], pos: usize) -> Vec<&'a Element> {
    let mut stack = Vec::new();
    for item in &stream[..pos] {
        track_stack(item, &mut stack);
    }
    stack
}

fn track_stack<'a>(item: &StreamItem<'a>, stack: &mut Vec<&'a Element>) {
    match item {
        StreamItem::Open(el) => stack.push(el),
        StreamItem::Close(_) => {
            stack.pop();
        },
        _ => {},
    }
}

// ── Word-level diff ────────────────────────────────────────────────────

/// A diff token: whole tags, whitespace runs, and words. Diffing words, not
/// characters, avoids pathological character-level noise.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Whitespace(&'a str),
    Word(&'a str),
}

impl<'a> Token<'a> {
    fn text(&self) -> &'a str {
        return match self {
            Token::Tag(text) | Token::Whitespace(text) | Token::Word(text) => text,
        };
    }
}

#[derive(Clone, Copy)]
enum DiffOp<'a> {
    Delete(Token<'a>),
    Equal(Token<'a>),
    Insert(Token<'a>),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            tokens.push(Token::Tag(&rest[..end]));
            pos += end;
            continue;
        }
        if rest.chars().next().is_some_and(char::is_whitespace) {
            let end = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            tokens.push(Token::Whitespace(&rest[..end]));
            pos += end;
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '<')
            .unwrap_or(rest.len());
        tokens.push(Token::Word(&rest[..end]));
        pos += end;
    }
    tokens
}

/// Classic LCS over tokens. Backtracking is deterministic: a match is always
/// taken, and on a tie the original is consumed first — the earliest
/// original-text match wins, so identical inputs give byte-identical output.
fn diff_ops<'a>(original: &[Token<'a>], changed: &[Token<'a>]) -> Vec<DiffOp<'a>> {
    let rows = original.len();
    let cols = changed.len();
    let width = cols + 1;
    let mut table = vec![0u32; (rows + 1) * width];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            table[i * width + j] = if original[i] == changed[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < rows && j < cols {
        if original[i] == changed[j] {
            ops.push(DiffOp::Equal(original[i]));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            ops.push(DiffOp::Delete(original[i]));
            i += 1;
        } else {
            ops.push(DiffOp::Insert(changed[j]));
            j += 1;
        }
    }
    while i < rows {
        ops.push(DiffOp::Delete(original[i]));
        i += 1;
    }
    while j < cols {
        ops.push(DiffOp::Insert(changed[j]));
        j += 1;
    }
    ops
}

/// Render diff ops as inline `<del>`/`<ins>` markup, or `None` when a change
/// run would cut through tag structure and needs the block-level fallback.
fn render_inline(ops: &[DiffOp<'_>]) -> Option<String> {
    let mut out = String::new();
    let mut i = 0;
    while i < ops.len() {
        if let DiffOp::Equal(token) = ops[i] {
            out.push_str(token.text());
            i += 1;
            continue;
        }

        let mut deleted: Vec<Token<'_>> = Vec::new();
        let mut inserted: Vec<Token<'_>> = Vec::new();
        loop {
            while i < ops.len() {
                match ops[i] {
                    DiffOp::Delete(token) => deleted.push(token),
                    DiffOp::Insert(token) => inserted.push(token),
                    DiffOp::Equal(_) => break,
                }
                i += 1;
            }
            // A whitespace-only equal run between two change runs bridges
            // them into one <del>/<ins> pair.
            let mut lookahead = i;
            while lookahead < ops.len()
                && matches!(ops[lookahead], DiffOp::Equal(Token::Whitespace(_)))
            {
                lookahead += 1;
            }
            let continues = lookahead > i
                && lookahead < ops.len()
                && matches!(ops[lookahead], DiffOp::Delete(_) | DiffOp::Insert(_));
            if !continues {
                break;
            }
            for op in &ops[i..lookahead] {
                let DiffOp::Equal(token) = *op else { continue };
                deleted.push(token);
                inserted.push(token);
            }
            i = lookahead;
        }

        if !tags_balanced(&deleted) || !tags_balanced(&inserted) {
            return None;
        }
        if !deleted.is_empty() {
            out.push_str("<del>");
            for token in &deleted {
                out.push_str(token.text());
            }
            out.push_str("</del>");
        }
        if !inserted.is_empty() {
            out.push_str("<ins>");
            for token in &inserted {
                out.push_str(token.text());
            }
            out.push_str("</ins>");
        }
    }
    Some(out)
}

fn tags_balanced(tokens: &[Token<'_>]) -> bool {
    let mut stack: Vec<String> = Vec::new();
    for token in tokens {
        let Token::Tag(text) = token else { continue };
        let inner = text
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/');
        if let Some(closing) = inner.strip_prefix('/') {
            if stack.pop().as_deref() != Some(tag_name_of(closing).as_str()) {
                return false;
            }
        } else {
            let name = tag_name_of(inner);
            if name != "br" {
                stack.push(name);
            }
        }
    }
    return stack.is_empty();
}

fn tag_name_of(tag_body: &str) -> String {
    return tag_body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
}

/// Mark every top-level element of a fragment with an extra class — the
/// whole-paragraph rendering used when inline markup cannot express a change.
fn mark_block(html_text: &str, class: &str) -> String {
    let Ok(nodes) = html::parse_fragment(html_text) else {
        return html_text.to_string();
    };
    let marked: Vec<HtmlNode> = nodes
        .into_iter()
        .map(|node| match node {
            HtmlNode::Element(mut el) => {
                append_class(&mut el, class);
                HtmlNode::Element(el)
            },
            text => text,
        })
        .collect();
    return html::serialize(&marked);
}

fn append_class(el: &mut Element, class: &str) {
    if let Some((_, value)) = el.attrs.iter_mut().find(|(name, _)| name == "class") {
        value.push(' ');
        value.push_str(class);
        return;
    }
    el.attrs.push(("class".to_string(), class.to_string()));
}

fn strip_or_empty(paragraph: &str) -> Result<String, Error> {
    if paragraph.is_empty() {
        return Ok(String::new());
    }
    return linenumbering::strip_line_numbers(paragraph);
}

#[cfg(test)]
mod tests {
    use super::{diff_fragment, diff_paragraphs, extract_range_by_line_numbers, replace_lines};
    use crate::error::Error;
    use crate::linenumbering::insert_line_numbers;
    use crate::types::LineRange;

    fn range(from: u32, to: u32) -> LineRange {
        LineRange { from, to }
    }

    #[test]
    fn extracts_a_whole_first_line() {
        let numbered =
            insert_line_numbers("<p>first paragraph</p><p>second paragraph</p>", 80, None)
                .unwrap();
        let extracted = extract_range_by_line_numbers(&numbered, range(1, 2)).unwrap();
        assert_eq!(extracted.html, "<p>first paragraph</p>");
        assert_eq!(extracted.ancestor_tags, vec!["p".to_string()]);
    }

    #[test]
    fn extraction_reopens_list_context_mid_item() {
        // "aaa bbb" wraps after 4 units, so line 2 starts mid-<li>.
        let numbered = insert_line_numbers("<ul><li>aaa bbb</li></ul>", 4, None).unwrap();
        let extracted = extract_range_by_line_numbers(&numbered, range(2, 3)).unwrap();
        assert_eq!(extracted.html, "<ul><li>bbb</li></ul>");
        assert_eq!(
            extracted.ancestor_tags,
            vec!["ul".to_string(), "li".to_string()]
        );
        assert_eq!(extracted.outer_context_html, "<ul><li>");
        assert_eq!(extracted.inner_context_html, "</li></ul>");
    }

    #[test]
    fn inverted_range_is_invalid() {
        let numbered = insert_line_numbers("<p>some text</p>", 80, None).unwrap();
        let result = extract_range_by_line_numbers(&numbered, range(50, 10));
        assert!(matches!(result, Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn range_past_last_line_is_invalid() {
        let numbered = insert_line_numbers("<p>one</p><p>two</p>", 80, None).unwrap();
        let result = extract_range_by_line_numbers(&numbered, range(2, 5));
        assert!(matches!(
            result,
            Err(Error::InvalidRange { last_line: 2, .. })
        ));
    }

    #[test]
    fn unnumbered_input_has_no_resolvable_lines() {
        let result = extract_range_by_line_numbers("<p>plain</p>", range(1, 2));
        assert!(matches!(result, Err(Error::InvalidRange { last_line: 0, .. })));
    }

    #[test]
    fn replaces_a_first_line_paragraph() {
        let numbered = insert_line_numbers(
            "<p>Hello world, this is line one</p><p>Second paragraph here</p>",
            80,
            None,
        )
        .unwrap();
        let replaced = replace_lines(&numbered, "<p>Hello world</p>", range(1, 2)).unwrap();
        assert_eq!(
            replaced,
            "<p>Hello world</p><p>Second paragraph here</p>"
        );
    }

    #[test]
    fn replaces_a_trailing_range_to_document_end() {
        let numbered = insert_line_numbers("<p>one</p><p>two</p><p>three</p>", 80, None).unwrap();
        let replaced = replace_lines(&numbered, "<p>tail</p>", range(2, 4)).unwrap();
        assert_eq!(replaced, "<p>one</p><p>tail</p>");
    }

    #[test]
    fn replaces_a_wrapped_line_inside_a_paragraph() {
        let numbered = insert_line_numbers("<p>abcdef</p>", 3, None).unwrap();
        let replaced = replace_lines(&numbered, "<p>XY</p>", range(2, 3)).unwrap();
        assert_eq!(replaced, "<p>abc</p><p>XY</p>");
    }

    #[test]
    fn adjacent_replacements_splice_cleanly() {
        let numbered = insert_line_numbers("<p>one</p><p>two</p><p>three</p>", 80, None).unwrap();
        let replaced = super::splice_ranges(
            &numbered,
            &[
                (range(1, 2), "<p>ONE</p>".to_string()),
                (range(2, 3), "<p>TWO</p>".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(replaced, "<p>ONE</p><p>TWO</p><p>three</p>");
    }

    #[test]
    fn diffing_identical_fragments_yields_nothing() {
        let text = "<p>same text</p><p>more text</p>";
        assert!(diff_paragraphs(text, text).unwrap().is_empty());
    }

    #[test]
    fn word_change_renders_as_del_ins_pair() {
        let rendered = diff_fragment("<p>Hello world</p>", "<p>Hello there</p>");
        assert_eq!(
            rendered,
            "<p>Hello <del>world</del><ins>there</ins></p>"
        );
    }

    #[test]
    fn changes_bridged_by_whitespace_merge_into_one_pair() {
        let rendered = diff_fragment("<p>aa bb</p>", "<p>xx yy</p>");
        assert_eq!(rendered, "<p><del>aa bb</del><ins>xx yy</ins></p>");
    }

    #[test]
    fn structural_change_falls_back_to_block_marking() {
        let rendered = diff_fragment("<p><em>one two</em></p>", "<p>one <em>two</em></p>");
        assert!(rendered.contains("class=\"delete\""));
        assert!(rendered.contains("class=\"insert\""));
        assert!(!rendered.contains("<del><em>"));
    }

    #[test]
    fn paragraph_diff_carries_original_line_numbers_and_context() {
        let numbered = insert_line_numbers(
            "<p>first paragraph</p><p>second paragraph</p><p>third paragraph</p>",
            80,
            None,
        )
        .unwrap();
        let changed = "<p>first paragraph</p><p>rewritten paragraph</p><p>third paragraph</p>";
        let diffs = diff_paragraphs(&numbered, changed).unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0];
        assert_eq!(diff.paragraph_no, 1);
        assert_eq!(diff.diff_line_from, 2);
        assert_eq!(diff.diff_line_to, 3);
        assert!(diff.text.contains("<del>second</del><ins>rewritten</ins>"));
        assert!(diff.text_pre.contains("first paragraph"));
        assert!(diff.text_post.contains("third paragraph"));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let first = diff_fragment("<p>a b c d</p>", "<p>a x c y</p>");
        let second = diff_fragment("<p>a b c d</p>", "<p>a x c y</p>");
        assert_eq!(first, second);
    }
}
