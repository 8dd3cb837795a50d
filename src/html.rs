//! Strict parser and canonical serializer for the safe HTML subset used in
//! motion texts.
//!
//! Motion bodies are authored through a controlled editor, so the tag set is
//! closed: anything outside [`SAFE_TAGS`], a mismatched closing tag, or a
//! truncated fragment is a data-integrity bug upstream and fails with
//! [`Error::MalformedHtml`] instead of producing corrupt output. Text content
//! is kept raw (entities stay un-decoded), which makes
//! serialize-after-parse byte-identical for canonical input: lowercase tags,
//! double-quoted attributes, `<br>` for the void element.

use std::fmt::Write as _;

use crate::error::Error;

/// Tags the engine accepts. Anything else fails parsing.
pub const SAFE_TAGS: &[&str] = &[
    "a", "br", "del", "em", "ins", "li", "ol", "p", "span", "strong", "u", "ul",
];

/// Tags that force a line break before and after their content.
pub const BLOCK_TAGS: &[&str] = &["li", "ol", "p", "ul"];

/// An element in the parsed fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Attributes in source order, values raw.
    pub attrs: Vec<(String, String)>,
    /// Child nodes; always empty for `<br>`.
    pub children: Vec<HtmlNode>,
    /// Lowercased tag name.
    pub tag: String,
}

impl Element {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        return self
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str());
    }

    /// Whether the `class` attribute contains the given class.
    pub fn has_class(&self, class: &str) -> bool {
        return self
            .attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class));
    }

    /// Whether this element starts and ends a line of its own.
    pub fn is_block(&self) -> bool {
        return BLOCK_TAGS.contains(&self.tag.as_str());
    }
}

/// One node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    /// An element with its subtree.
    Element(Element),
    /// Raw text, entities un-decoded.
    Text(String),
}

/// Parse a fragment of safe-subset HTML into a node tree.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` for tags outside the safe subset,
/// mismatched or stray closing tags, unterminated tags or attribute values,
/// and fragments that end with elements still open.
pub fn parse_fragment(html_text: &str) -> Result<Vec<HtmlNode>, Error> {
    let mut parser = FragmentParser {
        input: html_text,
        pos: 0,
    };
    parser.parse_nodes(None)
}

/// Serialize a node tree back to canonical markup.
pub fn serialize(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes);
    out
}

/// The opening-tag markup for an element, e.g. `<span class="x">`.
pub(crate) fn open_tag_markup(el: &Element) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        let _ = write!(out, " {name}=\"{value}\"");
    }
    out.push('>');
    out
}

/// The closing-tag markup for an element, e.g. `</span>`.
pub(crate) fn close_tag_markup(el: &Element) -> String {
    return format!("</{}>", el.tag);
}

/// Recursively merge adjacent text nodes, restoring text that earlier
/// processing split apart.
pub(crate) fn merge_adjacent_text(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    let mut out: Vec<HtmlNode> = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => {
                if let Some(HtmlNode::Text(prev)) = out.last_mut() {
                    prev.push_str(&text);
                } else {
                    out.push(HtmlNode::Text(text));
                }
            },
            HtmlNode::Element(el) => {
                out.push(HtmlNode::Element(Element {
                    attrs: el.attrs,
                    children: merge_adjacent_text(el.children),
                    tag: el.tag,
                }));
            },
        }
    }
    out
}

/// Decompose a fragment into paragraphs. Each top-level block element is one
/// paragraph; runs of top-level inline content group into one paragraph;
/// whitespace-only text between blocks is dropped.
///
/// # Errors
///
/// Returns `Error::MalformedHtml` if the fragment does not parse.
pub fn split_paragraphs(html_text: &str) -> Result<Vec<String>, Error> {
    let nodes = parse_fragment(html_text)?;
    let mut paragraphs = Vec::new();
    let mut inline_run: Vec<HtmlNode> = Vec::new();

    for node in nodes {
        let is_block = matches!(&node, HtmlNode::Element(el) if el.is_block());
        let is_blank = matches!(&node, HtmlNode::Text(t) if t.trim().is_empty());
        if is_block {
            flush_inline_run(&mut inline_run, &mut paragraphs);
            paragraphs.push(serialize(std::slice::from_ref(&node)));
        } else if is_blank && inline_run.is_empty() {
            // Formatting whitespace between blocks, not content.
        } else {
            inline_run.push(node);
        }
    }
    flush_inline_run(&mut inline_run, &mut paragraphs);

    Ok(paragraphs)
}

fn flush_inline_run(run: &mut Vec<HtmlNode>, paragraphs: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    let nodes = std::mem::take(run);
    paragraphs.push(serialize(&nodes));
}

fn write_nodes(out: &mut String, nodes: &[HtmlNode]) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(el) => {
                out.push_str(&open_tag_markup(el));
                if el.tag != "br" {
                    write_nodes(out, &el.children);
                    out.push_str(&close_tag_markup(el));
                }
            },
        }
    }
}

struct FragmentParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FragmentParser<'a> {
    // The slice borrows the input, not the parser, so the cursor can move
    // while a slice taken earlier is still in use.
    fn rest(&self) -> &'a str {
        return &self.input[self.pos..];
    }

    fn error(&self, reason: String) -> Error {
        return Error::MalformedHtml { reason };
    }

    /// Parse sibling nodes until end of input (top level) or the closing tag
    /// of `enclosing`, which is consumed.
    fn parse_nodes(&mut self, enclosing: Option<&str>) -> Result<Vec<HtmlNode>, Error> {
        let mut nodes = Vec::new();
        loop {
            if self.rest().is_empty() {
                let Some(open) = enclosing else {
                    return Ok(nodes);
                };
                return Err(self.error(format!("unclosed <{open}> at end of input")));
            }
            if self.rest().starts_with("</") {
                let name = self.parse_closing_tag()?;
                let Some(open) = enclosing else {
                    return Err(self.error(format!("stray closing tag </{name}>")));
                };
                if name != open {
                    return Err(self.error(format!(
                        "mismatched closing tag: expected </{open}>, found </{name}>"
                    )));
                }
                return Ok(nodes);
            }
            if self.rest().starts_with('<') {
                nodes.push(HtmlNode::Element(self.parse_element()?));
            } else {
                nodes.push(HtmlNode::Text(self.parse_text()));
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element, Error> {
        self.pos += 1; // consume '<'
        let tag = self.parse_tag_name()?;
        if !SAFE_TAGS.contains(&tag.as_str()) {
            return Err(self.error(format!("unsupported tag <{tag}>")));
        }
        let (attrs, self_closed) = self.parse_attrs()?;
        if self_closed || tag == "br" {
            return Ok(Element {
                attrs,
                children: Vec::new(),
                tag,
            });
        }
        let children = self.parse_nodes(Some(&tag))?;
        Ok(Element {
            attrs,
            children,
            tag,
        })
    }

    /// Text runs until the next tag. Entities stay raw.
    fn parse_text(&mut self) -> String {
        let rest = self.rest();
        let end = rest.find('<').unwrap_or(rest.len());
        self.pos += end;
        return rest[..end].to_string();
    }

    fn parse_closing_tag(&mut self) -> Result<String, Error> {
        self.pos += 2; // consume "</"
        let name = self.parse_tag_name()?;
        self.skip_whitespace();
        if !self.rest().starts_with('>') {
            return Err(self.error(format!("malformed closing tag </{name}")));
        }
        self.pos += 1;
        Ok(name)
    }

    fn parse_tag_name(&mut self) -> Result<String, Error> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("bare '<' in text content".to_string()));
        }
        self.pos += end;
        return Ok(rest[..end].to_ascii_lowercase());
    }

    /// Parse attributes up to and including the tag terminator. Returns the
    /// attributes and whether the tag was self-closed (`/>`).
    fn parse_attrs(&mut self) -> Result<(Vec<(String, String)>, bool), Error> {
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("/>") {
                self.pos += 2;
                return Ok((attrs, true));
            }
            if self.rest().starts_with('>') {
                self.pos += 1;
                return Ok((attrs, false));
            }
            if self.rest().is_empty() {
                return Err(self.error("unterminated tag at end of input".to_string()));
            }
            let name = self.parse_attr_name()?;
            self.skip_whitespace();
            if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                let value = self.parse_attr_value()?;
                attrs.push((name, value));
            } else {
                // Bare attribute, normalized to an empty value.
                attrs.push((name, String::new()));
            }
        }
    }

    fn parse_attr_name(&mut self) -> Result<String, Error> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        if end == 0 {
            let context: String = rest.chars().take(16).collect();
            return Err(self.error(format!("malformed attribute at `{context}`")));
        }
        self.pos += end;
        return Ok(rest[..end].to_ascii_lowercase());
    }

    fn parse_attr_value(&mut self) -> Result<String, Error> {
        let rest = self.rest();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            return Err(self.error("attribute value must be quoted".to_string()));
        };
        let body = &rest[1..];
        let Some(end) = body.find(quote) else {
            return Err(self.error("unterminated attribute value".to_string()));
        };
        self.pos += end + 2;
        return Ok(body[..end].to_string());
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }
}
