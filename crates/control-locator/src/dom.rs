//! In-memory page tree
//!
//! [`StaticPage`] is an arena-backed [`PageTree`] built either node by node
//! through [`PageBuilder`] or from a small, lenient HTML subset with
//! [`StaticPage::from_html`]. Display state is derived from the `hidden`
//! attribute, inline `display:none` / `visibility:hidden` styles and hidden
//! inputs.

use crate::node::{InputKind, NodeCategory, NodeId, PageTree};
use std::collections::HashMap;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug, Clone)]
struct NodeData {
    category: NodeCategory,
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
    frame_content: Option<NodeId>,
}

impl NodeData {
    fn new(category: NodeCategory, tag: &str) -> Self {
        Self {
            category,
            tag: tag.to_string(),
            attributes: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
            hidden: false,
            frame_content: None,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Arena-backed page snapshot
#[derive(Debug, Clone)]
pub struct StaticPage {
    nodes: Vec<NodeData>,
    root: NodeId,
    ids: HashMap<String, NodeId>,
}

impl StaticPage {
    /// Parse markup; a fragment without `<html>` is wrapped into
    /// `<html><head></head><body>...</body></html>`
    pub fn from_html(markup: &str) -> StaticPage {
        let mut builder = PageBuilder::new();
        let root = builder.root();
        builder.parse_into(root, markup);
        builder.build()
    }

    /// Number of nodes in the arena, frame documents included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag name of an element node
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.data(node).map(|data| data.tag.as_str())
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn caption(&self, node: NodeId) -> String {
        let text: String = self
            .descendants(node)
            .into_iter()
            .filter(|child| self.category(*child) == NodeCategory::Text)
            .filter_map(|child| self.text(child))
            .collect::<Vec<_>>()
            .join("");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            return text;
        }
        self.attribute(node, "value")
            .or_else(|| self.attribute(node, "alt"))
            .unwrap_or_default()
            .to_string()
    }
}

impl PageTree for StaticPage {
    fn root(&self) -> NodeId {
        self.root
    }

    fn category(&self, node: NodeId) -> NodeCategory {
        self.data(node)
            .map(|data| data.category)
            .unwrap_or(NodeCategory::Element)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.data(node).and_then(|data| data.attribute(name))
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.data(node).and_then(|data| data.text.as_deref())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.parent)
    }

    fn is_displayed(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.data(id) {
                Some(data) if !data.hidden => current = data.parent,
                _ => return false,
            }
        }
        true
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    fn frame_content(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.frame_content)
    }

    fn describe(&self, node: NodeId) -> String {
        let category = self.category(node);
        let mut description = format!("[{}", category.name());
        if category.is_element() {
            let caption = self.caption(node);
            if !caption.is_empty() {
                description.push_str(&format!(" '{}'", caption));
            }
            if let Some(id) = self.attribute(node, "id") {
                description.push_str(&format!(" (id='{}')", id));
            }
            if let Some(name) = self.attribute(node, "name") {
                description.push_str(&format!(" (name='{}')", name));
            }
        } else if let Some(text) = self.text(node) {
            description.push_str(&format!(" '{}'", text.trim()));
        }
        description.push(']');
        description
    }
}

/// Incremental construction of a [`StaticPage`]
#[derive(Debug, Clone)]
pub struct PageBuilder {
    nodes: Vec<NodeData>,
    root: NodeId,
    ids: HashMap<String, NodeId>,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuilder {
    /// Builder holding only a document node
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeCategory::Document, "#document")],
            root: NodeId(0),
            ids: HashMap::new(),
        }
    }

    /// Builder with `html`, `head` and `body`; returns the body as well
    pub fn with_skeleton() -> (Self, NodeId) {
        let mut builder = Self::new();
        let root = builder.root();
        let html = builder.element(root, "html", &[]);
        builder.element(html, "head", &[]);
        let body = builder.element(html, "body", &[]);
        (builder, body)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, parent: Option<NodeId>, mut data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        data.parent = parent;
        self.nodes.push(data);
        if let Some(parent) = parent {
            if let Some(parent_data) = self.nodes.get_mut(parent.0 as usize) {
                parent_data.children.push(id);
            }
        }
        id
    }

    /// Append an element
    pub fn element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let attributes: Vec<(String, String)> = attributes
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
            .collect();
        self.element_owned(parent, tag, attributes)
    }

    fn element_owned(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let input_type = attributes
            .iter()
            .find(|(key, _)| key == "type")
            .map(|(_, value)| value.as_str());
        let category = NodeCategory::from_tag(&tag, input_type);
        let mut data = NodeData::new(category, &tag);
        data.hidden = is_hidden(category, &attributes);
        let dom_id = attributes
            .iter()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.clone());
        data.attributes = attributes;

        let id = self.push(Some(parent), data);
        if let Some(dom_id) = dom_id {
            self.ids.entry(dom_id).or_insert(id);
        }
        id
    }

    /// Append a text node
    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeCategory::Text, "#text");
        data.text = Some(text.to_string());
        self.push(Some(parent), data)
    }

    pub fn comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeCategory::Comment, "#comment");
        data.text = Some(text.to_string());
        self.push(Some(parent), data)
    }

    /// Create the document shown by an inline frame
    pub fn frame_document(&mut self, frame: NodeId) -> NodeId {
        let document = self.push(None, NodeData::new(NodeCategory::Document, "#document"));
        if let Some(data) = self.nodes.get_mut(frame.0 as usize) {
            data.frame_content = Some(document);
        }
        document
    }

    /// Mark a node as not displayed
    pub fn hide(&mut self, node: NodeId) -> &mut Self {
        if let Some(data) = self.nodes.get_mut(node.0 as usize) {
            data.hidden = true;
        }
        self
    }

    /// Parse markup below `parent`
    pub fn parse_into(&mut self, parent: NodeId, markup: &str) {
        let trimmed = markup.trim_start().to_ascii_lowercase();
        if trimmed.starts_with("<html") || trimmed.starts_with("<!doctype") {
            MarkupParser::new(self, parent).run(markup);
        } else {
            let wrapped = format!("<html><head></head><body>{}</body></html>", markup);
            MarkupParser::new(self, parent).run(&wrapped);
        }
    }

    pub fn build(self) -> StaticPage {
        StaticPage {
            nodes: self.nodes,
            root: self.root,
            ids: self.ids,
        }
    }
}

fn is_hidden(category: NodeCategory, attributes: &[(String, String)]) -> bool {
    if category == NodeCategory::Input(InputKind::Hidden) {
        return true;
    }
    attributes.iter().any(|(key, value)| match key.as_str() {
        "hidden" => true,
        "style" => {
            let style: String = value
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        }
        _ => false,
    })
}

/// Lenient tokenizer for the HTML subset used by fixtures and tools
struct MarkupParser<'b> {
    builder: &'b mut PageBuilder,
    stack: Vec<(String, NodeId)>,
}

impl<'b> MarkupParser<'b> {
    fn new(builder: &'b mut PageBuilder, parent: NodeId) -> Self {
        Self {
            builder,
            stack: vec![(String::new(), parent)],
        }
    }

    fn current(&self) -> NodeId {
        self.stack
            .last()
            .map(|(_, id)| *id)
            .unwrap_or(self.builder.root)
    }

    fn run(mut self, markup: &str) {
        let mut rest = markup;
        while !rest.is_empty() {
            match rest.find('<') {
                Some(0) => rest = self.tag(rest),
                Some(pos) => {
                    self.add_text(&rest[..pos]);
                    rest = &rest[pos..];
                }
                None => {
                    self.add_text(rest);
                    rest = "";
                }
            }
        }
    }

    fn add_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let parent = self.current();
        self.builder.text(parent, &decode_entities(raw));
    }

    /// Consume one construct starting at `<`, returning the remaining input
    fn tag<'m>(&mut self, input: &'m str) -> &'m str {
        if let Some(body) = input.strip_prefix("<!--") {
            let (comment, rest) = match body.find("-->") {
                Some(end) => (&body[..end], &body[end + 3..]),
                None => (body, ""),
            };
            let parent = self.current();
            self.builder.comment(parent, comment);
            return rest;
        }
        if input.starts_with("<!") || input.starts_with("<?") {
            return match input.find('>') {
                Some(end) => &input[end + 1..],
                None => "",
            };
        }

        let Some(end) = find_tag_end(input) else {
            self.add_text(input);
            return "";
        };
        let inner = &input[1..end];
        let rest = &input[end + 1..];

        if let Some(closing) = inner.strip_prefix('/') {
            self.close(&closing.trim().to_ascii_lowercase());
            return rest;
        }

        let self_closing = inner.trim_end().ends_with('/');
        let inner = inner.trim_end().trim_end_matches('/');
        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        let name = inner[..name_end].to_ascii_lowercase();
        if name.is_empty() {
            self.add_text("<");
            return &input[1..];
        }
        let attributes = parse_attributes(&inner[name_end..]);
        self.close_implied(&name);

        let parent = self.current();
        let srcdoc = attributes
            .iter()
            .find(|(key, _)| key == "srcdoc")
            .map(|(_, value)| value.clone());
        let node = self.builder.element_owned(parent, &name, attributes);

        if let Some(srcdoc) = srcdoc {
            let document = self.builder.frame_document(node);
            self.builder.parse_into(document, &srcdoc);
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let closing = format!("</{}", name);
            let lower = rest.to_ascii_lowercase();
            let (content, remaining) = match lower.find(&closing) {
                Some(pos) => {
                    let after = &rest[pos..];
                    let skip = after.find('>').map(|p| p + 1).unwrap_or(after.len());
                    (&rest[..pos], &after[skip..])
                }
                None => (rest, ""),
            };
            if !content.is_empty() {
                self.builder.text(node, &decode_entities(content));
            }
            return remaining;
        }

        if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push((name, node));
        }
        rest
    }

    fn close(&mut self, name: &str) {
        if let Some(pos) = self.stack.iter().rposition(|(tag, _)| tag == name) {
            if pos > 0 {
                self.stack.truncate(pos);
            }
        }
    }

    /// Elements closed implicitly by the start of `name`
    fn close_implied(&mut self, name: &str) {
        let closes: &[&str] = match name {
            "option" => &["option"],
            "optgroup" => &["option", "optgroup"],
            "li" => &["li"],
            "td" | "th" => &["td", "th"],
            "tr" => &["td", "th", "tr"],
            "p" | "div" | "table" | "ul" | "ol" => &["p"],
            _ => &[],
        };
        while let Some((top, _)) = self.stack.last() {
            if self.stack.len() > 1 && closes.contains(&top.as_str()) {
                self.stack.pop();
            } else {
                break;
            }
        }
    }
}

/// Position of the `>` ending the tag, skipping quoted attribute values
fn find_tag_end(input: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (pos, ch) in input.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => return Some(pos),
            _ => {}
        }
    }
    None
}

fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        let start = pos;
        while pos < chars.len() && !chars[pos].is_whitespace() && chars[pos] != '=' {
            pos += 1;
        }
        if start == pos {
            pos += 1;
            continue;
        }
        let key: String = chars[start..pos].iter().collect::<String>().to_ascii_lowercase();
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if pos < chars.len() && chars[pos] == '=' {
            pos += 1;
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos < chars.len() && (chars[pos] == '"' || chars[pos] == '\'') {
                let quote = chars[pos];
                pos += 1;
                let value_start = pos;
                while pos < chars.len() && chars[pos] != quote {
                    pos += 1;
                }
                value = chars[value_start..pos].iter().collect();
                pos += 1;
            } else {
                let value_start = pos;
                while pos < chars.len() && !chars[pos].is_whitespace() {
                    pos += 1;
                }
                value = chars[value_start..pos].iter().collect();
            }
        }
        attributes.push((key, decode_entities(&value)));
    }
    attributes
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut result = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate.find(';').and_then(|end| {
            let entity = &candidate[1..end];
            let ch = match entity {
                "nbsp" => Some('\u{a0}'),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((ch, end)) => {
                result.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                result.push('&');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}
