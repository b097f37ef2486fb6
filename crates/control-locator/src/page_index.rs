//! Linear text projection of a page
//!
//! The index walks the tree once in pre-order and records, for every node, the
//! character span it covers in the normalized page text. A second projection
//! leaves out the content of form controls; html labels are matched against it.

use crate::node::{InputKind, NodeCategory, NodeId, PageTree};
use crate::pattern::SearchPattern;
use crate::types::{saturating_offset, FindSpot, PathSpot};
use std::collections::HashMap;
use tracing::debug;

fn is_blank(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{a0}'
}

/// Text buffer collapsing every whitespace run into one blank
#[derive(Debug, Default, Clone)]
struct NormalizedText {
    content: Vec<char>,
    disabled: usize,
}

impl NormalizedText {
    fn append(&mut self, text: &str) {
        if self.disabled > 0 || text.is_empty() {
            return;
        }
        let mut blank = self.content.last().map_or(true, |last| is_blank(*last));
        for ch in text.chars() {
            if is_blank(ch) {
                if !blank {
                    blank = true;
                    self.content.push(' ');
                }
            } else {
                blank = false;
                self.content.push(ch);
            }
        }
    }

    /// Nested disable/enable pairs are counted
    fn disable(&mut self) {
        self.disabled += 1;
    }

    fn enable(&mut self) {
        self.disabled = self.disabled.saturating_sub(1);
    }

    /// Length without a trailing blank
    fn len(&self) -> usize {
        match self.content.last() {
            Some(last) if is_blank(*last) => self.content.len() - 1,
            _ => self.content.len(),
        }
    }

    /// Characters `[start, end)` with one blank trimmed at each side
    fn substring(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        if start >= end {
            return String::new();
        }
        let mut start = start;
        let mut end = end;
        if is_blank(self.content[end - 1]) {
            end -= 1;
        }
        if start < end && is_blank(self.content[start]) {
            start += 1;
        }
        if start >= end {
            return String::new();
        }
        self.content[start..end].iter().collect()
    }

    fn to_text(&self) -> String {
        self.substring(0, self.len())
    }
}

#[derive(Debug, Clone)]
struct NodeInfo {
    order: usize,
    span: FindSpot,
    span_without_form_controls: FindSpot,
    hierarchy: String,
    category: NodeCategory,
    form: Option<NodeId>,
}

/// Position-indexed text of a page snapshot
#[derive(Debug, Clone)]
pub struct PageTextIndex {
    text: NormalizedText,
    text_without_form_controls: NormalizedText,
    normalized: String,
    nodes: Vec<NodeId>,
    info: HashMap<NodeId, NodeInfo>,
    visible_elements: Vec<NodeId>,
    visible_elements_bottom_up: Vec<NodeId>,
}

impl PageTextIndex {
    /// Walk `tree` from its root
    pub fn build<T: PageTree + ?Sized>(tree: &T) -> PageTextIndex {
        let mut builder = IndexBuilder {
            tree,
            text: NormalizedText::default(),
            text_without_form_controls: NormalizedText::default(),
            nodes: Vec::new(),
            info: HashMap::new(),
            visible_elements: Vec::new(),
            visible_elements_bottom_up: Vec::new(),
            frame_hosts: HashMap::new(),
        };
        builder.parse_node(tree.root());

        let normalized = builder.text.to_text();
        debug!(
            "Page index built: {} nodes, {} visible elements, {} chars",
            builder.nodes.len(),
            builder.visible_elements.len(),
            builder.text.len()
        );

        PageTextIndex {
            text: builder.text,
            text_without_form_controls: builder.text_without_form_controls,
            normalized,
            nodes: builder.nodes,
            info: builder.info,
            visible_elements: builder.visible_elements,
            visible_elements_bottom_up: builder.visible_elements_bottom_up,
        }
    }

    /// Normalized page text
    pub fn text(&self) -> &str {
        &self.normalized
    }

    pub fn text_without_form_controls(&self) -> String {
        self.text_without_form_controls.to_text()
    }

    /// Length of the normalized text in characters
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible elements in document order
    pub fn visible_elements(&self) -> &[NodeId] {
        &self.visible_elements
    }

    /// Visible elements, children before their parents
    pub fn visible_elements_bottom_up(&self) -> &[NodeId] {
        &self.visible_elements_bottom_up
    }

    /// Every indexed node in pre-order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.info.contains_key(&node)
    }

    pub fn first_occurrence(&self, pattern: &SearchPattern) -> Option<FindSpot> {
        pattern.first_occurrence_in(&self.normalized, 0)
    }

    pub fn first_occurrence_from(&self, pattern: &SearchPattern, pos: usize) -> Option<FindSpot> {
        pattern.first_occurrence_in(&self.normalized, pos)
    }

    /// Where the path prefix occurs first; a missing or match-all prefix
    /// leaves the search unconstrained
    pub fn path_spot(&self, pattern: Option<&SearchPattern>) -> PathSpot {
        match pattern {
            None => PathSpot::Unconstrained,
            Some(pattern) if pattern.is_match_all() => PathSpot::Unconstrained,
            Some(pattern) => match self.first_occurrence(pattern) {
                Some(spot) => PathSpot::Found(spot),
                None => PathSpot::NotFound,
            },
        }
    }

    pub fn position(&self, node: NodeId) -> Option<FindSpot> {
        self.info.get(&node).map(|info| info.span)
    }

    /// Pre-order number of the node
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        self.info.get(&node).map(|info| info.order)
    }

    /// Pre-order numbers from the document down to the node, joined by `>`
    pub fn hierarchy(&self, node: NodeId) -> Option<&str> {
        self.info.get(&node).map(|info| info.hierarchy.as_str())
    }

    pub fn text_before(&self, node: NodeId) -> Option<String> {
        let span = self.position(node)?;
        Some(self.text.substring(0, span.start as usize))
    }

    pub fn text_before_including(&self, node: NodeId) -> Option<String> {
        let span = self.position(node)?;
        Some(self.text.substring(0, span.end as usize))
    }

    pub fn as_text(&self, node: NodeId) -> Option<String> {
        let span = self.position(node)?;
        Some(self.text.substring(span.start as usize, span.end as usize))
    }

    pub fn as_text_without_form_controls(&self, node: NodeId) -> Option<String> {
        let span = self.info.get(&node)?.span_without_form_controls;
        Some(
            self.text_without_form_controls
                .substring(span.start as usize, span.end as usize),
        )
    }

    /// Text in front of a control that labels it
    ///
    /// Walks backwards up to the body, the previous visible form control
    /// (when some text remains) or an element of another form. The result
    /// never starts before `from`.
    pub fn label_text_before(&self, node: NodeId, from: usize) -> Option<String> {
        let info = self.info.get(&node)?;
        let node_start = info.span.start as usize;
        let current_form = info.form;
        let mut start = 0usize;

        for previous in self.nodes[..info.order].iter().rev() {
            let Some(previous_info) = self.info.get(previous) else {
                continue;
            };
            if previous_info.category == NodeCategory::Body {
                start = previous_info.span.start as usize;
                break;
            }
            if previous_info.category.is_submittable() && !previous_info.category.is_hidden_input()
            {
                start = previous_info.span.end as usize;
                let text = self.text.substring(start.max(from), node_start);
                if !text.is_empty() {
                    return Some(text);
                }
            }
            if previous_info.category.is_element() {
                if let Some(form) = previous_info.form {
                    if Some(form) != current_form {
                        start = previous_info.span.end as usize;
                        break;
                    }
                }
            }
        }

        Some(self.text.substring(start.max(from), node_start))
    }

    /// Text behind a control up to the next visible form control or the
    /// boundary of the control's form
    pub fn label_text_after(&self, node: NodeId) -> Option<String> {
        let info = self.info.get(&node)?;
        let current_form = info.form;
        let mut end = self.text.len();

        for next in &self.nodes[info.order + 1..] {
            let Some(next_info) = self.info.get(next) else {
                continue;
            };
            if next_info.category.is_submittable() && !next_info.category.is_hidden_input() {
                end = next_info.span.start as usize;
                break;
            }
            if next_info.category.is_element()
                && current_form.is_some()
                && next_info.form != current_form
            {
                end = next_info.span.start as usize;
                break;
            }
        }

        Some(self.text.substring(info.span.end as usize, end))
    }
}

struct IndexBuilder<'t, T: PageTree + ?Sized> {
    tree: &'t T,
    text: NormalizedText,
    text_without_form_controls: NormalizedText,
    nodes: Vec<NodeId>,
    info: HashMap<NodeId, NodeInfo>,
    visible_elements: Vec<NodeId>,
    visible_elements_bottom_up: Vec<NodeId>,
    /// Frame document -> inline frame element showing it
    frame_hosts: HashMap<NodeId, NodeId>,
}

impl<'t, T: PageTree + ?Sized> IndexBuilder<'t, T> {
    fn append_both(&mut self, text: &str) {
        self.text.append(text);
        self.text_without_form_controls.append(text);
    }

    fn parse_node(&mut self, node: NodeId) {
        if self.info.contains_key(&node) {
            return;
        }
        let order = self.nodes.len();
        self.nodes.push(node);

        let category = self.tree.category(node);
        let structural_parent = self
            .frame_hosts
            .get(&node)
            .copied()
            .or_else(|| self.tree.parent(node));
        let hierarchy = match structural_parent.and_then(|parent| self.info.get(&parent)) {
            Some(parent_info) => format!("{}>{}", parent_info.hierarchy, order),
            None => order.to_string(),
        };
        let form = if category.is_element() {
            self.tree.enclosing_form(node)
        } else {
            None
        };

        let start = saturating_offset(self.text.len());
        let start_without_form_controls = saturating_offset(self.text_without_form_controls.len());
        self.info.insert(
            node,
            NodeInfo {
                order,
                span: FindSpot::new(start, start),
                span_without_form_controls: FindSpot::new(
                    start_without_form_controls,
                    start_without_form_controls,
                ),
                hierarchy,
                category,
                form,
            },
        );

        if self.tree.is_displayed(node) {
            if category.is_element() {
                self.visible_elements.push(node);
            }
            self.append_content(node, category);
            if category.is_element() {
                self.visible_elements_bottom_up.push(node);
            }
        }

        let end = saturating_offset(self.text.len());
        let end_without_form_controls = saturating_offset(self.text_without_form_controls.len());
        if let Some(info) = self.info.get_mut(&node) {
            info.span.end = end;
            info.span_without_form_controls.end = end_without_form_controls;
        }
    }

    fn parse_children(&mut self, node: NodeId) {
        for child in self.tree.children(node) {
            self.parse_node(child);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> String {
        self.tree
            .attribute(node, name)
            .unwrap_or_default()
            .to_string()
    }

    fn append_content(&mut self, node: NodeId, category: NodeCategory) {
        match category {
            NodeCategory::Input(InputKind::Hidden)
            | NodeCategory::Input(InputKind::File)
            | NodeCategory::Applet
            | NodeCategory::Script
            | NodeCategory::Style
            | NodeCategory::Comment
            | NodeCategory::Head
            | NodeCategory::Title => {}
            NodeCategory::Text => {
                let data = self.tree.text(node).unwrap_or_default().to_string();
                self.append_both(&data);
            }
            NodeCategory::InlineFrame => {
                if let Some(document) = self.tree.frame_content(node) {
                    self.frame_hosts.insert(document, node);
                    self.parse_node(document);
                }
            }
            NodeCategory::LineBreak => self.append_both(" "),
            NodeCategory::Image => {
                let alt = self.attribute(node, "alt");
                self.append_both(&alt);
            }
            NodeCategory::Select => {
                self.text_without_form_controls.disable();
                for descendant in self.tree.descendants(node) {
                    if matches!(
                        self.tree.category(descendant),
                        NodeCategory::Option | NodeCategory::OptionGroup
                    ) {
                        self.append_both(" ");
                        self.parse_node(descendant);
                    }
                }
                self.text_without_form_controls.enable();
                self.append_both(" ");
            }
            NodeCategory::OptionGroup => {
                let label = self.attribute(node, "label");
                self.text.append(&label);
            }
            NodeCategory::Legend => {
                self.parse_children(node);
                self.append_both(" ");
            }
            NodeCategory::Input(kind) if kind.is_button_like() => {
                let value = self.attribute(node, "value");
                self.text.append(&value);
                self.text.append(" ");
            }
            NodeCategory::Input(InputKind::Checkbox)
            | NodeCategory::Input(InputKind::Radio)
            | NodeCategory::Button => {
                self.text_without_form_controls.disable();
                self.parse_children(node);
                self.text_without_form_controls.enable();
                self.append_both(" ");
            }
            NodeCategory::Input(InputKind::Image) => {
                let alt = self.attribute(node, "alt");
                self.text.append(&alt);
            }
            NodeCategory::Input(_) => {
                let value = self.attribute(node, "value");
                self.text.append(&value);
            }
            NodeCategory::TextArea => {
                self.text_without_form_controls.disable();
                self.parse_children(node);
                self.text_without_form_controls.enable();
            }
            NodeCategory::OrderedList => self.append_ordered_list(node),
            _ => {
                let block = category.is_block();
                if block {
                    self.append_both(" ");
                }
                self.parse_children(node);
                if block {
                    self.append_both(" ");
                }
            }
        }
    }

    fn append_ordered_list(&mut self, node: NodeId) {
        self.append_both(" ");
        let mut number = 1;
        for item in self.tree.children(node) {
            if self.tree.category(item) == NodeCategory::ListItem {
                let start = saturating_offset(self.text.len());
                let start_without_form_controls = saturating_offset(self.text_without_form_controls.len());
                self.append_both(&format!("{}. ", number));
                number += 1;

                self.parse_node(item);

                if let Some(info) = self.info.get_mut(&item) {
                    info.span.start = start;
                    info.span_without_form_controls.start = start_without_form_controls;
                }
            } else {
                self.parse_node(item);
            }
        }
        self.append_both(" ");
    }
}
