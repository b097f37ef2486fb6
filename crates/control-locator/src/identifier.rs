//! Identifier registry
//!
//! An identifier knows one family of controls: which nodes it looks at and
//! which matchers decide whether such a node is meant by a locator. The
//! registry maps every [`ControlCategory`] to its identifiers.

use crate::matchers::*;
use crate::node::{InputKind, NodeCategory, NodeId, PageTree};
use crate::pattern::SearchPattern;
use crate::types::{saturating_offset, FoundType, MatchResult, PathSpot};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// What the caller wants to do with the located control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCategory {
    Clickable,
    Settable,
    Selectable,
    Deselectable,
    Other,
}

impl ControlCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ControlCategory::Clickable => "clickable",
            ControlCategory::Settable => "settable",
            ControlCategory::Selectable => "selectable",
            ControlCategory::Deselectable => "deselectable",
            ControlCategory::Other => "other",
        }
    }

    /// Identifiers registered for the category
    pub fn identifiers(&self) -> &'static [&'static dyn ControlIdentifier] {
        match self {
            ControlCategory::Clickable => CLICKABLE,
            ControlCategory::Settable => SETTABLE,
            ControlCategory::Selectable => SELECTABLE,
            ControlCategory::Deselectable => DESELECTABLE,
            ControlCategory::Other => OTHER,
        }
    }
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One family of controls
pub trait ControlIdentifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `node` is worth running [`identify`](Self::identify) on
    fn supports(&self, tree: &dyn PageTree, node: NodeId) -> bool;

    /// Results for `node`; result nodes may differ from `node` (labels)
    fn identify(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult>;
}

/// Which part of the path has to precede the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathScope {
    Whole,
    /// Without the last path node, which names the enclosing control
    Enclosing,
}

/// Identifier driven by a fixed list of matchers
pub struct MatcherIdentifier {
    name: &'static str,
    target: fn(NodeCategory) -> bool,
    matchers: &'static [&'static dyn Matcher],
    label: Option<ByHtmlLabel>,
    table: Option<ByTableCoordinates>,
    scope: PathScope,
}

impl MatcherIdentifier {
    const fn new(
        name: &'static str,
        target: fn(NodeCategory) -> bool,
        matchers: &'static [&'static dyn Matcher],
    ) -> Self {
        Self {
            name,
            target,
            matchers,
            label: None,
            table: Some(ByTableCoordinates::new(target)),
            scope: PathScope::Whole,
        }
    }

    /// Also identify the controls through `<label>` elements
    const fn with_html_label(mut self) -> Self {
        self.label = Some(ByHtmlLabel::new(self.target));
        self
    }

    const fn scoped_to_enclosing(mut self) -> Self {
        self.scope = PathScope::Enclosing;
        self.table = None;
        self
    }
}

impl ControlIdentifier for MatcherIdentifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, tree: &dyn PageTree, node: NodeId) -> bool {
        let category = tree.category(node);
        (self.target)(category) || (self.label.is_some() && category == NodeCategory::Label)
    }

    fn identify(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let is_target = (self.target)(ctx.tree.category(node));

        if ctx.wpath.last_node().is_none() {
            return match (&self.table, ctx.wpath.has_table_coordinates() && is_target) {
                (Some(table), true) => table.matches(ctx, node),
                _ => Vec::new(),
            };
        }

        let mut scoped = *ctx;
        if self.scope == PathScope::Enclosing {
            let nodes = ctx.wpath.path_nodes();
            scoped.path_spot = match nodes.len() {
                0 | 1 => PathSpot::Unconstrained,
                len => match SearchPattern::from_fragments(&nodes[..len - 1]) {
                    Ok(pattern) => ctx.index.path_spot(Some(&pattern)),
                    Err(_) => return Vec::new(),
                },
            };
        }

        let mut results: Vec<MatchResult> = if is_target {
            self.matchers
                .iter()
                .flat_map(|matcher| matcher.matches(&scoped, node))
                .collect()
        } else {
            match &self.label {
                Some(label) => label.matches(&scoped, node),
                None => Vec::new(),
            }
        };

        if ctx.wpath.has_table_coordinates() {
            results.retain(|result| {
                is_in_table_coordinates(
                    ctx.tree,
                    ctx.index,
                    result.node,
                    ctx.table_coordinates,
                    ctx.path_spot,
                )
            });
        }

        if !results.is_empty() {
            trace!("{} identified {} result(s) for {}", self.name, results.len(), node);
        }
        results
    }
}

/// Options addressed through their select: `Select label > Option text`
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionIdentifier;

/// The select a label points to, by `for` or by nesting
fn labelled_select(tree: &dyn PageTree, label: NodeId) -> Option<NodeId> {
    let referenced = match tree.attribute(label, "for").filter(|id| !id.is_empty()) {
        Some(id) => tree.element_by_id(id),
        None => tree.descendants(label).into_iter().find(|node| {
            matches!(
                tree.category(*node),
                NodeCategory::Select | NodeCategory::TextArea | NodeCategory::Button
            ) || matches!(tree.category(*node), NodeCategory::Input(kind) if kind != InputKind::Hidden)
        }),
    }?;
    (tree.category(referenced) == NodeCategory::Select).then_some(referenced)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn char_count(text: &str) -> i32 {
    saturating_offset(text.chars().count())
}

impl OptionIdentifier {
    /// Score the option itself against the last node
    fn identify_option(
        &self,
        ctx: &MatchContext<'_>,
        select: NodeId,
        option: NodeId,
        distance: i32,
        results: &mut Vec<MatchResult>,
    ) {
        let Some(spot) = ctx.index.position(option) else {
            return;
        };
        if !ctx.table_coordinates.is_empty()
            && !is_in_table_coordinates(
                ctx.tree,
                ctx.index,
                select,
                ctx.table_coordinates,
                PathSpot::Unconstrained,
            )
        {
            return;
        }
        let pattern = ctx.pattern;

        if let Some(id) = non_empty(ctx.tree.attribute(option, "id")) {
            if pattern.min_length() > 0 && pattern.matches(id) {
                let deviation = pattern.no_of_surrounding_chars_in(id);
                if deviation >= 0 {
                    results.push(MatchResult::new(option, FoundType::ById, deviation, distance, spot.start));
                }
            }
        }

        let text = ctx.index.as_text(option);
        let label = ctx.tree.attribute(option, "label");
        for value in [text.as_deref(), label].into_iter().flatten() {
            let mut deviation = pattern.no_of_surrounding_chars_in(value);
            if deviation < 0 {
                continue;
            }
            // empty options are valid choices
            if pattern.min_length() == 0 {
                deviation = char_count(value);
            }
            results.push(MatchResult::new(option, FoundType::ByLabel, deviation, distance, spot.start));
        }
    }
}

impl ControlIdentifier for OptionIdentifier {
    fn name(&self) -> &'static str {
        "option"
    }

    fn supports(&self, tree: &dyn PageTree, node: NodeId) -> bool {
        match tree.category(node) {
            NodeCategory::Option => true,
            NodeCategory::Label => labelled_select(tree, node).is_some(),
            _ => false,
        }
    }

    fn identify(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        if ctx.wpath.last_node().is_none() {
            return Vec::new();
        }

        let nodes = ctx.wpath.path_nodes();
        let without_path = nodes.is_empty();
        let select_pattern = match nodes.last() {
            Some(last) => match SearchPattern::compile(last) {
                Ok(pattern) => pattern,
                Err(_) => return Vec::new(),
            },
            None => SearchPattern::match_all(),
        };
        let select_spot = if nodes.len() > 1 {
            match SearchPattern::from_fragments(&nodes[..nodes.len() - 1]) {
                Ok(pattern) => ctx.index.path_spot(Some(&pattern)),
                Err(_) => return Vec::new(),
            }
        } else {
            PathSpot::Unconstrained
        };
        if select_spot.is_not_found() {
            return Vec::new();
        }

        let mut results = Vec::new();
        match ctx.tree.category(node) {
            NodeCategory::Option => {
                let Some(select) = ctx
                    .tree
                    .ancestor_where(node, &|category| category == NodeCategory::Select)
                else {
                    return results;
                };
                let Some(select_position) = ctx.index.position(select) else {
                    return results;
                };
                if !select_spot.allows(select_position.start) {
                    return results;
                }
                let text_before = ctx.index.text_before(select).unwrap_or_default();

                let from = select_spot.end().unwrap_or(0).max(0) as usize;
                if let Some(label) = ctx.index.label_text_before(select, from) {
                    if !label.is_empty() && select_pattern.no_of_surrounding_chars_in(&label) >= 0 {
                        let distance = if without_path {
                            char_count(&text_before)
                        } else {
                            select_pattern.no_of_chars_after_last_occurrence_in(&label)
                        };
                        self.identify_option(ctx, select, node, distance, &mut results);
                    }
                }

                for attribute in ["name", "id"] {
                    let Some(value) = non_empty(ctx.tree.attribute(select, attribute)) else {
                        continue;
                    };
                    if select_pattern.matches(value)
                        && select_pattern.no_of_surrounding_chars_in(value) >= 0
                    {
                        let distance = if without_path { char_count(&text_before) } else { 0 };
                        self.identify_option(ctx, select, node, distance, &mut results);
                    }
                }
            }
            NodeCategory::Label => {
                let Some(label_position) = ctx.index.position(node) else {
                    return results;
                };
                if !select_spot.allows(label_position.start) {
                    return results;
                }
                let text = ctx.index.as_text_without_form_controls(node).unwrap_or_default();
                if select_pattern.no_of_chars_after_last_occurrence_in(&text) < 0 {
                    return results;
                }
                let Some(select) = labelled_select(ctx.tree, node) else {
                    return results;
                };
                if !ctx.tree.is_displayed(select) {
                    return results;
                }
                let text_before = ctx.index.text_before(select).unwrap_or_default();
                let distance = if without_path {
                    char_count(&text_before)
                } else {
                    select_pattern.no_of_chars_after_last_occurrence_in(&text_before)
                };
                for option in ctx
                    .tree
                    .descendants(select)
                    .into_iter()
                    .filter(|option| ctx.tree.category(*option) == NodeCategory::Option)
                {
                    self.identify_option(ctx, select, option, distance, &mut results);
                }
            }
            _ => {}
        }
        results
    }
}

fn is_anchor(category: NodeCategory) -> bool {
    category == NodeCategory::Anchor
}

fn is_button(category: NodeCategory) -> bool {
    category == NodeCategory::Button
}

fn is_input_button(category: NodeCategory) -> bool {
    matches!(category, NodeCategory::Input(kind) if kind.is_button_like())
}

fn is_input_image(category: NodeCategory) -> bool {
    category == NodeCategory::Input(InputKind::Image)
}

fn is_image(category: NodeCategory) -> bool {
    category == NodeCategory::Image
}

fn is_checkbox(category: NodeCategory) -> bool {
    category == NodeCategory::Input(InputKind::Checkbox)
}

fn is_radio(category: NodeCategory) -> bool {
    category == NodeCategory::Input(InputKind::Radio)
}

fn is_text_input(category: NodeCategory) -> bool {
    matches!(
        category,
        NodeCategory::Input(InputKind::Text | InputKind::Password | InputKind::Other)
    )
}

fn is_text_area(category: NodeCategory) -> bool {
    category == NodeCategory::TextArea
}

fn is_file_input(category: NodeCategory) -> bool {
    category == NodeCategory::Input(InputKind::File)
}

fn is_select(category: NodeCategory) -> bool {
    category == NodeCategory::Select
}

fn is_option_group(category: NodeCategory) -> bool {
    category == NodeCategory::OptionGroup
}

const ANCHOR_MATCHERS: &[&dyn Matcher] = &[
    &ByInnerImage,
    &ByText,
    &BY_TITLE_ATTRIBUTE,
    &BY_ARIA_LABEL,
    &BY_NAME,
    &BY_DATA_TESTID,
    &BY_ID,
];
const BUTTON_MATCHERS: &[&dyn Matcher] = &[&ByInnerImage, &ByText, &BY_NAME, &BY_ID];
const INPUT_BUTTON_MATCHERS: &[&dyn Matcher] = &[&BY_VALUE, &BY_NAME, &BY_DATA_TESTID, &BY_ID];
const IMAGE_MATCHERS: &[&dyn Matcher] = &[
    &BY_IMG_ALT,
    &BY_IMG_SRC,
    &BY_IMG_TITLE,
    &BY_ARIA_LABEL,
    &BY_NAME,
    &BY_DATA_TESTID,
    &BY_ID,
];
const INPUT_IMAGE_MATCHERS: &[&dyn Matcher] =
    &[&BY_IMG_ALT, &BY_IMG_SRC, &BY_TITLE_ATTRIBUTE, &BY_NAME, &BY_ID];
const TOGGLE_MATCHERS: &[&dyn Matcher] =
    &[&ByLabelingTextAfter, &BY_NAME, &BY_TITLE_ATTRIBUTE, &BY_ID];
const FIELD_MATCHERS: &[&dyn Matcher] = &[
    &ByWholeTextBefore,
    &ByLabelingTextBefore,
    &ByPlaceholder,
    &BY_NAME,
    &BY_ID,
];
const SELECT_MATCHERS: &[&dyn Matcher] =
    &[&ByWholeTextBefore, &ByLabelingTextBefore, &BY_NAME, &BY_ID];
const OPTION_GROUP_MATCHERS: &[&dyn Matcher] = &[&BY_LABEL_ATTRIBUTE, &BY_ID];

pub static ANCHOR: MatcherIdentifier = MatcherIdentifier::new("anchor", is_anchor, ANCHOR_MATCHERS);
pub static BUTTON: MatcherIdentifier = MatcherIdentifier::new("button", is_button, BUTTON_MATCHERS);
pub static INPUT_BUTTON: MatcherIdentifier =
    MatcherIdentifier::new("input-button", is_input_button, INPUT_BUTTON_MATCHERS);
pub static INPUT_IMAGE: MatcherIdentifier =
    MatcherIdentifier::new("input-image", is_input_image, INPUT_IMAGE_MATCHERS);
pub static IMAGE: MatcherIdentifier = MatcherIdentifier::new("image", is_image, IMAGE_MATCHERS);
pub static CHECKBOX: MatcherIdentifier =
    MatcherIdentifier::new("checkbox", is_checkbox, TOGGLE_MATCHERS).with_html_label();
pub static RADIO: MatcherIdentifier =
    MatcherIdentifier::new("radio", is_radio, TOGGLE_MATCHERS).with_html_label();
pub static TEXT_INPUT: MatcherIdentifier =
    MatcherIdentifier::new("text-input", is_text_input, FIELD_MATCHERS).with_html_label();
pub static TEXT_AREA: MatcherIdentifier =
    MatcherIdentifier::new("text-area", is_text_area, FIELD_MATCHERS).with_html_label();
pub static FILE_INPUT: MatcherIdentifier =
    MatcherIdentifier::new("file-input", is_file_input, FIELD_MATCHERS).with_html_label();
pub static SELECT: MatcherIdentifier =
    MatcherIdentifier::new("select", is_select, SELECT_MATCHERS).with_html_label();
pub static OPTION_GROUP: MatcherIdentifier =
    MatcherIdentifier::new("option-group", is_option_group, OPTION_GROUP_MATCHERS)
        .scoped_to_enclosing();
pub static OPTION: OptionIdentifier = OptionIdentifier;

static CLICKABLE: &[&dyn ControlIdentifier] = &[
    &ANCHOR,
    &BUTTON,
    &INPUT_BUTTON,
    &INPUT_IMAGE,
    &IMAGE,
    &CHECKBOX,
    &RADIO,
    &OPTION,
];
static SETTABLE: &[&dyn ControlIdentifier] = &[&TEXT_INPUT, &TEXT_AREA, &FILE_INPUT];
static SELECTABLE: &[&dyn ControlIdentifier] = &[&CHECKBOX, &RADIO, &OPTION, &OPTION_GROUP];
static DESELECTABLE: &[&dyn ControlIdentifier] = &[&CHECKBOX, &OPTION, &OPTION_GROUP];
static OTHER: &[&dyn ControlIdentifier] = &[&SELECT];
