//! Strategies reading a single attribute of the candidate

use super::{gate, MatchContext, MatchMode, Matcher};
use crate::node::NodeId;
use crate::types::{FoundType, MatchResult};

/// Scores one attribute of the candidate itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeMatcher {
    name: &'static str,
    attribute: &'static str,
    found_type: FoundType,
    mode: MatchMode,
}

impl AttributeMatcher {
    pub const fn new(
        name: &'static str,
        attribute: &'static str,
        found_type: FoundType,
        mode: MatchMode,
    ) -> Self {
        Self {
            name,
            attribute,
            found_type,
            mode,
        }
    }

    pub const fn attribute(&self) -> &'static str {
        self.attribute
    }
}

pub const BY_ID: AttributeMatcher =
    AttributeMatcher::new("by-id", "id", FoundType::ById, MatchMode::Contains);

pub const BY_NAME: AttributeMatcher =
    AttributeMatcher::new("by-name", "name", FoundType::ByName, MatchMode::Contains);

/// Caption of submit, reset and button inputs
pub const BY_VALUE: AttributeMatcher =
    AttributeMatcher::new("by-value", "value", FoundType::ByLabel, MatchMode::Contains);

/// `label` of option groups and options
pub const BY_LABEL_ATTRIBUTE: AttributeMatcher = AttributeMatcher::new(
    "by-label-attribute",
    "label",
    FoundType::ByLabel,
    MatchMode::Contains,
);

pub const BY_TITLE_ATTRIBUTE: AttributeMatcher = AttributeMatcher::new(
    "by-title-attribute",
    "title",
    FoundType::ByTitleAttribute,
    MatchMode::Contains,
);

pub const BY_ARIA_LABEL: AttributeMatcher = AttributeMatcher::new(
    "by-aria-label",
    "aria-label",
    FoundType::ByAriaLabel,
    MatchMode::Contains,
);

pub const BY_DATA_TESTID: AttributeMatcher =
    AttributeMatcher::new("by-data-testid", "data-testid", FoundType::ById, MatchMode::Exact);

impl Matcher for AttributeMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        ctx.score(
            node,
            spot,
            ctx.tree.attribute(node, self.attribute),
            self.found_type,
            self.mode,
        )
        .into_iter()
        .collect()
    }
}

/// `placeholder` of fields that have no value yet
#[derive(Debug, Clone, Copy, Default)]
pub struct ByPlaceholder;

impl Matcher for ByPlaceholder {
    fn name(&self) -> &'static str {
        "by-placeholder"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        let has_value = ctx
            .tree
            .attribute(node, "value")
            .map_or(false, |value| !value.is_empty());
        if has_value {
            return Vec::new();
        }
        ctx.score(
            node,
            spot,
            ctx.tree.attribute(node, "placeholder"),
            FoundType::ByPlaceholder,
            MatchMode::Contains,
        )
        .into_iter()
        .collect()
    }
}
