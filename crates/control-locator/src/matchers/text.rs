//! Strategies reading page text

use super::{gate, MatchContext, MatchMode, Matcher};
use crate::node::NodeId;
use crate::types::{FoundType, MatchResult};

/// Visible text of the candidate (anchors, buttons)
#[derive(Debug, Clone, Copy, Default)]
pub struct ByText;

impl Matcher for ByText {
    fn name(&self) -> &'static str {
        "by-text"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        let text = ctx.index.as_text(node);
        ctx.score(node, spot, text.as_deref(), FoundType::ByLabel, MatchMode::Contains)
            .into_iter()
            .collect()
    }
}

/// Whole locator (path and last node) found in the text in front of the
/// candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct ByWholeTextBefore;

impl Matcher for ByWholeTextBefore {
    fn name(&self) -> &'static str {
        "by-whole-text-before"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        let Some(text_before) = ctx.index.text_before(node) else {
            return Vec::new();
        };
        if text_before.is_empty() {
            return Vec::new();
        }
        let Some(deviation) = MatchMode::Contains.deviation(ctx.whole_pattern, &text_before) else {
            return Vec::new();
        };
        vec![MatchResult::new(
            node,
            FoundType::ByText,
            deviation,
            ctx.distance(&text_before),
            spot.start,
        )]
    }
}
