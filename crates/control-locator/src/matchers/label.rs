//! Strategies based on text that labels a control

use super::{gate, MatchContext, MatchMode, Matcher};
use crate::node::{NodeCategory, NodeId};
use crate::types::{FoundType, MatchResult, PathSpot};
use tracing::trace;

/// `<label>` elements pointing at a control, by `for` or by nesting
#[derive(Debug, Clone, Copy)]
pub struct ByHtmlLabel {
    target: fn(NodeCategory) -> bool,
}

impl ByHtmlLabel {
    /// Labels for controls whose category satisfies `target`
    pub const fn new(target: fn(NodeCategory) -> bool) -> Self {
        Self { target }
    }

    fn labelled(&self, ctx: &MatchContext<'_>, label: NodeId) -> Vec<NodeId> {
        let mut targets = Vec::new();
        if let Some(for_id) = ctx.tree.attribute(label, "for").filter(|id| !id.is_empty()) {
            if let Some(element) = ctx.tree.element_by_id(for_id) {
                targets.push(element);
            }
        }
        targets.extend(ctx.tree.descendants(label));
        targets
            .into_iter()
            .filter(|node| (self.target)(ctx.tree.category(*node)) && ctx.tree.is_displayed(*node))
            .collect()
    }
}

impl Matcher for ByHtmlLabel {
    fn name(&self) -> &'static str {
        "by-html-label"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        if ctx.tree.category(node) != NodeCategory::Label || gate(ctx, node).is_none() {
            return Vec::new();
        }
        let Some(text) = ctx.index.as_text_without_form_controls(node) else {
            return Vec::new();
        };
        let Some(deviation) = MatchMode::Contains.deviation(ctx.pattern, &text) else {
            return Vec::new();
        };
        let Some(distance) = ctx.distance_to(node) else {
            return Vec::new();
        };

        self.labelled(ctx, node)
            .into_iter()
            .filter_map(|target| {
                let spot = ctx.index.position(target)?;
                trace!("Label {} points to {}", node, target);
                Some(MatchResult::new(
                    target,
                    FoundType::ByHtmlLabel,
                    deviation,
                    distance,
                    spot.start,
                ))
            })
            .collect()
    }
}

/// Free text in front of a control, up to the previous control
#[derive(Debug, Clone, Copy, Default)]
pub struct ByLabelingTextBefore;

impl Matcher for ByLabelingTextBefore {
    fn name(&self) -> &'static str {
        "by-labeling-text-before"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        let from = match ctx.path_spot {
            PathSpot::Found(path) => path.end.max(0) as usize,
            _ => 0,
        };
        let Some(label) = ctx.index.label_text_before(node, from) else {
            return Vec::new();
        };
        if label.is_empty() {
            return Vec::new();
        }
        let Some(deviation) = MatchMode::Contains.deviation(ctx.pattern, &label) else {
            return Vec::new();
        };
        let Some(text_before) = ctx.index.text_before(node) else {
            return Vec::new();
        };

        // the label is part of the text before; measure up to where it starts
        let label_start = ctx.pattern.no_of_chars_before_last_occurrence_in(&text_before);
        let up_to_label: String = if label_start >= 0 {
            text_before.chars().take(label_start as usize).collect()
        } else {
            text_before
        };

        vec![MatchResult::new(
            node,
            FoundType::ByLabelingText,
            deviation,
            ctx.distance(&up_to_label),
            spot.start,
        )]
    }
}

/// Free text behind a control (checkboxes, radio buttons)
#[derive(Debug, Clone, Copy, Default)]
pub struct ByLabelingTextAfter;

impl Matcher for ByLabelingTextAfter {
    fn name(&self) -> &'static str {
        "by-labeling-text-after"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };
        let label = ctx.index.label_text_after(node);
        ctx.score(
            node,
            spot,
            label.as_deref(),
            FoundType::ByLabelingText,
            MatchMode::Contains,
        )
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::fixture::Fixture;
    use crate::node::InputKind;

    fn is_text_input(category: NodeCategory) -> bool {
        category == NodeCategory::Input(InputKind::Text)
    }

    const BEFORE: &str = "<form action='test'>\
        <input id='otherId' name='otherName' type='text'>\
        <p>Marker</p>\
        <input id='myId' name='myName' type='text'>\
        </form>";

    const BEFORE_WITH_TEXT: &str = "<form action='test'>\
        <p>Some text .... </p>\
        <input id='otherId' name='otherName' type='text'>\
        <p>Marker</p>\
        <input id='myId' name='myName' type='text'>\
        </form>";

    const AFTER: &str = "<p>Some text .... </p>\
        <input id='otherId1' type='checkbox'>\
        <input id='myId' type='checkbox'>CheckBox\
        <input id='otherId2' type='checkbox'>";

    const AFTER_WITH_TEXT: &str = "<input id='otherId' type='checkbox'>\
        <p>Some text .... </p>\
        <input id='myId' type='checkbox'>CheckBox";

    #[test]
    fn test_text_before() {
        let fixture = Fixture::new(BEFORE);
        let matches = fixture.run(&ByLabelingTextBefore, "Marker", &["myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 0, 0, 6);
    }

    #[test]
    fn test_text_before_wildcard() {
        let fixture = Fixture::new(BEFORE);
        let matches = fixture.run(&ByLabelingTextBefore, "Mark*", &["myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 0, 0, 6);
    }

    #[test]
    fn test_text_before_part() {
        let fixture = Fixture::new(BEFORE);
        let matches = fixture.run(&ByLabelingTextBefore, "arke", &["myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 2, 1, 6);
    }

    #[test]
    fn test_text_before_with_path() {
        let fixture = Fixture::new(BEFORE_WITH_TEXT);
        let matches = fixture.run(&ByLabelingTextBefore, "Some text > Marker", &["myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 0, 6, 21);
    }

    #[test]
    fn test_text_before_wrong_path() {
        let fixture = Fixture::new(BEFORE_WITH_TEXT);
        assert!(fixture
            .run(&ByLabelingTextBefore, "wrong text > Marker", &["myId", "otherId"])
            .is_empty());
        assert!(fixture.run(&ByLabelingTextBefore, "not", &["myId", "otherId"]).is_empty());
    }

    #[test]
    fn test_text_after() {
        let fixture = Fixture::new(AFTER);
        let matches = fixture.run(&ByLabelingTextAfter, "CheckBox", &["myId", "otherId1", "otherId2"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 0, 14, 14);
    }

    #[test]
    fn test_text_after_part() {
        let fixture = Fixture::new(AFTER);
        let matches = fixture.run(&ByLabelingTextAfter, "heckBo", &["myId", "otherId1", "otherId2"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 2, 14, 14);
    }

    #[test]
    fn test_text_after_with_path() {
        let fixture = Fixture::new(AFTER_WITH_TEXT);
        let matches = fixture.run(&ByLabelingTextAfter, "Some text > *eckBox", &["myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByLabelingText, 0, 5, 14);
    }

    #[test]
    fn test_text_after_without_text_before() {
        let fixture = Fixture::new(AFTER_WITH_TEXT);
        assert!(fixture
            .run(&ByLabelingTextAfter, "Some text > ", &["myId", "otherId"])
            .is_empty());
        assert!(fixture
            .run(&ByLabelingTextAfter, "wrong text > CheckBox", &["myId", "otherId"])
            .is_empty());
    }

    #[test]
    fn test_no_text_before() {
        let fixture = Fixture::new("<input id='myId' type='checkbox'>Marker");
        assert!(fixture
            .run(&ByLabelingTextBefore, "wrong text > Marker", &["myId"])
            .is_empty());
        assert!(fixture
            .run(&ByLabelingTextAfter, "wrong text > Marker", &["myId"])
            .is_empty());
        assert!(fixture.run(&ByLabelingTextBefore, "Marker", &["myId"]).is_empty());
    }

    #[test]
    fn test_html_label_for() {
        let fixture = Fixture::new(
            "<label id='labelId' for='myId'>Username</label>\
             <input id='myId' type='text'>\
             <input id='otherId' type='text'>",
        );
        let matcher = ByHtmlLabel::new(is_text_input);
        let matches = fixture.run(&matcher, "Username", &["labelId", "myId", "otherId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByHtmlLabel, 0, 0, 8);
    }

    #[test]
    fn test_html_label_nested() {
        let fixture = Fixture::new(
            "<p>Intro</p>\
             <label id='labelId'>Password <input id='myId' type='text' value='secret'></label>",
        );
        let matcher = ByHtmlLabel::new(is_text_input);
        let matches = fixture.run(&matcher, "Intro > word", &["labelId"]);
        assert_eq!(matches.len(), 1);
        fixture.assert_result(&matches[0], "myId", FoundType::ByHtmlLabel, 4, 0, 14);

        // label text never includes the value of the nested control
        assert!(fixture.run(&matcher, "secret", &["labelId"]).is_empty());
    }

    #[test]
    fn test_html_label_wrong_target() {
        let fixture = Fixture::new(
            "<label id='labelId' for='myId'>Accept</label><input id='myId' type='checkbox'>",
        );
        let matcher = ByHtmlLabel::new(is_text_input);
        assert!(fixture.run(&matcher, "Accept", &["labelId"]).is_empty());
    }
}
