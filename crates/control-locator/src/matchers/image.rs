//! Strategies reading image attributes

use super::attribute::AttributeMatcher;
use super::{gate, MatchContext, MatchMode, Matcher};
use crate::node::{NodeCategory, NodeId};
use crate::types::{FoundType, MatchResult};

pub const BY_IMG_ALT: AttributeMatcher =
    AttributeMatcher::new("by-image-alt", "alt", FoundType::ByImgAlt, MatchMode::Contains);

pub const BY_IMG_TITLE: AttributeMatcher =
    AttributeMatcher::new("by-image-title", "title", FoundType::ByImgTitle, MatchMode::Contains);

/// File name of the image; the search term has to end the `src`
pub const BY_IMG_SRC: AttributeMatcher =
    AttributeMatcher::new("by-image-src", "src", FoundType::ByImgSrc, MatchMode::EndsWith);

const INNER_IMAGE_DIMENSIONS: [(&str, FoundType, MatchMode); 4] = [
    ("alt", FoundType::ByInnerImgAlt, MatchMode::Contains),
    ("title", FoundType::ByInnerImgTitle, MatchMode::Contains),
    ("src", FoundType::ByInnerImgSrc, MatchMode::EndsWith),
    ("name", FoundType::ByInnerName, MatchMode::Exact),
];

/// Images nested in the candidate (image links, image buttons)
#[derive(Debug, Clone, Copy, Default)]
pub struct ByInnerImage;

impl Matcher for ByInnerImage {
    fn name(&self) -> &'static str {
        "by-inner-image"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        let Some(spot) = gate(ctx, node) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for image in ctx
            .tree
            .descendants(node)
            .into_iter()
            .filter(|inner| ctx.tree.category(*inner) == NodeCategory::Image)
        {
            for (attribute, found_type, mode) in INNER_IMAGE_DIMENSIONS {
                let value = ctx.tree.attribute(image, attribute);
                results.extend(ctx.score(node, spot, value, found_type, mode));
            }
        }
        results
    }
}
