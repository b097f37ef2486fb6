//! Core value types shared by patterns, matchers and the ranking list

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character count as an offset, saturating at `i32::MAX`
pub(crate) fn saturating_offset(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Half-open character range `[start, end)` in the normalized page text
///
/// Offsets count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FindSpot {
    pub start: i32,
    pub end: i32,
}

impl FindSpot {
    /// Undefined / not found marker
    pub const NOT_FOUND: FindSpot = FindSpot { start: -1, end: -1 };

    /// Create a new spot
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Whether this spot denotes a real position
    pub fn is_found(&self) -> bool {
        self.start >= 0 && self.end >= 0
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        if self.is_found() {
            (self.end - self.start).max(0) as usize
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FindSpot {
    fn default() -> Self {
        FindSpot::NOT_FOUND
    }
}

impl fmt::Display for FindSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FindSpot({}, {})", self.start, self.end)
    }
}

/// How a control was found
///
/// Declaration order is ranking order: lower rank means stronger evidence.
/// Variants sharing a rank tie on this key and fall through to deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoundType {
    ById,
    ByInnerName,
    ByName,
    ByLabel,
    ByHtmlLabel,
    ByLabelingText,
    ByPlaceholder,
    ByTitleAttribute,
    ByInnerImgSrc,
    ByInnerImgAlt,
    ByInnerImgTitle,
    ByImgSrc,
    ByImgAlt,
    ByImgTitle,
    ByAriaLabel,
    ByTableCoordinate,
    ByText,
}

impl FoundType {
    /// Ranking weight, ascending
    pub fn rank(&self) -> u8 {
        match self {
            FoundType::ById => 0,
            FoundType::ByInnerName => 1,
            FoundType::ByName => 2,
            FoundType::ByLabel => 3,
            FoundType::ByHtmlLabel => 4,
            FoundType::ByLabelingText => 5,
            FoundType::ByPlaceholder => 6,
            FoundType::ByTitleAttribute => 7,
            FoundType::ByInnerImgSrc | FoundType::ByInnerImgAlt | FoundType::ByInnerImgTitle => 8,
            FoundType::ByImgSrc | FoundType::ByImgAlt | FoundType::ByImgTitle => 9,
            FoundType::ByAriaLabel => 10,
            FoundType::ByTableCoordinate => 11,
            FoundType::ByText => 12,
        }
    }

    /// Get found type name as string
    pub fn name(&self) -> &'static str {
        match self {
            FoundType::ById => "BY_ID",
            FoundType::ByInnerName => "BY_INNER_NAME",
            FoundType::ByName => "BY_NAME",
            FoundType::ByLabel => "BY_LABEL",
            FoundType::ByHtmlLabel => "BY_HTML_LABEL",
            FoundType::ByLabelingText => "BY_LABELING_TEXT",
            FoundType::ByPlaceholder => "BY_PLACEHOLDER",
            FoundType::ByTitleAttribute => "BY_TITLE_ATTRIBUTE",
            FoundType::ByInnerImgSrc => "BY_INNER_IMG_SRC_ATTRIBUTE",
            FoundType::ByInnerImgAlt => "BY_INNER_IMG_ALT_ATTRIBUTE",
            FoundType::ByInnerImgTitle => "BY_INNER_IMG_TITLE_ATTRIBUTE",
            FoundType::ByImgSrc => "BY_IMG_SRC_ATTRIBUTE",
            FoundType::ByImgAlt => "BY_IMG_ALT_ATTRIBUTE",
            FoundType::ByImgTitle => "BY_IMG_TITLE_ATTRIBUTE",
            FoundType::ByAriaLabel => "BY_ARIA_LABEL_ATTRIBUTE",
            FoundType::ByTableCoordinate => "BY_TABLE_COORDINATE",
            FoundType::ByText => "BY_TEXT",
        }
    }
}

impl fmt::Display for FoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one matcher for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Node the result refers to (may differ from the inspected node, e.g. for labels)
    pub node: NodeId,

    /// Dimension that matched
    pub found_type: FoundType,

    /// Characters of the matched value outside the search term
    pub deviation: i32,

    /// Characters between the path prefix and the node
    pub distance: i32,

    /// Start of the node in the page text
    pub start: i32,
}

impl MatchResult {
    pub fn new(node: NodeId, found_type: FoundType, deviation: i32, distance: i32, start: i32) -> Self {
        Self {
            node,
            found_type,
            deviation,
            distance,
            start,
        }
    }
}

/// Where the path prefix of a locator sits in the page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSpot {
    /// Locator has no path nodes
    Unconstrained,

    /// Path nodes were given but do not occur in the page
    NotFound,

    /// First occurrence of the path nodes
    Found(FindSpot),
}

impl PathSpot {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PathSpot::NotFound)
    }

    /// End of the path occurrence, if any
    pub fn end(&self) -> Option<i32> {
        match self {
            PathSpot::Found(spot) => Some(spot.end),
            _ => None,
        }
    }

    /// Whether text starting at `pos` lies behind the path prefix
    pub fn allows(&self, pos: i32) -> bool {
        match self {
            PathSpot::Unconstrained => true,
            PathSpot::NotFound => false,
            PathSpot::Found(spot) => spot.end <= pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_saturate() {
        assert_eq!(saturating_offset(42), 42);
        assert_eq!(saturating_offset(usize::MAX), i32::MAX);
    }

    #[test]
    fn test_found_type_relative_order() {
        let ordered = [
            FoundType::ById,
            FoundType::ByName,
            FoundType::ByLabel,
            FoundType::ByHtmlLabel,
            FoundType::ByLabelingText,
            FoundType::ByPlaceholder,
            FoundType::ByTitleAttribute,
            FoundType::ByInnerImgAlt,
            FoundType::ByImgAlt,
            FoundType::ByAriaLabel,
            FoundType::ByTableCoordinate,
            FoundType::ByText,
        ];
        for pair in ordered.windows(2) {
            assert!(
                pair[0].rank() < pair[1].rank(),
                "{} should rank before {}",
                pair[0],
                pair[1]
            );
        }
        assert!(FoundType::ByInnerName.rank() < FoundType::ByName.rank());
        assert_eq!(FoundType::ByImgSrc.rank(), FoundType::ByImgTitle.rank());
        assert_eq!(FoundType::ByInnerImgSrc.rank(), FoundType::ByInnerImgAlt.rank());
    }

    #[test]
    fn test_find_spot_display_and_len() {
        assert_eq!(FindSpot::NOT_FOUND.to_string(), "FindSpot(-1, -1)");
        assert_eq!(FindSpot::new(2, 9).to_string(), "FindSpot(2, 9)");
        assert_eq!(FindSpot::new(2, 9).len(), 7);
        assert!(!FindSpot::NOT_FOUND.is_found());
        assert_eq!(FindSpot::default(), FindSpot::NOT_FOUND);
    }

    #[test]
    fn test_path_spot_allows() {
        assert!(PathSpot::Unconstrained.allows(0));
        assert!(!PathSpot::NotFound.allows(100));
        let spot = PathSpot::Found(FindSpot::new(0, 9));
        assert!(spot.allows(9));
        assert!(!spot.allows(8));
        assert_eq!(spot.end(), Some(9));
    }
}
