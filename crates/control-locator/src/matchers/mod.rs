//! Matching strategies
//!
//! Every strategy looks at one candidate node and reports zero or more
//! [`MatchResult`]s. They share one shape:
//!
//! 1. a path prefix that was given but not found never matches
//! 2. an empty search term never matches
//! 3. the node has to start behind the path prefix
//! 4. the extracted value is scored with the strategy's [`MatchMode`]
//! 5. distance is the text between the path prefix and the node

pub mod attribute;
pub mod image;
pub mod label;
pub mod table;
pub mod text;

pub use attribute::*;
pub use image::*;
pub use label::*;
pub use table::*;
pub use text::*;

use crate::node::{NodeId, PageTree};
use crate::page_index::PageTextIndex;
use crate::pattern::SearchPattern;
use crate::types::{saturating_offset, FindSpot, FoundType, MatchResult, PathSpot};
use crate::wpath::{TableCoordinate, WPath};

/// How an extracted value has to relate to the search term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Term anywhere in the value; deviation counts the surrounding chars
    Contains,
    /// Term covers the whole value
    Exact,
    /// Value starts with the term; deviation counts the chars after it
    StartsWith,
    /// Value ends with the term; deviation counts the chars before it
    EndsWith,
}

impl MatchMode {
    /// Deviation of `value`, `None` when the value does not qualify
    pub fn deviation(&self, pattern: &SearchPattern, value: &str) -> Option<i32> {
        let deviation = match self {
            MatchMode::Contains => pattern.no_of_surrounding_chars_in(value),
            MatchMode::Exact => {
                if !pattern.matches(value) {
                    return None;
                }
                pattern.no_of_surrounding_chars_in(value)
            }
            MatchMode::StartsWith => pattern.no_of_chars_after_last_occurrence_in(value),
            MatchMode::EndsWith => {
                if !pattern.matches_at_end(value) {
                    return None;
                }
                pattern.no_of_chars_before_last_occurrence_in(value)
            }
        };
        (deviation >= 0).then_some(deviation)
    }
}

/// Everything a matcher reads while looking at one locator
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub tree: &'a dyn PageTree,
    pub index: &'a PageTextIndex,
    pub wpath: &'a WPath,
    /// Path nodes joined; `None` without path nodes
    pub path_pattern: Option<&'a SearchPattern>,
    pub path_spot: PathSpot,
    /// Last node of the locator
    pub pattern: &'a SearchPattern,
    /// Path nodes and last node joined
    pub whole_pattern: &'a SearchPattern,
    /// Table coordinates, innermost first
    pub table_coordinates: &'a [TableCoordinate],
}

impl<'a> MatchContext<'a> {
    /// Context for `wpath`; `fallback` stands in for a missing last node
    /// and `table_coordinates` have to be innermost first
    pub fn new(
        tree: &'a dyn PageTree,
        index: &'a PageTextIndex,
        wpath: &'a WPath,
        table_coordinates: &'a [TableCoordinate],
        fallback: &'a SearchPattern,
    ) -> Self {
        let path_pattern = wpath.path_pattern();
        Self {
            tree,
            index,
            wpath,
            path_pattern,
            path_spot: index.path_spot(path_pattern),
            pattern: wpath.last_node_pattern().unwrap_or(fallback),
            whole_pattern: wpath.whole_path_pattern().unwrap_or(fallback),
            table_coordinates,
        }
    }

    /// Position of `node` if it may match at all
    pub fn candidate_spot(&self, node: NodeId) -> Option<FindSpot> {
        if self.path_spot.is_not_found() {
            return None;
        }
        let spot = self.index.position(node)?;
        self.path_spot.allows(spot.start).then_some(spot)
    }

    /// Chars between the end of the path prefix and the end of `text_before`
    pub fn distance(&self, text_before: &str) -> i32 {
        match self.path_pattern {
            Some(path) => path.no_of_chars_after_last_occurrence_in(text_before),
            None => saturating_offset(text_before.chars().count()),
        }
    }

    /// Distance of `node` measured over the whole text in front of it
    pub fn distance_to(&self, node: NodeId) -> Option<i32> {
        let text_before = self.index.text_before(node)?;
        Some(self.distance(&text_before))
    }

    /// Score `value` for `node` and build the result
    pub fn score(
        &self,
        node: NodeId,
        spot: FindSpot,
        value: Option<&str>,
        found_type: FoundType,
        mode: MatchMode,
    ) -> Option<MatchResult> {
        let value = value.filter(|value| !value.is_empty())?;
        let deviation = mode.deviation(self.pattern, value)?;
        let distance = self.distance_to(node)?;
        Some(MatchResult::new(node, found_type, deviation, distance, spot.start))
    }
}

/// One matching strategy
///
/// Matchers are stateless; everything locator specific arrives through the
/// [`MatchContext`], which lets the registry share them between threads.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Results for `node`; empty when the strategy does not apply
    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult>;
}

/// Steps one to three of the shared shape
pub(crate) fn gate(ctx: &MatchContext<'_>, node: NodeId) -> Option<FindSpot> {
    if ctx.pattern.min_length() == 0 {
        return None;
    }
    ctx.candidate_spot(node)
}
