//! Control finder
//!
//! Runs the registered identifiers of a [`ControlCategory`] over every
//! visible element of an indexed page and collects the results in a
//! [`WeightedControlList`].

use crate::config::LocatorConfig;
use crate::control::{Control, ControlKind};
use crate::identifier::ControlCategory;
use crate::matchers::{MatchContext, Matcher, BY_ID};
use crate::node::{NodeId, PageTree};
use crate::page_index::PageTextIndex;
use crate::pattern::SearchPattern;
use crate::types::{saturating_offset, FoundType, MatchResult};
use crate::weighted::{Entry, WeightedControlList};
use crate::wpath::{TableCoordinate, WPath};
use rayon::prelude::*;
use tracing::debug;

/// Finder over one indexed page
pub struct ControlFinder<'a> {
    tree: &'a dyn PageTree,
    index: &'a PageTextIndex,
    config: LocatorConfig,
}

impl<'a> ControlFinder<'a> {
    pub fn new(tree: &'a dyn PageTree, index: &'a PageTextIndex) -> Self {
        Self::with_config(tree, index, LocatorConfig::default())
    }

    pub fn with_config(
        tree: &'a dyn PageTree,
        index: &'a PageTextIndex,
        config: LocatorConfig,
    ) -> Self {
        Self {
            tree,
            index,
            config,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn all_clickables(&self, wpath: &WPath) -> WeightedControlList {
        self.find(ControlCategory::Clickable, wpath)
    }

    pub fn all_settables(&self, wpath: &WPath) -> WeightedControlList {
        self.find(ControlCategory::Settable, wpath)
    }

    pub fn all_selectables(&self, wpath: &WPath) -> WeightedControlList {
        self.find(ControlCategory::Selectable, wpath)
    }

    pub fn all_deselectables(&self, wpath: &WPath) -> WeightedControlList {
        self.find(ControlCategory::Deselectable, wpath)
    }

    pub fn all_other_controls(&self, wpath: &WPath) -> WeightedControlList {
        self.find(ControlCategory::Other, wpath)
    }

    /// Run every identifier of `category` on the visible elements
    pub fn find(&self, category: ControlCategory, wpath: &WPath) -> WeightedControlList {
        let list = WeightedControlList::new();
        let identifiers = category.identifiers();
        self.run(wpath, &list, |ctx, node| {
            identifiers
                .iter()
                .filter(|identifier| identifier.supports(self.tree, node))
                .flat_map(|identifier| identifier.identify(ctx, node))
                .collect()
        });

        debug!(
            "{} search for '{}' produced {} entries",
            category,
            wpath,
            list.len()
        );
        list
    }

    /// Elements that are no known control, found by id or by their text
    ///
    /// Every occurrence of the last node behind the path prefix is
    /// attributed to the innermost visible element around it.
    pub fn all_controls_for_text(&self, wpath: &WPath) -> WeightedControlList {
        let list = WeightedControlList::new();
        self.run(wpath, &list, |ctx, node| {
            if self.is_known_control(node) {
                Vec::new()
            } else {
                BY_ID.matches(ctx, node)
            }
        });

        let Some(pattern) = wpath.last_node_pattern() else {
            return list;
        };
        if pattern.min_length() == 0 {
            return list;
        }
        let path_spot = self.index.path_spot(wpath.path_pattern());
        if path_spot.is_not_found() {
            return list;
        }

        let mut from = path_spot.end().unwrap_or(0).max(0) as usize;
        while let Some(hit) = self.index.first_occurrence_from(pattern, from) {
            if let Some(entry) = self.enclosing_text_entry(wpath, pattern, hit.start, hit.end) {
                list.add_entry(entry);
            }
            from = hit.start.max(0) as usize + 1;
        }

        debug!("Text search for '{}' produced {} entries", wpath, list.len());
        list
    }

    fn is_known_control(&self, node: NodeId) -> bool {
        ControlKind::for_category(self.tree.category(node)).is_known()
    }

    /// Innermost visible element around `start..end`; only unknown elements
    /// produce an entry
    fn enclosing_text_entry(
        &self,
        wpath: &WPath,
        pattern: &SearchPattern,
        start: i32,
        end: i32,
    ) -> Option<Entry> {
        let node = self
            .index
            .visible_elements_bottom_up()
            .iter()
            .copied()
            .find(|node| {
                self.index
                    .position(*node)
                    .map_or(false, |spot| spot.start <= start && end <= spot.end)
            })?;
        if self.is_known_control(node) {
            return None;
        }

        let spot = self.index.position(node)?;
        let text_before = self.index.text_before_including(node)?;
        let last = pattern.last_occurrence_in(&text_before)?;
        let deviation = saturating_offset(text_before.chars().count()) - last.end;
        let leading: String = text_before.chars().take(last.start.max(0) as usize).collect();
        let distance = match wpath.path_pattern() {
            Some(path) => path.no_of_chars_after_last_occurrence_in(&leading),
            None => saturating_offset(leading.chars().count()),
        };

        Some(self.entry(MatchResult::new(
            node,
            FoundType::ByText,
            deviation,
            distance,
            spot.start,
        )))
    }

    /// Apply `identify` to every visible element, in parallel on large pages
    fn run<F>(&self, wpath: &WPath, list: &WeightedControlList, identify: F)
    where
        F: Fn(&MatchContext<'_>, NodeId) -> Vec<MatchResult> + Sync,
    {
        let path_spot = self.index.path_spot(wpath.path_pattern());
        if path_spot.is_not_found() {
            debug!("Path of '{}' not found in page", wpath);
            return;
        }
        debug!("Path spot of '{}': {:?}", wpath, path_spot);

        let coordinates: Vec<TableCoordinate> =
            wpath.table_coordinates_reversed().into_iter().cloned().collect();
        let fallback = SearchPattern::match_all();
        let ctx = MatchContext::new(self.tree, self.index, wpath, &coordinates, &fallback);

        let elements = self.index.visible_elements();
        if elements.len() >= self.config.parallel_threshold {
            debug!("Matching {} visible elements in parallel", elements.len());
            elements.par_iter().for_each(|node| {
                let entries: Vec<Entry> = identify(&ctx, *node)
                    .into_iter()
                    .map(|result| self.entry(result))
                    .collect();
                if !entries.is_empty() {
                    list.extend(entries);
                }
            });
        } else {
            for node in elements {
                list.extend(identify(&ctx, *node).into_iter().map(|result| self.entry(result)));
            }
        }
    }

    fn entry(&self, result: MatchResult) -> Entry {
        let kind = ControlKind::for_category(self.tree.category(result.node));
        Entry {
            control: Control::from_tree(self.tree, result.node, kind),
            found_type: result.found_type,
            deviation: result.deviation,
            distance: result.distance,
            start: result.start,
            hierarchy: self.index.hierarchy(result.node).unwrap_or_default().to_string(),
            index: self.index.node_index(result.node).unwrap_or(usize::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StaticPage;

    fn find<F>(markup: &str, locator: &str, search: F) -> (StaticPage, Vec<Entry>)
    where
        F: Fn(&ControlFinder<'_>, &WPath) -> WeightedControlList,
    {
        let page = StaticPage::from_html(markup);
        let index = PageTextIndex::build(&page);
        let wpath = WPath::parse(locator).unwrap();
        let entries = {
            let finder = ControlFinder::new(&page, &index);
            search(&finder, &wpath).entries_sorted()
        };
        (page, entries)
    }

    fn id_of(page: &StaticPage, entry: &Entry) -> String {
        page.attribute(entry.control.node(), "id").unwrap_or_default().to_string()
    }

    #[test]
    fn test_clickable_prefers_id() {
        let (page, entries) = find(
            "<a id='go' href='#'>Next</a><input id='next' type='submit' value='go'>",
            "go",
            |finder, wpath| finder.all_clickables(wpath),
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(id_of(&page, &entries[0]), "go");
        assert_eq!(entries[0].found_type, FoundType::ById);
        assert_eq!(entries[1].found_type, FoundType::ByLabel);
    }

    #[test]
    fn test_unknown_path_gives_nothing() {
        let (_, entries) = find(
            "<p>Intro</p><input id='a' type='text'>",
            "Missing > a",
            |finder, wpath| finder.all_settables(wpath),
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn test_hidden_controls_are_skipped() {
        let (_, entries) = find(
            "<input id='a' type='hidden' name='token'><input id='b' type='text' name='token' style='display:none'>",
            "token",
            |finder, wpath| finder.all_settables(wpath),
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn test_entries_carry_hierarchy_and_index() {
        let page = StaticPage::from_html("<form><input id='a' name='x' type='text'></form>");
        let index = PageTextIndex::build(&page);
        let finder = ControlFinder::new(&page, &index);
        let list = finder.all_settables(&WPath::parse("x").unwrap());
        let best = list.best().unwrap();
        let node = page.element_by_id("a").unwrap();
        assert_eq!(best.control.node(), node);
        assert_eq!(best.control.kind(), ControlKind::TextField);
        assert_eq!(best.hierarchy, index.hierarchy(node).unwrap());
        assert_eq!(best.index, index.node_index(node).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut markup = String::new();
        for i in 0..40 {
            markup.push_str(&format!(
                "<p>Field {}</p><input id='f{}' name='field{}' type='text'>",
                i, i, i
            ));
        }
        let page = StaticPage::from_html(&markup);
        let index = PageTextIndex::build(&page);
        let wpath = WPath::parse("Field 1").unwrap();

        let sequential = ControlFinder::with_config(
            &page,
            &index,
            LocatorConfig::default().with_parallel_threshold(usize::MAX),
        )
        .all_settables(&wpath);
        let parallel = ControlFinder::with_config(
            &page,
            &index,
            LocatorConfig::default().with_parallel_threshold(1),
        )
        .all_settables(&wpath);

        assert!(!sequential.is_empty());
        assert_eq!(sequential.entries_sorted(), parallel.entries_sorted());
        assert_eq!(sequential.len(), parallel.len());
    }

    #[test]
    fn test_controls_for_text() {
        let (page, entries) = find(
            "<div id='box'><span id='hello'>Hello World</span></div><a id='link' href='#'>Hello</a>",
            "World",
            |finder, wpath| finder.all_controls_for_text(wpath),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(id_of(&page, &entries[0]), "hello");
        assert_eq!(entries[0].found_type, FoundType::ByText);
        assert_eq!(entries[0].deviation, 0);
        assert_eq!(entries[0].distance, 6);
    }

    #[test]
    fn test_controls_for_text_skips_known_controls() {
        let (page, entries) = find(
            "<span id='note'>Hello</span><a id='link' href='#'>Hello</a>",
            "Hello",
            |finder, wpath| finder.all_controls_for_text(wpath),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(id_of(&page, &entries[0]), "note");
    }

    #[test]
    fn test_controls_for_text_by_id() {
        let (page, entries) = find(
            "<div id='banner'>Welcome</div><a id='banner-link' href='#'>x</a>",
            "banner",
            |finder, wpath| finder.all_controls_for_text(wpath),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(id_of(&page, &entries[0]), "banner");
        assert_eq!(entries[0].found_type, FoundType::ById);
    }
}
